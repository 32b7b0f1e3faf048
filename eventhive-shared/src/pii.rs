use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps purchaser contact details so `{:?}` and `{}` in log macros never
/// print them in full. Serialization is transparent: API responses and the
/// booking journal receive the real value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    /// `alice@example.com` becomes `a****@example.com`; anything without an
    /// `@` is fully starred.
    pub fn redacted(&self) -> String {
        let raw = self.0.as_ref();
        match raw.split_once('@') {
            Some((local, domain)) if !local.is_empty() => {
                let first: String = local.chars().take(1).collect();
                format!("{}****@{}", first, domain)
            }
            _ => "********".to_string(),
        }
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}
