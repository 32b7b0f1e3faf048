use async_trait::async_trait;
use eventhive_shared::{User, UserRole};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("A user with email {0} already exists")]
    EmailTaken(String),

    #[error("Invalid registration: {0}")]
    Validation(String),

    #[error("Identity store failure: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl Registration {
    /// Trims the fields and checks them; returns the normalized email.
    pub fn validate(&self) -> Result<String, IdentityError> {
        if self.name.trim().is_empty() {
            return Err(IdentityError::Validation("name is required".to_string()));
        }
        let email = normalize_email(&self.email);
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
            _ => Err(IdentityError::Validation(format!(
                "{} is not a valid email address",
                self.email.trim()
            ))),
        }
    }
}

/// Emails are the sign-in credential; compare them trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Resolves who is acting. The admission engine only ever sees the
/// [`eventhive_shared::Purchaser`] derived from a resolved [`User`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, email: &str) -> Result<Option<User>, IdentityError>;

    async fn register(&self, registration: Registration) -> Result<User, IdentityError>;

    async fn find(&self, user_id: Uuid) -> Result<Option<User>, IdentityError>;
}

pub struct InMemoryIdentityProvider {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn resolve(&self, email: &str) -> Result<Option<User>, IdentityError> {
        Ok(self.users.read().await.get(&normalize_email(email)).cloned())
    }

    async fn register(&self, registration: Registration) -> Result<User, IdentityError> {
        let email = registration.validate()?;
        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(IdentityError::EmailTaken(email));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: registration.name.trim().to_string(),
            email: email.clone(),
            role: registration.role,
        };
        users.insert(email, user.clone());
        tracing::info!("Registered {} as {}", user.id, user.role.as_str());
        Ok(user)
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<User>, IdentityError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.id == user_id)
            .cloned())
    }
}

/// Accounts created when the demo catalog is seeded.
pub fn demo_registrations() -> Vec<Registration> {
    vec![
        Registration {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::User,
        },
        Registration {
            name: "Bob (Organizer)".to_string(),
            email: "bob@example.com".to_string(),
            role: UserRole::Organizer,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Registration {
        Registration {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_register_then_resolve_case_insensitive() {
        let idp = InMemoryIdentityProvider::new();
        let user = idp.register(alice()).await.unwrap();

        let resolved = idp.resolve("  ALICE@Example.com ").await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(idp.find(user.id).await.unwrap().unwrap().email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let idp = InMemoryIdentityProvider::new();
        idp.register(alice()).await.unwrap();

        let mut again = alice();
        again.email = "Alice@Example.com".to_string();
        assert!(matches!(idp.register(again).await, Err(IdentityError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_unknown_email_resolves_to_none() {
        let idp = InMemoryIdentityProvider::new();
        assert!(idp.resolve("nobody@example.com").await.unwrap().is_none());
    }

    #[test]
    fn test_registration_validation() {
        let mut r = alice();
        r.name = " ".to_string();
        assert!(matches!(r.validate(), Err(IdentityError::Validation(_))));

        let mut r = alice();
        r.email = "not-an-email".to_string();
        assert!(matches!(r.validate(), Err(IdentityError::Validation(_))));
    }
}
