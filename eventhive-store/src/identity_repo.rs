use async_trait::async_trait;
use eventhive_core::identity::{normalize_email, IdentityError, IdentityProvider, Registration};
use eventhive_shared::{User, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = IdentityError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&row.role)
            .ok_or_else(|| IdentityError::Storage(format!("unknown role {}", row.role)))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
        })
    }
}

fn storage(e: sqlx::Error) -> IdentityError {
    IdentityError::Storage(e.to_string())
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn resolve(&self, email: &str) -> Result<Option<User>, IdentityError> {
        sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(User::try_from)
            .transpose()
    }

    async fn register(&self, registration: Registration) -> Result<User, IdentityError> {
        let email = registration.validate()?;
        let user = User {
            id: Uuid::new_v4(),
            name: registration.name.trim().to_string(),
            email,
            role: registration.role,
        };

        let inserted = sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(IdentityError::EmailTaken(user.email))
            }
            Err(e) => Err(storage(e)),
        }
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<User>, IdentityError> {
        sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(User::try_from)
            .transpose()
    }
}
