//! User persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tender_core::{User, UserId, UserType};

/// Insert or update a user record.
pub async fn upsert(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, user_type, name, email, active, accepted_terms_at, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO UPDATE SET
             user_type = EXCLUDED.user_type,
             name = EXCLUDED.name,
             email = EXCLUDED.email,
             active = EXCLUDED.active,
             accepted_terms_at = EXCLUDED.accepted_terms_at",
    )
    .bind(user.id.0)
    .bind(user.user_type.to_string())
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.active)
    .bind(user.accepted_terms_at.map(DateTime::<Utc>::from))
    .bind(DateTime::<Utc>::from(user.created_at))
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all users.
pub async fn load_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, user_type, name, email, active, accepted_terms_at, created_at
         FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(UserRow::into_user).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    user_type: String,
    name: String,
    email: Option<String>,
    active: bool,
    accepted_terms_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Option<User> {
        let user_type = match UserType::parse(&self.user_type) {
            Ok(ut) => ut,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "skipping user with unknown type");
                return None;
            }
        };
        Some(User {
            id: UserId::from_uuid(self.id),
            user_type,
            name: self.name,
            email: self.email,
            active: self.active,
            accepted_terms_at: self.accepted_terms_at.map(Into::into),
            created_at: self.created_at.into(),
        })
    }
}
