use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// Accounts are provisioned by the external auth provider; this service only
// reads them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

pub async fn find_profile_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT id, name, email, image
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}
