use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::user::UserProfile;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: UserProfile,
}

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    content: String,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: Option<String>,
    author_email: String,
    author_image: Option<String>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            author: UserProfile {
                id: row.author_id,
                name: row.author_name,
                email: row.author_email,
                image: row.author_image,
            },
        }
    }
}

pub async fn list_owned(pool: &PgPool, author_id: Uuid) -> Result<Vec<Document>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT d.id, d.title, d.content, d.author_id, d.created_at, d.updated_at,
               u.name AS author_name, u.email AS author_email, u.image AS author_image
        FROM documents d
        JOIN users u ON u.id = d.author_id
        WHERE d.author_id = $1
        ORDER BY d.updated_at DESC
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Document::from).collect())
}

pub async fn find_by_id(pool: &PgPool, document_id: Uuid) -> Result<Option<Document>, sqlx::Error> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT d.id, d.title, d.content, d.author_id, d.created_at, d.updated_at,
               u.name AS author_name, u.email AS author_email, u.image AS author_image
        FROM documents d
        JOIN users u ON u.id = d.author_id
        WHERE d.id = $1
        "#,
    )
    .bind(document_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Document::from))
}

// Owners and share recipients get the same view of a document; everyone else
// gets "not found" rather than "forbidden" so existence is not leaked.
pub async fn find_for_user(
    pool: &PgPool,
    document_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Document>, sqlx::Error> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT d.id, d.title, d.content, d.author_id, d.created_at, d.updated_at,
               u.name AS author_name, u.email AS author_email, u.image AS author_image
        FROM documents d
        JOIN users u ON u.id = d.author_id
        WHERE d.id = $1
          AND (d.author_id = $2 OR EXISTS (
              SELECT 1 FROM document_shares s
              WHERE s.document_id = d.id AND s.shared_with_id = $2
          ))
        "#,
    )
    .bind(document_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Document::from))
}

pub async fn find_owner(pool: &PgPool, document_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query_as::<_, (Uuid,)>(
        r#"
        SELECT author_id
        FROM documents
        WHERE id = $1
        "#,
    )
    .bind(document_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(author_id,)| author_id))
}

pub async fn insert(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    content: &str,
) -> Result<Uuid, sqlx::Error> {
    let document_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO documents (id, title, content, author_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(document_id)
    .bind(title)
    .bind(content)
    .bind(author_id)
    .execute(pool)
    .await?;

    Ok(document_id)
}

pub async fn fetch_content(pool: &PgPool, document_id: Uuid) -> Result<String, sqlx::Error> {
    let (content,) = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT content
        FROM documents
        WHERE id = $1
        "#,
    )
    .bind(document_id)
    .fetch_one(pool)
    .await?;

    Ok(content)
}

// Whole-content overwrite; the last edit observed by the server wins.
pub async fn overwrite_content(
    pool: &PgPool,
    document_id: Uuid,
    content: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE documents
        SET content = $2, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(document_id)
    .bind(content)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &PgPool, document_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM documents
        WHERE id = $1
        "#,
    )
    .bind(document_id)
    .execute(pool)
    .await?;

    Ok(())
}
