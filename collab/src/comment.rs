use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthor {
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub document_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub author: CommentAuthor,
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    document_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
    author_name: Option<String>,
    author_email: String,
    author_image: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            author_id: row.author_id,
            text: row.text,
            created_at: row.created_at,
            author: CommentAuthor {
                name: row.author_name,
                email: row.author_email,
                image: row.author_image,
            },
        }
    }
}

pub async fn list_for_document(
    pool: &PgPool,
    document_id: Uuid,
) -> Result<Vec<Comment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.document_id, c.author_id, c.text, c.created_at,
               u.name AS author_name, u.email AS author_email, u.image AS author_image
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.document_id = $1
        ORDER BY c.created_at
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Comment::from).collect())
}

pub async fn insert(
    pool: &PgPool,
    document_id: Uuid,
    author_id: Uuid,
    text: &str,
) -> Result<Comment, sqlx::Error> {
    let comment_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO comments (id, document_id, author_id, text)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(comment_id)
    .bind(document_id)
    .bind(author_id)
    .bind(text)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.document_id, c.author_id, c.text, c.created_at,
               u.name AS author_name, u.email AS author_email, u.image AS author_image
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}
