use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use std::{str::FromStr, sync::Arc};
use uuid::Uuid;

use crate::{
    auth::User,
    document::{self, Document},
    error::ApiError,
    server::ApplicationState,
    user::{self, UserProfile},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentShare {
    pub id: Uuid,
    pub document_id: Uuid,
    pub shared_with_id: Uuid,
    pub shared_at: DateTime<Utc>,
    pub shared_with: UserProfile,
}

// A grant as seen by its recipient, with the document it unlocks embedded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDocument {
    pub id: Uuid,
    pub document_id: Uuid,
    pub shared_with_id: Uuid,
    pub shared_at: DateTime<Utc>,
    pub document: Document,
}

#[derive(FromRow)]
struct SharedDocumentRow {
    id: Uuid,
    document_id: Uuid,
    shared_with_id: Uuid,
    shared_at: DateTime<Utc>,
    title: String,
    content: String,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: Option<String>,
    author_email: String,
    author_image: Option<String>,
}

impl From<SharedDocumentRow> for SharedDocument {
    fn from(row: SharedDocumentRow) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            shared_with_id: row.shared_with_id,
            shared_at: row.shared_at,
            document: Document {
                id: row.document_id,
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
            },
        }
    }
}

pub async fn list_shared_documents(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<SharedDocument>>, ApiError> {
    let rows = sqlx::query_as::<_, SharedDocumentRow>(
        r#"
        SELECT s.id, s.document_id, s.shared_with_id, s.shared_at,
               d.title, d.content, d.author_id, d.created_at, d.updated_at,
               u.name AS author_name, u.email AS author_email, u.image AS author_image
        FROM document_shares s
        JOIN documents d ON d.id = s.document_id
        JOIN users u ON u.id = d.author_id
        WHERE s.shared_with_id = $1
        ORDER BY s.shared_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows.into_iter().map(SharedDocument::from).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDocumentRequest {
    pub document_id: Uuid,
    pub share_with_email: String,
}

pub async fn share_document(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
    Json(request): Json<ShareDocumentRequest>,
) -> Result<Json<DocumentShare>, ApiError> {
    let owner_id = document::find_owner(&state.pool, request.document_id)
        .await?
        .ok_or(ApiError::DocumentNotFound(request.document_id))?;

    if owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the document owner can share it".to_string(),
        ));
    }

    let recipient = user::find_profile_by_email(&state.pool, &request.share_with_email)
        .await?
        .ok_or_else(|| ApiError::UserNotFound(request.share_with_email.clone()))?;

    if recipient.id == user.id {
        return Err(ApiError::BadRequest(
            "Cannot share a document with yourself".to_string(),
        ));
    }

    let existing = sqlx::query_as::<_, (Uuid,)>(
        r#"
        SELECT id
        FROM document_shares
        WHERE document_id = $1 AND shared_with_id = $2
        "#,
    )
    .bind(request.document_id)
    .bind(recipient.id)
    .fetch_optional(&state.pool)
    .await?;

    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "Document already shared with this user".to_string(),
        ));
    }

    let share_id = Uuid::new_v4();
    let (shared_at,) = sqlx::query_as::<_, (DateTime<Utc>,)>(
        r#"
        INSERT INTO document_shares (id, document_id, shared_with_id)
        VALUES ($1, $2, $3)
        RETURNING shared_at
        "#,
    )
    .bind(share_id)
    .bind(request.document_id)
    .bind(recipient.id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(
        document = %request.document_id,
        recipient = %recipient.id,
        "document shared"
    );

    Ok(Json(DocumentShare {
        id: share_id,
        document_id: request.document_id,
        shared_with_id: recipient.id,
        shared_at,
        shared_with: recipient,
    }))
}

pub async fn remove_share(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
    Path((document_id, user_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let document_id = Uuid::from_str(&document_id)
        .map_err(|_| ApiError::BadRequest("please provide a valid document UUID".to_string()))?;
    let user_id = Uuid::from_str(&user_id)
        .map_err(|_| ApiError::BadRequest("please provide a valid user UUID".to_string()))?;

    let owner_id = document::find_owner(&state.pool, document_id)
        .await?
        .ok_or(ApiError::DocumentNotFound(document_id))?;

    // The owner can revoke any grant; a recipient can only revoke their own.
    if user.id != owner_id && user.id != user_id {
        return Err(ApiError::Forbidden(
            "Only the document owner or the recipient can remove a share".to_string(),
        ));
    }

    let result = sqlx::query(
        r#"
        DELETE FROM document_shares
        WHERE document_id = $1 AND shared_with_id = $2
        "#,
    )
    .bind(document_id)
    .bind(user_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::ShareNotFound);
    }

    Ok(Json(json!({ "message": "Share removed successfully" })))
}
