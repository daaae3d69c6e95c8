use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::{str::FromStr, sync::Arc};
use uuid::Uuid;

use crate::{
    auth::User,
    document::{self, Document},
    error::ApiError,
    server::ApplicationState,
};

pub async fn list_documents(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let documents = document::list_owned(&state.pool, user.id).await?;

    Ok(Json(documents))
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

pub async fn create_document(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<Json<Document>, ApiError> {
    let document_id =
        document::insert(&state.pool, user.id, &request.title, &request.content).await?;

    let document = document::find_by_id(&state.pool, document_id)
        .await?
        .ok_or(ApiError::DocumentNotFound(document_id))?;

    tracing::info!(document = %document_id, "document created");
    Ok(Json(document))
}

pub async fn delete_document(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
    Path(document_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let document_id = Uuid::from_str(&document_id)
        .map_err(|_| ApiError::BadRequest("please provide a valid document UUID".to_string()))?;

    let owner_id = document::find_owner(&state.pool, document_id)
        .await?
        .ok_or(ApiError::DocumentNotFound(document_id))?;

    if owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the document owner can delete it".to_string(),
        ));
    }

    document::delete(&state.pool, document_id).await?;

    tracing::info!(document = %document_id, "document deleted");
    Ok(Json(json!({ "message": "Document deleted successfully" })))
}
