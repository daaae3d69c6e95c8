use serde_json::{json, Value};

use crate::helpers::{add_test_share, add_test_user, spawn_app};

#[tokio::test]
async fn share_document_by_email() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let recipient = add_test_user(&app.db_pool).await;

    let response = app
        .api_client
        .post(app.api_url("/api/documents/share"))
        .bearer_auth(app.signed_jwt(app.owner.id))
        .json(&json!({
            "documentId": test_doc.0,
            "shareWithEmail": recipient.email,
        }))
        .send()
        .await
        .expect("request sent");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["documentId"], test_doc.0.to_string());
    assert_eq!(body["sharedWithId"], recipient.id.to_string());
    assert_eq!(body["sharedWith"]["email"], recipient.email);
}

#[tokio::test]
async fn sharing_with_unknown_email_is_rejected() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;

    let response = app
        .api_client
        .post(app.api_url("/api/documents/share"))
        .bearer_auth(app.signed_jwt(app.owner.id))
        .json(&json!({
            "documentId": test_doc.0,
            "shareWithEmail": "nobody@example.com",
        }))
        .send()
        .await
        .expect("request sent");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn duplicate_share_is_rejected() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let recipient = add_test_user(&app.db_pool).await;
    add_test_share(&app.db_pool, test_doc.0, recipient.id).await;

    let response = app
        .api_client
        .post(app.api_url("/api/documents/share"))
        .bearer_auth(app.signed_jwt(app.owner.id))
        .json(&json!({
            "documentId": test_doc.0,
            "shareWithEmail": recipient.email,
        }))
        .send()
        .await
        .expect("request sent");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn non_owner_cannot_share() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let intruder = add_test_user(&app.db_pool).await;
    let recipient = add_test_user(&app.db_pool).await;

    let response = app
        .api_client
        .post(app.api_url("/api/documents/share"))
        .bearer_auth(app.signed_jwt(intruder.id))
        .json(&json!({
            "documentId": test_doc.0,
            "shareWithEmail": recipient.email,
        }))
        .send()
        .await
        .expect("request sent");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn recipient_sees_shared_document() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let recipient = add_test_user(&app.db_pool).await;
    add_test_share(&app.db_pool, test_doc.0, recipient.id).await;

    let response = app
        .api_client
        .get(app.api_url("/api/documents/shared"))
        .bearer_auth(app.signed_jwt(recipient.id))
        .send()
        .await
        .expect("request sent");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("json body");
    let shares = body.as_array().expect("share array");
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0]["documentId"], test_doc.0.to_string());
    assert_eq!(shares[0]["document"]["authorId"], test_doc.1.to_string());
    assert_eq!(shares[0]["document"]["author"]["email"], app.owner.email);
}

#[tokio::test]
async fn owner_can_remove_a_share() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let recipient = add_test_user(&app.db_pool).await;
    add_test_share(&app.db_pool, test_doc.0, recipient.id).await;

    let response = app
        .api_client
        .delete(app.api_url(&format!(
            "/api/documents/share/{}/{}",
            test_doc.0, recipient.id
        )))
        .bearer_auth(app.signed_jwt(app.owner.id))
        .send()
        .await
        .expect("request sent");
    assert_eq!(response.status().as_u16(), 200);

    let row = sqlx::query_as::<_, (i64,)>(
        "SELECT COUNT(*) FROM document_shares WHERE document_id = $1",
    )
    .bind(test_doc.0)
    .fetch_one(&app.db_pool)
    .await
    .expect("counted shares");
    assert_eq!(row.0, 0);

    // Removing it again is a 404.
    let response = app
        .api_client
        .delete(app.api_url(&format!(
            "/api/documents/share/{}/{}",
            test_doc.0, recipient.id
        )))
        .bearer_auth(app.signed_jwt(app.owner.id))
        .send()
        .await
        .expect("request sent");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn recipient_can_revoke_their_own_access() {
    let app = spawn_app().await;
    let test_doc = app.test_document().await;
    let recipient = add_test_user(&app.db_pool).await;
    let bystander = add_test_user(&app.db_pool).await;
    add_test_share(&app.db_pool, test_doc.0, recipient.id).await;

    let response = app
        .api_client
        .delete(app.api_url(&format!(
            "/api/documents/share/{}/{}",
            test_doc.0, recipient.id
        )))
        .bearer_auth(app.signed_jwt(bystander.id))
        .send()
        .await
        .expect("request sent");
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .api_client
        .delete(app.api_url(&format!(
            "/api/documents/share/{}/{}",
            test_doc.0, recipient.id
        )))
        .bearer_auth(app.signed_jwt(recipient.id))
        .send()
        .await
        .expect("request sent");
    assert_eq!(response.status().as_u16(), 200);
}
