mod test_utils;

use portfolio_admin::storage::StorageBackend;
use reqwest::StatusCode;
use test_utils::{json_body, TestApp, PNG_HEADER};

#[actix_rt::test]
async fn health_reports_database_and_storage() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to call health endpoint");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["database"], "OK");
    assert_eq!(body["storage"], "OK");
    assert_eq!(body["status"], "healthy");
}

#[actix_rt::test]
async fn stored_files_are_served_with_sniffed_type() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let mut bytes = PNG_HEADER.to_vec();
    bytes.extend_from_slice(&[0u8; 16]);
    app.storage.write("projects/1/served.png", &bytes).await.unwrap();

    let response = app.client
        .get(app.url("/storage/projects/1/served.png"))
        .send()
        .await
        .expect("Failed to fetch stored file");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(response.bytes().await.unwrap().to_vec(), bytes);

    let response = app.client
        .get(app.url("/storage/projects/1/missing.png"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
