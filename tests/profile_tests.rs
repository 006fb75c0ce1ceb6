mod test_utils;

use reqwest::{multipart::Form, StatusCode};
use serde_json::json;
use test_utils::{json_body, location, pdf_part, png_part, TestApp};

async fn avatar_file_id(app: &TestApp) -> Option<i64> {
    sqlx::query_scalar("SELECT avatar_file_id FROM dev_profile ORDER BY id LIMIT 1")
        .fetch_one(&app.db_pool)
        .await
        .unwrap()
}

async fn upload_avatar(app: &TestApp, name: &str) -> reqwest::Response {
    app.client
        .post(app.url("/admin/dev-profile/avatar"))
        .multipart(Form::new().part("avatar", png_part(name)))
        .send()
        .await
        .expect("Failed to upload avatar")
}

#[actix_rt::test]
async fn edit_creates_the_singleton_profile() {
    let Some(app) = TestApp::try_spawn().await else { return };

    for _ in 0..2 {
        let response = app.client
            .get(app.url("/admin/dev-profile/edit"))
            .send()
            .await
            .expect("Failed to load profile");
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.count("dev_profile").await, 1);
}

#[actix_rt::test]
async fn update_profile_saves_fields() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .post(app.url("/admin/dev-profile"))
        .json(&json!({
            "job_title": "Staff Engineer",
            "short_bio": "Builds things.",
            "long_description": "A longer story.",
            "email": "dev@example.com",
            "years_experience": 12,
            "languages": ["English", " German ", ""],
        }))
        .send()
        .await
        .expect("Failed to update profile");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/dev-profile/edit");

    let (job_title, languages): (String, Option<Vec<String>>) =
        sqlx::query_as("SELECT job_title, languages FROM dev_profile ORDER BY id LIMIT 1")
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(job_title, "Staff Engineer");
    assert_eq!(languages, Some(vec!["English".to_string(), "German".to_string()]));
}

#[actix_rt::test]
async fn update_profile_reports_invalid_fields() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .post(app.url("/admin/dev-profile"))
        .json(&json!({
            "job_title": "",
            "short_bio": "Bio",
            "long_description": "Story",
            "email": "not-an-email",
            "years_experience": 150,
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["job_title"].is_array());
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["years_experience"].is_array());
}

#[actix_rt::test]
async fn replacing_avatar_releases_the_previous_file() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = upload_avatar(&app, "first.png").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(json_body(response).await["message"], "Avatar uploaded successfully!");
    let first = avatar_file_id(&app).await.expect("avatar set");

    let response = upload_avatar(&app, "second.png").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let second = avatar_file_id(&app).await.expect("avatar set");

    assert_ne!(first, second);
    assert_eq!(app.count("files").await, 1);
    assert_eq!(app.storage.paths().len(), 1);
}

#[actix_rt::test]
async fn avatar_upload_requires_an_image() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .post(app.url("/admin/dev-profile/avatar"))
        .multipart(Form::new().part("avatar", pdf_part("cv.pdf")))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["avatar"].is_array());
    assert!(app.storage.paths().is_empty());
}

#[actix_rt::test]
async fn resume_upload_and_delete() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .post(app.url("/admin/dev-profile/resume"))
        .multipart(Form::new().part("resume", pdf_part("cv.pdf")))
        .send()
        .await
        .expect("Failed to upload resume");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(json_body(response).await["message"], "Resume uploaded successfully!");

    let kind: String = sqlx::query_scalar(r#"SELECT "type"::TEXT FROM files LIMIT 1"#)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(kind, "document");

    let response = app.client
        .delete(app.url("/admin/dev-profile/resume"))
        .send()
        .await
        .expect("Failed to delete resume");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(json_body(response).await["message"], "Resume deleted successfully!");
    assert_eq!(app.count("files").await, 0);
    assert!(app.storage.paths().is_empty());
}
