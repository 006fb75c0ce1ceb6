mod test_utils;

use reqwest::{multipart::Form, StatusCode};
use test_utils::{json_body, location, png_part, TestApp};

fn certification_form(name: &str, issue_date: &str, expiration_date: &str) -> Form {
    Form::new()
        .text("name", name.to_string())
        .text("issuing_organization", "Cloud Academy")
        .text("issue_date", issue_date.to_string())
        .text("expiration_date", expiration_date.to_string())
        .text("credential_url", "https://example.com/cred/1")
}

async fn image_id(app: &TestApp, certification_id: i64) -> Option<i64> {
    sqlx::query_scalar("SELECT certification_image_id FROM certifications WHERE id = $1")
        .bind(certification_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap()
}

#[actix_rt::test]
async fn create_certification_with_image_and_technologies() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let aws = app.insert_technology("AWS", "Tools").await;
    let form = certification_form("Solutions Architect", "2024-01-10", "2027-01-10")
        .text("technology_ids[]", aws.to_string())
        .part("certificationImage[]", png_part("badge.png"));

    let response = app.client
        .post(app.url("/admin/certifications"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create certification");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/certifications");
    assert_eq!(json_body(response).await["message"], "Certification created successfully!");

    let id = app.latest_id("certifications").await;
    let file_id = image_id(&app, id).await.expect("image linked");

    let path: String = sqlx::query_scalar("SELECT path FROM files WHERE id = $1")
        .bind(file_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert!(path.starts_with(&format!("certifications/{}/", id)));
    assert_eq!(app.count("certification_technology").await, 1);
}

#[actix_rt::test]
async fn malformed_dates_are_rejected() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .post(app.url("/admin/certifications"))
        .multipart(certification_form("Backwards", "", "05/01/2023"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["issue_date"].is_array());
    assert!(body["errors"]["expiration_date"].is_array());
    assert_eq!(app.count("certifications").await, 0);
}

#[actix_rt::test]
async fn only_one_image_is_accepted() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let form = certification_form("Greedy", "2024-01-01", "")
        .part("certificationImage[]", png_part("a.png"))
        .part("certificationImage[]", png_part("b.png"));

    let response = app.client
        .post(app.url("/admin/certifications"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["certificationImage"].is_array());
    assert!(app.storage.paths().is_empty());
}

#[actix_rt::test]
async fn replacing_and_deleting_release_the_image() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let form = certification_form("Kubernetes", "2024-02-02", "")
        .part("certificationImage[]", png_part("old.png"));
    app.client
        .post(app.url("/admin/certifications"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create certification");
    let id = app.latest_id("certifications").await;

    let form = certification_form("Kubernetes", "2024-02-02", "")
        .part("certificationImage[]", png_part("new.png"));
    let response = app.client
        .put(app.url(&format!("/admin/certifications/{}", id)))
        .multipart(form)
        .send()
        .await
        .expect("Failed to update certification");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.count("files").await, 1);
    assert_eq!(app.storage.paths().len(), 1);

    let response = app.client
        .delete(app.url(&format!("/admin/certifications/{}", id)))
        .send()
        .await
        .expect("Failed to delete certification");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.count("certifications").await, 0);
    assert_eq!(app.count("files").await, 0);
    assert!(app.storage.paths().is_empty());
}

#[actix_rt::test]
async fn index_lists_technology_options() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .get(app.url("/admin/certifications?issuing_organization=cloud"))
        .send()
        .await
        .expect("Failed to list certifications");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["certifications"]["data"].is_array());
    assert!(body["technologies"].as_array().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["filters"]["issuing_organization"], "cloud");
}
