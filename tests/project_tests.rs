mod test_utils;

use reqwest::{multipart::Form, StatusCode};
use serde_json::json;
use test_utils::{json_body, location, png_part, TestApp};

fn project_form(name: &str, technology_ids: &[i64]) -> Form {
    let form = Form::new()
        .text("name", name.to_string())
        .text("short_description", "A short summary")
        .text("long_description", "Some **markdown** body")
        .text("link", "https://example.com")
        .text("github", "https://github.com/example/repo");

    technology_ids
        .iter()
        .fold(form, |form, id| form.text("technology_ids[]", id.to_string()))
}

async fn create_project_with_images(app: &TestApp, name: &str, images: usize) -> i64 {
    let form = (0..images).fold(project_form(name, &[]), |form, i| {
        form.part("images[]", png_part(&format!("shot-{}.png", i)))
    });

    let response = app.client
        .post(app.url("/admin/projects"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create project");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    app.latest_id("projects").await
}

#[actix_rt::test]
async fn create_project_links_technologies_and_uploads_images() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let react = app.insert_technology("React", "Frontend").await;
    let rust = app.insert_technology("Rust", "Backend").await;

    let form = project_form("Portfolio", &[react, rust]).part("images[]", png_part("cover.png"));

    let response = app.client
        .post(app.url("/admin/projects"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create project");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/projects");
    let body = json_body(response).await;
    assert_eq!(body["message"], "Project created successfully!");

    let project_id = app.latest_id("projects").await;

    let technologies: Vec<(i64, i32)> = sqlx::query_as(
        "SELECT technology_id, sort_order FROM project_technology WHERE project_id = $1 ORDER BY sort_order",
    )
    .bind(project_id)
    .fetch_all(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(technologies, vec![(react, 1), (rust, 2)]);

    let files = app.project_file_orders(project_id).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].1, 1);

    let path: String = sqlx::query_scalar("SELECT path FROM files WHERE id = $1")
        .bind(files[0].0)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert!(path.starts_with(&format!("projects/{}/", project_id)));
    assert!(path.ends_with(".png"));
    assert!(app.storage.contains(&path));
}

#[actix_rt::test]
async fn create_project_rejects_unknown_technologies_and_bad_uploads() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let form = project_form("Broken", &[9_999])
        .part("images[]", test_utils::pdf_part("not-an-image.pdf"));

    let response = app.client
        .post(app.url("/admin/projects"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["technology_ids"].is_array());
    assert!(body["errors"]["images.0"].is_array());
    assert_eq!(body["input"]["name"], "Broken");

    assert_eq!(app.count("projects").await, 0);
    assert_eq!(app.count("files").await, 0);
    assert!(app.storage.paths().is_empty());
}

#[actix_rt::test]
async fn update_appends_images_after_existing_ones() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let project_id = create_project_with_images(&app, "Gallery", 2).await;

    let form = project_form("Gallery v2", &[]).part("images[]", png_part("third.png"));
    let response = app.client
        .put(app.url(&format!("/admin/projects/{}", project_id)))
        .multipart(form)
        .send()
        .await
        .expect("Failed to update project");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Project updated successfully!");

    let orders: Vec<i32> = app.project_file_orders(project_id).await.iter().map(|f| f.1).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[actix_rt::test]
async fn reorder_images_rewrites_sort_orders() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let project_id = create_project_with_images(&app, "Reorder", 3).await;
    let ids = app.project_file_ids(project_id).await;
    let wanted = vec![ids[2], ids[0], ids[1]];

    let response = app.client
        .post(app.url(&format!("/admin/projects/{}/images/reorder", project_id)))
        .json(&json!({ "file_ids": wanted }))
        .send()
        .await
        .expect("Failed to reorder");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/admin/projects/{}/edit", project_id));
    assert_eq!(app.project_file_ids(project_id).await, wanted);

    let orders: Vec<i32> = app.project_file_orders(project_id).await.iter().map(|f| f.1).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[actix_rt::test]
async fn reorder_images_requires_every_attached_file() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let project_id = create_project_with_images(&app, "Partial", 2).await;
    let ids = app.project_file_ids(project_id).await;

    let response = app.client
        .post(app.url(&format!("/admin/projects/{}/images/reorder", project_id)))
        .json(&json!({ "file_ids": [ids[1]] }))
        .send()
        .await
        .expect("Failed to reorder");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["file_ids"].is_array());
    assert_eq!(app.project_file_ids(project_id).await, ids);
}

#[actix_rt::test]
async fn featured_image_is_exclusive() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let project_id = create_project_with_images(&app, "Featured", 2).await;
    let ids = app.project_file_ids(project_id).await;

    for id in [ids[0], ids[1]] {
        let response = app.client
            .post(app.url(&format!("/admin/projects/{}/images/{}/featured", project_id, id)))
            .send()
            .await
            .expect("Failed to set featured image");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let featured: Vec<i64> = app.project_file_orders(project_id).await
        .into_iter()
        .filter(|f| f.2)
        .map(|f| f.0)
        .collect();
    assert_eq!(featured, vec![ids[1]]);

    let response = app.client
        .post(app.url(&format!("/admin/projects/{}/images/{}/featured", project_id, 424_242)))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn detach_image_compacts_orders_and_deletes_blob() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let project_id = create_project_with_images(&app, "Detach", 3).await;
    let ids = app.project_file_ids(project_id).await;
    let path: String = sqlx::query_scalar("SELECT path FROM files WHERE id = $1")
        .bind(ids[0])
        .fetch_one(&app.db_pool)
        .await
        .unwrap();

    let response = app.client
        .delete(app.url(&format!("/admin/projects/{}/images/{}", project_id, ids[0])))
        .send()
        .await
        .expect("Failed to detach image");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Image removed successfully!");

    let remaining = app.project_file_orders(project_id).await;
    assert_eq!(remaining.iter().map(|f| f.0).collect::<Vec<_>>(), vec![ids[1], ids[2]]);
    assert_eq!(remaining.iter().map(|f| f.1).collect::<Vec<_>>(), vec![1, 2]);

    assert_eq!(app.count("files").await, 2);
    assert!(!app.storage.contains(&path));
}

#[actix_rt::test]
async fn delete_project_removes_orphaned_files() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let project_id = create_project_with_images(&app, "Doomed", 2).await;
    assert_eq!(app.storage.paths().len(), 2);

    let response = app.client
        .delete(app.url(&format!("/admin/projects/{}", project_id)))
        .send()
        .await
        .expect("Failed to delete project");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.count("projects").await, 0);
    assert_eq!(app.count("project_files").await, 0);
    assert_eq!(app.count("files").await, 0);
    assert!(app.storage.paths().is_empty());
}

#[actix_rt::test]
async fn index_filters_and_ignores_unknown_parameters() {
    let Some(app) = TestApp::try_spawn().await else { return };

    create_project_with_images(&app, "Alpha Site", 0).await;
    create_project_with_images(&app, "Beta Service", 0).await;

    let response = app.client
        .get(app.url("/admin/projects?name=alpha&bogus=1&sort=nope&direction=sideways"))
        .send()
        .await
        .expect("Failed to list projects");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let names: Vec<&str> = body["projects"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Alpha Site"]);
    assert_eq!(body["filters"]["name"], "alpha");
}

#[actix_rt::test]
async fn edit_unknown_project_is_not_found() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.client
        .get(app.url("/admin/projects/987654/edit"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn shared_file_survives_until_last_owner_lets_go() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let first = create_project_with_images(&app, "First", 1).await;
    let second = create_project_with_images(&app, "Second", 0).await;
    let file_id = app.project_file_ids(first).await[0];

    sqlx::query("INSERT INTO project_files (project_id, file_id, sort_order, is_featured) VALUES ($1, $2, 1, TRUE)")
        .bind(second)
        .bind(file_id)
        .execute(&app.db_pool)
        .await
        .unwrap();

    let response = app.client
        .delete(app.url(&format!("/admin/projects/{}/images/{}", first, file_id)))
        .send()
        .await
        .expect("Failed to detach image");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(app.count("files").await, 1);
    assert_eq!(app.storage.paths().len(), 1);

    let response = app.client
        .delete(app.url(&format!("/admin/projects/{}/images/{}", second, file_id)))
        .send()
        .await
        .expect("Failed to detach image");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(app.count("files").await, 0);
    assert!(app.storage.paths().is_empty());
}
