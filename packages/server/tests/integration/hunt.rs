use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn create_hunt_returns_empty_hunt() {
    let app = TestApp::spawn().await;

    let res = app
        .post(routes::HUNTS, &json!({ "display_name": "Park Hunt" }))
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["display_name"], "Park Hunt");
    assert_eq!(res.body["clues"], json!([]));
    assert!(Uuid::parse_str(res.body["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn create_hunt_allows_empty_and_duplicate_names() {
    let app = TestApp::spawn().await;

    let unnamed = app.post(routes::HUNTS, &json!({})).await;
    assert_eq!(unnamed.status, 201, "{}", unnamed.text);
    assert_eq!(unnamed.body["display_name"], "");

    let first = app.create_hunt("Same").await;
    let second = app.create_hunt("Same").await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn create_hunt_without_json_content_type_is_415() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .post(app.url(routes::HUNTS))
        .body(r#"{"display_name":"x"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 415);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn malformed_json_is_validation_error() {
    let app = TestApp::spawn().await;

    let res = app
        .post(routes::HUNTS, &json!({ "display_name": 42 }))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn list_hunts_newest_first_with_clues() {
    let app = TestApp::spawn().await;
    let older = app.create_hunt("Older").await;
    let newer = app.create_hunt("Newer").await;
    app.create_clue(&older, "Find the oak").await;

    let res = app.get(routes::HUNTS).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["total"], 2);
    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data[0]["id"], newer.as_str());
    assert_eq!(data[1]["id"], older.as_str());
    assert_eq!(data[1]["clues"][0]["text"], "Find the oak");
}

#[tokio::test]
async fn get_missing_hunt_is_404() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::hunt(Uuid::now_v7())).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn rename_hunt() {
    let app = TestApp::spawn().await;
    let id = app.create_hunt("Park Hunt").await;

    let res = app
        .patch(&routes::hunt(&id), &json!({ "display_name": "Forest Hunt" }))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["display_name"], "Forest Hunt");

    let res = app.get(&routes::hunt(&id)).await;
    assert_eq!(res.body["display_name"], "Forest Hunt");
}

#[tokio::test]
async fn rename_missing_hunt_is_404() {
    let app = TestApp::spawn().await;

    let res = app
        .patch(&routes::hunt(Uuid::now_v7()), &json!({ "display_name": "x" }))
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn delete_hunt_removes_it_and_its_clues() {
    let app = TestApp::spawn().await;
    let id = app.create_hunt("Doomed").await;
    let clue_id = app.create_clue(&id, "Gone soon").await;

    let res = app.delete(&routes::hunt(&id)).await;
    assert_eq!(res.status, 204, "{}", res.text);

    assert_eq!(app.get(&routes::hunt(&id)).await.status, 404);
    assert_eq!(app.get(&routes::clue(&id, &clue_id)).await.status, 404);
    assert_eq!(app.delete(&routes::hunt(&id)).await.status, 404);
}

#[tokio::test]
async fn lookup_keeps_order_and_reports_missing() {
    let app = TestApp::spawn().await;
    let a = app.create_hunt("A").await;
    let b = app.create_hunt("B").await;
    let gone = Uuid::now_v7().to_string();

    let res = app
        .post(routes::HUNTS_LOOKUP, &json!({ "ids": [&b, &gone, &a] }))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    let hunts: Vec<&str> = res.body["hunts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_str().unwrap())
        .collect();
    assert_eq!(hunts, [b.as_str(), a.as_str()]);
    assert_eq!(res.body["missing"], json!([gone]));
}

#[tokio::test]
async fn lookup_rejects_oversized_batches() {
    let app = TestApp::spawn().await;
    let ids: Vec<String> = (0..501).map(|_| Uuid::now_v7().to_string()).collect();

    let res = app.post(routes::HUNTS_LOOKUP, &json!({ "ids": ids })).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn openapi_document_lists_hunt_routes() {
    let app = TestApp::spawn().await;

    let res = app.get("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.keys().any(|p| p.contains("/api/v1/hunts")));
    assert!(paths.keys().any(|p| p.ends_with("/print")));
}
