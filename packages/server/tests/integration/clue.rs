use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn create_clue_appends_blank_clue() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let first = app.create_clue(&hunt_id, "Find the oak").await;

    let res = app.post_empty(&routes::clues(&hunt_id)).await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["text"], "");
    assert_eq!(res.body["hint"], "");
    assert_eq!(res.body["media_url"], json!(null));
    assert_eq!(app.clue_ids(&hunt_id).await, [first, res.id()]);
}

#[tokio::test]
async fn create_clue_on_missing_hunt_is_404() {
    let app = TestApp::spawn().await;

    let res = app.post_empty(&routes::clues(Uuid::now_v7())).await;

    assert_eq!(res.status, 404);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clue_creation_never_fails() {
    let app = TestApp::spawn().await;
    let park = app.create_hunt("Park Hunt").await;
    let beach = app.create_hunt("Beach Hunt").await;

    let paths: Vec<String> = (0..6)
        .map(|i| routes::clues(if i % 2 == 0 { &park } else { &beach }))
        .collect();
    let responses = futures::future::join_all(paths.iter().map(|p| app.post_empty(p))).await;

    for res in &responses {
        assert_eq!(res.status, 201, "{}", res.text);
    }
    assert_eq!(app.clue_ids(&park).await.len(), 3);
    assert_eq!(app.clue_ids(&beach).await.len(), 3);
}

#[tokio::test]
async fn update_clue_writes_only_given_fields() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let clue_id = app.create_clue(&hunt_id, "Find the oak").await;

    let res = app
        .patch(&routes::clue(&hunt_id, &clue_id), &json!({ "hint": "It is tall" }))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["text"], "Find the oak");
    assert_eq!(res.body["hint"], "It is tall");
}

#[tokio::test]
async fn update_clue_rejects_unsafe_media_path() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let clue_id = app.create_clue(&hunt_id, "Find the oak").await;

    let res = app
        .patch(
            &routes::clue(&hunt_id, &clue_id),
            &json!({ "media_url": "../../etc/passwd", "media_type": "image" }),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_clue_accepts_legacy_media_url_and_clears_with_null() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let clue_id = app.create_clue(&hunt_id, "Find the oak").await;
    let path = routes::clue(&hunt_id, &clue_id);

    let res = app
        .patch(
            &path,
            &json!({ "media_url": "https://cdn.example.com/oak.png", "media_type": "image" }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["media_url"], "https://cdn.example.com/oak.png");
    assert_eq!(res.body["media_type"], "image");

    let res = app
        .patch(&path, &json!({ "media_url": null, "media_type": null }))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["media_url"], json!(null));
    assert_eq!(res.body["media_type"], json!(null));
    assert_eq!(res.body["text"], "Find the oak");
}

#[tokio::test]
async fn get_clue_reports_step_and_last() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let first = app.create_clue(&hunt_id, "Find the oak").await;
    let last = app.create_clue(&hunt_id, "Find the gate").await;

    let res = app.get(&routes::clue(&hunt_id, &first)).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["step"], 1);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["is_last"], false);
    assert_eq!(res.body["hunt_name"], "Park Hunt");
    assert_eq!(res.body["clue"]["text"], "Find the oak");

    let res = app.get(&routes::clue(&hunt_id, &last)).await;
    assert_eq!(res.body["step"], 2);
    assert_eq!(res.body["is_last"], true);
}

#[tokio::test]
async fn clue_of_another_hunt_is_404() {
    let app = TestApp::spawn().await;
    let hunt_a = app.create_hunt("A").await;
    let hunt_b = app.create_hunt("B").await;
    let clue_id = app.create_clue(&hunt_a, "Only in A").await;

    assert_eq!(app.get(&routes::clue(&hunt_b, &clue_id)).await.status, 404);
    assert_eq!(
        app.patch(&routes::clue(&hunt_b, &clue_id), &json!({ "text": "x" }))
            .await
            .status,
        404
    );
    assert_eq!(app.delete(&routes::clue(&hunt_b, &clue_id)).await.status, 404);
}

#[tokio::test]
async fn reorder_persists_new_order() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let a = app.create_clue(&hunt_id, "A").await;
    let b = app.create_clue(&hunt_id, "B").await;
    let c = app.create_clue(&hunt_id, "C").await;

    let res = app
        .put(&routes::clues_reorder(&hunt_id), &json!({ "clue_ids": [&c, &a, &b] }))
        .await;
    assert_eq!(res.status, 204, "{}", res.text);

    assert_eq!(app.clue_ids(&hunt_id).await, [c.clone(), a, b]);
    let res = app.get(&routes::clue(&hunt_id, &c)).await;
    assert_eq!(res.body["step"], 1);
}

#[tokio::test]
async fn reorder_must_name_every_clue_once() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let a = app.create_clue(&hunt_id, "A").await;
    let b = app.create_clue(&hunt_id, "B").await;
    let path = routes::clues_reorder(&hunt_id);

    let missing = app.put(&path, &json!({ "clue_ids": [&a] })).await;
    assert_eq!(missing.status, 400);

    let duplicate = app.put(&path, &json!({ "clue_ids": [&a, &b, &a] })).await;
    assert_eq!(duplicate.status, 400);

    let foreign = app
        .put(&path, &json!({ "clue_ids": [&a, Uuid::now_v7().to_string()] }))
        .await;
    assert_eq!(foreign.status, 400);

    assert_eq!(app.clue_ids(&hunt_id).await, [a, b]);
}

#[tokio::test]
async fn reorder_empty_hunt_with_empty_list() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Empty").await;

    let res = app
        .put(&routes::clues_reorder(&hunt_id), &json!({ "clue_ids": [] }))
        .await;

    assert_eq!(res.status, 204, "{}", res.text);
}

#[tokio::test]
async fn delete_clue_closes_the_gap() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let a = app.create_clue(&hunt_id, "A").await;
    let b = app.create_clue(&hunt_id, "B").await;
    let c = app.create_clue(&hunt_id, "C").await;

    let res = app.delete(&routes::clue(&hunt_id, &b)).await;
    assert_eq!(res.status, 204, "{}", res.text);

    assert_eq!(app.clue_ids(&hunt_id).await, [a, c.clone()]);
    let res = app.get(&routes::clue(&hunt_id, &c)).await;
    assert_eq!(res.body["step"], 2);
    assert_eq!(res.body["is_last"], true);

    let appended = app.create_clue(&hunt_id, "D").await;
    assert_eq!(app.clue_ids(&hunt_id).await.last(), Some(&appended));
}
