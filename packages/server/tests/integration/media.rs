use common::media::hunt_media_prefix;
use common::storage::BlobStore;
use uuid::Uuid;

use crate::common::{TestApp, routes};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

async fn hunt_with_clue(app: &TestApp) -> (String, String) {
    let hunt_id = app.create_hunt("Park Hunt").await;
    let clue_id = app.create_clue(&hunt_id, "Find the oak").await;
    (hunt_id, clue_id)
}

#[tokio::test]
async fn upload_attaches_media_to_clue() {
    let app = TestApp::spawn().await;
    let (hunt_id, clue_id) = hunt_with_clue(&app).await;

    let res = app
        .upload(
            &routes::clue_media(&hunt_id, &clue_id),
            "oak tree.png",
            "image/png",
            PNG.to_vec(),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["media_type"], "image");
    let path = res.body["media_url"].as_str().unwrap();
    let hunt_uuid = Uuid::parse_str(&hunt_id).unwrap();
    assert!(path.starts_with(&format!("{}/{clue_id}-", hunt_media_prefix(hunt_uuid))));
    assert!(path.ends_with("-oak_tree.png"));
    assert_eq!(app.blobs.get(path).await.unwrap(), PNG);
}

#[tokio::test]
async fn uploaded_media_is_served_with_cache_headers() {
    let app = TestApp::spawn().await;
    let (hunt_id, clue_id) = hunt_with_clue(&app).await;
    let res = app
        .upload(&routes::clue_media(&hunt_id, &clue_id), "oak.png", "image/png", PNG.to_vec())
        .await;
    let path = res.body["media_url"].as_str().unwrap().to_string();

    let res = app
        .client
        .get(app.url(&routes::media(&path)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert!(
        res.headers()["cache-control"]
            .to_str()
            .unwrap()
            .contains("immutable")
    );
    let etag = res.headers()["etag"].to_str().unwrap().to_string();
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);

    let cached = app
        .client
        .get(app.url(&routes::media(&path)))
        .header("If-None-Match", &etag)
        .send()
        .await
        .unwrap();
    assert_eq!(cached.status().as_u16(), 304);
}

#[tokio::test]
async fn missing_or_unsafe_media_paths_are_rejected() {
    let app = TestApp::spawn().await;

    let missing = app.get(&routes::media("hunt-media/nope/none.png")).await;
    assert_eq!(missing.status, 404);

    let unsafe_path = app.get(&routes::media("hunt-media/..%2F..%2Fsecret")).await;
    assert_eq!(unsafe_path.status, 400);
}

#[tokio::test]
async fn unsupported_type_is_415_and_leaves_clue_unchanged() {
    let app = TestApp::spawn().await;
    let (hunt_id, clue_id) = hunt_with_clue(&app).await;

    let res = app
        .upload(
            &routes::clue_media(&hunt_id, &clue_id),
            "notes.txt",
            "text/plain",
            b"hello".to_vec(),
        )
        .await;

    assert_eq!(res.status, 415, "{}", res.text);
    assert_eq!(res.body["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert!(app.blobs.is_empty());

    let clue = app.get(&routes::clue(&hunt_id, &clue_id)).await;
    assert_eq!(clue.body["clue"]["media_url"], serde_json::json!(null));
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let app = TestApp::spawn_with_max_blob_size(1024).await;
    let (hunt_id, clue_id) = hunt_with_clue(&app).await;

    let res = app
        .upload(
            &routes::clue_media(&hunt_id, &clue_id),
            "big.png",
            "image/png",
            vec![0u8; 4096],
        )
        .await;

    assert_eq!(res.status, 413, "{}", res.text);
    assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn upload_to_missing_clue_is_404() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;

    let res = app
        .upload(
            &routes::clue_media(&hunt_id, Uuid::now_v7()),
            "oak.png",
            "image/png",
            PNG.to_vec(),
        )
        .await;

    assert_eq!(res.status, 404);
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn replacing_media_removes_previous_blob() {
    let app = TestApp::spawn().await;
    let (hunt_id, clue_id) = hunt_with_clue(&app).await;
    let route = routes::clue_media(&hunt_id, &clue_id);

    let first = app.upload(&route, "a.png", "image/png", PNG.to_vec()).await;
    let first_path = first.body["media_url"].as_str().unwrap().to_string();
    let second = app
        .upload(&route, "b.mp4", "video/mp4", b"fake-video".to_vec())
        .await;
    assert_eq!(second.status, 200, "{}", second.text);
    assert_eq!(second.body["media_type"], "video");

    app.hunts.drain_background_tasks().await;
    assert!(!app.blobs.exists(&first_path).await.unwrap());
    assert_eq!(app.blobs.len(), 1);
}

#[tokio::test]
async fn delete_media_clears_clue_and_blob() {
    let app = TestApp::spawn().await;
    let (hunt_id, clue_id) = hunt_with_clue(&app).await;
    let route = routes::clue_media(&hunt_id, &clue_id);
    app.upload(&route, "a.png", "image/png", PNG.to_vec()).await;

    let res = app.delete(&route).await;
    assert_eq!(res.status, 204, "{}", res.text);

    let clue = app.get(&routes::clue(&hunt_id, &clue_id)).await;
    assert_eq!(clue.body["clue"]["media_url"], serde_json::json!(null));
    assert_eq!(clue.body["clue"]["text"], "Find the oak");

    app.hunts.drain_background_tasks().await;
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn deleting_hunt_sweeps_its_media() {
    let app = TestApp::spawn().await;
    let (hunt_id, clue_id) = hunt_with_clue(&app).await;
    let other_hunt = app.create_hunt("Keep").await;
    let other_clue = app.create_clue(&other_hunt, "Stay").await;
    app.upload(&routes::clue_media(&hunt_id, &clue_id), "a.png", "image/png", PNG.to_vec())
        .await;
    let kept = app
        .upload(
            &routes::clue_media(&other_hunt, &other_clue),
            "b.png",
            "image/png",
            PNG.to_vec(),
        )
        .await;

    assert_eq!(app.delete(&routes::hunt(&hunt_id)).await.status, 204);
    app.hunts.drain_background_tasks().await;

    assert_eq!(app.blobs.len(), 1);
    assert!(
        app.blobs
            .exists(kept.body["media_url"].as_str().unwrap())
            .await
            .unwrap()
    );
}
