use std::sync::Arc;

use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use hunt_client::MediaCache;
use hunt_client::MediaSource;
use hunt_client::remote::HttpRemoteMedia;

use crate::common::TestEnv;

async fn cache_for(env: &TestEnv) -> (MediaCache, Arc<FilesystemBlobStore>) {
    let local = Arc::new(
        FilesystemBlobStore::new(env.dir.path().join("cache"), 1024 * 1024)
            .await
            .unwrap(),
    );
    let remote = HttpRemoteMedia::new(reqwest::Client::new(), &env.origin());
    (MediaCache::new(Arc::new(remote), local.clone()), local)
}

#[tokio::test]
async fn resolves_uploaded_media_through_the_server() {
    let env = TestEnv::spawn().await;
    let hunt = env.hunts.create_hunt("Park Hunt").await.unwrap();
    let clue = env.hunts.create_clue(hunt.id).await.unwrap();
    let clue = env
        .api
        .upload_media(hunt.id, clue.id, "oak.png", "image/png", b"oak".to_vec())
        .await
        .unwrap();
    let path = clue.media_url.unwrap();
    let (cache, local) = cache_for(&env).await;

    let MediaSource::Local(handle) = cache.resolve(&path).await.unwrap() else {
        panic!("expected cached media");
    };

    assert_eq!(handle.bytes().as_ref(), b"oak");
    assert_eq!(local.get(&path).await.unwrap(), b"oak");
    assert_eq!(cache.entry(&path).await.unwrap().unwrap().size, 3);
}

#[tokio::test]
async fn prefetch_warms_every_clue_of_a_hunt() {
    let env = TestEnv::spawn().await;
    let hunt = env.hunts.create_hunt("Park Hunt").await.unwrap();
    for name in ["a.png", "b.gif", "c.mp4", "d.png"] {
        let clue = env.hunts.create_clue(hunt.id).await.unwrap();
        let content_type = mime_guess::from_path(name).first_or_octet_stream();
        env.api
            .upload_media(
                hunt.id,
                clue.id,
                name,
                content_type.as_ref(),
                name.as_bytes().to_vec(),
            )
            .await
            .unwrap();
    }
    let hunt = env.api.get_hunt(hunt.id).await.unwrap();
    let paths: Vec<String> = hunt
        .stored_media_paths()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(paths.len(), 4);
    let (cache, local) = cache_for(&env).await;

    cache.prefetch(paths.clone()).await.unwrap();

    for path in &paths {
        assert!(local.exists(path).await.unwrap(), "{path} not cached");
    }
}

#[tokio::test]
async fn missing_media_surfaces_not_found() {
    let env = TestEnv::spawn().await;
    let (cache, _local) = cache_for(&env).await;

    let err = cache
        .resolve("hunt-media/gone/never-uploaded.png")
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "{err}");
}
