use std::sync::{Arc, Mutex};
use std::time::Duration;

use domains::{UploadFile, MAX_UPLOAD_BYTES};
use integration_tests::fixtures::{epoch, StepClock};
use services::{UploadController, UploadPhase};
use storage_adapters::MemoryGateway;

const BUCKET: &str = "blog-images";

fn controller(gateway: Arc<MemoryGateway>) -> UploadController {
    UploadController::new(gateway, StepClock::starting_at(epoch()), BUCKET)
        .with_folder("covers")
        .with_tick(Duration::from_millis(1))
}

fn png(len: usize) -> UploadFile {
    UploadFile::new("cover.PNG", "image/png", vec![7u8; len])
}

#[tokio::test]
async fn oversize_image_is_rejected_before_any_transfer() {
    let gateway = Arc::new(MemoryGateway::default());
    let uploads = controller(gateway.clone());

    let err = uploads.upload(&png(MAX_UPLOAD_BYTES + 1)).await.unwrap_err();
    assert_eq!(err.user_message(), "validation error: image must be 6 MB or smaller");
    assert_eq!(gateway.object_count(), 0);

    let state = uploads.state().await;
    assert_eq!(state.phase, UploadPhase::Error);
    assert!(state.preview_url.is_none());
}

#[tokio::test]
async fn image_at_the_limit_is_accepted() {
    let gateway = Arc::new(MemoryGateway::default());
    let uploads = controller(gateway.clone());
    assert!(uploads.upload(&png(MAX_UPLOAD_BYTES)).await.is_ok());
    assert_eq!(gateway.object_count(), 1);
}

#[tokio::test]
async fn non_image_is_rejected() {
    let gateway = Arc::new(MemoryGateway::default());
    let uploads = controller(gateway.clone());

    let file = UploadFile::new("notes.txt", "text/plain", &b"hello"[..]);
    assert!(uploads.upload(&file).await.is_err());
    assert_eq!(gateway.object_count(), 0);
    assert!(uploads.state().await.error.is_some_and(|e| e.contains("image")));
}

#[tokio::test]
async fn successful_upload_stores_object_and_publishes_cache_busted_url() {
    let gateway = Arc::new(MemoryGateway::default());
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let uploads = controller(gateway.clone()).on_uploaded({
        let seen = seen.clone();
        move |url| seen.lock().unwrap().push(url.to_string())
    });

    let url = uploads.upload(&png(1024)).await.unwrap();
    assert!(url.starts_with("memory://objects/blog-images/covers/"));
    assert!(url.contains(".png?t="));

    let key = url
        .trim_start_matches("memory://objects/blog-images/")
        .split('?')
        .next()
        .unwrap()
        .to_string();
    let stored = gateway.object(BUCKET, &key).unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(stored.body.len(), 1024);

    let state = uploads.state().await;
    assert_eq!(state.phase, UploadPhase::Success);
    assert_eq!(state.progress, 100);
    assert_eq!(state.preview_url.as_deref(), Some(url.as_str()));
    assert_eq!(*seen.lock().unwrap(), vec![url]);
}

#[tokio::test]
async fn every_upload_gets_a_fresh_key_and_cache_buster() {
    let gateway = Arc::new(MemoryGateway::default());
    let uploads = controller(gateway.clone());

    let first = uploads.upload(&png(10)).await.unwrap();
    let second = uploads.upload(&png(10)).await.unwrap();
    assert_ne!(first, second);
    assert_eq!(gateway.object_count(), 2);
}

#[tokio::test]
async fn storage_failure_leaves_error_state() {
    let gateway = Arc::new(MemoryGateway::default());
    gateway.fail_table(BUCKET, "Bucket not found");
    let uploads = controller(gateway.clone());

    let err = uploads.upload(&png(10)).await.unwrap_err();
    assert_eq!(err.user_message(), "Bucket not found");

    let state = uploads.state().await;
    assert_eq!(state.phase, UploadPhase::Error);
    assert_eq!(state.progress, 0);
    assert_eq!(state.error.as_deref(), Some("Bucket not found"));
}

#[tokio::test]
async fn clear_resets_and_notifies() {
    let gateway = Arc::new(MemoryGateway::default());
    let cleared = Arc::new(Mutex::new(0));
    let uploads = controller(gateway).on_cleared({
        let cleared = cleared.clone();
        move || *cleared.lock().unwrap() += 1
    });

    uploads.upload(&png(10)).await.unwrap();
    uploads.clear().await;

    assert_eq!(uploads.state().await.phase, UploadPhase::Idle);
    assert!(uploads.state().await.preview_url.is_none());
    assert_eq!(*cleared.lock().unwrap(), 1);
}
