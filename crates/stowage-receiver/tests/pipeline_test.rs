mod helpers;

use std::sync::Arc;

use bytes::Bytes;
use helpers::fixtures::{chunked, dimensions, failing_after, png};
use helpers::{memory_stage, scenario_options, FaultyStorage};
use stowage_core::{PublishMode, UploadOptions};
use stowage_processing::{ImageTransformer, TransformError, VariantKind};
use stowage_receiver::{
    CatalogAdapter, IncomingFile, ReceiverError, ReceiverStage, UploadPipeline, VariantError,
    WriteError,
};
use stowage_storage::{ObjectStoreStorage, Storage, StorageError};

fn faulty_stage(storage: FaultyStorage, defaults: UploadOptions) -> ReceiverStage {
    ReceiverStage::new(Arc::new(storage), defaults)
}

#[tokio::test]
async fn test_resize_disabled_writes_only_original() {
    let (storage, stage) = memory_stage(UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            folder: Some("uploads/2024".to_string()),
            ..Default::default()
        })
        .unwrap();

    for id in ["a.png", "notes.txt", "no-extension"] {
        let received = sink
            .write(IncomingFile::from_bytes(id, Bytes::from_static(b"payload")))
            .await
            .unwrap();
        assert_eq!(received.outcomes.len(), 1);
        assert_eq!(received.outcomes[0].kind, VariantKind::Original);
    }

    assert_eq!(
        storage.list("").await.unwrap(),
        vec![
            "uploads/2024/a.png",
            "uploads/2024/no-extension",
            "uploads/2024/notes.txt"
        ]
    );
}

#[tokio::test]
async fn test_resize_enabled_writes_three_objects() {
    let (storage, stage) = memory_stage(UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            resize: Some(true),
            resize_dimension: Some(64),
            ..Default::default()
        })
        .unwrap();

    let received = sink.write(chunked("dog.png", png(320, 200), 1024)).await.unwrap();

    assert!(received.outcomes.iter().all(|o| o.succeeded));
    assert_eq!(
        storage.list("").await.unwrap(),
        vec!["photos/dog.png", "photos/resized/dog.png", "photos/thumbs/dog.png"]
    );
    assert_eq!(
        dimensions(&storage.read("photos/resized/dog.png").await.unwrap()),
        (64, 40)
    );
}

#[tokio::test]
async fn test_concrete_scenario() {
    let (storage, stage) = memory_stage(UploadOptions::default());
    let sink = stage.receive(&scenario_options()).unwrap();
    let source = png(2000, 1500);

    let received = sink
        .write(chunked("cat.png", source.clone(), 64 * 1024))
        .await
        .unwrap();

    assert_eq!(
        received.primary_location.as_deref(),
        Some("https://storage.googleapis.com/b/photos/cat.png")
    );
    assert_eq!(
        received.metadata.get("contentType").map(String::as_str),
        Some("image/png")
    );

    // Original bytes unchanged.
    assert_eq!(storage.read("photos/cat.png").await.unwrap(), source);

    let (w, h) = dimensions(&storage.read("photos/resized/cat.png").await.unwrap());
    assert!(w.max(h) <= 900);
    assert_eq!((w, h), (900, 675));

    assert_eq!(
        dimensions(&storage.read("photos/thumbs/cat.png").await.unwrap()),
        (100, 100)
    );

    for key in ["photos/cat.png", "photos/resized/cat.png", "photos/thumbs/cat.png"] {
        assert!(storage.is_public(key), "{} should be public", key);
    }
    for outcome in &received.outcomes {
        assert_eq!(
            outcome.public_url.as_deref(),
            Some(format!("https://storage.googleapis.com/b/{}", outcome.destination).as_str())
        );
    }
}

#[tokio::test]
async fn test_thumbnail_write_failure_fails_file() {
    let inner = Arc::new(ObjectStoreStorage::in_memory("b"));
    let storage = FaultyStorage::new(inner.clone()).fail_write("photos/thumbs/cat.png");
    let stage = faulty_stage(storage, UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            resize: Some(true),
            ..Default::default()
        })
        .unwrap();

    let err = match sink.write(chunked("cat.png", png(300, 200), 4096)).await {
        Err(ReceiverError::Pipeline(e)) => e,
        other => panic!("expected pipeline failure, got {:?}", other),
    };

    let failed: Vec<_> = err.failed().map(|o| o.kind).collect();
    assert_eq!(failed, vec![VariantKind::Thumbnail]);
    assert!(matches!(
        err.failed().next().and_then(|o| o.error.as_ref()),
        Some(VariantError::Write(WriteError::Storage(StorageError::UploadFailed(_))))
    ));
    assert!(err.to_string().contains("thumbnail variant (photos/thumbs/cat.png)"));

    // Siblings were allowed to finish; the failed thumbnail never became visible.
    assert_eq!(
        inner.list("").await.unwrap(),
        vec!["photos/cat.png", "photos/resized/cat.png"]
    );
}

#[tokio::test]
async fn test_public_flag_controls_urls() {
    for public in [true, false] {
        let (storage, stage) = memory_stage(UploadOptions::default());
        let sink = stage
            .receive(&UploadOptions {
                resize: Some(true),
                public: Some(public),
                ..Default::default()
            })
            .unwrap();

        let received = sink.write(chunked("a.png", png(150, 150), 512)).await.unwrap();

        for outcome in &received.outcomes {
            assert!(outcome.succeeded);
            assert_eq!(outcome.public_url.is_some(), public);
            assert_eq!(storage.is_public(&outcome.destination), public);
        }
        assert_eq!(received.primary_location.is_some(), public);
        assert_eq!(received.location, "https://storage.googleapis.com/b/photos/a.png");
    }
}

#[tokio::test]
async fn test_zero_byte_input_settles() {
    let (storage, stage) = memory_stage(UploadOptions::default());
    let sink = stage.receive(&scenario_options()).unwrap();

    let err = match sink
        .write(IncomingFile::new(
            "empty.png",
            futures::stream::empty::<std::io::Result<Bytes>>(),
        ))
        .await
    {
        Err(ReceiverError::Pipeline(e)) => e,
        other => panic!("expected pipeline failure, got {:?}", other),
    };

    let original = &err.outcomes()[0];
    assert_eq!(original.kind, VariantKind::Original);
    assert!(original.succeeded);
    assert_eq!(original.bytes_written, 0);
    assert!(storage.read("photos/empty.png").await.unwrap().is_empty());

    for outcome in err.failed() {
        assert!(matches!(
            outcome.error,
            Some(VariantError::Transform(TransformError::EmptyInput))
        ));
    }
    assert_eq!(err.failed().count(), 2);
}

#[tokio::test]
async fn test_default_publish_keeps_failed_file_private() {
    let inner = Arc::new(ObjectStoreStorage::in_memory("b"));
    let storage = FaultyStorage::new(inner.clone()).fail_write("photos/thumbs/cat.png");
    let stage = faulty_stage(storage, UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            resize: Some(true),
            public: Some(true),
            ..Default::default()
        })
        .unwrap();

    let err = match sink.write(chunked("cat.png", png(400, 300), 4096)).await {
        Err(ReceiverError::Pipeline(e)) => e,
        other => panic!("expected pipeline failure, got {:?}", other),
    };

    let failed: Vec<_> = err.failed().map(|o| o.kind).collect();
    assert_eq!(failed, vec![VariantKind::Thumbnail]);
    assert!(err.outcomes().iter().all(|o| o.public_url.is_none()));
    assert!(inner.read("photos/cat.png").await.is_ok());
    assert!(!inner.is_public("photos/cat.png"));
    assert!(!inner.is_public("photos/resized/cat.png"));
}

#[tokio::test]
async fn test_eager_publish_is_opt_in() {
    let inner = Arc::new(ObjectStoreStorage::in_memory("b"));
    let storage = FaultyStorage::new(inner.clone()).fail_write("photos/thumbs/cat.png");
    let stage = faulty_stage(storage, UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            publish_mode: Some(PublishMode::Eager),
            ..scenario_options()
        })
        .unwrap();

    let err = match sink.write(chunked("cat.png", png(400, 300), 4096)).await {
        Err(ReceiverError::Pipeline(e)) => e,
        other => panic!("expected pipeline failure, got {:?}", other),
    };

    // Siblings that finished were published before the thumbnail failed.
    assert!(inner.is_public("photos/cat.png"));
    assert!(inner.is_public("photos/resized/cat.png"));
    assert!(!inner.is_public("photos/thumbs/cat.png"));
    assert_eq!(
        err.outcomes()[0].public_url.as_deref(),
        Some("https://storage.googleapis.com/b/photos/cat.png")
    );
}

#[tokio::test]
async fn test_after_all_leaves_failed_file_private() {
    let inner = Arc::new(ObjectStoreStorage::in_memory("b"));
    let storage = FaultyStorage::new(inner.clone()).fail_write("photos/resized/cat.png");
    let stage = faulty_stage(storage, UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            publish_mode: Some(PublishMode::AfterAll),
            ..scenario_options()
        })
        .unwrap();

    let err = match sink.write(chunked("cat.png", png(1000, 500), 4096)).await {
        Err(ReceiverError::Pipeline(e)) => e,
        other => panic!("expected pipeline failure, got {:?}", other),
    };

    assert!(err.outcomes().iter().all(|o| o.public_url.is_none()));
    assert!(inner.read("photos/cat.png").await.is_ok());
    assert!(!inner.is_public("photos/cat.png"));
    assert!(!inner.is_public("photos/thumbs/cat.png"));
}

#[tokio::test]
async fn test_after_all_publishes_complete_file() {
    let (storage, stage) = memory_stage(UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            publish_mode: Some(PublishMode::AfterAll),
            ..scenario_options()
        })
        .unwrap();

    let received = sink.write(chunked("cat.png", png(400, 300), 4096)).await.unwrap();

    assert!(received.outcomes.iter().all(|o| o.public_url.is_some()));
    assert!(storage.is_public("photos/thumbs/cat.png"));
    assert_eq!(
        received.primary_location.as_deref(),
        Some("https://storage.googleapis.com/b/photos/cat.png")
    );
}

#[tokio::test]
async fn test_make_public_failure_is_best_effort() {
    let inner = Arc::new(ObjectStoreStorage::in_memory("b"));
    let storage = FaultyStorage::new(inner.clone()).fail_publish();
    let stage = faulty_stage(storage, UploadOptions::default());
    let sink = stage
        .receive(&UploadOptions {
            public: Some(true),
            ..Default::default()
        })
        .unwrap();

    let received = sink
        .write(IncomingFile::from_bytes("a.txt", Bytes::from_static(b"hi")))
        .await
        .unwrap();

    let outcome = &received.outcomes[0];
    assert!(outcome.succeeded);
    assert!(outcome.public_url.is_none());
    assert!(matches!(
        outcome.public_error,
        Some(StorageError::PublishFailed { .. })
    ));
    assert_eq!(received.primary_location, None);
    assert_eq!(
        inner.read("photos/a.txt").await.unwrap(),
        Bytes::from_static(b"hi")
    );
}

#[tokio::test]
async fn test_source_error_fails_every_variant() {
    let (storage, stage) = memory_stage(UploadOptions::default());
    let sink = stage.receive(&scenario_options()).unwrap();

    let err = match sink.write(failing_after("cat.png", png(300, 300), 100)).await {
        Err(ReceiverError::Pipeline(e)) => e,
        other => panic!("expected pipeline failure, got {:?}", other),
    };

    assert_eq!(err.failed().count(), 3);
    for outcome in err.outcomes() {
        assert!(matches!(
            outcome.error,
            Some(VariantError::Write(WriteError::Source(_)))
        ));
    }
    assert!(storage.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_used_directly() {
    let storage = Arc::new(ObjectStoreStorage::in_memory("b"));
    let pipeline = UploadPipeline::new(storage.clone(), Arc::new(ImageTransformer));
    let options = scenario_options().resolve(storage.bucket()).unwrap();

    let result = pipeline
        .upload(chunked("cat.png", png(200, 100), 333), &options)
        .await
        .unwrap();

    assert!(result.succeeded);
    assert_eq!(
        result
            .outcome(VariantKind::Thumbnail)
            .and_then(|o| o.written_path.as_deref()),
        Some("photos/thumbs/cat.png")
    );
}

#[tokio::test]
async fn test_catalog_after_upload() {
    let (storage, stage) = memory_stage(UploadOptions::default());
    let sink = stage.receive(&UploadOptions::default()).unwrap();
    sink.write(IncomingFile::from_bytes("a.txt", Bytes::from_static(b"first")))
        .await
        .unwrap();
    sink.write(IncomingFile::from_bytes("a.txt", Bytes::from_static(b"second")))
        .await
        .unwrap();

    let catalog = CatalogAdapter::new(storage);
    assert_eq!(catalog.list("photos/").await.unwrap(), vec!["photos/a.txt"]);
    assert_eq!(
        catalog.read("photos/a.txt").await.unwrap(),
        Bytes::from_static(b"second")
    );
    assert!(catalog.remove("photos/a.txt").await.is_err());
}
