// Tests running the full store against a real directory and against many
// concurrent stores sharing one backend.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sl_core::{SessionId, StoreConfig};
use sl_store::{FileBackend, GcSweeper, LoggingHandler, MemoryBackend, SessionHandler, SessionStore};

fn file_config(dir: &Path) -> StoreConfig {
    StoreConfig::new(dir.to_string_lossy())
        .with_namespace("app")
        .with_poll_interval_ms(5)
}

fn set_age(path: &Path, age: Duration) {
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - age)
        .unwrap();
}

// ── Files backend ──

#[tokio::test]
async fn test_files_layout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::new(file_config(dir.path()));
    store.open("", "app").await.unwrap();
    let id = store.create_sid().await.unwrap();

    let entry = dir.path().join(format!("sess_app_{id}"));
    let lock = dir.path().join(format!("sess_app_{id}.lock"));

    assert!(store.read(id.as_str()).await.unwrap().is_empty());
    assert!(entry.is_file());
    assert!(lock.is_dir());

    store.write(id.as_str(), b"user=1").await.unwrap();
    assert_eq!(std::fs::read(&entry).unwrap(), b"user=1");
    assert!(!lock.exists());

    store.read(id.as_str()).await.unwrap();
    store.destroy(id.as_str()).await.unwrap();
    assert!(!entry.exists());
    assert!(!lock.exists());
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_files_gc_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileBackend::new(dir.path().to_path_buf()));
    let mut store = SessionStore::with_backend(file_config(dir.path()), backend.clone());
    store.open("", "app").await.unwrap();

    let mut ids = Vec::new();
    for age in [10, 50, 120] {
        let id = store.create_sid().await.unwrap();
        store.read(id.as_str()).await.unwrap();
        store.write(id.as_str(), b"x").await.unwrap();
        set_age(
            &dir.path().join(format!("sess_app_{id}")),
            Duration::from_secs(age),
        );
        ids.push(id);
    }
    // A stale lock directory must survive the sweep.
    let held = SessionId::random();
    std::fs::create_dir(dir.path().join(format!("sess_app_{held}.lock"))).unwrap();

    assert_eq!(store.gc(Duration::from_secs(60)).await.unwrap(), 1);

    assert!(store.validate_id(ids[0].as_str()).await.unwrap());
    assert!(store.validate_id(ids[1].as_str()).await.unwrap());
    assert!(!store.validate_id(ids[2].as_str()).await.unwrap());
    assert!(dir.path().join(format!("sess_app_{held}.lock")).is_dir());
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_gc_leaves_other_namespaces_alone() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileBackend::new(dir.path().to_path_buf()));
    let id = SessionId::random();
    for name in [format!("sess_app_{id}"), format!("sess_app_admin_{id}"), format!("sess_{id}")] {
        let path = dir.path().join(name);
        std::fs::write(&path, b"x").unwrap();
        set_age(&path, Duration::from_secs(3600));
    }

    let layout = sl_core::KeyLayout::new(sl_core::KeyStyle::Files, "app");
    let gc = GcSweeper::new(backend, layout);
    assert_eq!(gc.collect(Duration::from_secs(60)).await.unwrap(), 1);
    assert!(dir.path().join(format!("sess_app_admin_{id}")).exists());
    assert!(dir.path().join(format!("sess_{id}")).exists());
}

#[tokio::test]
async fn test_logging_transcript_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let save_path = dir.path().to_string_lossy().into_owned();
    let mut handler = LoggingHandler::recording(SessionStore::new(file_config(dir.path())));
    let id = "0123456789abcdef0123456789abcdef";

    handler.open(&save_path, "app").await.unwrap();
    handler.validate_id(id).await.unwrap();
    handler.read(id).await.unwrap();
    handler.write(id, b"a|i:1;").await.unwrap();
    handler.close().await.unwrap();

    let expected = [
        format!("open {} = true", serde_json::json!([save_path, "app"])),
        format!(r#"validate_id ["{id}"] = false"#),
        format!(r#"read ["{id}"] = """#),
        format!(r#"write ["{id}","a|i:1;"] = true"#),
        "close [] = true".to_string(),
    ];
    assert_eq!(handler.transcript(), expected);
}

// ── Mutual exclusion ──

async fn increment(mut store: SessionStore, id: SessionId, inside: Arc<AtomicUsize>) {
    let data = store.read(id.as_str()).await.unwrap();
    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0, "two holders at once");

    let n: u64 = if data.is_empty() {
        0
    } else {
        String::from_utf8(data).unwrap().parse().unwrap()
    };
    tokio::task::yield_now().await;

    inside.fetch_sub(1, Ordering::SeqCst);
    store
        .write(id.as_str(), (n + 1).to_string().as_bytes())
        .await
        .unwrap();
    store.close().await.unwrap();
}

async fn run_increments(stores: Vec<SessionStore>, id: SessionId) {
    let inside = Arc::new(AtomicUsize::new(0));
    let mut tasks = Vec::new();
    for store in stores {
        tasks.push(tokio::spawn(increment(store, id.clone(), inside.clone())));
    }
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_are_serialized_memory() {
    let backend = MemoryBackend::new();
    let config = StoreConfig::new("memory:").with_poll_interval_ms(1);
    let id = SessionId::random();

    let mut stores = Vec::new();
    for _ in 0..20 {
        let mut store = SessionStore::with_backend(config.clone(), Arc::new(backend.clone()));
        store.open("", "app").await.unwrap();
        stores.push(store);
    }
    run_increments(stores, id.clone()).await;

    let mut check = SessionStore::with_backend(config, Arc::new(backend.clone()));
    check.open("", "app").await.unwrap();
    assert_eq!(check.read(id.as_str()).await.unwrap(), b"20");
    check.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_are_serialized_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(dir.path());
    let id = SessionId::random();

    let mut stores = Vec::new();
    for _ in 0..10 {
        let mut store = SessionStore::new(config.clone());
        store.open("", "app").await.unwrap();
        stores.push(store);
    }
    run_increments(stores, id.clone()).await;

    assert_eq!(
        std::fs::read(dir.path().join(format!("sess_app_{id}"))).unwrap(),
        b"10"
    );
}
