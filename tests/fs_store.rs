//! File-backed store tests with real filesystem notifications.

use std::sync::Arc;

use futures_util::StreamExt;

use rpc_config_zookeeper::policy::Quota;
use rpc_config_zookeeper::store::{ChangeKind, CoordinationClient, FsStore};
use rpc_config_zookeeper::suite::{ServerSuite, Suite};

mod common;
use common::{test_options, wait_until, WAIT};

const LIMIT_PATH: &str = "/KitexConfig/paymentSvc/limit";

#[tokio::test]
async fn test_subscription_sees_put() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::open(dir.path()).unwrap();
    store.put(LIMIT_PATH, b"{}").await.unwrap();

    let mut events = store.subscribe(LIMIT_PATH).await.unwrap();
    store.put(LIMIT_PATH, br#"{"qps_limit":1}"#).await.unwrap();

    let event = tokio::time::timeout(WAIT, events.next()).await.unwrap().unwrap();
    assert_eq!(event.path, LIMIT_PATH);
    assert_ne!(event.kind, ChangeKind::Deleted);
}

#[tokio::test]
async fn test_subscribe_watches_only_node_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::open(dir.path()).unwrap();

    // Missing parent directories are created.
    let mut events = store.subscribe(LIMIT_PATH).await.unwrap();
    assert!(store.node_file(LIMIT_PATH).unwrap().parent().unwrap().is_dir());

    store.put("/KitexConfig/otherSvc/limit", b"{}").await.unwrap();
    store.put(LIMIT_PATH, b"{}").await.unwrap();
    let event = tokio::time::timeout(WAIT, events.next()).await.unwrap().unwrap();
    assert_eq!(event.path, LIMIT_PATH);
}

#[tokio::test]
async fn test_removed_directory_ends_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::open(dir.path()).unwrap();
    store.put(LIMIT_PATH, b"{}").await.unwrap();

    let mut events = store.subscribe(LIMIT_PATH).await.unwrap();
    let node_dir = store.node_file(LIMIT_PATH).unwrap().parent().unwrap().to_path_buf();
    std::fs::remove_dir_all(&node_dir).unwrap();

    let ended = tokio::time::timeout(WAIT, async {
        while events.next().await.is_some() {}
    })
    .await;
    assert!(ended.is_ok());
}

#[tokio::test]
async fn test_server_suite_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::open(dir.path()).unwrap();
    store.put(LIMIT_PATH, br#"{"qps_limit":100}"#).await.unwrap();

    let (options, reporter) = test_options();
    let suite = ServerSuite::new("paymentSvc", Arc::new(store.clone()), options).await.unwrap();
    assert_eq!(suite.limiter_policy().qps(), Quota::Max(100));

    store.put(LIMIT_PATH, br#"{"qps_limit":200}"#).await.unwrap();
    assert!(wait_until(WAIT, || suite.limiter_policy().qps() == Quota::Max(200)).await);

    store.put(LIMIT_PATH, br#"{"qps_limit":"lots"}"#).await.unwrap();
    assert!(wait_until(WAIT, || reporter.total() == 1).await);
    assert_eq!(suite.limiter_policy().qps(), Quota::Max(200));

    suite.close().await;
}
