//! Project configuration wiring: settings file, flags, URL source and
//! publisher mirror working together.

#![allow(clippy::unwrap_used)]

use fedmesh_cli::context::{NodeArgs, resolve_config, url_source};
use fedmesh_core::TunnelRecord;
use fedmesh_discovery::store::MemoryContentStore;
use fedmesh_discovery::{Publisher, UrlSource};

fn write_settings(dir: &std::path::Path, source: &str) {
    let settings = serde_json::json!({
        "node": { "name": "alice" },
        "store": { "repo": "alice/mesh", "token": "ghp_test" },
        "tunnel": {
            "source": source,
            "url_file": dir.join("runtime/tunnel-url"),
        },
        "watcher": { "mirror_path": dir.join("server.json") },
    });
    std::fs::create_dir_all(dir.join(".fedmesh")).unwrap();
    std::fs::write(
        dir.join(".fedmesh/settings.json"),
        serde_json::to_string_pretty(&settings).unwrap(),
    )
    .unwrap();
}

#[tokio::test]
async fn node_flag_wins_and_file_source_reads_project_file() {
    let dir = tempfile::tempdir().unwrap();
    write_settings(dir.path(), "file");

    let args = NodeArgs {
        node: Some("bob".into()),
        ..NodeArgs::default()
    };
    let config = resolve_config(dir.path(), &args).await.unwrap();
    assert_eq!(config.node_name().unwrap(), "bob");

    let source = url_source(&config, None).unwrap();
    assert_eq!(source.current_url().await, None);

    std::fs::create_dir_all(dir.path().join("runtime")).unwrap();
    std::fs::write(
        dir.path().join("runtime/tunnel-url"),
        "https://calm-river.trycloudflare.com\n",
    )
    .unwrap();
    assert_eq!(
        source.current_url().await.as_deref(),
        Some("https://calm-river.trycloudflare.com")
    );
}

#[tokio::test]
async fn publish_mirrors_the_document_locally() {
    let dir = tempfile::tempdir().unwrap();
    write_settings(dir.path(), "file");
    let config = resolve_config(dir.path(), &NodeArgs::default()).await.unwrap();

    let publisher = Publisher::new(MemoryContentStore::new(), config.store.documents_dir.clone())
        .with_mirror(config.watcher.mirror_path.clone());
    let node = config.node_name().unwrap().to_string();
    publisher
        .publish(&node, "https://calm-river.trycloudflare.com")
        .await
        .unwrap();

    let stored = publisher
        .store()
        .body(&publisher.document_path(&node))
        .unwrap();
    let mirrored = std::fs::read_to_string(dir.path().join("server.json")).unwrap();
    assert_eq!(stored, mirrored);
    assert_eq!(
        TunnelRecord::from_document(&mirrored).unwrap().url,
        "https://calm-river.trycloudflare.com"
    );
}

#[tokio::test]
async fn log_source_requires_a_compose_command() {
    let dir = tempfile::tempdir().unwrap();
    write_settings(dir.path(), "log");
    let config = resolve_config(dir.path(), &NodeArgs::default()).await.unwrap();

    let err = url_source(&config, None).err().unwrap();
    assert!(err.to_string().contains("compose"), "{err}");
}
