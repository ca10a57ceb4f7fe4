use std::fs;

use anyhow::Result;
use async_trait::async_trait;
use boxforge_data::{
    DataError, DataResult, InboundJoinRow, ListenOptions, LogRow, NewHandshake, NewInbound,
    NewLog, NewReality, NewTls, NewTransport, NewUser, RecordStore, UserRow,
};
use boxforge_document::{
    GenerateError, ProjectionError, ProjectionOptions, RecordSource, generate_document, project,
    render_document,
};
use boxforge_test_support::fixtures::temp_dir;
use boxforge_test_support::sqlite::memory_pool;
use serde_json::{Value, json};

async fn store() -> Result<RecordStore> {
    Ok(RecordStore::from_pool(memory_pool().await?).await?)
}

fn default_log() -> NewLog {
    NewLog {
        disabled: false,
        level: "info".to_string(),
        output: "/var/log/app.log".to_string(),
        timestamp: true,
    }
}

fn inbound(tag: &str) -> NewInbound {
    NewInbound {
        kind: "vless".to_string(),
        tag: tag.to_string(),
        listen: "::".to_string(),
        listen_port: 8080,
        sniff: true,
        sniff_override_destination: false,
        sniff_timeout: "300ms".to_string(),
        domain_strategy: None,
        listen_options: ListenOptions::default(),
        transport_id: None,
        tls_id: None,
        reality_id: None,
        handshake_id: None,
    }
}

fn user(name: &str, uuid: &str, sub: &str, active: bool) -> NewUser {
    NewUser {
        name: name.to_string(),
        uuid: uuid.to_string(),
        sub: sub.to_string(),
        active,
    }
}

#[tokio::test]
async fn single_user_single_inbound_scenario() -> Result<()> {
    let store = store().await?;
    store.upsert_log(&default_log()).await?;
    store.insert_user(&user("alice", "u-1", "s-1", true)).await?;
    store.insert_inbound(&inbound("in1")).await?;

    let document = project(&store, ProjectionOptions::default()).await?;

    assert_eq!(document.inbounds.len(), 1);
    let node = &document.inbounds[0];
    assert!(!node.tls.enabled);
    assert!(!node.tls.reality.enabled);
    assert_eq!(node.users.len(), 1);
    assert_eq!(node.users[0].name, "alice");
    assert_eq!(node.users[0].uuid, "u-1");

    let rendered: Value = serde_json::from_str(&render_document(&document)?)?;
    assert_eq!(
        rendered["inbounds"][0],
        json!({
            "type": "vless",
            "tag": "in1",
            "listen": "::",
            "listen_port": 8080,
            "sniff": true,
            "sniff_override_destination": false,
            "sniff_timeout": "300ms",
            "users": [{"name": "alice", "uuid": "u-1"}],
            "tls": {"reality": {"handshake": {}}},
            "transport": {}
        })
    );
    assert_eq!(
        rendered["log"],
        json!({"level": "info", "output": "/var/log/app.log", "timestamp": true})
    );
    Ok(())
}

#[tokio::test]
async fn enabled_tls_row_is_copied_into_the_block() -> Result<()> {
    let store = store().await?;
    store.upsert_log(&default_log()).await?;
    let tls_id = store
        .insert_tls(&NewTls {
            enabled: true,
            server_name: Some("example.com".to_string()),
            min_version: Some("1.2".to_string()),
            max_version: None,
            certificate_path: Some("/etc/cert.pem".to_string()),
            key_path: Some("/etc/key.pem".to_string()),
        })
        .await?;
    store
        .insert_inbound(&NewInbound {
            tls_id: Some(tls_id),
            ..inbound("tls-in")
        })
        .await?;

    let document = project(&store, ProjectionOptions::default()).await?;
    let tls = &document.inbounds[0].tls;

    assert!(tls.enabled);
    assert_eq!(tls.server_name.as_deref(), Some("example.com"));
    assert_eq!(tls.min_version.as_deref(), Some("1.2"));
    assert_eq!(tls.max_version, None);
    assert_eq!(tls.certificate_path.as_deref(), Some("/etc/cert.pem"));
    assert_eq!(tls.key_path.as_deref(), Some("/etc/key.pem"));
    Ok(())
}

#[tokio::test]
async fn reality_and_handshake_nest_inside_tls() -> Result<()> {
    let store = store().await?;
    store.upsert_log(&default_log()).await?;
    let transport_id = store
        .insert_transport(&NewTransport {
            kind: "ws".to_string(),
            path: "/ws".to_string(),
        })
        .await?;
    let tls_id = store
        .insert_tls(&NewTls {
            enabled: true,
            server_name: Some("example.com".to_string()),
            ..NewTls::default()
        })
        .await?;
    let reality_id = store
        .insert_reality(&NewReality {
            enabled: true,
            private_key: Some("private".to_string()),
            short_id: Some("0123".to_string()),
        })
        .await?;
    let handshake_id = store
        .insert_handshake(&NewHandshake {
            server: Some("www.example.com".to_string()),
            server_port: Some(443),
        })
        .await?;
    store
        .insert_inbound(&NewInbound {
            transport_id: Some(transport_id),
            tls_id: Some(tls_id),
            reality_id: Some(reality_id),
            handshake_id: Some(handshake_id),
            ..inbound("reality-in")
        })
        .await?;

    let document = project(&store, ProjectionOptions::default()).await?;
    let rendered: Value = serde_json::from_str(&render_document(&document)?)?;

    assert_eq!(
        rendered["inbounds"][0]["tls"],
        json!({
            "enabled": true,
            "server_name": "example.com",
            "reality": {
                "enabled": true,
                "handshake": {"server": "www.example.com", "server_port": 443},
                "private_key": "private",
                "short_id": "0123"
            }
        })
    );
    assert_eq!(
        rendered["inbounds"][0]["transport"],
        json!({"type": "ws", "path": "/ws"})
    );
    Ok(())
}

#[tokio::test]
async fn orphaned_reality_renders_under_disabled_tls() -> Result<()> {
    let store = store().await?;
    store.upsert_log(&default_log()).await?;
    let reality_id = store
        .insert_reality(&NewReality {
            enabled: true,
            private_key: Some("pk".to_string()),
            short_id: None,
        })
        .await?;
    store
        .insert_inbound(&NewInbound {
            reality_id: Some(reality_id),
            ..inbound("orphan")
        })
        .await?;

    let document = project(&store, ProjectionOptions::default()).await?;
    let tls = &document.inbounds[0].tls;

    assert!(!tls.enabled);
    assert!(tls.reality.enabled);
    assert_eq!(tls.reality.private_key.as_deref(), Some("pk"));
    Ok(())
}

#[tokio::test]
async fn users_are_shared_across_inbounds_in_id_order() -> Result<()> {
    let store = store().await?;
    store.upsert_log(&default_log()).await?;
    store.insert_user(&user("alice", "u-1", "s-1", true)).await?;
    store.insert_user(&user("bob", "u-2", "s-2", false)).await?;
    store.insert_user(&user("carol", "u-3", "s-3", true)).await?;
    store.insert_inbound(&inbound("first")).await?;
    store.insert_inbound(&inbound("second")).await?;
    store.insert_inbound(&inbound("third")).await?;

    let document = project(
        &store,
        ProjectionOptions {
            include_user_sub: true,
        },
    )
    .await?;

    let tags: Vec<_> = document.inbounds.iter().map(|node| node.tag.as_str()).collect();
    assert_eq!(tags, ["first", "second", "third"]);
    let reference = &document.inbounds[0].users;
    assert_eq!(reference.len(), 2);
    assert_eq!(reference[1].sub.as_deref(), Some("s-3"));
    assert!(document.inbounds.iter().all(|node| &node.users == reference));
    Ok(())
}

#[tokio::test]
async fn no_active_users_omits_the_list() -> Result<()> {
    let store = store().await?;
    store.upsert_log(&default_log()).await?;
    store.insert_user(&user("bob", "u-2", "s-2", false)).await?;
    store.insert_inbound(&inbound("in1")).await?;

    let document = project(&store, ProjectionOptions::default()).await?;
    let rendered: Value = serde_json::from_str(&render_document(&document)?)?;

    assert!(rendered["inbounds"][0].get("users").is_none());
    Ok(())
}

#[tokio::test]
async fn missing_log_row_is_reported_and_nothing_is_written() -> Result<()> {
    let store = store().await?;
    store.insert_inbound(&inbound("in1")).await?;
    let temp = temp_dir()?;
    let path = temp.path().join("config.json");
    fs::write(&path, "previous")?;

    let err = generate_document(&store, ProjectionOptions::default(), &path)
        .await
        .expect_err("projection should fail");

    assert!(matches!(
        err,
        GenerateError::Projection(ProjectionError::MissingSingleton { table: "log" })
    ));
    assert_eq!(fs::read_to_string(&path)?, "previous");
    Ok(())
}

#[tokio::test]
async fn generate_document_writes_the_rendered_text() -> Result<()> {
    let store = store().await?;
    store.upsert_log(&default_log()).await?;
    store.insert_inbound(&inbound("in1")).await?;
    let temp = temp_dir()?;
    let path = temp.path().join("out").join("config.json");

    let document = generate_document(&store, ProjectionOptions::default(), &path).await?;

    assert_eq!(fs::read_to_string(&path)?, render_document(&document)?);
    Ok(())
}

struct FailingSource;

#[async_trait]
impl RecordSource for FailingSource {
    async fn log_settings(&self) -> DataResult<Option<LogRow>> {
        Ok(Some(LogRow {
            disabled: false,
            level: "info".to_string(),
            output: String::new(),
            timestamp: false,
        }))
    }

    async fn users(&self) -> DataResult<Vec<UserRow>> {
        Ok(Vec::new())
    }

    async fn inbound_rows(&self) -> DataResult<Vec<InboundJoinRow>> {
        Err(DataError::ColumnOutOfRange {
            column: "listen_port",
            value: 70_000,
        })
    }
}

#[tokio::test]
async fn scan_failure_aborts_the_projection() {
    let err = project(&FailingSource, ProjectionOptions::default())
        .await
        .expect_err("scan failure should abort");
    assert!(matches!(
        err,
        ProjectionError::Scan {
            operation: "projection.inbounds",
            ..
        }
    ));
}
