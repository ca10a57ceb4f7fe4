use anyhow::{Context, Result};
use boxforge_data::{Joined, ListenOptions, NewInbound, NewLog, NewReality, RecordStore};
use boxforge_test_support::fixtures::temp_dir;

fn inbound(tag: &str, reality_id: Option<i64>) -> NewInbound {
    NewInbound {
        kind: "vless".to_string(),
        tag: tag.to_string(),
        listen: "::".to_string(),
        listen_port: 443,
        sniff: true,
        sniff_override_destination: false,
        sniff_timeout: "300ms".to_string(),
        domain_strategy: Some("prefer_ipv4".to_string()),
        listen_options: ListenOptions {
            tcp_fast_open: Some(true),
            ..ListenOptions::default()
        },
        transport_id: None,
        tls_id: None,
        reality_id,
        handshake_id: None,
    }
}

#[tokio::test]
async fn records_survive_reopening_the_database_file() -> Result<()> {
    let temp = temp_dir()?;
    let url = format!("sqlite://{}", temp.path().join("config.db").display());

    {
        let store = RecordStore::connect(&url).await?;
        store
            .upsert_log(&NewLog {
                disabled: false,
                level: "info".to_string(),
                output: "/var/log/app.log".to_string(),
                timestamp: true,
            })
            .await?;
        let reality = store
            .insert_reality(&NewReality {
                enabled: true,
                private_key: Some("key".to_string()),
                short_id: None,
            })
            .await?;
        store.insert_inbound(&inbound("in1", Some(reality))).await?;
        store.pool().close().await;
    }

    let reopened = RecordStore::connect(&url).await?;
    let log = reopened.fetch_log().await?.context("log row missing")?;
    assert_eq!(log.level, "info");

    let rows = reopened.fetch_inbound_join_rows().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].inbound.tag, "in1");
    assert_eq!(rows[0].inbound.listen_port, 443);
    assert_eq!(rows[0].inbound.listen_options.tcp_fast_open, Some(true));
    assert_eq!(rows[0].inbound.listen_options.udp_fragment, None);
    assert_eq!(rows[0].reality.enabled, Joined::Value(true));
    assert_eq!(rows[0].reality.short_id, Joined::Null);
    assert!(!rows[0].tls.enabled.is_joined());
    Ok(())
}

#[tokio::test]
async fn deleting_a_referenced_row_leaves_the_reference_dangling() -> Result<()> {
    let temp = temp_dir()?;
    let url = format!("sqlite://{}", temp.path().join("config.db").display());
    let store = RecordStore::connect(&url).await?;

    let reality = store
        .insert_reality(&NewReality {
            enabled: true,
            ..NewReality::default()
        })
        .await?;
    store.insert_inbound(&inbound("in1", Some(reality))).await?;
    assert!(store.delete_reality(reality).await?);

    let inbounds = store.list_inbounds().await?;
    assert_eq!(inbounds[0].reality_id, Some(reality));
    let rows = store.fetch_inbound_join_rows().await?;
    assert_eq!(rows[0].reality.enabled, Joined::Unjoined);
    Ok(())
}
