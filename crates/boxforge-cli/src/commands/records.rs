//! Handlers for the reference tables an inbound can point at.

use anyhow::Context;
use boxforge_data::{NewHandshake, NewReality, NewTls, NewTransport};
use tracing::info;

use crate::cli::{HandshakeAddArgs, IdArgs, RealityAddArgs, TlsAddArgs, TransportAddArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::{render_handshakes, render_reality, render_tls, render_transports};

fn report_delete(label: &str, id: i64, deleted: bool) {
    if deleted {
        println!("{label} {id} deleted.");
    } else {
        println!("No {label} found with id {id}.");
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub(crate) async fn handle_transport_add(
    ctx: &AppContext,
    args: TransportAddArgs,
) -> CliResult<()> {
    if args.kind.trim().is_empty() {
        return Err(CliError::validation("transport type must not be empty"));
    }
    let id = ctx
        .store
        .insert_transport(&NewTransport {
            kind: args.kind,
            path: args.path,
        })
        .await
        .context("failed to add transport")
        .map_err(CliError::failure)?;
    info!(id, "transport added");
    println!("Transport added (id {id}).");
    Ok(())
}

pub(crate) async fn handle_transport_list(ctx: &AppContext) -> CliResult<()> {
    let rows = ctx
        .store
        .list_transports()
        .await
        .context("failed to list transports")
        .map_err(CliError::failure)?;
    render_transports(&rows, ctx.output)
}

pub(crate) async fn handle_transport_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let deleted = ctx
        .store
        .delete_transport(args.id)
        .await
        .context("failed to delete transport")
        .map_err(CliError::failure)?;
    report_delete("transport", args.id, deleted);
    Ok(())
}

pub(crate) async fn handle_tls_add(ctx: &AppContext, args: TlsAddArgs) -> CliResult<()> {
    let tls = NewTls {
        enabled: args.enabled,
        server_name: non_blank(args.server_name),
        min_version: non_blank(args.min_version),
        max_version: non_blank(args.max_version),
        certificate_path: non_blank(args.certificate_path),
        key_path: non_blank(args.key_path),
    };
    let id = ctx
        .store
        .insert_tls(&tls)
        .await
        .context("failed to add TLS settings")
        .map_err(CliError::failure)?;
    info!(id, "tls settings added");
    println!("TLS settings added (id {id}).");
    Ok(())
}

pub(crate) async fn handle_tls_list(ctx: &AppContext) -> CliResult<()> {
    let rows = ctx
        .store
        .list_tls()
        .await
        .context("failed to list TLS settings")
        .map_err(CliError::failure)?;
    render_tls(&rows, ctx.output)
}

pub(crate) async fn handle_tls_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let deleted = ctx
        .store
        .delete_tls(args.id)
        .await
        .context("failed to delete TLS settings")
        .map_err(CliError::failure)?;
    report_delete("TLS settings", args.id, deleted);
    Ok(())
}

pub(crate) async fn handle_reality_add(ctx: &AppContext, args: RealityAddArgs) -> CliResult<()> {
    let reality = NewReality {
        enabled: args.enabled,
        private_key: non_blank(args.private_key),
        short_id: non_blank(args.short_id),
    };
    let id = ctx
        .store
        .insert_reality(&reality)
        .await
        .context("failed to add Reality settings")
        .map_err(CliError::failure)?;
    info!(id, "reality settings added");
    println!("Reality settings added (id {id}).");
    Ok(())
}

pub(crate) async fn handle_reality_list(ctx: &AppContext) -> CliResult<()> {
    let rows = ctx
        .store
        .list_reality()
        .await
        .context("failed to list Reality settings")
        .map_err(CliError::failure)?;
    render_reality(&rows, ctx.output)
}

pub(crate) async fn handle_reality_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let deleted = ctx
        .store
        .delete_reality(args.id)
        .await
        .context("failed to delete Reality settings")
        .map_err(CliError::failure)?;
    report_delete("Reality settings", args.id, deleted);
    Ok(())
}

pub(crate) async fn handle_handshake_add(
    ctx: &AppContext,
    args: HandshakeAddArgs,
) -> CliResult<()> {
    let handshake = NewHandshake {
        server: non_blank(args.server),
        server_port: args.server_port,
    };
    let id = ctx
        .store
        .insert_handshake(&handshake)
        .await
        .context("failed to add handshake target")
        .map_err(CliError::failure)?;
    info!(id, "handshake target added");
    println!("Handshake target added (id {id}).");
    Ok(())
}

pub(crate) async fn handle_handshake_list(ctx: &AppContext) -> CliResult<()> {
    let rows = ctx
        .store
        .list_handshakes()
        .await
        .context("failed to list handshake targets")
        .map_err(CliError::failure)?;
    render_handshakes(&rows, ctx.output)
}

pub(crate) async fn handle_handshake_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let deleted = ctx
        .store
        .delete_handshake(args.id)
        .await
        .context("failed to delete handshake target")
        .map_err(CliError::failure)?;
    report_delete("handshake target", args.id, deleted);
    Ok(())
}
