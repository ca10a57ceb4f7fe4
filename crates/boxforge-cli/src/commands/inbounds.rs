use anyhow::Context;
use boxforge_data::{ListenOptions, NewInbound};
use tracing::{info, warn};

use crate::cli::{IdArgs, InboundAddArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::render_inbounds;

/// Parse an optional reference id; malformed input means "no reference".
pub(crate) fn parse_reference(field: &'static str, raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            warn!(field, value = raw, "ignoring malformed reference id");
            None
        }
    }
}

pub(crate) async fn handle_inbound_add(ctx: &AppContext, args: InboundAddArgs) -> CliResult<()> {
    if args.tag.trim().is_empty() {
        return Err(CliError::validation("inbound tag must not be empty"));
    }

    let inbound = NewInbound {
        transport_id: parse_reference("transport", args.transport.as_deref()),
        tls_id: parse_reference("tls", args.tls.as_deref()),
        reality_id: parse_reference("reality", args.reality.as_deref()),
        handshake_id: parse_reference("handshake", args.handshake.as_deref()),
        kind: args.kind,
        tag: args.tag,
        listen: args.listen,
        listen_port: args.listen_port,
        sniff: args.sniff,
        sniff_override_destination: args.sniff_override_destination,
        sniff_timeout: args.sniff_timeout,
        domain_strategy: args.domain_strategy,
        listen_options: ListenOptions {
            tcp_fast_open: args.tcp_fast_open,
            tcp_multi_path: args.tcp_multi_path,
            udp_fragment: args.udp_fragment,
            udp_timeout: args.udp_timeout,
            detour: args.detour,
            udp_disable_domain_unmapping: args.udp_disable_domain_unmapping,
        },
    };

    let id = ctx
        .store
        .insert_inbound(&inbound)
        .await
        .with_context(|| format!("failed to add inbound {}", inbound.tag))
        .map_err(CliError::failure)?;
    info!(id, tag = %inbound.tag, "inbound added");
    println!("Inbound {} added (id {id}).", inbound.tag);
    Ok(())
}

pub(crate) async fn handle_inbound_list(ctx: &AppContext) -> CliResult<()> {
    let inbounds = ctx
        .store
        .list_inbounds()
        .await
        .context("failed to list inbounds")
        .map_err(CliError::failure)?;
    render_inbounds(&inbounds, ctx.output)
}

pub(crate) async fn handle_inbound_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let deleted = ctx
        .store
        .delete_inbound(args.id)
        .await
        .context("failed to delete inbound")
        .map_err(CliError::failure)?;
    if deleted {
        println!("Inbound {} deleted.", args.id);
    } else {
        println!("No inbound found with id {}.", args.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command, InboundCommand};
    use crate::commands::test_support::context;
    use anyhow::{Result, anyhow};
    use clap::Parser;

    #[test]
    fn malformed_references_become_absent() {
        assert_eq!(parse_reference("tls", None), None);
        assert_eq!(parse_reference("tls", Some("")), None);
        assert_eq!(parse_reference("tls", Some("abc")), None);
        assert_eq!(parse_reference("tls", Some("-3")), None);
        assert_eq!(parse_reference("tls", Some("0")), None);
        assert_eq!(parse_reference("tls", Some(" 7 ")), Some(7));
    }

    #[tokio::test]
    async fn add_stores_parsed_references() -> Result<()> {
        let ctx = context().await?;
        let cli = Cli::try_parse_from([
            "boxforge", "inbound", "add", "--tag", "in1", "--tls", "oops", "--handshake", "3",
        ])?;
        let Command::Inbound(InboundCommand::Add(args)) = cli.command else {
            return Err(anyhow!("expected inbound add"));
        };

        handle_inbound_add(&ctx, args)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;

        let rows = ctx.store.list_inbounds().await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag, "in1");
        assert_eq!(rows[0].tls_id, None);
        assert_eq!(rows[0].handshake_id, Some(3));
        assert_eq!(rows[0].sniff_timeout, "300ms");
        Ok(())
    }
}
