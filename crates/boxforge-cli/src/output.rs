//! Table and JSON renderers for command output.

use anyhow::anyhow;
use boxforge_data::{HandshakeRow, InboundRow, LogRow, RealityRow, TlsRow, TransportRow, UserRow};
use boxforge_fsops::EmitReport;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|value| !value.is_empty()).unwrap_or("-")
}

fn id_or_dash(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |id| id.to_string())
}

pub(crate) fn render_users(users: &[UserRow], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(users)?,
        OutputFormat::Table => {
            println!("{:>5} {:<20} {:<36} {:<6} SUB", "ID", "NAME", "UUID", "ACTIVE");
            for user in users {
                println!(
                    "{:>5} {:<20} {:<36} {:<6} {}",
                    user.id, user.name, user.uuid, user.active, user.sub
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_log(log: &LogRow, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(log)?,
        OutputFormat::Table => {
            println!("disabled: {}", log.disabled);
            println!("level: {}", log.level);
            println!("output: {}", log.output);
            println!("timestamp: {}", log.timestamp);
        }
    }
    Ok(())
}

pub(crate) fn render_inbounds(inbounds: &[InboundRow], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(inbounds)?,
        OutputFormat::Table => {
            println!(
                "{:>5} {:<8} {:<16} {:<15} {:>5} {:>9} {:>4} {:>7} {:>9}",
                "ID", "TYPE", "TAG", "LISTEN", "PORT", "TRANSPORT", "TLS", "REALITY", "HANDSHAKE"
            );
            for inbound in inbounds {
                println!(
                    "{:>5} {:<8} {:<16} {:<15} {:>5} {:>9} {:>4} {:>7} {:>9}",
                    inbound.id,
                    inbound.kind,
                    inbound.tag,
                    inbound.listen,
                    inbound.listen_port,
                    id_or_dash(inbound.transport_id),
                    id_or_dash(inbound.tls_id),
                    id_or_dash(inbound.reality_id),
                    id_or_dash(inbound.handshake_id),
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_transports(rows: &[TransportRow], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(rows)?,
        OutputFormat::Table => {
            println!("{:>5} {:<10} PATH", "ID", "TYPE");
            for row in rows {
                println!("{:>5} {:<10} {}", row.id, row.kind, or_dash(Some(&row.path)));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_tls(rows: &[TlsRow], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(rows)?,
        OutputFormat::Table => {
            println!(
                "{:>5} {:<7} {:<24} {:<5} {:<5} CERTIFICATE / KEY",
                "ID", "ENABLED", "SERVER NAME", "MIN", "MAX"
            );
            for row in rows {
                println!(
                    "{:>5} {:<7} {:<24} {:<5} {:<5} {} / {}",
                    row.id,
                    row.enabled,
                    or_dash(row.server_name.as_deref()),
                    or_dash(row.min_version.as_deref()),
                    or_dash(row.max_version.as_deref()),
                    or_dash(row.certificate_path.as_deref()),
                    or_dash(row.key_path.as_deref()),
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_reality(rows: &[RealityRow], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(rows)?,
        OutputFormat::Table => {
            println!("{:>5} {:<7} {:<12} PRIVATE KEY", "ID", "ENABLED", "SHORT ID");
            for row in rows {
                println!(
                    "{:>5} {:<7} {:<12} {}",
                    row.id,
                    row.enabled,
                    or_dash(row.short_id.as_deref()),
                    or_dash(row.private_key.as_deref()),
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_handshakes(rows: &[HandshakeRow], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(rows)?,
        OutputFormat::Table => {
            println!("{:>5} {:<32} PORT", "ID", "SERVER");
            for row in rows {
                println!(
                    "{:>5} {:<32} {}",
                    row.id,
                    or_dash(row.server.as_deref()),
                    id_or_dash(row.server_port),
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_emit_report(
    label: &str,
    report: &EmitReport,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => {
            println!(
                "{label}: {} written, {} unchanged, {} removed, {} failed",
                report.written.len(),
                report.unchanged.len(),
                report.removed.len(),
                report.failures.len()
            );
            for failure in &report.failures {
                println!("  {}: {}", failure.user, failure.reason);
            }
        }
    }
    Ok(())
}
