//! Argument parsing and command dispatch.

use std::path::PathBuf;

use anyhow::Context;
use boxforge_config::{AppConfig, ConfigError};
use boxforge_data::RecordStore;
use boxforge_telemetry::{LogFormat, LoggingConfig, build_sha, init_logging};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::commands::inbounds::{handle_inbound_add, handle_inbound_delete, handle_inbound_list};
use crate::commands::log::{handle_log_set, handle_log_show};
use crate::commands::records::{
    handle_handshake_add, handle_handshake_delete, handle_handshake_list, handle_reality_add,
    handle_reality_delete, handle_reality_list, handle_tls_add, handle_tls_delete,
    handle_tls_list, handle_transport_add, handle_transport_delete, handle_transport_list,
};
use crate::commands::render::{handle_render_clients, handle_render_config, handle_render_subs};
use crate::commands::users::{
    handle_user_add, handle_user_delete, handle_user_import, handle_user_list,
    handle_user_set_active,
};
use crate::context::{AppContext, CliError, CliResult};

const BUILD_SHA: Option<&str> = option_env!("BOXFORGE_BUILD_SHA");

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let config = resolve_config(cli.config.as_deref(), cli.database_url.as_deref())?;
    install_logging(&config);
    debug!(
        build = build_sha(),
        command = command_label(&cli.command),
        "dispatching command"
    );

    let store = RecordStore::connect(&config.database_url)
        .await
        .context("failed to open record store")
        .map_err(CliError::failure)?;
    let ctx = AppContext {
        store,
        config,
        output: cli.output,
    };
    dispatch(&ctx, cli.command).await
}

pub(crate) fn resolve_config(
    file: Option<&std::path::Path>,
    database_url: Option<&str>,
) -> CliResult<AppConfig> {
    let mut config = boxforge_config::load(file).map_err(|err| match err {
        ConfigError::InvalidField {
            section,
            field,
            reason,
            ..
        } => CliError::validation(format!("invalid configuration {section}.{field}: {reason}")),
        other => CliError::failure(anyhow::Error::new(other).context("failed to load configuration")),
    })?;

    if let Some(url) = database_url {
        if url.trim().is_empty() {
            return Err(CliError::validation("--database-url must not be empty"));
        }
        config.database_url = url.to_string();
    }
    Ok(config)
}

fn install_logging(config: &AppConfig) {
    let logging = LoggingConfig {
        level: &config.telemetry.level,
        format: LogFormat::from_name(config.telemetry.format.as_str()),
        build_sha: BUILD_SHA.unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }
}

async fn dispatch(ctx: &AppContext, command: Command) -> CliResult<()> {
    match command {
        Command::User(user) => match user {
            UserCommand::Add(args) => handle_user_add(ctx, args).await,
            UserCommand::Import(args) => handle_user_import(ctx, args).await,
            UserCommand::List => handle_user_list(ctx).await,
            UserCommand::Delete(args) => handle_user_delete(ctx, args).await,
            UserCommand::Activate(args) => handle_user_set_active(ctx, args, true).await,
            UserCommand::Deactivate(args) => handle_user_set_active(ctx, args, false).await,
        },
        Command::Log(log) => match log {
            LogCommand::Set(args) => handle_log_set(ctx, args).await,
            LogCommand::Show => handle_log_show(ctx).await,
        },
        Command::Inbound(inbound) => match inbound {
            InboundCommand::Add(args) => handle_inbound_add(ctx, args).await,
            InboundCommand::List => handle_inbound_list(ctx).await,
            InboundCommand::Delete(args) => handle_inbound_delete(ctx, args).await,
        },
        Command::Transport(transport) => match transport {
            TransportCommand::Add(args) => handle_transport_add(ctx, args).await,
            TransportCommand::List => handle_transport_list(ctx).await,
            TransportCommand::Delete(args) => handle_transport_delete(ctx, args).await,
        },
        Command::Tls(tls) => match tls {
            TlsCommand::Add(args) => handle_tls_add(ctx, args).await,
            TlsCommand::List => handle_tls_list(ctx).await,
            TlsCommand::Delete(args) => handle_tls_delete(ctx, args).await,
        },
        Command::Reality(reality) => match reality {
            RealityCommand::Add(args) => handle_reality_add(ctx, args).await,
            RealityCommand::List => handle_reality_list(ctx).await,
            RealityCommand::Delete(args) => handle_reality_delete(ctx, args).await,
        },
        Command::Handshake(handshake) => match handshake {
            HandshakeCommand::Add(args) => handle_handshake_add(ctx, args).await,
            HandshakeCommand::List => handle_handshake_list(ctx).await,
            HandshakeCommand::Delete(args) => handle_handshake_delete(ctx, args).await,
        },
        Command::Render(render) => match render {
            RenderCommand::Config => handle_render_config(ctx).await,
            RenderCommand::Clients => handle_render_clients(ctx).await,
            RenderCommand::Subs => handle_render_subs(ctx).await,
            RenderCommand::All => {
                handle_render_config(ctx).await?;
                handle_render_clients(ctx).await?;
                handle_render_subs(ctx).await
            }
        },
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::User(_) => "user",
        Command::Log(_) => "log",
        Command::Inbound(_) => "inbound",
        Command::Transport(_) => "transport",
        Command::Tls(_) => "tls",
        Command::Reality(_) => "reality",
        Command::Handshake(_) => "handshake",
        Command::Render(_) => "render",
    }
}

#[derive(Parser)]
#[command(
    name = "boxforge",
    version,
    about = "Manage proxy records and render their configuration files"
)]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "BOXFORGE_CONFIG", help = "JSON configuration file")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true, help = "Record store URL, overriding configuration")]
    pub(crate) database_url: Option<String>,
    #[arg(
        id = "format",
        long = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that print records"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Manage users.
    #[command(subcommand)]
    User(UserCommand),
    /// Manage the log settings.
    #[command(subcommand)]
    Log(LogCommand),
    /// Manage inbounds.
    #[command(subcommand)]
    Inbound(InboundCommand),
    /// Manage transports.
    #[command(subcommand)]
    Transport(TransportCommand),
    /// Manage TLS settings.
    #[command(subcommand)]
    Tls(TlsCommand),
    /// Manage Reality settings.
    #[command(subcommand)]
    Reality(RealityCommand),
    /// Manage handshake targets.
    #[command(subcommand)]
    Handshake(HandshakeCommand),
    /// Write configuration files.
    #[command(subcommand)]
    Render(RenderCommand),
}

#[derive(Subcommand)]
pub(crate) enum UserCommand {
    /// Add a user with a generated UUID and subscription token.
    Add(UserAddArgs),
    /// Import users from a JSON array of `{name, uuid, sub, active}`.
    Import(UserImportArgs),
    /// List users.
    List,
    /// Delete a user.
    Delete(IdArgs),
    /// Mark a user active.
    Activate(IdArgs),
    /// Mark a user inactive.
    Deactivate(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum LogCommand {
    /// Replace the log settings.
    Set(LogSetArgs),
    /// Print the log settings.
    Show,
}

#[derive(Subcommand)]
pub(crate) enum InboundCommand {
    /// Add an inbound.
    Add(InboundAddArgs),
    /// List inbounds.
    List,
    /// Delete an inbound.
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum TransportCommand {
    /// Add a transport.
    Add(TransportAddArgs),
    /// List transports.
    List,
    /// Delete a transport.
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum TlsCommand {
    /// Add TLS settings.
    Add(TlsAddArgs),
    /// List TLS settings.
    List,
    /// Delete TLS settings.
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum RealityCommand {
    /// Add Reality settings.
    Add(RealityAddArgs),
    /// List Reality settings.
    List,
    /// Delete Reality settings.
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum HandshakeCommand {
    /// Add a handshake target.
    Add(HandshakeAddArgs),
    /// List handshake targets.
    List,
    /// Delete a handshake target.
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum RenderCommand {
    /// Write the proxy configuration document.
    Config,
    /// Write one client document per active user.
    Clients,
    /// Regenerate the subscription stubs.
    Subs,
    /// Run config, clients, and subs in order.
    All,
}

#[derive(Args)]
pub(crate) struct IdArgs {
    #[arg(help = "Record identifier")]
    pub(crate) id: i64,
}

#[derive(Args)]
pub(crate) struct UserAddArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long, help = "Credential UUID (defaults to a random v4 UUID)")]
    pub(crate) uuid: Option<String>,
    #[arg(long, help = "Subscription token (defaults to 50 random hex characters)")]
    pub(crate) sub: Option<String>,
    #[arg(long, help = "Store the user as inactive")]
    pub(crate) inactive: bool,
}

#[derive(Args)]
pub(crate) struct UserImportArgs {
    #[arg(long)]
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct LogSetArgs {
    #[arg(long)]
    pub(crate) disabled: bool,
    #[arg(long, default_value = "info")]
    pub(crate) level: String,
    #[arg(long, default_value = "/var/log/app.log")]
    pub(crate) output: String,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) timestamp: bool,
}

#[derive(Args)]
pub(crate) struct InboundAddArgs {
    #[arg(long = "type", default_value = "vless")]
    pub(crate) kind: String,
    #[arg(long, default_value = "vless-ws")]
    pub(crate) tag: String,
    #[arg(long, default_value = "::")]
    pub(crate) listen: String,
    #[arg(long = "port", default_value_t = 8080)]
    pub(crate) listen_port: u16,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) sniff: bool,
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub(crate) sniff_override_destination: bool,
    #[arg(long, default_value = "300ms")]
    pub(crate) sniff_timeout: String,
    #[arg(long)]
    pub(crate) domain_strategy: Option<String>,
    #[arg(long)]
    pub(crate) tcp_fast_open: Option<bool>,
    #[arg(long)]
    pub(crate) tcp_multi_path: Option<bool>,
    #[arg(long)]
    pub(crate) udp_fragment: Option<bool>,
    #[arg(long)]
    pub(crate) udp_timeout: Option<String>,
    #[arg(long)]
    pub(crate) detour: Option<String>,
    #[arg(long)]
    pub(crate) udp_disable_domain_unmapping: Option<bool>,
    #[arg(long, help = "Transport id; malformed values leave the reference unset")]
    pub(crate) transport: Option<String>,
    #[arg(long, help = "TLS id; malformed values leave the reference unset")]
    pub(crate) tls: Option<String>,
    #[arg(long, help = "Reality id; malformed values leave the reference unset")]
    pub(crate) reality: Option<String>,
    #[arg(long, help = "Handshake id; malformed values leave the reference unset")]
    pub(crate) handshake: Option<String>,
}

#[derive(Args)]
pub(crate) struct TransportAddArgs {
    #[arg(long = "type", default_value = "ws")]
    pub(crate) kind: String,
    #[arg(long, default_value = "")]
    pub(crate) path: String,
}

#[derive(Args)]
pub(crate) struct TlsAddArgs {
    #[arg(long)]
    pub(crate) enabled: bool,
    #[arg(long)]
    pub(crate) server_name: Option<String>,
    #[arg(long)]
    pub(crate) min_version: Option<String>,
    #[arg(long)]
    pub(crate) max_version: Option<String>,
    #[arg(long)]
    pub(crate) certificate_path: Option<String>,
    #[arg(long)]
    pub(crate) key_path: Option<String>,
}

#[derive(Args)]
pub(crate) struct RealityAddArgs {
    #[arg(long)]
    pub(crate) enabled: bool,
    #[arg(long)]
    pub(crate) private_key: Option<String>,
    #[arg(long)]
    pub(crate) short_id: Option<String>,
}

#[derive(Args)]
pub(crate) struct HandshakeAddArgs {
    #[arg(long)]
    pub(crate) server: Option<String>,
    #[arg(long)]
    pub(crate) server_port: Option<u16>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxforge_test_support::fixtures::{temp_dir, write_file};
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(err) => panic!("failed to parse {args:?}: {err}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn inbound_add_applies_defaults() {
        let cli = parse(&["boxforge", "inbound", "add"]);
        let Command::Inbound(InboundCommand::Add(args)) = cli.command else {
            panic!("expected inbound add");
        };
        assert_eq!(args.kind, "vless");
        assert_eq!(args.tag, "vless-ws");
        assert_eq!(args.listen, "::");
        assert_eq!(args.listen_port, 8080);
        assert!(args.sniff);
        assert!(!args.sniff_override_destination);
        assert_eq!(args.sniff_timeout, "300ms");
        assert!(args.transport.is_none());
    }

    #[test]
    fn inbound_add_accepts_overrides_and_raw_references() {
        let cli = parse(&[
            "boxforge",
            "inbound",
            "add",
            "--type",
            "vmess",
            "--port",
            "443",
            "--sniff",
            "false",
            "--tls",
            "abc",
            "--reality",
            "2",
        ]);
        let Command::Inbound(InboundCommand::Add(args)) = cli.command else {
            panic!("expected inbound add");
        };
        assert_eq!(args.kind, "vmess");
        assert_eq!(args.listen_port, 443);
        assert!(!args.sniff);
        assert_eq!(args.tls.as_deref(), Some("abc"));
        assert_eq!(args.reality.as_deref(), Some("2"));
    }

    #[test]
    fn log_set_defaults_and_global_format() {
        let cli = parse(&["boxforge", "log", "set", "--format", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);
        let Command::Log(LogCommand::Set(args)) = cli.command else {
            panic!("expected log set");
        };
        assert!(!args.disabled);
        assert_eq!(args.level, "info");
        assert_eq!(args.output, "/var/log/app.log");
        assert!(args.timestamp);
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(Cli::try_parse_from(["boxforge", "inbound", "add", "--port", "70000"]).is_err());
        assert!(Cli::try_parse_from(["boxforge", "user", "delete", "x"]).is_err());
    }

    #[test]
    fn database_url_flag_overrides_configuration() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let file = write_file(temp.path(), "boxforge.json", r#"{"database_url": "sqlite://a.db"}"#)?;

        let from_file = resolve_config(Some(file.as_path()), None)
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(from_file.database_url, "sqlite://a.db");

        let overridden = resolve_config(Some(file.as_path()), Some("sqlite://b.db"))
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(overridden.database_url, "sqlite://b.db");

        let blank = resolve_config(Some(file.as_path()), Some(" "));
        assert!(matches!(blank, Err(CliError::Validation(_))));
        Ok(())
    }

    #[test]
    fn invalid_configuration_is_a_validation_error() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let file = write_file(
            temp.path(),
            "boxforge.json",
            r#"{"subscription": {"route_prefix": "sub"}}"#,
        )?;
        let err = resolve_config(Some(file.as_path()), None).expect_err("invalid prefix");
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }
}
