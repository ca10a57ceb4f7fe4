use anyhow::Context;
use boxforge_data::NewLog;

use crate::cli::LogSetArgs;
use crate::context::{AppContext, CliError, CliResult};
use crate::output::render_log;

pub(crate) async fn handle_log_set(ctx: &AppContext, args: LogSetArgs) -> CliResult<()> {
    if args.level.trim().is_empty() {
        return Err(CliError::validation("log level must not be empty"));
    }
    let log = NewLog {
        disabled: args.disabled,
        level: args.level,
        output: args.output,
        timestamp: args.timestamp,
    };
    ctx.store
        .upsert_log(&log)
        .await
        .context("failed to store log settings")
        .map_err(CliError::failure)?;
    println!("Log settings saved.");
    Ok(())
}

pub(crate) async fn handle_log_show(ctx: &AppContext) -> CliResult<()> {
    let log = ctx
        .store
        .fetch_log()
        .await
        .context("failed to read log settings")
        .map_err(CliError::failure)?
        .ok_or_else(|| CliError::validation("log settings are not set (run `boxforge log set`)"))?;
    render_log(&log, ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use anyhow::{Result, anyhow};

    #[tokio::test]
    async fn set_then_show_round_trips() -> Result<()> {
        let ctx = context().await?;
        assert!(matches!(
            handle_log_show(&ctx).await,
            Err(CliError::Validation(_))
        ));

        handle_log_set(
            &ctx,
            LogSetArgs {
                disabled: false,
                level: "warn".to_string(),
                output: "/var/log/box.log".to_string(),
                timestamp: true,
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;

        let stored = ctx.store.fetch_log().await?.ok_or_else(|| anyhow!("log row"))?;
        assert_eq!(stored.level, "warn");
        assert!(handle_log_show(&ctx).await.is_ok());
        Ok(())
    }
}
