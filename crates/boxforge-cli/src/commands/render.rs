use std::fs;

use anyhow::Context;
use boxforge_document::{GenerateError, ProjectionError, ProjectionOptions, generate_document};
use boxforge_fsops::{ClientEmitter, FsOpsError, StubEmitter, StubLayout};
use tracing::info;

use crate::context::{AppContext, CliError, CliResult};
use crate::output::render_emit_report;

fn map_emit_error(error: FsOpsError) -> CliError {
    match error {
        FsOpsError::InvalidInput { .. } => CliError::validation(error.to_string()),
        other => CliError::failure(other),
    }
}

pub(crate) async fn handle_render_config(ctx: &AppContext) -> CliResult<()> {
    let options = ProjectionOptions {
        include_user_sub: ctx.config.render.include_user_sub,
    };
    let path = &ctx.config.paths.config_output;
    let document = generate_document(&ctx.store, options, path)
        .await
        .map_err(|err| match err {
            GenerateError::Projection(ProjectionError::MissingSingleton { table }) => {
                CliError::validation(format!(
                    "the {table} settings are not configured; run `boxforge {table} set` first"
                ))
            }
            other => CliError::failure(other),
        })?;
    info!(
        path = %path.display(),
        inbounds = document.inbounds.len(),
        "configuration document written"
    );
    println!("Configuration written to {}.", path.display());
    Ok(())
}

pub(crate) async fn handle_render_clients(ctx: &AppContext) -> CliResult<()> {
    let template_path = &ctx.config.paths.template;
    let template = fs::read_to_string(template_path)
        .with_context(|| format!("failed to read client template {}", template_path.display()))
        .map_err(CliError::failure)?;
    let users = ctx
        .store
        .list_active_users()
        .await
        .context("failed to load active users")
        .map_err(CliError::failure)?;

    let emitter = ClientEmitter::new(
        ctx.config.paths.users_dir.clone(),
        ctx.config.subscription.document_ext.clone(),
    );
    let report = emitter
        .emit(&users, &template, template_path)
        .map_err(map_emit_error)?;
    render_emit_report("client documents", &report, ctx.output)
}

pub(crate) async fn handle_render_subs(ctx: &AppContext) -> CliResult<()> {
    let users = ctx
        .store
        .list_active_users()
        .await
        .context("failed to load active users")
        .map_err(CliError::failure)?;

    let subscription = &ctx.config.subscription;
    let layout = StubLayout {
        route_prefix: subscription.route_prefix.clone(),
        alias_root: subscription.alias_root.clone(),
        document_ext: subscription.document_ext.clone(),
    };
    let report = StubEmitter::new(ctx.config.paths.sub_dir.clone(), layout)
        .emit(&users)
        .map_err(map_emit_error)?;
    render_emit_report("subscription stubs", &report, ctx.output)
}
