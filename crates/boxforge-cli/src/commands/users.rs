use std::fmt::Write as _;

use anyhow::Context;
use boxforge_data::NewUser;
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cli::{IdArgs, UserAddArgs, UserImportArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::render_users;

const SUB_TOKEN_BYTES: usize = 25;

/// One entry of a bulk import file.
#[derive(Debug, Deserialize)]
struct ImportedUser {
    name: String,
    uuid: String,
    sub: String,
    #[serde(default)]
    active: bool,
}

pub(crate) fn generate_sub_token() -> String {
    let mut bytes = [0_u8; SUB_TOKEN_BYTES];
    rand::rng().fill(&mut bytes[..]);
    bytes
        .iter()
        .fold(String::with_capacity(SUB_TOKEN_BYTES * 2), |mut token, byte| {
            let _ = write!(token, "{byte:02x}");
            token
        })
}

pub(crate) async fn handle_user_add(ctx: &AppContext, args: UserAddArgs) -> CliResult<()> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::validation("user name must not be empty"));
    }

    let user = NewUser {
        name: name.to_string(),
        uuid: args.uuid.unwrap_or_else(|| Uuid::new_v4().to_string()),
        sub: args.sub.unwrap_or_else(generate_sub_token),
        active: !args.inactive,
    };
    let id = ctx
        .store
        .insert_user(&user)
        .await
        .with_context(|| format!("failed to add user {}", user.name))
        .map_err(CliError::failure)?;

    info!(id, user = %user.name, "user added");
    println!("User {} added (id {id}). UUID: {}", user.name, user.uuid);
    Ok(())
}

pub(crate) async fn handle_user_import(ctx: &AppContext, args: UserImportArgs) -> CliResult<()> {
    let payload = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))
        .map_err(CliError::failure)?;
    let users: Vec<ImportedUser> = serde_json::from_str(&payload).map_err(|err| {
        CliError::validation(format!("import file is not a JSON array of users: {err}"))
    })?;

    let total = users.len();
    let mut imported = 0_usize;
    for user in users {
        let row = NewUser {
            name: user.name,
            uuid: user.uuid,
            sub: user.sub,
            active: user.active,
        };
        match ctx.store.insert_user(&row).await {
            Ok(id) => {
                imported += 1;
                info!(id, user = %row.name, "user imported");
            }
            Err(err) => warn!(user = %row.name, error = ?err, "failed to import user"),
        }
    }

    println!("Imported {imported} of {total} users.");
    Ok(())
}

pub(crate) async fn handle_user_list(ctx: &AppContext) -> CliResult<()> {
    let users = ctx
        .store
        .list_users()
        .await
        .context("failed to list users")
        .map_err(CliError::failure)?;
    render_users(&users, ctx.output)
}

pub(crate) async fn handle_user_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let deleted = ctx
        .store
        .delete_user(args.id)
        .await
        .context("failed to delete user")
        .map_err(CliError::failure)?;
    if deleted {
        println!("User {} deleted.", args.id);
    } else {
        println!("No user found with id {}.", args.id);
    }
    Ok(())
}

pub(crate) async fn handle_user_set_active(
    ctx: &AppContext,
    args: IdArgs,
    active: bool,
) -> CliResult<()> {
    let updated = ctx
        .store
        .set_user_active(args.id, active)
        .await
        .context("failed to update user")
        .map_err(CliError::failure)?;
    if !updated {
        return Err(CliError::validation(format!("no user found with id {}", args.id)));
    }
    let state = if active { "activated" } else { "deactivated" };
    println!("User {} {state}.", args.id);
    Ok(())
}
