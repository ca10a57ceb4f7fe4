//! Thin entrypoint delegating to [`boxforge_cli::run`].

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = boxforge_cli::run().await;
    process::exit(exit_code);
}
