use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;
use wishlane_client::{
    init_tracing, shell, AssignmentController, ClientConfig, ClientContext, NoticeSink, Session,
};
use wishlane_shared::constants::APP_NAME;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::from_env();
    info!(app = APP_NAME, db = ?config.database_path, "starting");

    // no sign-in flow in the terminal; the demo owner is used
    let session = Arc::new(Session::new());
    let ctx = ClientContext::open(config, session).context("failed to open client context")?;

    let (tx, rx) = mpsc::unbounded_channel();
    let notices: Arc<dyn NoticeSink> = Arc::new(tx);
    let mut controller = AssignmentController::mount_for_context(ctx, notices);

    let stdin = BufReader::new(tokio::io::stdin());
    let outcome = shell::run(&mut controller, stdin, rx).await;

    controller.unmount();
    info!("bye");
    outcome
}
