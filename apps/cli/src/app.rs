//! Wires the concrete clients into a [`RunController`].

use std::sync::Arc;

use folderpush_bot_api::BotApiClient;
use folderpush_ledger::{ErrorLog, Ledger};
use folderpush_uploader::{RunController, RunSummary, StreamConnector};
use indicatif::MultiProgress;

use crate::config::RunConfig;
use crate::terminal::TerminalReporter;

/// Runs one upload pass over `config.source_dir`.
pub async fn run(config: &RunConfig, multi: MultiProgress) -> anyhow::Result<RunSummary> {
    let ledger = Ledger::load(&config.upload_log)?;
    tracing::info!(
        ledger = %config.upload_log.display(),
        entries = ledger.len(),
        "ledger loaded"
    );
    let error_log = ErrorLog::new(&config.error_log);

    let connector = Arc::new(StreamConnector::new(&config.stream_endpoint));
    let document_api = BotApiClient::new(&config.bot_api_url, &config.credentials.bot_token)?;

    let controller = RunController::new(
        connector,
        config.credentials.clone(),
        config.settings(),
        ledger,
        error_log,
    )
    .with_document_api(Arc::new(document_api))
    .with_reporter(Arc::new(TerminalReporter::new(multi)));

    Ok(controller.run(&config.source_dir).await?)
}
