//! Concurrent client harness.
//!
//! Spawns one task per client worker, waits for all of them and reduces
//! their results into a [`ThroughputReport`]. Workers share nothing but the
//! store connector.

mod report;
mod worker;

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info};

pub use report::ThroughputReport;
pub use worker::{ClientWorker, WorkerError, WorkerOutcome, WorkerResult, WorkerState};

use crate::config::{Config, HarnessConfig, StoreConfig};
use crate::storage::{init_store, SessionOptions, StorageError, StoreConnector};

/// Errors that abort a whole harness run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Store error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Harness {
    harness: HarnessConfig,
    store: StoreConfig,
    connector: Arc<dyn StoreConnector>,
}

impl Harness {
    pub fn new(config: &Config, connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            harness: config.harness.clone(),
            store: config.store.clone(),
            connector,
        }
    }

    /// Workers numbered from 1, worker `i` reading `{xact_dir}/{i}.txt`.
    pub fn workers(&self) -> Vec<ClientWorker> {
        (1..=self.harness.clients)
            .map(|index| {
                ClientWorker::new(
                    index,
                    self.harness.xact_dir.join(format!("{index}.txt")),
                    SessionOptions::for_worker(&self.store, index),
                    Arc::clone(&self.connector),
                )
                .with_echo(self.harness.echo_results)
            })
            .collect()
    }

    /// Run every worker concurrently and aggregate their results.
    pub async fn run(&self) -> ThroughputReport {
        info!(clients = self.harness.clients, "Starting client workers");

        let workers = self.workers();
        let indexes: Vec<usize> = workers.iter().map(ClientWorker::index).collect();
        let tasks = workers
            .into_iter()
            .map(|mut worker| tokio::spawn(async move { worker.run().await }));

        let outcomes = join_all(tasks)
            .await
            .into_iter()
            .zip(indexes)
            .map(|(joined, index)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(worker = index, error = %e, "Client worker task panicked");
                    WorkerOutcome::Failed {
                        index,
                        reason: format!("task panicked: {e}"),
                    }
                }
            });

        let report = ThroughputReport::from_outcomes(outcomes);
        info!(
            completed = report.completed().len(),
            failed = report.failed().len(),
            transactions = report.total_transactions(),
            "All client workers finished"
        );
        report
    }
}

/// Open the configured store, run the harness and write the report.
pub async fn run_from_config(config: &Config) -> Result<ThroughputReport, HarnessError> {
    let connector = init_store(&config.store).await?;
    let report = Harness::new(config, connector).run().await;
    report.write_to(&config.harness.report_path).await?;
    info!(path = %config.harness.report_path.display(), "Report written");
    Ok(report)
}
