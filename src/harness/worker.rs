//! Client worker: one simulated client with its own store session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::fs::File;
use tokio::io::BufReader;
use tracing::{debug, error, info};

use crate::router::{dispatch, InstructionReader, ParseError};
use crate::storage::{SessionOptions, StorageError, StoreConnector};

/// Errors that terminate a single worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Failed to open store session: {0}")]
    Connect(#[source] StorageError),

    #[error("Cannot open instruction source {}: {source}", path.display())]
    Source {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error at line {line}: {source}")]
    Parse { line: usize, source: ParseError },

    #[error("Store error at line {line}: {source}")]
    Storage { line: usize, source: StorageError },
}

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Counters of a worker that ran its source to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerResult {
    pub index: usize,
    pub transactions: u64,
    pub elapsed: Duration,
}

impl WorkerResult {
    /// Transactions per second. Zero when no time elapsed.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.transactions as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    Completed(WorkerResult),
    Failed { index: usize, reason: String },
}

impl WorkerOutcome {
    pub fn index(&self) -> usize {
        match self {
            WorkerOutcome::Completed(result) => result.index,
            WorkerOutcome::Failed { index, .. } => *index,
        }
    }
}

pub struct ClientWorker {
    index: usize,
    source: PathBuf,
    options: SessionOptions,
    connector: Arc<dyn StoreConnector>,
    echo: bool,
    state: WorkerState,
}

impl ClientWorker {
    pub fn new(
        index: usize,
        source: PathBuf,
        options: SessionOptions,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        Self {
            index,
            source,
            options,
            connector,
            echo: false,
            state: WorkerState::Idle,
        }
    }

    /// Log every transaction output at info level.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Run the instruction source to completion.
    pub async fn run(&mut self) -> WorkerOutcome {
        self.state = WorkerState::Running;
        info!(worker = self.index, source = %self.source.display(), "Client worker started");

        match self.execute().await {
            Ok(result) => {
                self.state = WorkerState::Completed;
                info!(
                    worker = self.index,
                    transactions = result.transactions,
                    elapsed_secs = result.elapsed.as_secs_f64(),
                    "Client worker completed"
                );
                WorkerOutcome::Completed(result)
            }
            Err(e) => {
                self.state = WorkerState::Failed;
                error!(worker = self.index, error = %e, "Client worker failed");
                WorkerOutcome::Failed {
                    index: self.index,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn execute(&self) -> Result<WorkerResult, WorkerError> {
        let store = self
            .connector
            .connect(&self.options)
            .await
            .map_err(WorkerError::Connect)?;
        let file = File::open(&self.source)
            .await
            .map_err(|source| WorkerError::Source {
                path: self.source.clone(),
                source,
            })?;
        let mut reader = InstructionReader::new(BufReader::new(file));

        let mut transactions = 0u64;
        let start = Instant::now();
        loop {
            let instruction = match reader.next_instruction().await {
                Ok(Some(instruction)) => instruction,
                Ok(None) => break,
                Err(source) => {
                    return Err(WorkerError::Parse {
                        line: reader.line_number(),
                        source,
                    })
                }
            };
            let output = dispatch(store.as_ref(), &instruction)
                .await
                .map_err(|source| WorkerError::Storage {
                    line: reader.line_number(),
                    source,
                })?;
            transactions += 1;

            if self.echo {
                info!(worker = self.index, kind = output.kind(), "\n{output}");
            } else {
                debug!(worker = self.index, kind = output.kind(), "\n{output}");
            }
        }

        Ok(WorkerResult {
            index: self.index,
            transactions,
            elapsed: start.elapsed(),
        })
    }
}
