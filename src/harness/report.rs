//! Throughput report.

use std::fmt;
use std::path::Path;

use super::worker::{WorkerOutcome, WorkerResult};

/// Per-client and aggregate throughput of one harness run.
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputReport {
    completed: Vec<WorkerResult>,
    failed: Vec<(usize, String)>,
}

impl ThroughputReport {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = WorkerOutcome>) -> Self {
        let mut completed = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                WorkerOutcome::Completed(result) => completed.push(result),
                WorkerOutcome::Failed { index, reason } => failed.push((index, reason)),
            }
        }
        completed.sort_by_key(|r| r.index);
        failed.sort_by_key(|(index, _)| *index);
        Self { completed, failed }
    }

    pub fn completed(&self) -> &[WorkerResult] {
        &self.completed
    }

    /// `(index, reason)` of every failed worker.
    pub fn failed(&self) -> &[(usize, String)] {
        &self.failed
    }

    pub fn total_transactions(&self) -> u64 {
        self.completed.iter().map(|r| r.transactions).sum()
    }

    /// Mean of the per-client throughputs.
    pub fn average_throughput(&self) -> Option<f64> {
        if self.completed.is_empty() {
            return None;
        }
        let sum: f64 = self.completed.iter().map(WorkerResult::throughput).sum();
        Some(sum / self.completed.len() as f64)
    }

    /// Slowest client; the lowest index wins ties.
    pub fn min_client(&self) -> Option<&WorkerResult> {
        self.completed
            .iter()
            .min_by(|a, b| a.throughput().total_cmp(&b.throughput()))
    }

    /// Fastest client; the lowest index wins ties.
    pub fn max_client(&self) -> Option<&WorkerResult> {
        self.completed
            .iter()
            .rev()
            .max_by(|a, b| a.throughput().total_cmp(&b.throughput()))
    }

    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.to_string()).await
    }
}

impl fmt::Display for ThroughputReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.average_throughput(), self.min_client(), self.max_client()) {
            (Some(average), Some(min), Some(max)) => {
                writeln!(f, "Average transaction throughput is: {average}")?;
                writeln!(
                    f,
                    "Minimum transaction throughput is Client with index: {} with throughput: {}",
                    min.index,
                    min.throughput()
                )?;
                writeln!(
                    f,
                    "Maximum transaction throughput is Client with index: {} with throughput: {}",
                    max.index,
                    max.throughput()
                )?;
            }
            _ => writeln!(f, "No client completed.")?,
        }
        writeln!(f)?;

        for result in &self.completed {
            writeln!(f, "Performance measure for client with index: {}", result.index)?;
            writeln!(f, "Transaction count: {}", result.transactions)?;
            writeln!(
                f,
                "Total transaction execution time: {}",
                result.elapsed.as_secs_f64()
            )?;
            writeln!(f, "Transaction throughput: {}", result.throughput())?;
            writeln!(f)?;
        }

        for (index, reason) in &self.failed {
            writeln!(f, "Client with index: {index} failed: {reason}")?;
        }
        Ok(())
    }
}
