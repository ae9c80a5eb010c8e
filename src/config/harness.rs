//! Client harness configuration.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Number of concurrent client workers.
    pub clients: usize,
    /// Directory holding one `<n>.txt` instruction file per worker, from 1.
    pub xact_dir: PathBuf,
    /// Where the throughput report is written.
    pub report_path: PathBuf,
    /// Log each transaction's output at info instead of debug.
    pub echo_results: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            clients: 1,
            xact_dir: PathBuf::from("xact"),
            report_path: PathBuf::from("performanceMeasurement.txt"),
            echo_results: false,
        }
    }
}
