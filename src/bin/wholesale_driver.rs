//! wholesale-driver: run the configured client workers and write the
//! throughput report.
//!
//! ## Configuration
//! ```yaml
//! store:
//!   type: sqlite
//!   consistency: quorum
//!   sqlite:
//!     path: data/wholesale.db
//!
//! harness:
//!   clients: 8
//!   xact_dir: xact
//!   report_path: performanceMeasurement.txt
//! ```

use tracing::{error, info};

use wholesale::config::Config;
use wholesale::harness;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    wholesale::utils::bootstrap::init_tracing();

    let config_path = wholesale::utils::bootstrap::parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        clients = config.harness.clients,
        store = ?config.store.store_type,
        consistency = %config.store.consistency,
        "Starting wholesale-driver"
    );

    let report = harness::run_from_config(&config).await.map_err(|e| {
        error!("Driver run failed: {}", e);
        e
    })?;

    print!("{report}");
    Ok(())
}
