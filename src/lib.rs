//! Wholesale - multi-warehouse wholesale workload driver
//!
//! Runs a TPC-C style mix of seven transactions against a denormalized,
//! partitioned store with no multi-row transactions, from many concurrent
//! clients, and reports per-client and aggregate throughput.

pub mod config;
pub mod harness;
pub mod model;
pub mod router;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transactions;
pub mod utils;
