//! Shared fixtures for the end-to-end harness tests.

#![allow(dead_code)]

use std::path::Path;

use wholesale::config::Config;
use wholesale::model::OrderKey;
use wholesale::storage::{StorageClient, StoreLoader};
use wholesale::test_utils;

pub const ITEMS: u32 = 10;
pub const CUSTOMERS_PER_DISTRICT: u32 = 5;

/// Items plus warehouses 1 and 2.
pub async fn seed(loader: &dyn StoreLoader) {
    test_utils::seed_items(loader, ITEMS).await.unwrap();
    for warehouse_id in 1..=2 {
        test_utils::seed_warehouse(loader, warehouse_id, CUSTOMERS_PER_DISTRICT, ITEMS)
            .await
            .unwrap();
    }
}

/// Harness config reading instruction files from `dir`.
pub fn config_for(dir: &Path, clients: usize) -> Config {
    let mut config = Config::default();
    config.harness.clients = clients;
    config.harness.xact_dir = dir.join("xact");
    config.harness.report_path = dir.join("performanceMeasurement.txt");
    config
}

/// Write worker `index`'s instruction file.
pub fn write_source(config: &Config, index: usize, records: &[String]) {
    std::fs::create_dir_all(&config.harness.xact_dir).unwrap();
    let mut contents = records.join("\n");
    contents.push('\n');
    std::fs::write(config.harness.xact_dir.join(format!("{index}.txt")), contents).unwrap();
}

/// A New-Order record with its item block.
pub fn new_order(customer_id: u32, warehouse_id: u32, district_id: u32, items: &[(u32, u32, i32)]) -> String {
    let mut record = format!("N,{customer_id},{warehouse_id},{district_id},{}", items.len());
    for (item_id, supply_warehouse_id, quantity) in items {
        record.push_str(&format!("\n{item_id},{supply_warehouse_id},{quantity}"));
    }
    record
}

/// Both order indexes hold the same row for every order `1..=count`.
pub async fn assert_order_indexes_agree(
    session: &dyn StorageClient,
    warehouse_id: u32,
    district_id: u32,
    count: u32,
) {
    for order_id in 1..=count {
        let key = OrderKey::new(warehouse_id, district_id, order_id);
        let by_id = session
            .order_by_id(key)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("order {order_id} missing"));
        let by_recency = session
            .order_by_recency(key, by_id.entry_d)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("order {order_id} missing from recency index"));
        assert_eq!(by_id, by_recency);
    }
}
