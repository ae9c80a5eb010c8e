//! Stock-Level: items of recent orders whose stock fell below a threshold.

use std::collections::HashSet;
use std::fmt;

use crate::storage::{Result, StorageClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevelRequest {
    pub warehouse_id: u32,
    pub district_id: u32,
    pub threshold: i32,
    /// How many of the most recent orders to examine.
    pub last_orders: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowStockItem {
    pub item_id: u32,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevelOutput {
    pub warehouse_id: u32,
    /// Distinct items whose stock was read.
    pub items_checked: usize,
    pub low_stock: Vec<LowStockItem>,
}

/// Each distinct item is read once, however many recent orders carry it.
pub async fn execute(
    store: &dyn StorageClient,
    request: &StockLevelRequest,
) -> Result<StockLevelOutput> {
    let orders = store
        .recent_orders(request.warehouse_id, request.district_id, request.last_orders)
        .await?;

    let mut seen = HashSet::new();
    let mut item_ids = Vec::new();
    for order in &orders {
        for line in store.order_lines(order.key).await? {
            if seen.insert(line.item_id) {
                item_ids.push(line.item_id);
            }
        }
    }

    let mut low_stock = Vec::new();
    for &item_id in &item_ids {
        let stock = store.stock(request.warehouse_id, item_id).await?;
        if stock.quantity < request.threshold {
            low_stock.push(LowStockItem {
                item_id,
                quantity: stock.quantity,
            });
        }
    }

    Ok(StockLevelOutput {
        warehouse_id: request.warehouse_id,
        items_checked: item_ids.len(),
        low_stock,
    })
}

impl fmt::Display for StockLevelOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.low_stock {
            writeln!(
                f,
                "Items {} stock quantity at {} is below the threshold; its quantity number is: {}.",
                item.item_id, self.warehouse_id, item.quantity
            )?;
        }
        Ok(())
    }
}
