//! Top-Balance: the ten customers with the highest balance.

use std::fmt;

use rust_decimal::Decimal;

use crate::model::CustomerName;
use crate::storage::{Result, StorageClient};

/// Rows reported by Top-Balance.
pub const TOP_BALANCE_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct TopBalanceRow {
    pub name: CustomerName,
    pub balance: Decimal,
    pub warehouse_id: u32,
    pub district_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopBalanceOutput {
    pub rows: Vec<TopBalanceRow>,
}

/// Ranks from the derived balance index, then resolves names from the
/// customer table. Fewer than ten customers yields fewer rows.
pub async fn execute(store: &dyn StorageClient) -> Result<TopBalanceOutput> {
    let entries = store.top_balances(TOP_BALANCE_LIMIT).await?;

    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let customer = store.customer(entry.customer).await?;
        rows.push(TopBalanceRow {
            name: customer.name,
            balance: entry.balance,
            warehouse_id: entry.customer.warehouse_id,
            district_id: entry.customer.district_id,
        });
    }

    Ok(TopBalanceOutput { rows })
}

impl fmt::Display for TopBalanceOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "customer name: {}", row.name)?;
            writeln!(f, "customer balance: {}", row.balance)?;
            writeln!(f, "WId: {} DId: {}", row.warehouse_id, row.district_id)?;
        }
        Ok(())
    }
}
