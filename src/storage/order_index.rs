//! Dual-index order writes.
//!
//! Orders are materialized twice, keyed by identity and by recency. Both
//! copies carry the same payload and are only ever written together through
//! [`OrderIndexWriter`], so an atomic batch primitive can later replace the
//! two calls without touching the handlers.

use tracing::debug;

use super::{Result, StorageClient, StorageError};
use crate::model::Order;

/// Writes one logical order to both order indexes.
pub struct OrderIndexWriter<'a> {
    store: &'a dyn StorageClient,
}

impl<'a> OrderIndexWriter<'a> {
    pub fn new(store: &'a dyn StorageClient) -> Self {
        Self { store }
    }

    /// Insert a new order into both indexes.
    pub async fn insert(&self, order: &Order) -> Result<()> {
        self.write(order).await
    }

    /// Assign a carrier and write the delivered order to both indexes.
    ///
    /// Returns the updated row so callers keep working with the same payload
    /// that was written. Negative carrier ids are rejected: an order carrying
    /// the undelivered sentinel would be delivered again.
    pub async fn assign_carrier(&self, order: &Order, carrier_id: i32) -> Result<Order> {
        if carrier_id < 0 {
            return Err(StorageError::Rejected {
                operation: "assign_carrier",
            });
        }
        let mut delivered = order.clone();
        delivered.carrier_id = carrier_id;
        self.write(&delivered).await?;
        Ok(delivered)
    }

    async fn write(&self, order: &Order) -> Result<()> {
        debug!(
            warehouse_id = order.key.warehouse_id,
            district_id = order.key.district_id,
            order_id = order.key.order_id,
            carrier_id = order.carrier_id,
            "Writing order indexes"
        );
        self.store.put_order_by_id(order).await?;
        self.store.put_order_by_recency(order).await?;
        Ok(())
    }
}
