//! Delivery: deliver the oldest undelivered order of every district.

use std::fmt;

use chrono::{SubsecRound, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{CustomerKey, DISTRICTS_PER_WAREHOUSE};
use crate::storage::{OrderIndexWriter, Result, StorageClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub warehouse_id: u32,
    pub carrier_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredOrder {
    pub district_id: u32,
    pub order_id: u32,
    pub customer: CustomerKey,
    /// Sum of the order's line amounts, credited to the customer.
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutput {
    pub warehouse_id: u32,
    pub carrier_id: i32,
    pub delivered: Vec<DeliveredOrder>,
    /// Districts with no undelivered order.
    pub skipped_districts: Vec<u32>,
}

/// Attempts every district of the warehouse. A district with nothing to
/// deliver is skipped and the loop moves on to the next one.
pub async fn execute(
    store: &dyn StorageClient,
    request: &DeliveryRequest,
) -> Result<DeliveryOutput> {
    let carrier_id = request.carrier_id;
    let writer = OrderIndexWriter::new(store);
    let mut delivered = Vec::new();
    let mut skipped_districts = Vec::new();

    for district_id in 1..=DISTRICTS_PER_WAREHOUSE {
        let Some(order) = store
            .oldest_undelivered_order(request.warehouse_id, district_id)
            .await?
        else {
            debug!(
                warehouse_id = request.warehouse_id,
                district_id, "No undelivered order"
            );
            skipped_districts.push(district_id);
            continue;
        };

        let order = writer.assign_carrier(&order, carrier_id).await?;

        let delivery_d = Utc::now().trunc_subsecs(6);
        let mut amount = Decimal::ZERO;
        for line in store.order_lines(order.key).await? {
            store
                .update_order_line_delivery(order.key, line.number, delivery_d)
                .await?;
            amount += line.amount;
        }

        let customer_key = order.customer_key();
        let customer = store.customer(customer_key).await?;
        store
            .update_customer_delivery(
                customer_key,
                customer.balance + amount,
                customer.delivery_count + 1,
                carrier_id,
            )
            .await?;

        debug!(
            warehouse_id = request.warehouse_id,
            district_id,
            order_id = order.key.order_id,
            %amount,
            "Order delivered"
        );
        delivered.push(DeliveredOrder {
            district_id,
            order_id: order.key.order_id,
            customer: customer_key,
            amount,
        });
    }

    Ok(DeliveryOutput {
        warehouse_id: request.warehouse_id,
        carrier_id: request.carrier_id,
        delivered,
        skipped_districts,
    })
}

impl fmt::Display for DeliveryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Delivery for warehouse {} by carrier {}",
            self.warehouse_id, self.carrier_id
        )?;
        for order in &self.delivered {
            writeln!(
                f,
                "District {}: order {} delivered to customer {}, amount {}",
                order.district_id, order.order_id, order.customer, order.amount
            )?;
        }
        if !self.skipped_districts.is_empty() {
            let skipped: Vec<String> = self
                .skipped_districts
                .iter()
                .map(u32::to_string)
                .collect();
            writeln!(f, "No pending orders in districts: {}", skipped.join(", "))?;
        }
        Ok(())
    }
}
