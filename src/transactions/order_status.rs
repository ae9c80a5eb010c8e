//! Order-Status: a customer's balance and the lines of their last order.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::model::{CustomerKey, CustomerName, OrderKey};
use crate::storage::{Result, StorageClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStatusRequest {
    pub warehouse_id: u32,
    pub district_id: u32,
    pub customer_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusLine {
    pub item_id: u32,
    pub supply_warehouse_id: u32,
    pub quantity: i32,
    pub amount: Decimal,
    pub delivery_d: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusOutput {
    pub name: CustomerName,
    pub balance: Decimal,
    pub last_order_id: Option<u32>,
    pub last_order_entry: Option<DateTime<Utc>>,
    pub last_carrier_id: Option<i32>,
    pub lines: Vec<OrderStatusLine>,
}

pub async fn execute(
    store: &dyn StorageClient,
    request: &OrderStatusRequest,
) -> Result<OrderStatusOutput> {
    let customer = store
        .customer(CustomerKey::new(
            request.warehouse_id,
            request.district_id,
            request.customer_id,
        ))
        .await?;

    let mut lines = Vec::new();
    if let Some(order_id) = customer.last_order_id {
        let order = OrderKey::new(request.warehouse_id, request.district_id, order_id);
        for number in store.order_line_numbers(order).await? {
            let line = store.order_line(order, number).await?;
            lines.push(OrderStatusLine {
                item_id: line.item_id,
                supply_warehouse_id: line.supply_warehouse_id,
                quantity: line.quantity,
                amount: line.amount,
                delivery_d: line.delivery_d,
            });
        }
    }

    Ok(OrderStatusOutput {
        name: customer.name,
        balance: customer.balance,
        last_order_id: customer.last_order_id,
        last_order_entry: customer.last_order_entry,
        last_carrier_id: customer.last_carrier_id,
        lines,
    })
}

fn or_none<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

impl fmt::Display for OrderStatusOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Customer's first name is: {}, middle name is: {}, last name is: {}.",
            self.name.first, self.name.middle, self.name.last
        )?;
        writeln!(f, "Customer's balance is: {}.", self.balance)?;
        writeln!(f, "Last order number is: {}.", or_none(&self.last_order_id))?;
        writeln!(
            f,
            "Last order entry date and time is: {}.",
            or_none(&self.last_order_entry)
        )?;
        writeln!(
            f,
            "Last order carrier identifier is: {}.",
            or_none(&self.last_carrier_id)
        )?;
        writeln!(f, "=======Item Info is below.======")?;
        for line in &self.lines {
            writeln!(f, "Item number: {}", line.item_id)?;
            writeln!(f, "Supplying warehouse number: {}", line.supply_warehouse_id)?;
            writeln!(f, "Quantity ordered: {}", line.quantity)?;
            writeln!(f, "Total price for ordered item: {}", line.amount)?;
            writeln!(f, "Data and time of delivery: {}", or_none(&line.delivery_d))?;
        }
        Ok(())
    }
}
