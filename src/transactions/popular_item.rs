//! Popular-Item: the largest-quantity items of a district's recent orders.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::model::CustomerName;
use crate::storage::{Result, StorageClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularItemRequest {
    pub warehouse_id: u32,
    pub district_id: u32,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularLine {
    pub item_id: u32,
    pub item_name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopularOrder {
    pub order_id: u32,
    pub entry_d: DateTime<Utc>,
    pub customer_name: CustomerName,
    /// Every line sharing the order's maximum quantity.
    pub popular: Vec<PopularLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemPopularity {
    pub item_id: u32,
    pub item_name: String,
    /// Orders containing the item, as a percentage of the requested window.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopularItemOutput {
    pub warehouse_id: u32,
    pub district_id: u32,
    pub order_count: usize,
    pub orders: Vec<PopularOrder>,
    pub items: Vec<ItemPopularity>,
}

pub async fn execute(
    store: &dyn StorageClient,
    request: &PopularItemRequest,
) -> Result<PopularItemOutput> {
    let recent = store
        .recent_orders(request.warehouse_id, request.district_id, request.order_count)
        .await?;

    let mut orders = Vec::with_capacity(recent.len());
    let mut order_items: Vec<HashSet<u32>> = Vec::with_capacity(recent.len());
    let mut seen = HashSet::new();
    let mut popular_items: Vec<(u32, String)> = Vec::new();

    for order in recent {
        let lines = store.order_lines(order.key).await?;
        let max_quantity = lines.iter().map(|line| line.quantity).max();
        let popular: Vec<PopularLine> = lines
            .iter()
            .filter(|line| Some(line.quantity) == max_quantity)
            .map(|line| PopularLine {
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                quantity: line.quantity,
            })
            .collect();

        for line in &popular {
            if seen.insert(line.item_id) {
                popular_items.push((line.item_id, line.item_name.clone()));
            }
        }
        order_items.push(lines.iter().map(|line| line.item_id).collect());
        orders.push(PopularOrder {
            order_id: order.key.order_id,
            entry_d: order.entry_d,
            customer_name: order.customer_name,
            popular,
        });
    }

    // Percentages are relative to the requested window even when the
    // district holds fewer orders. An empty window yields no items.
    let window = Decimal::from(request.order_count);
    let items = popular_items
        .into_iter()
        .map(|(item_id, item_name)| {
            let frequency = order_items
                .iter()
                .filter(|items| items.contains(&item_id))
                .count();
            ItemPopularity {
                item_id,
                item_name,
                percentage: Decimal::from(frequency * 100) / window,
            }
        })
        .collect();

    Ok(PopularItemOutput {
        warehouse_id: request.warehouse_id,
        district_id: request.district_id,
        order_count: request.order_count,
        orders,
        items,
    })
}

impl fmt::Display for PopularItemOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "WId: {} DId: {}", self.warehouse_id, self.district_id)?;
        writeln!(f, "number of orders been examined: {}", self.order_count)?;
        for order in &self.orders {
            writeln!(f, "order Id: {}", order.order_id)?;
            writeln!(f, "entry date and time: {}", order.entry_d)?;
            writeln!(f, "customer name: {}", order.customer_name)?;
            for line in &order.popular {
                writeln!(f, "item name: {}", line.item_name)?;
                writeln!(f, "item quantity: {}", line.quantity)?;
            }
        }
        for item in &self.items {
            writeln!(f, "popular item percentage:")?;
            writeln!(f, "item name: {}", item.item_name)?;
            writeln!(f, "percentage: {:.2}", item.percentage)?;
        }
        Ok(())
    }
}
