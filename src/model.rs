//! Schema model for the wholesale-distribution tables.
//!
//! Typed views over the six denormalized tables (warehouse, district,
//! customer, item, stock, order-line), the two redundant order indexes and
//! the derived balance index. Rows are decoded into these structs once at the
//! store boundary; handlers never see untyped rows.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Every warehouse owns exactly this many districts, numbered from 1.
pub const DISTRICTS_PER_WAREHOUSE: u32 = 10;

/// Carrier id stored on orders that have not been delivered yet.
pub const UNDELIVERED_CARRIER_ID: i32 = -1;

/// Stock below this level after an order is replenished.
pub const STOCK_REPLENISH_THRESHOLD: i32 = 10;

/// Quantity added on each replenishment.
pub const STOCK_REPLENISH_AMOUNT: i32 = 100;

/// Apply an order of `requested` units to a stock level of `current`.
///
/// The result is replenished by [`STOCK_REPLENISH_AMOUNT`] until it is back
/// at or above [`STOCK_REPLENISH_THRESHOLD`].
pub fn adjust_stock_quantity(current: i32, requested: i32) -> i32 {
    let mut adjusted = current - requested;
    while adjusted < STOCK_REPLENISH_THRESHOLD {
        adjusted += STOCK_REPLENISH_AMOUNT;
    }
    adjusted
}

/// Postal address shared by warehouses, districts and customers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street_1: String,
    pub street_2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Street({} {}) City({}) State({}) Zip({})",
            self.street_1, self.street_2, self.city, self.state, self.zip
        )
    }
}

/// Customer name, denormalized onto both order indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerName {
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.first, self.middle, self.last)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Warehouse {
    pub id: u32,
    pub name: String,
    pub address: Address,
    pub tax: Decimal,
    /// Year-to-date revenue. Only ever increased, by Payment.
    pub ytd: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub warehouse_id: u32,
    pub id: u32,
    pub name: String,
    pub address: Address,
    pub tax: Decimal,
    pub ytd: Decimal,
    /// Next order id to hand out. Advanced by exactly one per New-Order.
    pub next_order_id: u32,
}

/// Composite key of a customer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomerKey {
    pub warehouse_id: u32,
    pub district_id: u32,
    pub customer_id: u32,
}

impl CustomerKey {
    pub fn new(warehouse_id: u32, district_id: u32, customer_id: u32) -> Self {
        Self {
            warehouse_id,
            district_id,
            customer_id,
        }
    }
}

impl fmt::Display for CustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.warehouse_id, self.district_id, self.customer_id
        )
    }
}

/// Customer row.
///
/// `balance` is credited by Delivery and debited by Payment. Reports key off
/// this exact arithmetic, so it must not be flipped to ledger convention.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub key: CustomerKey,
    pub name: CustomerName,
    pub address: Address,
    pub phone: String,
    pub since: DateTime<Utc>,
    pub credit: String,
    pub credit_limit: Decimal,
    pub discount: Decimal,
    pub balance: Decimal,
    pub ytd_payment: Decimal,
    pub payment_count: u32,
    pub delivery_count: u32,
    pub data: String,
    pub last_order_id: Option<u32>,
    pub last_order_entry: Option<DateTime<Utc>>,
    pub last_carrier_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub price: Decimal,
    pub image_id: u32,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub warehouse_id: u32,
    pub item_id: u32,
    pub quantity: i32,
    pub ytd: i64,
    pub order_count: u32,
    pub remote_count: u32,
    /// One descriptor per district, index 0 is district 1.
    pub dist_info: [String; DISTRICTS_PER_WAREHOUSE as usize],
    pub data: String,
}

impl Stock {
    /// Descriptor string for a district, empty for ids outside 1..=10.
    pub fn dist_info(&self, district_id: u32) -> &str {
        district_id
            .checked_sub(1)
            .and_then(|idx| self.dist_info.get(idx as usize))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Mutable stock counters written back by New-Order.
#[derive(Debug, Clone, PartialEq)]
pub struct StockUpdate {
    pub warehouse_id: u32,
    pub item_id: u32,
    pub quantity: i32,
    pub ytd: i64,
    pub order_count: u32,
    pub remote_count: u32,
}

/// Identity of an order within its district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub warehouse_id: u32,
    pub district_id: u32,
    pub order_id: u32,
}

impl OrderKey {
    pub fn new(warehouse_id: u32, district_id: u32, order_id: u32) -> Self {
        Self {
            warehouse_id,
            district_id,
            order_id,
        }
    }
}

/// Order row as materialized in both the identity and the recency index.
///
/// The two copies must stay value-identical; write them through
/// [`crate::storage::OrderIndexWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub key: OrderKey,
    pub customer_id: u32,
    pub entry_d: DateTime<Utc>,
    /// [`UNDELIVERED_CARRIER_ID`] until Delivery assigns a carrier.
    pub carrier_id: i32,
    pub line_count: u32,
    pub all_local: bool,
    pub customer_name: CustomerName,
}

impl Order {
    pub fn is_delivered(&self) -> bool {
        self.carrier_id != UNDELIVERED_CARRIER_ID
    }

    pub fn customer_key(&self) -> CustomerKey {
        CustomerKey::new(
            self.key.warehouse_id,
            self.key.district_id,
            self.customer_id,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub order: OrderKey,
    /// 1-based line number within the order.
    pub number: u32,
    pub item_id: u32,
    pub item_name: String,
    pub supply_warehouse_id: u32,
    pub quantity: i32,
    pub amount: Decimal,
    pub delivery_d: Option<DateTime<Utc>>,
    pub dist_info: String,
}

/// Row of the derived balance index. Never authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEntry {
    pub customer: CustomerKey,
    pub balance: Decimal,
}
