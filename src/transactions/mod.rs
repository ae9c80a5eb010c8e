//! Transaction handlers.
//!
//! Each handler is a bounded sequence of point reads and writes against a
//! [`StorageClient`](crate::storage::StorageClient). None of them is atomic:
//! a failed store call leaves earlier writes of the same transaction in
//! place.

use std::fmt;

pub mod delivery;
pub mod new_order;
pub mod order_status;
pub mod payment;
pub mod popular_item;
pub mod stock_level;
pub mod top_balance;

pub use delivery::{DeliveryOutput, DeliveryRequest};
pub use new_order::{NewOrderOutput, NewOrderRequest, OrderItem};
pub use order_status::{OrderStatusOutput, OrderStatusRequest};
pub use payment::{PaymentOutput, PaymentRequest};
pub use popular_item::{PopularItemOutput, PopularItemRequest};
pub use stock_level::{StockLevelOutput, StockLevelRequest};
pub use top_balance::TopBalanceOutput;

/// Result of any one transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutput {
    NewOrder(NewOrderOutput),
    Payment(PaymentOutput),
    Delivery(DeliveryOutput),
    OrderStatus(OrderStatusOutput),
    StockLevel(StockLevelOutput),
    PopularItem(PopularItemOutput),
    TopBalance(TopBalanceOutput),
}

impl TransactionOutput {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionOutput::NewOrder(_) => "new-order",
            TransactionOutput::Payment(_) => "payment",
            TransactionOutput::Delivery(_) => "delivery",
            TransactionOutput::OrderStatus(_) => "order-status",
            TransactionOutput::StockLevel(_) => "stock-level",
            TransactionOutput::PopularItem(_) => "popular-item",
            TransactionOutput::TopBalance(_) => "top-balance",
        }
    }
}

impl fmt::Display for TransactionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutput::NewOrder(out) => fmt::Display::fmt(out, f),
            TransactionOutput::Payment(out) => fmt::Display::fmt(out, f),
            TransactionOutput::Delivery(out) => fmt::Display::fmt(out, f),
            TransactionOutput::OrderStatus(out) => fmt::Display::fmt(out, f),
            TransactionOutput::StockLevel(out) => fmt::Display::fmt(out, f),
            TransactionOutput::PopularItem(out) => fmt::Display::fmt(out, f),
            TransactionOutput::TopBalance(out) => fmt::Display::fmt(out, f),
        }
    }
}

#[cfg(test)]
mod tests;
