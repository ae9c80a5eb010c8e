//! Store boundary.
//!
//! The transaction handlers talk to the data store only through
//! [`StorageClient`]: keyed point reads and point writes against the
//! partitioned tables, with no multi-row transaction primitive. Each client
//! worker opens its own session through a [`StoreConnector`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::config::{StoreConfig, StoreType};
use crate::model::{
    BalanceEntry, Customer, CustomerKey, District, Item, Order, OrderKey, OrderLine, Stock,
    StockUpdate, Warehouse,
};

pub mod memory;
mod order_index;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{MemorySession, MemoryStore};
pub use order_index::OrderIndexWriter;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteSession, SqliteStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Write rejected: {operation}")]
    Rejected { operation: &'static str },

    #[error("Invalid decimal in column {column}: {value:?}")]
    InvalidDecimal { column: &'static str, value: String },

    #[error("Invalid timestamp in column {column}: {value:?}")]
    InvalidTimestamp { column: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "sqlite")]
    #[error("Query build error: {0}")]
    Query(#[from] sea_query::error::Error),

    #[error("Unsupported store: {0}")]
    Unsupported(String),
}

impl StorageError {
    pub(crate) fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        StorageError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// How many replicas must acknowledge a read or write.
///
/// Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    One,
    #[default]
    Quorum,
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyLevel::One => write!(f, "ONE"),
            ConsistencyLevel::Quorum => write!(f, "QUORUM"),
        }
    }
}

/// Parameters for one worker's store session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub contact_point: Option<String>,
    pub keyspace: String,
    pub consistency: ConsistencyLevel,
}

impl SessionOptions {
    /// Session options for worker `index`, rotating over the contact points.
    pub fn for_worker(config: &StoreConfig, index: usize) -> Self {
        let contact_point = if config.contact_points.is_empty() {
            None
        } else {
            Some(config.contact_points[index % config.contact_points.len()].clone())
        };
        Self {
            contact_point,
            keyspace: config.keyspace.clone(),
            consistency: config.consistency,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            contact_point: None,
            keyspace: crate::config::DEFAULT_KEYSPACE.to_string(),
            consistency: ConsistencyLevel::default(),
        }
    }
}

/// Keyed reads and writes used by the transaction handlers.
///
/// Every method is a single-partition operation. Nothing here is atomic
/// across calls except [`StorageClient::allocate_order_id`], which relies on
/// the store's per-row increment.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Consistency level this session was opened with.
    fn consistency(&self) -> ConsistencyLevel;

    async fn warehouse(&self, warehouse_id: u32) -> Result<Warehouse>;

    async fn update_warehouse_ytd(&self, warehouse_id: u32, ytd: Decimal) -> Result<()>;

    async fn district(&self, warehouse_id: u32, district_id: u32) -> Result<District>;

    async fn update_district_ytd(&self, warehouse_id: u32, district_id: u32, ytd: Decimal)
        -> Result<()>;

    /// Hand out the district's next order id and advance the counter by one.
    async fn allocate_order_id(&self, warehouse_id: u32, district_id: u32) -> Result<u32>;

    async fn customer(&self, key: CustomerKey) -> Result<Customer>;

    async fn update_customer_payment(
        &self,
        key: CustomerKey,
        balance: Decimal,
        ytd_payment: Decimal,
        payment_count: u32,
    ) -> Result<()>;

    async fn update_customer_delivery(
        &self,
        key: CustomerKey,
        balance: Decimal,
        delivery_count: u32,
        carrier_id: i32,
    ) -> Result<()>;

    /// Point the customer at a freshly entered order and clear its carrier.
    async fn update_customer_last_order(
        &self,
        key: CustomerKey,
        order_id: u32,
        entry_d: DateTime<Utc>,
    ) -> Result<()>;

    async fn item(&self, item_id: u32) -> Result<Item>;

    async fn stock(&self, warehouse_id: u32, item_id: u32) -> Result<Stock>;

    async fn update_stock(&self, update: &StockUpdate) -> Result<()>;

    /// Upsert into the identity index. Use [`OrderIndexWriter`] instead.
    async fn put_order_by_id(&self, order: &Order) -> Result<()>;

    /// Upsert into the recency index. Use [`OrderIndexWriter`] instead.
    async fn put_order_by_recency(&self, order: &Order) -> Result<()>;

    async fn order_by_id(&self, key: OrderKey) -> Result<Option<Order>>;

    async fn order_by_recency(&self, key: OrderKey, entry_d: DateTime<Utc>)
        -> Result<Option<Order>>;

    /// Lowest-id order in the district still carrying the undelivered sentinel.
    async fn oldest_undelivered_order(
        &self,
        warehouse_id: u32,
        district_id: u32,
    ) -> Result<Option<Order>>;

    /// Up to `limit` orders of the district, newest entry time first.
    async fn recent_orders(
        &self,
        warehouse_id: u32,
        district_id: u32,
        limit: usize,
    ) -> Result<Vec<Order>>;

    async fn insert_order_line(&self, line: &OrderLine) -> Result<()>;

    /// All lines of an order, by line number.
    async fn order_lines(&self, order: OrderKey) -> Result<Vec<OrderLine>>;

    async fn order_line_numbers(&self, order: OrderKey) -> Result<Vec<u32>>;

    async fn order_line(&self, order: OrderKey, number: u32) -> Result<OrderLine>;

    async fn update_order_line_delivery(
        &self,
        order: OrderKey,
        number: u32,
        delivery_d: DateTime<Utc>,
    ) -> Result<()>;

    /// Read the derived balance index, highest balance first.
    async fn top_balances(&self, limit: usize) -> Result<Vec<BalanceEntry>>;
}

/// Bulk-load boundary for the entities created once at load time.
#[async_trait]
pub trait StoreLoader: Send + Sync {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<()>;

    async fn insert_district(&self, district: &District) -> Result<()>;

    async fn insert_customer(&self, customer: &Customer) -> Result<()>;

    async fn insert_item(&self, item: &Item) -> Result<()>;

    async fn insert_stock(&self, stock: &Stock) -> Result<()>;
}

/// Opens independent store sessions, one per client worker.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, options: &SessionOptions) -> Result<Box<dyn StorageClient>>;
}

/// Initialize the store connector based on configuration.
pub async fn init_store(config: &StoreConfig) -> Result<Arc<dyn StoreConnector>> {
    info!(store = ?config.store_type, keyspace = %config.keyspace, "Initializing store");

    match config.store_type {
        StoreType::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        StoreType::Sqlite => {
            let store = SqliteStore::open(&config.sqlite).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreType::Sqlite => {
            tracing::error!("SQLite store requested but 'sqlite' feature is not enabled");
            Err(StorageError::Unsupported("sqlite feature not enabled".into()))
        }
    }
}
