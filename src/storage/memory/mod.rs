//! In-process partitioned store.
//!
//! Tables live behind one `RwLock` each and are shared by every session
//! opened from the same [`MemoryStore`]. Each call takes a single lock, so
//! individual point writes are atomic but nothing spanning two calls is.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::info;

use super::{
    ConsistencyLevel, Result, SessionOptions, StorageClient, StorageError, StoreConnector,
    StoreLoader,
};
use crate::model::{
    BalanceEntry, Customer, CustomerKey, District, Item, Order, OrderKey, OrderLine, Stock,
    StockUpdate, Warehouse, UNDELIVERED_CARRIER_ID,
};

/// Recency index key: (warehouse, district, entry time, order id).
type RecencyKey = (u32, u32, DateTime<Utc>, u32);

#[derive(Default)]
struct Tables {
    warehouses: RwLock<BTreeMap<u32, Warehouse>>,
    districts: RwLock<BTreeMap<(u32, u32), District>>,
    customers: RwLock<BTreeMap<CustomerKey, Customer>>,
    items: RwLock<BTreeMap<u32, Item>>,
    stocks: RwLock<BTreeMap<(u32, u32), Stock>>,
    orders_by_id: RwLock<BTreeMap<OrderKey, Order>>,
    orders_by_recency: RwLock<BTreeMap<RecencyKey, Order>>,
    order_lines: RwLock<BTreeMap<(OrderKey, u32), OrderLine>>,
    reject_writes: AtomicBool,
}

impl Tables {
    fn check_write(&self, operation: &'static str) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected { operation });
        }
        Ok(())
    }
}

fn recency_key(order: &Order) -> RecencyKey {
    (
        order.key.warehouse_id,
        order.key.district_id,
        order.entry_d,
        order.key.order_id,
    )
}

/// Shared in-memory tables. Cheap to clone.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session with default options.
    pub fn session(&self) -> MemorySession {
        self.session_with(SessionOptions::default())
    }

    pub fn session_with(&self, options: SessionOptions) -> MemorySession {
        MemorySession {
            tables: Arc::clone(&self.tables),
            options,
        }
    }

    /// Make every subsequent write fail with [`StorageError::Rejected`].
    pub fn set_reject_writes(&self, reject: bool) {
        self.tables.reject_writes.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self, options: &SessionOptions) -> Result<Box<dyn StorageClient>> {
        info!(
            contact_point = options.contact_point.as_deref().unwrap_or("local"),
            keyspace = %options.keyspace,
            consistency = %options.consistency,
            "Opened memory session"
        );
        Ok(Box::new(self.session_with(options.clone())))
    }
}

#[async_trait]
impl StoreLoader for MemoryStore {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<()> {
        self.tables.check_write("insert_warehouse")?;
        self.tables
            .warehouses
            .write()
            .await
            .insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn insert_district(&self, district: &District) -> Result<()> {
        self.tables.check_write("insert_district")?;
        self.tables
            .districts
            .write()
            .await
            .insert((district.warehouse_id, district.id), district.clone());
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        self.tables.check_write("insert_customer")?;
        self.tables
            .customers
            .write()
            .await
            .insert(customer.key, customer.clone());
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<()> {
        self.tables.check_write("insert_item")?;
        self.tables.items.write().await.insert(item.id, item.clone());
        Ok(())
    }

    async fn insert_stock(&self, stock: &Stock) -> Result<()> {
        self.tables.check_write("insert_stock")?;
        self.tables
            .stocks
            .write()
            .await
            .insert((stock.warehouse_id, stock.item_id), stock.clone());
        Ok(())
    }
}

/// One worker's view of a [`MemoryStore`].
pub struct MemorySession {
    tables: Arc<Tables>,
    options: SessionOptions,
}

impl MemorySession {
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

#[async_trait]
impl StorageClient for MemorySession {
    fn consistency(&self) -> ConsistencyLevel {
        self.options.consistency
    }

    async fn warehouse(&self, warehouse_id: u32) -> Result<Warehouse> {
        self.tables
            .warehouses
            .read()
            .await
            .get(&warehouse_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("warehouse", warehouse_id))
    }

    async fn update_warehouse_ytd(&self, warehouse_id: u32, ytd: Decimal) -> Result<()> {
        self.tables.check_write("update_warehouse_ytd")?;
        let mut warehouses = self.tables.warehouses.write().await;
        let warehouse = warehouses
            .get_mut(&warehouse_id)
            .ok_or_else(|| StorageError::not_found("warehouse", warehouse_id))?;
        warehouse.ytd = ytd;
        Ok(())
    }

    async fn district(&self, warehouse_id: u32, district_id: u32) -> Result<District> {
        self.tables
            .districts
            .read()
            .await
            .get(&(warehouse_id, district_id))
            .cloned()
            .ok_or_else(|| {
                StorageError::not_found("district", format!("({warehouse_id}, {district_id})"))
            })
    }

    async fn update_district_ytd(
        &self,
        warehouse_id: u32,
        district_id: u32,
        ytd: Decimal,
    ) -> Result<()> {
        self.tables.check_write("update_district_ytd")?;
        let mut districts = self.tables.districts.write().await;
        let district = districts.get_mut(&(warehouse_id, district_id)).ok_or_else(|| {
            StorageError::not_found("district", format!("({warehouse_id}, {district_id})"))
        })?;
        district.ytd = ytd;
        Ok(())
    }

    async fn allocate_order_id(&self, warehouse_id: u32, district_id: u32) -> Result<u32> {
        self.tables.check_write("allocate_order_id")?;
        let mut districts = self.tables.districts.write().await;
        let district = districts.get_mut(&(warehouse_id, district_id)).ok_or_else(|| {
            StorageError::not_found("district", format!("({warehouse_id}, {district_id})"))
        })?;
        let allocated = district.next_order_id;
        district.next_order_id += 1;
        Ok(allocated)
    }

    async fn customer(&self, key: CustomerKey) -> Result<Customer> {
        self.tables
            .customers
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found("customer", key))
    }

    async fn update_customer_payment(
        &self,
        key: CustomerKey,
        balance: Decimal,
        ytd_payment: Decimal,
        payment_count: u32,
    ) -> Result<()> {
        self.tables.check_write("update_customer_payment")?;
        let mut customers = self.tables.customers.write().await;
        let customer = customers
            .get_mut(&key)
            .ok_or_else(|| StorageError::not_found("customer", key))?;
        customer.balance = balance;
        customer.ytd_payment = ytd_payment;
        customer.payment_count = payment_count;
        Ok(())
    }

    async fn update_customer_delivery(
        &self,
        key: CustomerKey,
        balance: Decimal,
        delivery_count: u32,
        carrier_id: i32,
    ) -> Result<()> {
        self.tables.check_write("update_customer_delivery")?;
        let mut customers = self.tables.customers.write().await;
        let customer = customers
            .get_mut(&key)
            .ok_or_else(|| StorageError::not_found("customer", key))?;
        customer.balance = balance;
        customer.delivery_count = delivery_count;
        customer.last_carrier_id = Some(carrier_id);
        Ok(())
    }

    async fn update_customer_last_order(
        &self,
        key: CustomerKey,
        order_id: u32,
        entry_d: DateTime<Utc>,
    ) -> Result<()> {
        self.tables.check_write("update_customer_last_order")?;
        let mut customers = self.tables.customers.write().await;
        let customer = customers
            .get_mut(&key)
            .ok_or_else(|| StorageError::not_found("customer", key))?;
        customer.last_order_id = Some(order_id);
        customer.last_order_entry = Some(entry_d);
        customer.last_carrier_id = None;
        Ok(())
    }

    async fn item(&self, item_id: u32) -> Result<Item> {
        self.tables
            .items
            .read()
            .await
            .get(&item_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("item", item_id))
    }

    async fn stock(&self, warehouse_id: u32, item_id: u32) -> Result<Stock> {
        self.tables
            .stocks
            .read()
            .await
            .get(&(warehouse_id, item_id))
            .cloned()
            .ok_or_else(|| StorageError::not_found("stock", format!("({warehouse_id}, {item_id})")))
    }

    async fn update_stock(&self, update: &StockUpdate) -> Result<()> {
        self.tables.check_write("update_stock")?;
        let mut stocks = self.tables.stocks.write().await;
        let stock = stocks
            .get_mut(&(update.warehouse_id, update.item_id))
            .ok_or_else(|| {
                StorageError::not_found(
                    "stock",
                    format!("({}, {})", update.warehouse_id, update.item_id),
                )
            })?;
        stock.quantity = update.quantity;
        stock.ytd = update.ytd;
        stock.order_count = update.order_count;
        stock.remote_count = update.remote_count;
        Ok(())
    }

    async fn put_order_by_id(&self, order: &Order) -> Result<()> {
        self.tables.check_write("put_order_by_id")?;
        self.tables
            .orders_by_id
            .write()
            .await
            .insert(order.key, order.clone());
        Ok(())
    }

    async fn put_order_by_recency(&self, order: &Order) -> Result<()> {
        self.tables.check_write("put_order_by_recency")?;
        self.tables
            .orders_by_recency
            .write()
            .await
            .insert(recency_key(order), order.clone());
        Ok(())
    }

    async fn order_by_id(&self, key: OrderKey) -> Result<Option<Order>> {
        Ok(self.tables.orders_by_id.read().await.get(&key).cloned())
    }

    async fn order_by_recency(
        &self,
        key: OrderKey,
        entry_d: DateTime<Utc>,
    ) -> Result<Option<Order>> {
        let recency = (key.warehouse_id, key.district_id, entry_d, key.order_id);
        Ok(self
            .tables
            .orders_by_recency
            .read()
            .await
            .get(&recency)
            .cloned())
    }

    async fn oldest_undelivered_order(
        &self,
        warehouse_id: u32,
        district_id: u32,
    ) -> Result<Option<Order>> {
        let orders = self.tables.orders_by_id.read().await;
        let range = OrderKey::new(warehouse_id, district_id, 0)
            ..=OrderKey::new(warehouse_id, district_id, u32::MAX);
        Ok(orders
            .range(range)
            .map(|(_, order)| order)
            .find(|order| order.carrier_id == UNDELIVERED_CARRIER_ID)
            .cloned())
    }

    async fn recent_orders(
        &self,
        warehouse_id: u32,
        district_id: u32,
        limit: usize,
    ) -> Result<Vec<Order>> {
        let orders = self.tables.orders_by_recency.read().await;
        let range = (warehouse_id, district_id, DateTime::<Utc>::MIN_UTC, 0)
            ..=(warehouse_id, district_id, DateTime::<Utc>::MAX_UTC, u32::MAX);
        Ok(orders
            .range(range)
            .rev()
            .take(limit)
            .map(|(_, order)| order.clone())
            .collect())
    }

    async fn insert_order_line(&self, line: &OrderLine) -> Result<()> {
        self.tables.check_write("insert_order_line")?;
        self.tables
            .order_lines
            .write()
            .await
            .insert((line.order, line.number), line.clone());
        Ok(())
    }

    async fn order_lines(&self, order: OrderKey) -> Result<Vec<OrderLine>> {
        let lines = self.tables.order_lines.read().await;
        Ok(lines
            .range((order, 0)..=(order, u32::MAX))
            .map(|(_, line)| line.clone())
            .collect())
    }

    async fn order_line_numbers(&self, order: OrderKey) -> Result<Vec<u32>> {
        let lines = self.tables.order_lines.read().await;
        Ok(lines
            .range((order, 0)..=(order, u32::MAX))
            .map(|((_, number), _)| *number)
            .collect())
    }

    async fn order_line(&self, order: OrderKey, number: u32) -> Result<OrderLine> {
        self.tables
            .order_lines
            .read()
            .await
            .get(&(order, number))
            .cloned()
            .ok_or_else(|| {
                StorageError::not_found(
                    "order line",
                    format!(
                        "({}, {}, {}, {number})",
                        order.warehouse_id, order.district_id, order.order_id
                    ),
                )
            })
    }

    async fn update_order_line_delivery(
        &self,
        order: OrderKey,
        number: u32,
        delivery_d: DateTime<Utc>,
    ) -> Result<()> {
        self.tables.check_write("update_order_line_delivery")?;
        let mut lines = self.tables.order_lines.write().await;
        let line = lines.get_mut(&(order, number)).ok_or_else(|| {
            StorageError::not_found(
                "order line",
                format!(
                    "({}, {}, {}, {number})",
                    order.warehouse_id, order.district_id, order.order_id
                ),
            )
        })?;
        line.delivery_d = Some(delivery_d);
        Ok(())
    }

    async fn top_balances(&self, limit: usize) -> Result<Vec<BalanceEntry>> {
        let customers = self.tables.customers.read().await;
        let mut entries: Vec<BalanceEntry> = customers
            .values()
            .map(|customer| BalanceEntry {
                customer: customer.key,
                balance: customer.balance,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.customer.cmp(&b.customer))
        });
        entries.truncate(limit);
        Ok(entries)
    }
}
