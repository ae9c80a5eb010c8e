//! SQLite backend.
//!
//! One database file holds every table. Each worker session gets its own
//! single-connection pool so workers never share a connection.

mod rows;
mod schema;
mod session;

use std::time::Duration;

use async_trait::async_trait;
use sea_query::{Query, SimpleExpr, SqliteQueryBuilder};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::SqliteConfig;
use crate::model::{Customer, District, Item, Stock, Warehouse};
use crate::storage::{Result, SessionOptions, StorageClient, StoreConnector, StoreLoader};

pub use rows::format_timestamp;
use schema::{Customers, Districts, Items, Stocks, Warehouses, STOCK_DIST_COLUMNS};
pub use session::SqliteSession;

/// File-backed store. Opening it creates the schema if needed.
pub struct SqliteStore {
    connect_options: SqliteConnectOptions,
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(config: &SqliteConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = Self::pool(&connect_options).await?;
        let store = Self {
            connect_options,
            pool,
        };
        store.init_schema().await?;

        info!(path = %config.path.display(), "Opened SQLite store");
        Ok(store)
    }

    async fn pool(options: &SqliteConnectOptions) -> Result<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        Ok(pool)
    }

    /// Create tables and the balance view if they do not exist.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(schema::CREATE_TABLES)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Open an independent session with its own connection.
    pub async fn open_session(&self, options: &SessionOptions) -> Result<SqliteSession> {
        let pool = Self::pool(&self.connect_options).await?;
        Ok(SqliteSession::new(pool, options.clone()))
    }
}

#[async_trait]
impl StoreConnector for SqliteStore {
    async fn connect(&self, options: &SessionOptions) -> Result<Box<dyn StorageClient>> {
        let session = self.open_session(options).await?;
        info!(
            contact_point = options.contact_point.as_deref().unwrap_or("local"),
            keyspace = %options.keyspace,
            consistency = %options.consistency,
            "Opened SQLite session"
        );
        Ok(Box::new(session))
    }
}

#[async_trait]
impl StoreLoader for SqliteStore {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<()> {
        let a = &warehouse.address;
        let query = Query::insert()
            .into_table(Warehouses::Table)
            .columns([
                Warehouses::Id,
                Warehouses::Name,
                Warehouses::Street1,
                Warehouses::Street2,
                Warehouses::City,
                Warehouses::State,
                Warehouses::Zip,
                Warehouses::Tax,
                Warehouses::Ytd,
            ])
            .values([
                warehouse.id.into(),
                warehouse.name.as_str().into(),
                a.street_1.as_str().into(),
                a.street_2.as_str().into(),
                a.city.as_str().into(),
                a.state.as_str().into(),
                a.zip.as_str().into(),
                warehouse.tax.to_string().into(),
                warehouse.ytd.to_string().into(),
            ])?
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_district(&self, district: &District) -> Result<()> {
        let a = &district.address;
        let query = Query::insert()
            .into_table(Districts::Table)
            .columns([
                Districts::WarehouseId,
                Districts::Id,
                Districts::Name,
                Districts::Street1,
                Districts::Street2,
                Districts::City,
                Districts::State,
                Districts::Zip,
                Districts::Tax,
                Districts::Ytd,
                Districts::NextOrderId,
            ])
            .values([
                district.warehouse_id.into(),
                district.id.into(),
                district.name.as_str().into(),
                a.street_1.as_str().into(),
                a.street_2.as_str().into(),
                a.city.as_str().into(),
                a.state.as_str().into(),
                a.zip.as_str().into(),
                district.tax.to_string().into(),
                district.ytd.to_string().into(),
                district.next_order_id.into(),
            ])?
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        let a = &customer.address;
        let query = Query::insert()
            .into_table(Customers::Table)
            .columns([
                Customers::WarehouseId,
                Customers::DistrictId,
                Customers::Id,
                Customers::First,
                Customers::Middle,
                Customers::Last,
                Customers::Street1,
                Customers::Street2,
                Customers::City,
                Customers::State,
                Customers::Zip,
                Customers::Phone,
                Customers::Since,
                Customers::Credit,
                Customers::CreditLimit,
                Customers::Discount,
                Customers::Balance,
                Customers::YtdPayment,
                Customers::PaymentCount,
                Customers::DeliveryCount,
                Customers::Data,
                Customers::LastOrderId,
                Customers::LastOrderEntry,
                Customers::LastCarrierId,
            ])
            .values([
                customer.key.warehouse_id.into(),
                customer.key.district_id.into(),
                customer.key.customer_id.into(),
                customer.name.first.as_str().into(),
                customer.name.middle.as_str().into(),
                customer.name.last.as_str().into(),
                a.street_1.as_str().into(),
                a.street_2.as_str().into(),
                a.city.as_str().into(),
                a.state.as_str().into(),
                a.zip.as_str().into(),
                customer.phone.as_str().into(),
                format_timestamp(customer.since).into(),
                customer.credit.as_str().into(),
                customer.credit_limit.to_string().into(),
                customer.discount.to_string().into(),
                customer.balance.to_string().into(),
                customer.ytd_payment.to_string().into(),
                customer.payment_count.into(),
                customer.delivery_count.into(),
                customer.data.as_str().into(),
                customer.last_order_id.into(),
                customer.last_order_entry.map(format_timestamp).into(),
                customer.last_carrier_id.into(),
            ])?
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<()> {
        let query = Query::insert()
            .into_table(Items::Table)
            .columns([
                Items::Id,
                Items::Name,
                Items::Price,
                Items::ImageId,
                Items::Data,
            ])
            .values([
                item.id.into(),
                item.name.as_str().into(),
                item.price.to_string().into(),
                item.image_id.into(),
                item.data.as_str().into(),
            ])?
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_stock(&self, stock: &Stock) -> Result<()> {
        let query = stock_insert(stock)?;
        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }
}

/// Stock insert SQL. Built outside the async loader since sea-query values
/// are not `Send`.
fn stock_insert(stock: &Stock) -> Result<String> {
    let mut columns = vec![
        Stocks::WarehouseId,
        Stocks::ItemId,
        Stocks::Quantity,
        Stocks::Ytd,
        Stocks::OrderCount,
        Stocks::RemoteCount,
        Stocks::Data,
    ];
    columns.extend(STOCK_DIST_COLUMNS);

    let mut values: Vec<SimpleExpr> = vec![
        stock.warehouse_id.into(),
        stock.item_id.into(),
        stock.quantity.into(),
        stock.ytd.into(),
        stock.order_count.into(),
        stock.remote_count.into(),
        stock.data.as_str().into(),
    ];
    values.extend(stock.dist_info.iter().map(|info| info.as_str().into()));

    let query = Query::insert()
        .into_table(Stocks::Table)
        .columns(columns)
        .values(values)?
        .to_string(SqliteQueryBuilder);
    Ok(query)
}

#[cfg(test)]
mod tests;
