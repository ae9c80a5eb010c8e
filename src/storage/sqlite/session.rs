//! SQLite `StorageClient` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_query::{Asterisk, Expr, OnConflict, Order as SortOrder, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};

use super::rows::{self, format_timestamp};
use super::schema::{
    CustomerBalances, Customers, Districts, Items, OrderLines, Orders, Stocks, Warehouses,
};
use crate::model::{
    BalanceEntry, Customer, CustomerKey, District, Item, Order, OrderKey, OrderLine, Stock,
    StockUpdate, Warehouse, UNDELIVERED_CARRIER_ID,
};
use crate::storage::{ConsistencyLevel, Result, SessionOptions, StorageClient, StorageError};

/// One worker's connection to a [`super::SqliteStore`].
pub struct SqliteSession {
    pool: SqlitePool,
    options: SessionOptions,
}

impl SqliteSession {
    pub(super) fn new(pool: SqlitePool, options: SessionOptions) -> Self {
        Self { pool, options }
    }

    async fn upsert_order(&self, table: Orders, conflict: Vec<Orders>, order: &Order) -> Result<()> {
        let query = Query::insert()
            .into_table(table)
            .columns([
                Orders::WarehouseId,
                Orders::DistrictId,
                Orders::Id,
                Orders::CustomerId,
                Orders::EntryD,
                Orders::CarrierId,
                Orders::LineCount,
                Orders::AllLocal,
                Orders::CustomerFirst,
                Orders::CustomerMiddle,
                Orders::CustomerLast,
            ])
            .values([
                order.key.warehouse_id.into(),
                order.key.district_id.into(),
                order.key.order_id.into(),
                order.customer_id.into(),
                format_timestamp(order.entry_d).into(),
                order.carrier_id.into(),
                order.line_count.into(),
                order.all_local.into(),
                order.customer_name.first.as_str().into(),
                order.customer_name.middle.as_str().into(),
                order.customer_name.last.as_str().into(),
            ])?
            .on_conflict(
                OnConflict::columns(conflict)
                    .update_columns([
                        Orders::CustomerId,
                        Orders::CarrierId,
                        Orders::LineCount,
                        Orders::AllLocal,
                        Orders::CustomerFirst,
                        Orders::CustomerMiddle,
                        Orders::CustomerLast,
                    ])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    fn order_line_key(order: OrderKey, number: u32) -> String {
        format!(
            "({}, {}, {}, {number})",
            order.warehouse_id, order.district_id, order.order_id
        )
    }
}

#[async_trait]
impl StorageClient for SqliteSession {
    fn consistency(&self) -> ConsistencyLevel {
        self.options.consistency
    }

    async fn warehouse(&self, warehouse_id: u32) -> Result<Warehouse> {
        let query = Query::select()
            .column(Asterisk)
            .from(Warehouses::Table)
            .and_where(Expr::col(Warehouses::Id).eq(warehouse_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => rows::warehouse(&row),
            None => Err(StorageError::not_found("warehouse", warehouse_id)),
        }
    }

    async fn update_warehouse_ytd(&self, warehouse_id: u32, ytd: Decimal) -> Result<()> {
        let query = Query::update()
            .table(Warehouses::Table)
            .value(Warehouses::Ytd, ytd.to_string())
            .and_where(Expr::col(Warehouses::Id).eq(warehouse_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("warehouse", warehouse_id));
        }
        Ok(())
    }

    async fn district(&self, warehouse_id: u32, district_id: u32) -> Result<District> {
        let query = Query::select()
            .column(Asterisk)
            .from(Districts::Table)
            .and_where(Expr::col(Districts::WarehouseId).eq(warehouse_id))
            .and_where(Expr::col(Districts::Id).eq(district_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => rows::district(&row),
            None => Err(StorageError::not_found(
                "district",
                format!("({warehouse_id}, {district_id})"),
            )),
        }
    }

    async fn update_district_ytd(
        &self,
        warehouse_id: u32,
        district_id: u32,
        ytd: Decimal,
    ) -> Result<()> {
        let query = Query::update()
            .table(Districts::Table)
            .value(Districts::Ytd, ytd.to_string())
            .and_where(Expr::col(Districts::WarehouseId).eq(warehouse_id))
            .and_where(Expr::col(Districts::Id).eq(district_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(
                "district",
                format!("({warehouse_id}, {district_id})"),
            ));
        }
        Ok(())
    }

    async fn allocate_order_id(&self, warehouse_id: u32, district_id: u32) -> Result<u32> {
        let row = sqlx::query(
            "UPDATE districts SET d_next_o_id = d_next_o_id + 1 \
             WHERE d_w_id = ? AND d_id = ? \
             RETURNING d_next_o_id - 1 AS allocated",
        )
        .bind(i64::from(warehouse_id))
        .bind(i64::from(district_id))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let allocated: i64 = row.try_get("allocated")?;
                Ok(allocated as u32)
            }
            None => Err(StorageError::not_found(
                "district",
                format!("({warehouse_id}, {district_id})"),
            )),
        }
    }

    async fn customer(&self, key: CustomerKey) -> Result<Customer> {
        let query = Query::select()
            .column(Asterisk)
            .from(Customers::Table)
            .and_where(Expr::col(Customers::WarehouseId).eq(key.warehouse_id))
            .and_where(Expr::col(Customers::DistrictId).eq(key.district_id))
            .and_where(Expr::col(Customers::Id).eq(key.customer_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => rows::customer(&row),
            None => Err(StorageError::not_found("customer", key)),
        }
    }

    async fn update_customer_payment(
        &self,
        key: CustomerKey,
        balance: Decimal,
        ytd_payment: Decimal,
        payment_count: u32,
    ) -> Result<()> {
        let query = Query::update()
            .table(Customers::Table)
            .values([
                (Customers::Balance, balance.to_string().into()),
                (Customers::YtdPayment, ytd_payment.to_string().into()),
                (Customers::PaymentCount, payment_count.into()),
            ])
            .and_where(Expr::col(Customers::WarehouseId).eq(key.warehouse_id))
            .and_where(Expr::col(Customers::DistrictId).eq(key.district_id))
            .and_where(Expr::col(Customers::Id).eq(key.customer_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("customer", key));
        }
        Ok(())
    }

    async fn update_customer_delivery(
        &self,
        key: CustomerKey,
        balance: Decimal,
        delivery_count: u32,
        carrier_id: i32,
    ) -> Result<()> {
        let query = Query::update()
            .table(Customers::Table)
            .values([
                (Customers::Balance, balance.to_string().into()),
                (Customers::DeliveryCount, delivery_count.into()),
                (Customers::LastCarrierId, carrier_id.into()),
            ])
            .and_where(Expr::col(Customers::WarehouseId).eq(key.warehouse_id))
            .and_where(Expr::col(Customers::DistrictId).eq(key.district_id))
            .and_where(Expr::col(Customers::Id).eq(key.customer_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("customer", key));
        }
        Ok(())
    }

    async fn update_customer_last_order(
        &self,
        key: CustomerKey,
        order_id: u32,
        entry_d: DateTime<Utc>,
    ) -> Result<()> {
        let query = Query::update()
            .table(Customers::Table)
            .values([
                (Customers::LastOrderId, order_id.into()),
                (Customers::LastOrderEntry, format_timestamp(entry_d).into()),
                (Customers::LastCarrierId, Option::<i32>::None.into()),
            ])
            .and_where(Expr::col(Customers::WarehouseId).eq(key.warehouse_id))
            .and_where(Expr::col(Customers::DistrictId).eq(key.district_id))
            .and_where(Expr::col(Customers::Id).eq(key.customer_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("customer", key));
        }
        Ok(())
    }

    async fn item(&self, item_id: u32) -> Result<Item> {
        let query = Query::select()
            .column(Asterisk)
            .from(Items::Table)
            .and_where(Expr::col(Items::Id).eq(item_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => rows::item(&row),
            None => Err(StorageError::not_found("item", item_id)),
        }
    }

    async fn stock(&self, warehouse_id: u32, item_id: u32) -> Result<Stock> {
        let query = Query::select()
            .column(Asterisk)
            .from(Stocks::Table)
            .and_where(Expr::col(Stocks::WarehouseId).eq(warehouse_id))
            .and_where(Expr::col(Stocks::ItemId).eq(item_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => rows::stock(&row),
            None => Err(StorageError::not_found(
                "stock",
                format!("({warehouse_id}, {item_id})"),
            )),
        }
    }

    async fn update_stock(&self, update: &StockUpdate) -> Result<()> {
        let query = Query::update()
            .table(Stocks::Table)
            .values([
                (Stocks::Quantity, update.quantity.into()),
                (Stocks::Ytd, update.ytd.into()),
                (Stocks::OrderCount, update.order_count.into()),
                (Stocks::RemoteCount, update.remote_count.into()),
            ])
            .and_where(Expr::col(Stocks::WarehouseId).eq(update.warehouse_id))
            .and_where(Expr::col(Stocks::ItemId).eq(update.item_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(
                "stock",
                format!("({}, {})", update.warehouse_id, update.item_id),
            ));
        }
        Ok(())
    }

    async fn put_order_by_id(&self, order: &Order) -> Result<()> {
        self.upsert_order(
            Orders::ById,
            vec![Orders::WarehouseId, Orders::DistrictId, Orders::Id],
            order,
        )
        .await
    }

    async fn put_order_by_recency(&self, order: &Order) -> Result<()> {
        self.upsert_order(
            Orders::ByTimestamp,
            vec![
                Orders::WarehouseId,
                Orders::DistrictId,
                Orders::EntryD,
                Orders::Id,
            ],
            order,
        )
        .await
    }

    async fn order_by_id(&self, key: OrderKey) -> Result<Option<Order>> {
        let query = Query::select()
            .column(Asterisk)
            .from(Orders::ById)
            .and_where(Expr::col(Orders::WarehouseId).eq(key.warehouse_id))
            .and_where(Expr::col(Orders::DistrictId).eq(key.district_id))
            .and_where(Expr::col(Orders::Id).eq(key.order_id))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| rows::order(&row))
            .transpose()
    }

    async fn order_by_recency(
        &self,
        key: OrderKey,
        entry_d: DateTime<Utc>,
    ) -> Result<Option<Order>> {
        let query = Query::select()
            .column(Asterisk)
            .from(Orders::ByTimestamp)
            .and_where(Expr::col(Orders::WarehouseId).eq(key.warehouse_id))
            .and_where(Expr::col(Orders::DistrictId).eq(key.district_id))
            .and_where(Expr::col(Orders::EntryD).eq(format_timestamp(entry_d)))
            .and_where(Expr::col(Orders::Id).eq(key.order_id))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| rows::order(&row))
            .transpose()
    }

    async fn oldest_undelivered_order(
        &self,
        warehouse_id: u32,
        district_id: u32,
    ) -> Result<Option<Order>> {
        let query = Query::select()
            .column(Asterisk)
            .from(Orders::ById)
            .and_where(Expr::col(Orders::WarehouseId).eq(warehouse_id))
            .and_where(Expr::col(Orders::DistrictId).eq(district_id))
            .and_where(Expr::col(Orders::CarrierId).eq(UNDELIVERED_CARRIER_ID))
            .order_by(Orders::Id, SortOrder::Asc)
            .limit(1)
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| rows::order(&row))
            .transpose()
    }

    async fn recent_orders(
        &self,
        warehouse_id: u32,
        district_id: u32,
        limit: usize,
    ) -> Result<Vec<Order>> {
        let query = Query::select()
            .column(Asterisk)
            .from(Orders::ByTimestamp)
            .and_where(Expr::col(Orders::WarehouseId).eq(warehouse_id))
            .and_where(Expr::col(Orders::DistrictId).eq(district_id))
            .order_by(Orders::EntryD, SortOrder::Desc)
            .order_by(Orders::Id, SortOrder::Desc)
            .limit(limit as u64)
            .to_string(SqliteQueryBuilder);

        let fetched = sqlx::query(&query).fetch_all(&self.pool).await?;
        fetched.iter().map(rows::order).collect()
    }

    async fn insert_order_line(&self, line: &OrderLine) -> Result<()> {
        let query = Query::insert()
            .into_table(OrderLines::Table)
            .columns([
                OrderLines::WarehouseId,
                OrderLines::DistrictId,
                OrderLines::OrderId,
                OrderLines::Number,
                OrderLines::ItemId,
                OrderLines::ItemName,
                OrderLines::SupplyWarehouseId,
                OrderLines::Quantity,
                OrderLines::Amount,
                OrderLines::DeliveryD,
                OrderLines::DistInfo,
            ])
            .values([
                line.order.warehouse_id.into(),
                line.order.district_id.into(),
                line.order.order_id.into(),
                line.number.into(),
                line.item_id.into(),
                line.item_name.as_str().into(),
                line.supply_warehouse_id.into(),
                line.quantity.into(),
                line.amount.to_string().into(),
                line.delivery_d.map(format_timestamp).into(),
                line.dist_info.as_str().into(),
            ])?
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn order_lines(&self, order: OrderKey) -> Result<Vec<OrderLine>> {
        let query = Query::select()
            .column(Asterisk)
            .from(OrderLines::Table)
            .and_where(Expr::col(OrderLines::WarehouseId).eq(order.warehouse_id))
            .and_where(Expr::col(OrderLines::DistrictId).eq(order.district_id))
            .and_where(Expr::col(OrderLines::OrderId).eq(order.order_id))
            .order_by(OrderLines::Number, SortOrder::Asc)
            .to_string(SqliteQueryBuilder);

        let fetched = sqlx::query(&query).fetch_all(&self.pool).await?;
        fetched.iter().map(rows::order_line).collect()
    }

    async fn order_line_numbers(&self, order: OrderKey) -> Result<Vec<u32>> {
        let query = Query::select()
            .column(OrderLines::Number)
            .from(OrderLines::Table)
            .and_where(Expr::col(OrderLines::WarehouseId).eq(order.warehouse_id))
            .and_where(Expr::col(OrderLines::DistrictId).eq(order.district_id))
            .and_where(Expr::col(OrderLines::OrderId).eq(order.order_id))
            .order_by(OrderLines::Number, SortOrder::Asc)
            .to_string(SqliteQueryBuilder);

        let fetched = sqlx::query(&query).fetch_all(&self.pool).await?;
        fetched
            .iter()
            .map(|row| {
                let number: i64 = row.try_get("ol_number")?;
                Ok(number as u32)
            })
            .collect()
    }

    async fn order_line(&self, order: OrderKey, number: u32) -> Result<OrderLine> {
        let query = Query::select()
            .column(Asterisk)
            .from(OrderLines::Table)
            .and_where(Expr::col(OrderLines::WarehouseId).eq(order.warehouse_id))
            .and_where(Expr::col(OrderLines::DistrictId).eq(order.district_id))
            .and_where(Expr::col(OrderLines::OrderId).eq(order.order_id))
            .and_where(Expr::col(OrderLines::Number).eq(number))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => rows::order_line(&row),
            None => Err(StorageError::not_found(
                "order line",
                Self::order_line_key(order, number),
            )),
        }
    }

    async fn update_order_line_delivery(
        &self,
        order: OrderKey,
        number: u32,
        delivery_d: DateTime<Utc>,
    ) -> Result<()> {
        let query = Query::update()
            .table(OrderLines::Table)
            .value(OrderLines::DeliveryD, format_timestamp(delivery_d))
            .and_where(Expr::col(OrderLines::WarehouseId).eq(order.warehouse_id))
            .and_where(Expr::col(OrderLines::DistrictId).eq(order.district_id))
            .and_where(Expr::col(OrderLines::OrderId).eq(order.order_id))
            .and_where(Expr::col(OrderLines::Number).eq(number))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(
                "order line",
                Self::order_line_key(order, number),
            ));
        }
        Ok(())
    }

    async fn top_balances(&self, limit: usize) -> Result<Vec<BalanceEntry>> {
        let query = Query::select()
            .columns([
                Customers::WarehouseId,
                Customers::DistrictId,
                Customers::Id,
                Customers::Balance,
            ])
            .from(CustomerBalances::Table)
            .order_by_expr(Expr::cust("CAST(c_balance AS REAL)"), SortOrder::Desc)
            .order_by(Customers::WarehouseId, SortOrder::Asc)
            .order_by(Customers::DistrictId, SortOrder::Asc)
            .order_by(Customers::Id, SortOrder::Asc)
            .limit(limit as u64)
            .to_string(SqliteQueryBuilder);

        let fetched = sqlx::query(&query).fetch_all(&self.pool).await?;
        fetched
            .iter()
            .map(|row| {
                let customer = rows::customer_key(row)?;
                let balance = rows::balance(row)?;
                Ok(BalanceEntry { customer, balance })
            })
            .collect()
    }
}
