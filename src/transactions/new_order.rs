//! New-Order: enter a customer order and draw its lines from stock.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{
    adjust_stock_quantity, CustomerKey, Order, OrderKey, OrderLine, StockUpdate,
    UNDELIVERED_CARRIER_ID,
};
use crate::storage::{OrderIndexWriter, Result, StorageClient};

/// One requested line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderItem {
    pub item_id: u32,
    pub supply_warehouse_id: u32,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderRequest {
    pub customer_id: u32,
    pub warehouse_id: u32,
    pub district_id: u32,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub item_id: u32,
    pub item_name: String,
    pub supply_warehouse_id: u32,
    pub quantity: i32,
    pub amount: Decimal,
    /// Stock level after the wrap rule was applied.
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderOutput {
    pub customer: CustomerKey,
    pub customer_last: String,
    pub credit: String,
    pub discount: Decimal,
    pub warehouse_tax: Decimal,
    pub district_tax: Decimal,
    pub order_id: u32,
    pub entry_d: DateTime<Utc>,
    pub lines: Vec<NewOrderLine>,
    pub total_amount: Decimal,
}

pub async fn execute(store: &dyn StorageClient, request: &NewOrderRequest) -> Result<NewOrderOutput> {
    let customer_key = CustomerKey::new(
        request.warehouse_id,
        request.district_id,
        request.customer_id,
    );
    let customer = store.customer(customer_key).await?;
    let district = store
        .district(request.warehouse_id, request.district_id)
        .await?;
    let warehouse = store.warehouse(request.warehouse_id).await?;

    let order_id = store
        .allocate_order_id(request.warehouse_id, request.district_id)
        .await?;
    let entry_d = Utc::now().trunc_subsecs(6);
    let all_local = request
        .items
        .iter()
        .all(|item| item.supply_warehouse_id == request.warehouse_id);

    let order = Order {
        key: OrderKey::new(request.warehouse_id, request.district_id, order_id),
        customer_id: request.customer_id,
        entry_d,
        carrier_id: UNDELIVERED_CARRIER_ID,
        line_count: request.items.len() as u32,
        all_local,
        customer_name: customer.name.clone(),
    };
    OrderIndexWriter::new(store).insert(&order).await?;
    store
        .update_customer_last_order(customer_key, order_id, entry_d)
        .await?;

    let mut lines = Vec::with_capacity(request.items.len());
    let mut subtotal = Decimal::ZERO;
    for (idx, requested) in request.items.iter().enumerate() {
        let stock = store
            .stock(requested.supply_warehouse_id, requested.item_id)
            .await?;
        let stock_quantity = adjust_stock_quantity(stock.quantity, requested.quantity);
        let remote = requested.supply_warehouse_id != request.warehouse_id;
        store
            .update_stock(&StockUpdate {
                warehouse_id: stock.warehouse_id,
                item_id: stock.item_id,
                quantity: stock_quantity,
                ytd: stock.ytd + i64::from(requested.quantity),
                order_count: stock.order_count + 1,
                remote_count: stock.remote_count + u32::from(remote),
            })
            .await?;

        let item = store.item(requested.item_id).await?;
        let amount = item.price * Decimal::from(requested.quantity);
        store
            .insert_order_line(&OrderLine {
                order: order.key,
                number: idx as u32 + 1,
                item_id: item.id,
                item_name: item.name.clone(),
                supply_warehouse_id: requested.supply_warehouse_id,
                quantity: requested.quantity,
                amount,
                delivery_d: None,
                dist_info: stock.dist_info(request.district_id).to_string(),
            })
            .await?;
        subtotal += amount;

        lines.push(NewOrderLine {
            item_id: item.id,
            item_name: item.name,
            supply_warehouse_id: requested.supply_warehouse_id,
            quantity: requested.quantity,
            amount,
            stock_quantity,
        });
    }

    let total_amount = subtotal
        * (Decimal::ONE + district.tax + warehouse.tax)
        * (Decimal::ONE - customer.discount);

    debug!(
        warehouse_id = request.warehouse_id,
        district_id = request.district_id,
        order_id,
        lines = lines.len(),
        %total_amount,
        "New order entered"
    );

    Ok(NewOrderOutput {
        customer: customer_key,
        customer_last: customer.name.last,
        credit: customer.credit,
        discount: customer.discount,
        warehouse_tax: warehouse.tax,
        district_tax: district.tax,
        order_id,
        entry_d,
        lines,
        total_amount,
    })
}

impl fmt::Display for NewOrderOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(
                f,
                "itemId: {}, itemName: {}, warehouseId: {}, quantity: {}, OL_AMOUNT: {:.2}, S_QUANTITY: {}",
                line.item_id,
                line.item_name,
                line.supply_warehouse_id,
                line.quantity,
                line.amount,
                line.stock_quantity
            )?;
        }
        writeln!(
            f,
            "customer with C_W_ID: {}, C_D_ID: {}, C_ID: {}, C_LAST: {}, C_CREDIT: {}, C_DISCOUNT: {}",
            self.customer.warehouse_id,
            self.customer.district_id,
            self.customer.customer_id,
            self.customer_last,
            self.credit,
            self.discount
        )?;
        writeln!(
            f,
            "Warehouse tax rate: {}, District tax rate: {}",
            self.warehouse_tax, self.district_tax
        )?;
        writeln!(f, "Order number: {}, entry date: {}", self.order_id, self.entry_d)?;
        write!(
            f,
            "Number of items: {}, total amount for order: {:.2}",
            self.lines.len(),
            self.total_amount
        )
    }
}
