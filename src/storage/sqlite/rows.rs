//! Row decoding for the SQLite backend.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::model::{
    Address, Customer, CustomerKey, CustomerName, District, Item, Order, OrderKey, OrderLine,
    Stock, Warehouse,
};
use crate::storage::{Result, StorageError};

/// Canonical text form of a timestamp column.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decimal(row: &SqliteRow, column: &'static str) -> Result<Decimal> {
    let value: String = row.try_get(column)?;
    Decimal::from_str(&value).map_err(|_| StorageError::InvalidDecimal { column, value })
}

fn parse_timestamp(column: &'static str, value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp { column, value })
}

fn timestamp(row: &SqliteRow, column: &'static str) -> Result<DateTime<Utc>> {
    parse_timestamp(column, row.try_get(column)?)
}

fn optional_timestamp(row: &SqliteRow, column: &'static str) -> Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.try_get(column)?;
    value.map(|v| parse_timestamp(column, v)).transpose()
}

fn unsigned(row: &SqliteRow, column: &'static str) -> Result<u32> {
    let value: i64 = row.try_get(column)?;
    Ok(value as u32)
}

fn address(row: &SqliteRow, prefix: &str) -> Result<Address> {
    Ok(Address {
        street_1: row.try_get(format!("{prefix}_street_1").as_str())?,
        street_2: row.try_get(format!("{prefix}_street_2").as_str())?,
        city: row.try_get(format!("{prefix}_city").as_str())?,
        state: row.try_get(format!("{prefix}_state").as_str())?,
        zip: row.try_get(format!("{prefix}_zip").as_str())?,
    })
}

pub fn warehouse(row: &SqliteRow) -> Result<Warehouse> {
    Ok(Warehouse {
        id: unsigned(row, "w_id")?,
        name: row.try_get("w_name")?,
        address: address(row, "w")?,
        tax: decimal(row, "w_tax")?,
        ytd: decimal(row, "w_ytd")?,
    })
}

pub fn district(row: &SqliteRow) -> Result<District> {
    Ok(District {
        warehouse_id: unsigned(row, "d_w_id")?,
        id: unsigned(row, "d_id")?,
        name: row.try_get("d_name")?,
        address: address(row, "d")?,
        tax: decimal(row, "d_tax")?,
        ytd: decimal(row, "d_ytd")?,
        next_order_id: unsigned(row, "d_next_o_id")?,
    })
}

pub fn customer_key(row: &SqliteRow) -> Result<CustomerKey> {
    Ok(CustomerKey::new(
        unsigned(row, "c_w_id")?,
        unsigned(row, "c_d_id")?,
        unsigned(row, "c_id")?,
    ))
}

pub fn balance(row: &SqliteRow) -> Result<Decimal> {
    decimal(row, "c_balance")
}

pub fn customer(row: &SqliteRow) -> Result<Customer> {
    let last_order_id: Option<i64> = row.try_get("c_last_o_id")?;
    let last_carrier_id: Option<i64> = row.try_get("c_last_o_carrier_id")?;
    Ok(Customer {
        key: customer_key(row)?,
        name: CustomerName {
            first: row.try_get("c_first")?,
            middle: row.try_get("c_middle")?,
            last: row.try_get("c_last")?,
        },
        address: address(row, "c")?,
        phone: row.try_get("c_phone")?,
        since: timestamp(row, "c_since")?,
        credit: row.try_get("c_credit")?,
        credit_limit: decimal(row, "c_credit_lim")?,
        discount: decimal(row, "c_discount")?,
        balance: balance(row)?,
        ytd_payment: decimal(row, "c_ytd_payment")?,
        payment_count: unsigned(row, "c_payment_cnt")?,
        delivery_count: unsigned(row, "c_delivery_cnt")?,
        data: row.try_get("c_data")?,
        last_order_id: last_order_id.map(|id| id as u32),
        last_order_entry: optional_timestamp(row, "c_last_o_entry_d")?,
        last_carrier_id: last_carrier_id.map(|id| id as i32),
    })
}

pub fn item(row: &SqliteRow) -> Result<Item> {
    Ok(Item {
        id: unsigned(row, "i_id")?,
        name: row.try_get("i_name")?,
        price: decimal(row, "i_price")?,
        image_id: unsigned(row, "i_im_id")?,
        data: row.try_get("i_data")?,
    })
}

pub fn stock(row: &SqliteRow) -> Result<Stock> {
    let mut dist_info: [String; 10] = Default::default();
    for (idx, slot) in dist_info.iter_mut().enumerate() {
        *slot = row.try_get(format!("s_dist_{:02}", idx + 1).as_str())?;
    }
    let quantity: i64 = row.try_get("s_quantity")?;
    Ok(Stock {
        warehouse_id: unsigned(row, "s_w_id")?,
        item_id: unsigned(row, "s_i_id")?,
        quantity: quantity as i32,
        ytd: row.try_get("s_ytd")?,
        order_count: unsigned(row, "s_order_cnt")?,
        remote_count: unsigned(row, "s_remote_cnt")?,
        dist_info,
        data: row.try_get("s_data")?,
    })
}

pub fn order(row: &SqliteRow) -> Result<Order> {
    let carrier_id: i64 = row.try_get("o_carrier_id")?;
    let all_local: bool = row.try_get("o_all_local")?;
    Ok(Order {
        key: OrderKey::new(
            unsigned(row, "o_w_id")?,
            unsigned(row, "o_d_id")?,
            unsigned(row, "o_id")?,
        ),
        customer_id: unsigned(row, "o_c_id")?,
        entry_d: timestamp(row, "o_entry_d")?,
        carrier_id: carrier_id as i32,
        line_count: unsigned(row, "o_ol_cnt")?,
        all_local,
        customer_name: CustomerName {
            first: row.try_get("c_first")?,
            middle: row.try_get("c_middle")?,
            last: row.try_get("c_last")?,
        },
    })
}

pub fn order_line(row: &SqliteRow) -> Result<OrderLine> {
    let quantity: i64 = row.try_get("ol_quantity")?;
    Ok(OrderLine {
        order: OrderKey::new(
            unsigned(row, "ol_w_id")?,
            unsigned(row, "ol_d_id")?,
            unsigned(row, "ol_o_id")?,
        ),
        number: unsigned(row, "ol_number")?,
        item_id: unsigned(row, "ol_i_id")?,
        item_name: row.try_get("i_name")?,
        supply_warehouse_id: unsigned(row, "ol_supply_w_id")?,
        quantity: quantity as i32,
        amount: decimal(row, "ol_amount")?,
        delivery_d: optional_timestamp(row, "ol_delivery_d")?,
        dist_info: row.try_get("ol_dist_info")?,
    })
}
