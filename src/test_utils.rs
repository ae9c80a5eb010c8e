//! Fixture rows and seeding helpers for tests.
//!
//! Rows are built with fixed, easy-to-check values: warehouse tax 10%,
//! district tax 5%, customer discount 10%, item `i` priced at `i` dollars
//! and 50 units of every item in stock.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use crate::model::{
    Address, Customer, CustomerKey, CustomerName, District, Item, Stock, Warehouse,
    DISTRICTS_PER_WAREHOUSE,
};
use crate::storage::{Result, StoreLoader};

/// Default on-hand quantity for seeded stock rows.
pub const SEED_STOCK_QUANTITY: i32 = 50;

fn address(tag: &str) -> Address {
    Address {
        street_1: format!("{tag} Street 1"),
        street_2: format!("{tag} Street 2"),
        city: format!("{tag} City"),
        state: "CA".into(),
        zip: "123456789".into(),
    }
}

pub fn warehouse(id: u32) -> Warehouse {
    Warehouse {
        id,
        name: format!("W{id}"),
        address: address("Warehouse"),
        tax: Decimal::new(10, 2),
        ytd: Decimal::ZERO,
    }
}

pub fn district(warehouse_id: u32, id: u32) -> District {
    District {
        warehouse_id,
        id,
        name: format!("D{id}"),
        address: address("District"),
        tax: Decimal::new(5, 2),
        ytd: Decimal::ZERO,
        next_order_id: 1,
    }
}

pub fn customer(key: CustomerKey) -> Customer {
    Customer {
        key,
        name: CustomerName {
            first: format!("First{}", key.customer_id),
            middle: "OE".into(),
            last: format!("Last{}", key.customer_id),
        },
        address: address("Customer"),
        phone: "555-0100".into(),
        since: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap_or_default(),
        credit: "GC".into(),
        credit_limit: Decimal::new(50_000, 0),
        discount: Decimal::new(10, 2),
        balance: Decimal::new(-1000, 2),
        ytd_payment: Decimal::new(1000, 2),
        payment_count: 1,
        delivery_count: 0,
        data: String::new(),
        last_order_id: None,
        last_order_entry: None,
        last_carrier_id: None,
    }
}

pub fn item(id: u32) -> Item {
    Item {
        id,
        name: format!("Item{id}"),
        price: Decimal::from(id),
        image_id: id,
        data: String::new(),
    }
}

pub fn stock(warehouse_id: u32, item_id: u32, quantity: i32) -> Stock {
    Stock {
        warehouse_id,
        item_id,
        quantity,
        ytd: 0,
        order_count: 0,
        remote_count: 0,
        dist_info: std::array::from_fn(|i| format!("S_DIST_{:02}_{item_id}", i + 1)),
        data: String::new(),
    }
}

/// Seed the shared item catalogue `1..=item_count`.
pub async fn seed_items(loader: &dyn StoreLoader, item_count: u32) -> Result<()> {
    for id in 1..=item_count {
        loader.insert_item(&item(id)).await?;
    }
    Ok(())
}

/// Seed one warehouse with all ten districts, `customers_per_district`
/// customers each and stock for items `1..=item_count`.
pub async fn seed_warehouse(
    loader: &dyn StoreLoader,
    warehouse_id: u32,
    customers_per_district: u32,
    item_count: u32,
) -> Result<()> {
    loader.insert_warehouse(&warehouse(warehouse_id)).await?;
    for district_id in 1..=DISTRICTS_PER_WAREHOUSE {
        loader
            .insert_district(&district(warehouse_id, district_id))
            .await?;
        for customer_id in 1..=customers_per_district {
            let key = CustomerKey::new(warehouse_id, district_id, customer_id);
            loader.insert_customer(&customer(key)).await?;
        }
    }
    for item_id in 1..=item_count {
        loader
            .insert_stock(&stock(warehouse_id, item_id, SEED_STOCK_QUANTITY))
            .await?;
    }
    Ok(())
}
