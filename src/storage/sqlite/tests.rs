use chrono::{Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

use super::*;
use crate::model::{CustomerKey, CustomerName, Order, OrderKey, OrderLine, UNDELIVERED_CARRIER_ID};
use crate::storage::{ConsistencyLevel, StorageError, StoreLoader};
use crate::test_utils;

async fn open_store(dir: &TempDir) -> SqliteStore {
    let config = SqliteConfig {
        path: dir.path().join("nested").join("wholesale.db"),
        ..SqliteConfig::default()
    };
    SqliteStore::open(&config).await.unwrap()
}

fn order(order_id: u32, carrier_id: i32) -> Order {
    Order {
        key: OrderKey::new(1, 1, order_id),
        customer_id: 3,
        entry_d: Utc::now().trunc_subsecs(6) + Duration::seconds(i64::from(order_id)),
        carrier_id,
        line_count: 2,
        all_local: true,
        customer_name: CustomerName {
            first: "Ann".into(),
            middle: "OE".into(),
            last: "ABLE".into(),
        },
    }
}

#[tokio::test]
async fn test_open_creates_schema_idempotently() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    store.init_schema().await.unwrap();
}

#[tokio::test]
async fn test_seeded_rows_read_back() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    test_utils::seed_items(&store, 3).await.unwrap();
    test_utils::seed_warehouse(&store, 1, 2, 3).await.unwrap();

    let session = store.open_session(&SessionOptions::default()).await.unwrap();
    assert_eq!(session.warehouse(1).await.unwrap(), test_utils::warehouse(1));
    assert_eq!(session.district(1, 10).await.unwrap(), test_utils::district(1, 10));
    let key = CustomerKey::new(1, 4, 2);
    assert_eq!(session.customer(key).await.unwrap(), test_utils::customer(key));
    assert_eq!(session.item(2).await.unwrap(), test_utils::item(2));
    let stock = session.stock(1, 3).await.unwrap();
    assert_eq!(stock, test_utils::stock(1, 3, test_utils::SEED_STOCK_QUANTITY));
    assert_eq!(stock.dist_info(7), "S_DIST_07_3");
}

#[tokio::test]
async fn test_missing_customer_not_found() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let session = store.open_session(&SessionOptions::default()).await.unwrap();

    let err = session.customer(CustomerKey::new(1, 1, 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "customer", .. }));
    let err = session.update_warehouse_ytd(1, Decimal::ONE).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_allocate_order_id_across_sessions() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    store.insert_district(&test_utils::district(1, 1)).await.unwrap();
    let first = store.open_session(&SessionOptions::default()).await.unwrap();
    let second = store.open_session(&SessionOptions::default()).await.unwrap();

    assert_eq!(first.allocate_order_id(1, 1).await.unwrap(), 1);
    assert_eq!(second.allocate_order_id(1, 1).await.unwrap(), 2);
    assert_eq!(first.district(1, 1).await.unwrap().next_order_id, 3);
}

#[tokio::test]
async fn test_order_upsert_and_queries() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let session = store.open_session(&SessionOptions::default()).await.unwrap();
    for order_id in 1..=3 {
        let order = order(order_id, UNDELIVERED_CARRIER_ID);
        session.put_order_by_id(&order).await.unwrap();
        session.put_order_by_recency(&order).await.unwrap();
    }

    let mut delivered = session
        .order_by_id(OrderKey::new(1, 1, 1))
        .await
        .unwrap()
        .unwrap();
    delivered.carrier_id = 7;
    session.put_order_by_id(&delivered).await.unwrap();
    session.put_order_by_recency(&delivered).await.unwrap();

    let by_recency = session
        .order_by_recency(delivered.key, delivered.entry_d)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_recency, delivered);

    let oldest = session.oldest_undelivered_order(1, 1).await.unwrap().unwrap();
    assert_eq!(oldest.key.order_id, 2);

    let recent: Vec<u32> = session
        .recent_orders(1, 1, 2)
        .await
        .unwrap()
        .iter()
        .map(|o| o.key.order_id)
        .collect();
    assert_eq!(recent, vec![3, 2]);
}

#[tokio::test]
async fn test_order_line_delivery_stamp() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let session = store.open_session(&SessionOptions::default()).await.unwrap();
    let key = OrderKey::new(1, 2, 9);
    for number in 1..=2 {
        session
            .insert_order_line(&OrderLine {
                order: key,
                number,
                item_id: number,
                item_name: format!("Item{number}"),
                supply_warehouse_id: 1,
                quantity: 4,
                amount: Decimal::new(1250, 2),
                delivery_d: None,
                dist_info: "S_DIST_02".into(),
            })
            .await
            .unwrap();
    }

    let now = Utc::now().trunc_subsecs(6);
    session.update_order_line_delivery(key, 2, now).await.unwrap();

    let lines = session.order_lines(key).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].delivery_d.is_none());
    assert_eq!(lines[1].delivery_d, Some(now));
    assert_eq!(lines[1].amount, Decimal::new(1250, 2));
    assert_eq!(session.order_line_numbers(key).await.unwrap(), vec![1, 2]);
    assert!(session.order_line(key, 3).await.is_err());
}

#[tokio::test]
async fn test_top_balances_from_view() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    for (customer_id, cents) in [(1, 500), (2, 100_000), (3, -2_500), (4, 9_950)] {
        let mut customer = test_utils::customer(CustomerKey::new(1, 1, customer_id));
        customer.balance = Decimal::new(cents, 2);
        store.insert_customer(&customer).await.unwrap();
    }
    let session = store
        .open_session(&SessionOptions {
            consistency: ConsistencyLevel::One,
            ..SessionOptions::default()
        })
        .await
        .unwrap();

    let top = session.top_balances(3).await.unwrap();
    let ids: Vec<u32> = top.iter().map(|e| e.customer.customer_id).collect();
    assert_eq!(ids, vec![2, 4, 1]);
    assert_eq!(top[0].balance, Decimal::new(100_000, 2));
    assert_eq!(session.consistency(), ConsistencyLevel::One);
}

fn assert_send<T: Send>(_: &T) {}

#[tokio::test]
async fn test_stock_insert_from_spawned_task() {
    let dir = TempDir::new().unwrap();
    let store = std::sync::Arc::new(open_store(&dir).await);

    let loader = store.clone();
    let handle = tokio::spawn(async move {
        let stock = test_utils::stock(2, 9, 12);
        let insert = loader.insert_stock(&stock);
        assert_send(&insert);
        insert.await
    });
    handle.await.unwrap().unwrap();

    let session = store.open_session(&SessionOptions::default()).await.unwrap();
    let stock = session.stock(2, 9).await.unwrap();
    assert_eq!(stock.quantity, 12);
    assert_eq!(stock.dist_info(10), "S_DIST_10_9");
}

#[test]
fn test_stock_insert_covers_every_column() {
    let sql = stock_insert(&test_utils::stock(1, 4, 30)).unwrap();
    assert!(sql.starts_with("INSERT INTO \"stocks\""));
    for district in 1..=10 {
        assert!(sql.contains(&format!("S_DIST_{district:02}_4")));
    }
}
