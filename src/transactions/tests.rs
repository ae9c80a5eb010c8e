use std::collections::HashSet;

use rust_decimal::Decimal;

use super::*;
use crate::model::{CustomerKey, OrderKey, UNDELIVERED_CARRIER_ID};
use crate::storage::{MemorySession, MemoryStore, StorageClient, StorageError, StoreLoader};
use crate::test_utils;

async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    test_utils::seed_items(&store, 10).await.unwrap();
    test_utils::seed_warehouse(&store, 1, 3, 10).await.unwrap();
    test_utils::seed_warehouse(&store, 2, 3, 10).await.unwrap();
    store
}

fn item(item_id: u32, supply_warehouse_id: u32, quantity: i32) -> OrderItem {
    OrderItem {
        item_id,
        supply_warehouse_id,
        quantity,
    }
}

async fn place_order(
    session: &MemorySession,
    district_id: u32,
    customer_id: u32,
    items: Vec<OrderItem>,
) -> NewOrderOutput {
    let request = NewOrderRequest {
        customer_id,
        warehouse_id: 1,
        district_id,
        items,
    };
    new_order::execute(session, &request).await.unwrap()
}

// ============================================================================
// New-Order
// ============================================================================

#[tokio::test]
async fn test_new_order_allocates_sequential_ids() {
    let store = seeded().await;
    let session = store.session();

    let first = place_order(&session, 3, 1, vec![item(1, 1, 1)]).await;
    let second = place_order(&session, 3, 2, vec![item(1, 1, 1)]).await;
    let other_district = place_order(&session, 4, 1, vec![item(1, 1, 1)]).await;

    assert_eq!(first.order_id, 1);
    assert_eq!(second.order_id, 2);
    assert_eq!(other_district.order_id, 1);
    assert_eq!(session.district(1, 3).await.unwrap().next_order_id, 3);
}

#[tokio::test]
async fn test_new_order_totals_and_stock() {
    let store = seeded().await;
    let session = store.session();

    let output = place_order(&session, 3, 2, vec![item(1, 1, 5), item(2, 2, 45)]).await;

    // 5 x $1 + 45 x $2, plus 15% tax, less 10% discount.
    assert_eq!(output.lines[0].amount, Decimal::new(5, 0));
    assert_eq!(output.lines[1].amount, Decimal::new(90, 0));
    assert_eq!(output.total_amount, Decimal::new(98325, 3));
    assert_eq!(output.lines[0].stock_quantity, 45);
    assert_eq!(output.lines[1].stock_quantity, 105);

    let local = session.stock(1, 1).await.unwrap();
    assert_eq!((local.quantity, local.ytd, local.order_count, local.remote_count), (45, 5, 1, 0));
    let remote = session.stock(2, 2).await.unwrap();
    assert_eq!((remote.quantity, remote.ytd, remote.order_count, remote.remote_count), (105, 45, 1, 1));

    let key = OrderKey::new(1, 3, output.order_id);
    let lines = session.order_lines(key).await.unwrap();
    assert_eq!(lines.iter().map(|l| l.number).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(lines[1].dist_info, "S_DIST_03_2");
    assert_eq!(lines[1].item_name, "Item2");
    assert!(lines.iter().all(|l| l.delivery_d.is_none()));

    let customer = session.customer(CustomerKey::new(1, 3, 2)).await.unwrap();
    assert_eq!(customer.last_order_id, Some(output.order_id));
    assert_eq!(customer.last_order_entry, Some(output.entry_d));
}

#[tokio::test]
async fn test_new_order_writes_identical_indexes() {
    let store = seeded().await;
    let session = store.session();

    let output = place_order(&session, 1, 1, vec![item(3, 2, 1), item(4, 1, 2)]).await;

    let key = OrderKey::new(1, 1, output.order_id);
    let by_id = session.order_by_id(key).await.unwrap().unwrap();
    let by_recency = session
        .order_by_recency(key, output.entry_d)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id, by_recency);
    assert_eq!(by_id.carrier_id, UNDELIVERED_CARRIER_ID);
    assert_eq!(by_id.line_count, 2);
    assert!(!by_id.all_local);
    assert_eq!(by_id.customer_name.last, "Last1");
}

#[tokio::test]
async fn test_concurrent_new_orders_never_reuse_ids() {
    let store = seeded().await;

    let tasks: Vec<_> = (0..20u32)
        .map(|n| {
            let store = store.clone();
            tokio::spawn(async move {
                let session = store.session();
                place_order(&session, 5, n % 3 + 1, vec![item(n % 10 + 1, 1, 1)])
                    .await
                    .order_id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in futures::future::join_all(tasks).await {
        assert!(ids.insert(task.unwrap()));
    }
    assert_eq!(ids, (1..=20).collect());
    assert_eq!(store.session().district(1, 5).await.unwrap().next_order_id, 21);
}

// ============================================================================
// Payment
// ============================================================================

#[tokio::test]
async fn test_payment_updates_three_rows() {
    let store = MemoryStore::new();
    let mut warehouse = test_utils::warehouse(1);
    warehouse.ytd = Decimal::new(100_000, 2);
    let mut district = test_utils::district(1, 2);
    district.ytd = Decimal::new(20_000, 2);
    let key = CustomerKey::new(1, 2, 3);
    let mut customer = test_utils::customer(key);
    customer.balance = Decimal::new(5_000, 2);
    store.insert_warehouse(&warehouse).await.unwrap();
    store.insert_district(&district).await.unwrap();
    store.insert_customer(&customer).await.unwrap();
    let session = store.session();

    let request = PaymentRequest {
        warehouse_id: 1,
        district_id: 2,
        customer_id: 3,
        amount: Decimal::new(2_500, 2),
    };
    let output = payment::execute(&session, &request).await.unwrap();

    assert_eq!(session.warehouse(1).await.unwrap().ytd, Decimal::new(102_500, 2));
    assert_eq!(session.district(1, 2).await.unwrap().ytd, Decimal::new(22_500, 2));
    let after = session.customer(key).await.unwrap();
    assert_eq!(after.balance, Decimal::new(2_500, 2));
    assert_eq!(after.payment_count, customer.payment_count + 1);
    assert_eq!(after.ytd_payment, customer.ytd_payment + Decimal::new(2_500, 2));
    assert_eq!(output.customer, after);
    assert!(output.to_string().ends_with("Payment amount: 25.00"));
}

// ============================================================================
// Delivery
// ============================================================================

async fn order_with_lines(session: &MemorySession, district_id: u32, amounts: &[i64]) -> OrderKey {
    let output = place_order(
        session,
        district_id,
        1,
        (1..=amounts.len() as u32).map(|id| item(id, 1, 1)).collect(),
    )
    .await;
    let key = OrderKey::new(1, district_id, output.order_id);
    // Rewrite amounts so the credited sum is easy to check.
    for (line, &cents) in session.order_lines(key).await.unwrap().iter().zip(amounts) {
        let mut line = line.clone();
        line.amount = Decimal::new(cents, 2);
        session.insert_order_line(&line).await.unwrap();
    }
    key
}

#[tokio::test]
async fn test_delivery_credits_customer_and_stamps_lines() {
    let store = seeded().await;
    let session = store.session();
    let key = order_with_lines(&session, 1, &[1_000, 2_000, 500]).await;
    let before = session.customer(CustomerKey::new(1, 1, 1)).await.unwrap();

    let request = DeliveryRequest {
        warehouse_id: 1,
        carrier_id: 3,
    };
    let output = delivery::execute(&session, &request).await.unwrap();

    assert_eq!(output.delivered.len(), 1);
    assert_eq!(output.delivered[0].amount, Decimal::new(3_500, 2));

    let by_id = session.order_by_id(key).await.unwrap().unwrap();
    let by_recency = session
        .order_by_recency(key, by_id.entry_d)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id.carrier_id, 3);
    assert_eq!(by_id, by_recency);

    let lines = session.order_lines(key).await.unwrap();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.delivery_d.is_some()));

    let after = session.customer(CustomerKey::new(1, 1, 1)).await.unwrap();
    assert_eq!(after.balance, before.balance + Decimal::new(3_500, 2));
    assert_eq!(after.delivery_count, before.delivery_count + 1);
    assert_eq!(after.last_carrier_id, Some(3));
}

#[tokio::test]
async fn test_delivery_attempts_every_district() {
    let store = seeded().await;
    let session = store.session();
    order_with_lines(&session, 1, &[100]).await;
    order_with_lines(&session, 7, &[100]).await;
    order_with_lines(&session, 10, &[100]).await;

    let request = DeliveryRequest {
        warehouse_id: 1,
        carrier_id: 0,
    };
    let output = delivery::execute(&session, &request).await.unwrap();

    let delivered: Vec<u32> = output.delivered.iter().map(|d| d.district_id).collect();
    assert_eq!(delivered, vec![1, 7, 10]);
    assert_eq!(output.skipped_districts, vec![2, 3, 4, 5, 6, 8, 9]);

    let again = delivery::execute(&session, &request).await.unwrap();
    assert!(again.delivered.is_empty());
    assert_eq!(again.skipped_districts.len(), 10);
}

#[tokio::test]
async fn test_delivery_negative_carrier_leaves_order_pending() {
    let store = seeded().await;
    let session = store.session();
    let key = order_with_lines(&session, 4, &[600]).await;
    let before = session.customer(CustomerKey::new(1, 4, 1)).await.unwrap();

    let request = DeliveryRequest {
        warehouse_id: 1,
        carrier_id: UNDELIVERED_CARRIER_ID,
    };
    let result = delivery::execute(&session, &request).await;
    assert!(matches!(result, Err(StorageError::Rejected { .. })));

    let pending = session.order_by_id(key).await.unwrap().unwrap();
    assert!(!pending.is_delivered());
    let after = session.customer(CustomerKey::new(1, 4, 1)).await.unwrap();
    assert_eq!(after.balance, before.balance);
}

#[tokio::test]
async fn test_delivery_takes_oldest_order_first() {
    let store = seeded().await;
    let session = store.session();
    let oldest = order_with_lines(&session, 2, &[100]).await;
    let newer = order_with_lines(&session, 2, &[200]).await;

    let request = DeliveryRequest {
        warehouse_id: 1,
        carrier_id: 5,
    };
    let output = delivery::execute(&session, &request).await.unwrap();

    assert_eq!(output.delivered[0].order_id, oldest.order_id);
    let pending = session.order_by_id(newer).await.unwrap().unwrap();
    assert!(!pending.is_delivered());
}

// ============================================================================
// Order-Status
// ============================================================================

#[tokio::test]
async fn test_order_status_without_orders() {
    let store = seeded().await;
    let session = store.session();

    let request = OrderStatusRequest {
        warehouse_id: 1,
        district_id: 1,
        customer_id: 2,
    };
    let output = order_status::execute(&session, &request).await.unwrap();

    assert!(output.last_order_id.is_none());
    assert!(output.lines.is_empty());
    assert!(output.to_string().contains("Last order number is: none."));
}

#[tokio::test]
async fn test_order_status_tracks_last_order() {
    let store = seeded().await;
    let session = store.session();
    place_order(&session, 1, 2, vec![item(1, 1, 1)]).await;
    let last = place_order(&session, 1, 2, vec![item(2, 1, 3), item(3, 2, 4)]).await;

    let request = OrderStatusRequest {
        warehouse_id: 1,
        district_id: 1,
        customer_id: 2,
    };
    let first_read = order_status::execute(&session, &request).await.unwrap();
    let second_read = order_status::execute(&session, &request).await.unwrap();

    assert_eq!(first_read, second_read);
    assert_eq!(first_read.last_order_id, Some(last.order_id));
    assert_eq!(first_read.last_carrier_id, None);
    let items: Vec<(u32, u32, i32)> = first_read
        .lines
        .iter()
        .map(|l| (l.item_id, l.supply_warehouse_id, l.quantity))
        .collect();
    assert_eq!(items, vec![(2, 1, 3), (3, 2, 4)]);
}

// ============================================================================
// Stock-Level
// ============================================================================

#[tokio::test]
async fn test_stock_level_checks_each_item_once() {
    let store = seeded().await;
    let session = store.session();
    for other in 1..=3 {
        place_order(&session, 6, 1, vec![item(7, 1, 10), item(other, 1, 1)]).await;
    }

    let request = StockLevelRequest {
        warehouse_id: 1,
        district_id: 6,
        threshold: 25,
        last_orders: 3,
    };
    let output = stock_level::execute(&session, &request).await.unwrap();

    assert_eq!(output.items_checked, 4);
    assert_eq!(output.low_stock.len(), 1);
    assert_eq!(output.low_stock[0].item_id, 7);
    assert_eq!(output.low_stock[0].quantity, 20);

    let again = stock_level::execute(&session, &request).await.unwrap();
    assert_eq!(output, again);
}

#[tokio::test]
async fn test_stock_level_window_limits_orders() {
    let store = seeded().await;
    let session = store.session();
    place_order(&session, 6, 1, vec![item(8, 1, 35)]).await;
    place_order(&session, 6, 1, vec![item(9, 1, 1)]).await;

    let request = StockLevelRequest {
        warehouse_id: 1,
        district_id: 6,
        threshold: 20,
        last_orders: 1,
    };
    let output = stock_level::execute(&session, &request).await.unwrap();

    assert_eq!(output.items_checked, 1);
    assert!(output.low_stock.is_empty());
}

// ============================================================================
// Popular-Item
// ============================================================================

#[tokio::test]
async fn test_popular_item_percentages() {
    let store = seeded().await;
    let session = store.session();
    place_order(&session, 8, 1, vec![item(9, 1, 5), item(1, 1, 1)]).await;
    place_order(&session, 8, 1, vec![item(2, 1, 3), item(9, 1, 1)]).await;
    place_order(&session, 8, 2, vec![item(3, 1, 2)]).await;
    place_order(&session, 8, 2, vec![item(4, 1, 2), item(5, 1, 2)]).await;
    place_order(&session, 8, 3, vec![item(1, 1, 4)]).await;

    let request = PopularItemRequest {
        warehouse_id: 1,
        district_id: 8,
        order_count: 5,
    };
    let output = popular_item::execute(&session, &request).await.unwrap();

    assert_eq!(output.orders.len(), 5);
    let tied = output
        .orders
        .iter()
        .find(|o| o.popular.len() == 2)
        .unwrap();
    let tied_items: Vec<u32> = tied.popular.iter().map(|l| l.item_id).collect();
    assert_eq!(tied_items, vec![4, 5]);

    let mut items: Vec<u32> = output.items.iter().map(|i| i.item_id).collect();
    items.sort_unstable();
    assert_eq!(items, vec![1, 2, 3, 4, 5, 9]);

    let percentage = |item_id: u32| {
        output
            .items
            .iter()
            .find(|i| i.item_id == item_id)
            .map(|i| i.percentage)
            .unwrap()
    };
    assert_eq!(percentage(9), Decimal::new(40, 0));
    assert_eq!(percentage(1), Decimal::new(40, 0));
    assert_eq!(percentage(4), Decimal::new(20, 0));
    assert!(output.to_string().contains("percentage: 40.00"));
}

#[tokio::test]
async fn test_popular_item_short_district_uses_requested_window() {
    let store = seeded().await;
    let session = store.session();
    place_order(&session, 6, 1, vec![item(9, 1, 3)]).await;
    place_order(&session, 6, 2, vec![item(9, 1, 2), item(1, 1, 1)]).await;

    let request = PopularItemRequest {
        warehouse_id: 1,
        district_id: 6,
        order_count: 5,
    };
    let output = popular_item::execute(&session, &request).await.unwrap();

    assert_eq!(output.orders.len(), 2);
    let items: Vec<(u32, Decimal)> = output
        .items
        .iter()
        .map(|i| (i.item_id, i.percentage))
        .collect();
    // Two orders out of a window of five.
    assert_eq!(items, vec![(9, Decimal::new(40, 0))]);
}

#[tokio::test]
async fn test_popular_item_empty_district() {
    let store = seeded().await;
    let session = store.session();

    let request = PopularItemRequest {
        warehouse_id: 1,
        district_id: 9,
        order_count: 5,
    };
    let output = popular_item::execute(&session, &request).await.unwrap();

    assert!(output.orders.is_empty());
    assert!(output.items.is_empty());
}

// ============================================================================
// Top-Balance
// ============================================================================

#[tokio::test]
async fn test_top_balance_ranks_ten_customers() {
    let store = MemoryStore::new();
    for customer_id in 1..=12 {
        let mut customer = test_utils::customer(CustomerKey::new(1, customer_id % 3 + 1, customer_id));
        customer.balance = Decimal::from(customer_id * 10);
        store.insert_customer(&customer).await.unwrap();
    }
    let session = store.session();

    let output = top_balance::execute(&session).await.unwrap();

    assert_eq!(output.rows.len(), 10);
    assert_eq!(output.rows[0].balance, Decimal::from(120));
    assert_eq!(output.rows[0].name.first, "First12");
    assert_eq!(output.rows[0].district_id, 1);
    assert!(output.rows.windows(2).all(|w| w[0].balance >= w[1].balance));
    assert_eq!(output, top_balance::execute(&session).await.unwrap());
}

#[tokio::test]
async fn test_top_balance_reports_fewer_rows() {
    let store = MemoryStore::new();
    for customer_id in 1..=3 {
        store
            .insert_customer(&test_utils::customer(CustomerKey::new(2, 1, customer_id)))
            .await
            .unwrap();
    }

    let output = top_balance::execute(&store.session()).await.unwrap();

    assert_eq!(output.rows.len(), 3);
    assert!(output.rows.iter().all(|r| r.warehouse_id == 2));
}

#[test]
fn test_output_kind_names() {
    let output = TransactionOutput::TopBalance(TopBalanceOutput { rows: vec![] });
    assert_eq!(output.kind(), "top-balance");
    assert_eq!(output.to_string(), "");
}
