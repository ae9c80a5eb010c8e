//! Payment: apply a customer payment to warehouse, district and customer.

use std::fmt;

use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{Address, Customer, CustomerKey};
use crate::storage::{Result, StorageClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub warehouse_id: u32,
    pub district_id: u32,
    pub customer_id: u32,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutput {
    pub warehouse_address: Address,
    pub district_address: Address,
    /// Customer row as written.
    pub customer: Customer,
    pub amount: Decimal,
}

/// Read-then-write warehouse, district and customer, in that order.
///
/// The customer balance is debited by the payment.
pub async fn execute(store: &dyn StorageClient, request: &PaymentRequest) -> Result<PaymentOutput> {
    let warehouse = store.warehouse(request.warehouse_id).await?;
    store
        .update_warehouse_ytd(warehouse.id, warehouse.ytd + request.amount)
        .await?;

    let district = store
        .district(request.warehouse_id, request.district_id)
        .await?;
    store
        .update_district_ytd(district.warehouse_id, district.id, district.ytd + request.amount)
        .await?;

    let key = CustomerKey::new(
        request.warehouse_id,
        request.district_id,
        request.customer_id,
    );
    let mut customer = store.customer(key).await?;
    customer.balance -= request.amount;
    customer.ytd_payment += request.amount;
    customer.payment_count += 1;
    store
        .update_customer_payment(
            key,
            customer.balance,
            customer.ytd_payment,
            customer.payment_count,
        )
        .await?;

    debug!(customer = %key, amount = %request.amount, "Payment applied");

    Ok(PaymentOutput {
        warehouse_address: warehouse.address,
        district_address: district.address,
        customer,
        amount: request.amount,
    })
}

impl fmt::Display for PaymentOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.customer;
        writeln!(f, "Warehouse address: {}", self.warehouse_address)?;
        writeln!(f, "District address: {}", self.district_address)?;
        writeln!(
            f,
            "Customer: Identifier({}, {}, {}), Name({}, {}, {}), Address({}, {}, {}, {}, {}), \
             Phone({}), Since({}), Credits({}, {}, {}, {})",
            c.key.warehouse_id,
            c.key.district_id,
            c.key.customer_id,
            c.name.first,
            c.name.middle,
            c.name.last,
            c.address.street_1,
            c.address.street_2,
            c.address.city,
            c.address.state,
            c.address.zip,
            c.phone,
            c.since,
            c.credit,
            c.credit_limit,
            c.discount,
            c.balance
        )?;
        write!(f, "Payment amount: {}", self.amount)
    }
}
