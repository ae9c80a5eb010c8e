//! Table and column identifiers for the SQLite backend.

use sea_query::Iden;

#[derive(Iden)]
pub enum Warehouses {
    Table,
    #[iden = "w_id"]
    Id,
    #[iden = "w_name"]
    Name,
    #[iden = "w_street_1"]
    Street1,
    #[iden = "w_street_2"]
    Street2,
    #[iden = "w_city"]
    City,
    #[iden = "w_state"]
    State,
    #[iden = "w_zip"]
    Zip,
    #[iden = "w_tax"]
    Tax,
    #[iden = "w_ytd"]
    Ytd,
}

#[derive(Iden)]
pub enum Districts {
    Table,
    #[iden = "d_w_id"]
    WarehouseId,
    #[iden = "d_id"]
    Id,
    #[iden = "d_name"]
    Name,
    #[iden = "d_street_1"]
    Street1,
    #[iden = "d_street_2"]
    Street2,
    #[iden = "d_city"]
    City,
    #[iden = "d_state"]
    State,
    #[iden = "d_zip"]
    Zip,
    #[iden = "d_tax"]
    Tax,
    #[iden = "d_ytd"]
    Ytd,
    #[iden = "d_next_o_id"]
    NextOrderId,
}

#[derive(Iden)]
pub enum Customers {
    Table,
    #[iden = "c_w_id"]
    WarehouseId,
    #[iden = "c_d_id"]
    DistrictId,
    #[iden = "c_id"]
    Id,
    #[iden = "c_first"]
    First,
    #[iden = "c_middle"]
    Middle,
    #[iden = "c_last"]
    Last,
    #[iden = "c_street_1"]
    Street1,
    #[iden = "c_street_2"]
    Street2,
    #[iden = "c_city"]
    City,
    #[iden = "c_state"]
    State,
    #[iden = "c_zip"]
    Zip,
    #[iden = "c_phone"]
    Phone,
    #[iden = "c_since"]
    Since,
    #[iden = "c_credit"]
    Credit,
    #[iden = "c_credit_lim"]
    CreditLimit,
    #[iden = "c_discount"]
    Discount,
    #[iden = "c_balance"]
    Balance,
    #[iden = "c_ytd_payment"]
    YtdPayment,
    #[iden = "c_payment_cnt"]
    PaymentCount,
    #[iden = "c_delivery_cnt"]
    DeliveryCount,
    #[iden = "c_data"]
    Data,
    #[iden = "c_last_o_id"]
    LastOrderId,
    #[iden = "c_last_o_entry_d"]
    LastOrderEntry,
    #[iden = "c_last_o_carrier_id"]
    LastCarrierId,
}

#[derive(Iden)]
pub enum CustomerBalances {
    Table,
}

#[derive(Iden)]
pub enum Items {
    Table,
    #[iden = "i_id"]
    Id,
    #[iden = "i_name"]
    Name,
    #[iden = "i_price"]
    Price,
    #[iden = "i_im_id"]
    ImageId,
    #[iden = "i_data"]
    Data,
}

#[derive(Iden, Clone, Copy)]
pub enum Stocks {
    Table,
    #[iden = "s_w_id"]
    WarehouseId,
    #[iden = "s_i_id"]
    ItemId,
    #[iden = "s_quantity"]
    Quantity,
    #[iden = "s_ytd"]
    Ytd,
    #[iden = "s_order_cnt"]
    OrderCount,
    #[iden = "s_remote_cnt"]
    RemoteCount,
    #[iden = "s_dist_01"]
    Dist01,
    #[iden = "s_dist_02"]
    Dist02,
    #[iden = "s_dist_03"]
    Dist03,
    #[iden = "s_dist_04"]
    Dist04,
    #[iden = "s_dist_05"]
    Dist05,
    #[iden = "s_dist_06"]
    Dist06,
    #[iden = "s_dist_07"]
    Dist07,
    #[iden = "s_dist_08"]
    Dist08,
    #[iden = "s_dist_09"]
    Dist09,
    #[iden = "s_dist_10"]
    Dist10,
    #[iden = "s_data"]
    Data,
}

/// Per-district descriptor columns, district 1 first.
pub const STOCK_DIST_COLUMNS: [Stocks; 10] = [
    Stocks::Dist01,
    Stocks::Dist02,
    Stocks::Dist03,
    Stocks::Dist04,
    Stocks::Dist05,
    Stocks::Dist06,
    Stocks::Dist07,
    Stocks::Dist08,
    Stocks::Dist09,
    Stocks::Dist10,
];

/// Both order indexes share one column layout.
#[derive(Iden, Clone, Copy)]
pub enum Orders {
    #[iden = "orders_by_id"]
    ById,
    #[iden = "orders_by_timestamp"]
    ByTimestamp,
    #[iden = "o_w_id"]
    WarehouseId,
    #[iden = "o_d_id"]
    DistrictId,
    #[iden = "o_id"]
    Id,
    #[iden = "o_c_id"]
    CustomerId,
    #[iden = "o_entry_d"]
    EntryD,
    #[iden = "o_carrier_id"]
    CarrierId,
    #[iden = "o_ol_cnt"]
    LineCount,
    #[iden = "o_all_local"]
    AllLocal,
    #[iden = "c_first"]
    CustomerFirst,
    #[iden = "c_middle"]
    CustomerMiddle,
    #[iden = "c_last"]
    CustomerLast,
}

#[derive(Iden)]
pub enum OrderLines {
    Table,
    #[iden = "ol_w_id"]
    WarehouseId,
    #[iden = "ol_d_id"]
    DistrictId,
    #[iden = "ol_o_id"]
    OrderId,
    #[iden = "ol_number"]
    Number,
    #[iden = "ol_i_id"]
    ItemId,
    #[iden = "i_name"]
    ItemName,
    #[iden = "ol_supply_w_id"]
    SupplyWarehouseId,
    #[iden = "ol_quantity"]
    Quantity,
    #[iden = "ol_amount"]
    Amount,
    #[iden = "ol_delivery_d"]
    DeliveryD,
    #[iden = "ol_dist_info"]
    DistInfo,
}

/// Money columns are TEXT holding exact decimal strings. Timestamps are
/// RFC 3339 UTC with fixed microsecond precision, so they sort as text.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS warehouses (
    w_id INTEGER NOT NULL PRIMARY KEY,
    w_name TEXT NOT NULL,
    w_street_1 TEXT NOT NULL,
    w_street_2 TEXT NOT NULL,
    w_city TEXT NOT NULL,
    w_state TEXT NOT NULL,
    w_zip TEXT NOT NULL,
    w_tax TEXT NOT NULL,
    w_ytd TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS districts (
    d_w_id INTEGER NOT NULL,
    d_id INTEGER NOT NULL,
    d_name TEXT NOT NULL,
    d_street_1 TEXT NOT NULL,
    d_street_2 TEXT NOT NULL,
    d_city TEXT NOT NULL,
    d_state TEXT NOT NULL,
    d_zip TEXT NOT NULL,
    d_tax TEXT NOT NULL,
    d_ytd TEXT NOT NULL,
    d_next_o_id INTEGER NOT NULL,
    PRIMARY KEY (d_w_id, d_id)
);

CREATE TABLE IF NOT EXISTS customers (
    c_w_id INTEGER NOT NULL,
    c_d_id INTEGER NOT NULL,
    c_id INTEGER NOT NULL,
    c_first TEXT NOT NULL,
    c_middle TEXT NOT NULL,
    c_last TEXT NOT NULL,
    c_street_1 TEXT NOT NULL,
    c_street_2 TEXT NOT NULL,
    c_city TEXT NOT NULL,
    c_state TEXT NOT NULL,
    c_zip TEXT NOT NULL,
    c_phone TEXT NOT NULL,
    c_since TEXT NOT NULL,
    c_credit TEXT NOT NULL,
    c_credit_lim TEXT NOT NULL,
    c_discount TEXT NOT NULL,
    c_balance TEXT NOT NULL,
    c_ytd_payment TEXT NOT NULL,
    c_payment_cnt INTEGER NOT NULL,
    c_delivery_cnt INTEGER NOT NULL,
    c_data TEXT NOT NULL,
    c_last_o_id INTEGER,
    c_last_o_entry_d TEXT,
    c_last_o_carrier_id INTEGER,
    PRIMARY KEY (c_w_id, c_d_id, c_id)
);

CREATE TABLE IF NOT EXISTS items (
    i_id INTEGER NOT NULL PRIMARY KEY,
    i_name TEXT NOT NULL,
    i_price TEXT NOT NULL,
    i_im_id INTEGER NOT NULL,
    i_data TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stocks (
    s_w_id INTEGER NOT NULL,
    s_i_id INTEGER NOT NULL,
    s_quantity INTEGER NOT NULL,
    s_ytd INTEGER NOT NULL,
    s_order_cnt INTEGER NOT NULL,
    s_remote_cnt INTEGER NOT NULL,
    s_dist_01 TEXT NOT NULL,
    s_dist_02 TEXT NOT NULL,
    s_dist_03 TEXT NOT NULL,
    s_dist_04 TEXT NOT NULL,
    s_dist_05 TEXT NOT NULL,
    s_dist_06 TEXT NOT NULL,
    s_dist_07 TEXT NOT NULL,
    s_dist_08 TEXT NOT NULL,
    s_dist_09 TEXT NOT NULL,
    s_dist_10 TEXT NOT NULL,
    s_data TEXT NOT NULL,
    PRIMARY KEY (s_w_id, s_i_id)
);

CREATE TABLE IF NOT EXISTS orders_by_id (
    o_w_id INTEGER NOT NULL,
    o_d_id INTEGER NOT NULL,
    o_id INTEGER NOT NULL,
    o_c_id INTEGER NOT NULL,
    o_entry_d TEXT NOT NULL,
    o_carrier_id INTEGER NOT NULL,
    o_ol_cnt INTEGER NOT NULL,
    o_all_local INTEGER NOT NULL,
    c_first TEXT NOT NULL,
    c_middle TEXT NOT NULL,
    c_last TEXT NOT NULL,
    PRIMARY KEY (o_w_id, o_d_id, o_id)
);

CREATE TABLE IF NOT EXISTS orders_by_timestamp (
    o_w_id INTEGER NOT NULL,
    o_d_id INTEGER NOT NULL,
    o_id INTEGER NOT NULL,
    o_c_id INTEGER NOT NULL,
    o_entry_d TEXT NOT NULL,
    o_carrier_id INTEGER NOT NULL,
    o_ol_cnt INTEGER NOT NULL,
    o_all_local INTEGER NOT NULL,
    c_first TEXT NOT NULL,
    c_middle TEXT NOT NULL,
    c_last TEXT NOT NULL,
    PRIMARY KEY (o_w_id, o_d_id, o_entry_d, o_id)
);

CREATE TABLE IF NOT EXISTS order_lines (
    ol_w_id INTEGER NOT NULL,
    ol_d_id INTEGER NOT NULL,
    ol_o_id INTEGER NOT NULL,
    ol_number INTEGER NOT NULL,
    ol_i_id INTEGER NOT NULL,
    i_name TEXT NOT NULL,
    ol_supply_w_id INTEGER NOT NULL,
    ol_quantity INTEGER NOT NULL,
    ol_amount TEXT NOT NULL,
    ol_delivery_d TEXT,
    ol_dist_info TEXT NOT NULL,
    PRIMARY KEY (ol_w_id, ol_d_id, ol_o_id, ol_number)
);

CREATE VIEW IF NOT EXISTS customer_balances AS
    SELECT c_w_id, c_d_id, c_id, c_balance FROM customers;
"#;
