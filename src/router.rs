//! Instruction stream parsing and dispatch.
//!
//! A client's instruction file is one record per line, comma separated and
//! tag first:
//!
//! ```text
//! N,cId,wId,dId,itemCount     followed by itemCount lines of itemId,supplyWId,quantity
//! P,wId,dId,cId,payment
//! D,wId,carrierId
//! O,wId,dId,cId
//! S,wId,dId,threshold,lastOrders
//! I,wId,dId,numOfOrders
//! T
//! ```
//!
//! Unknown tags are logged and skipped. Malformed fields are fatal.

use std::str::FromStr;

use rust_decimal::Decimal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;

use crate::storage::{self, StorageClient};
use crate::transactions::{
    delivery, new_order, order_status, payment, popular_item, stock_level, top_balance,
    DeliveryRequest, NewOrderRequest, OrderItem, OrderStatusRequest, PaymentRequest,
    PopularItemRequest, StockLevelRequest, TransactionOutput,
};

/// Errors raised while reading an instruction stream.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing field {field} in '{tag}' instruction")]
    MissingField { tag: String, field: &'static str },

    #[error("Invalid number in field {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid decimal in field {field}: {value:?}")]
    InvalidDecimal { field: &'static str, value: String },

    #[error("Expected {expected} item lines after New-Order, found {found}")]
    UnexpectedEof { expected: usize, found: usize },

    #[error("New-Order instruction without items")]
    EmptyItemBlock,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    NewOrder(NewOrderRequest),
    Payment(PaymentRequest),
    Delivery(DeliveryRequest),
    OrderStatus(OrderStatusRequest),
    StockLevel(StockLevelRequest),
    PopularItem(PopularItemRequest),
    TopBalance,
}

impl Instruction {
    pub fn tag(&self) -> char {
        match self {
            Instruction::NewOrder(_) => 'N',
            Instruction::Payment(_) => 'P',
            Instruction::Delivery(_) => 'D',
            Instruction::OrderStatus(_) => 'O',
            Instruction::StockLevel(_) => 'S',
            Instruction::PopularItem(_) => 'I',
            Instruction::TopBalance => 'T',
        }
    }
}

/// Comma-separated fields of one record, after the tag.
struct Fields<'a> {
    tag: &'a str,
    rest: std::str::Split<'a, char>,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        let mut rest = line.split(',');
        let tag = rest.next().unwrap_or_default().trim();
        Self { tag, rest }
    }

    fn raw(&mut self, field: &'static str) -> Result<&'a str, ParseError> {
        match self.rest.next().map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ParseError::MissingField {
                tag: self.tag.to_string(),
                field,
            }),
        }
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, ParseError> {
        let value = self.raw(field)?;
        value.parse().map_err(|_| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    }

    /// Carrier ids are non-negative; `-1` marks an undelivered order.
    fn carrier_id(&mut self) -> Result<i32, ParseError> {
        let value = self.raw("carrierId")?;
        match value.parse::<i32>() {
            Ok(id) if id >= 0 => Ok(id),
            _ => Err(ParseError::InvalidNumber {
                field: "carrierId",
                value: value.to_string(),
            }),
        }
    }

    fn decimal(&mut self, field: &'static str) -> Result<Decimal, ParseError> {
        let value = self.raw(field)?;
        Decimal::from_str(value).map_err(|_| ParseError::InvalidDecimal {
            field,
            value: value.to_string(),
        })
    }
}

/// Reads [`Instruction`]s from a line-oriented source.
pub struct InstructionReader<R> {
    lines: Lines<R>,
    line_number: usize,
    skipped: usize,
}

impl<R: AsyncBufRead + Unpin> InstructionReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Last line consumed, 1-based.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Records skipped because of an unknown tag.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    async fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        let line = self.lines.next_line().await?;
        if line.is_some() {
            self.line_number += 1;
        }
        Ok(line)
    }

    /// Next instruction, or `None` at end of input.
    pub async fn next_instruction(&mut self) -> Result<Option<Instruction>, ParseError> {
        loop {
            let Some(line) = self.next_line().await? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = Fields::new(line);
            let tag = fields.tag;
            let instruction = match tag {
                "N" => self.new_order(line).await?,
                "P" => Instruction::Payment(PaymentRequest {
                    warehouse_id: fields.number("wId")?,
                    district_id: fields.number("dId")?,
                    customer_id: fields.number("cId")?,
                    amount: fields.decimal("payment")?,
                }),
                "D" => Instruction::Delivery(DeliveryRequest {
                    warehouse_id: fields.number("wId")?,
                    carrier_id: fields.carrier_id()?,
                }),
                "O" => Instruction::OrderStatus(OrderStatusRequest {
                    warehouse_id: fields.number("wId")?,
                    district_id: fields.number("dId")?,
                    customer_id: fields.number("cId")?,
                }),
                "S" => Instruction::StockLevel(StockLevelRequest {
                    warehouse_id: fields.number("wId")?,
                    district_id: fields.number("dId")?,
                    threshold: fields.number("T")?,
                    last_orders: fields.number("L")?,
                }),
                "I" => Instruction::PopularItem(PopularItemRequest {
                    warehouse_id: fields.number("wId")?,
                    district_id: fields.number("dId")?,
                    order_count: fields.number("numOfOrders")?,
                }),
                "T" => Instruction::TopBalance,
                tag => {
                    warn!(line = self.line_number, tag, "Unknown instruction tag, skipping");
                    self.skipped += 1;
                    continue;
                }
            };
            return Ok(Some(instruction));
        }
    }

    /// Parse a New-Order header and its trailing block of item lines.
    async fn new_order(&mut self, header: &str) -> Result<Instruction, ParseError> {
        let mut fields = Fields::new(header);
        let customer_id = fields.number("cId")?;
        let warehouse_id = fields.number("wId")?;
        let district_id = fields.number("dId")?;
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        if columns.len() < 5 {
            return Err(ParseError::MissingField {
                tag: "N".to_string(),
                field: "itemCount",
            });
        }
        let count_field = columns[columns.len() - 1];
        let count: usize = count_field.parse().map_err(|_| ParseError::InvalidNumber {
            field: "itemCount",
            value: count_field.to_string(),
        })?;
        if count == 0 {
            return Err(ParseError::EmptyItemBlock);
        }

        let mut items = Vec::new();
        while items.len() < count {
            let Some(line) = self.next_line().await? else {
                return Err(ParseError::UnexpectedEof {
                    expected: count,
                    found: items.len(),
                });
            };
            let mut fields = Fields::new(line.trim());
            // Item lines have no tag: the first column is the item id.
            let item_id = fields.tag.parse().map_err(|_| ParseError::InvalidNumber {
                field: "itemId",
                value: fields.tag.to_string(),
            })?;
            items.push(OrderItem {
                item_id,
                supply_warehouse_id: fields.number("supplyWId")?,
                quantity: fields.number("quantity")?,
            });
        }

        Ok(Instruction::NewOrder(NewOrderRequest {
            customer_id,
            warehouse_id,
            district_id,
            items,
        }))
    }
}

/// Run one instruction against the store.
pub async fn dispatch(
    store: &dyn StorageClient,
    instruction: &Instruction,
) -> storage::Result<TransactionOutput> {
    let output = match instruction {
        Instruction::NewOrder(req) => TransactionOutput::NewOrder(new_order::execute(store, req).await?),
        Instruction::Payment(req) => TransactionOutput::Payment(payment::execute(store, req).await?),
        Instruction::Delivery(req) => TransactionOutput::Delivery(delivery::execute(store, req).await?),
        Instruction::OrderStatus(req) => {
            TransactionOutput::OrderStatus(order_status::execute(store, req).await?)
        }
        Instruction::StockLevel(req) => {
            TransactionOutput::StockLevel(stock_level::execute(store, req).await?)
        }
        Instruction::PopularItem(req) => {
            TransactionOutput::PopularItem(popular_item::execute(store, req).await?)
        }
        Instruction::TopBalance => TransactionOutput::TopBalance(top_balance::execute(store).await?),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils;

    async fn parse_all(input: &str) -> Result<Vec<Instruction>, ParseError> {
        let mut reader = InstructionReader::new(input.as_bytes());
        let mut out = Vec::new();
        while let Some(instruction) = reader.next_instruction().await? {
            out.push(instruction);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn test_parse_every_tag() {
        let input = "N,4,1,2,2\n5,1,3\n6,2,1\nP,1,2,3,125.50\nD,1,7\nO,1,2,3\nS,1,2,15,20\nI,1,2,5\nT\n";
        let parsed = parse_all(input).await.unwrap();

        let tags: String = parsed.iter().map(Instruction::tag).collect();
        assert_eq!(tags, "NPDOSIT");
        assert_eq!(
            parsed[0],
            Instruction::NewOrder(NewOrderRequest {
                customer_id: 4,
                warehouse_id: 1,
                district_id: 2,
                items: vec![
                    OrderItem {
                        item_id: 5,
                        supply_warehouse_id: 1,
                        quantity: 3
                    },
                    OrderItem {
                        item_id: 6,
                        supply_warehouse_id: 2,
                        quantity: 1
                    },
                ],
            })
        );
        assert_eq!(
            parsed[1],
            Instruction::Payment(PaymentRequest {
                warehouse_id: 1,
                district_id: 2,
                customer_id: 3,
                amount: Decimal::new(12550, 2),
            })
        );
        assert_eq!(
            parsed[4],
            Instruction::StockLevel(StockLevelRequest {
                warehouse_id: 1,
                district_id: 2,
                threshold: 15,
                last_orders: 20,
            })
        );
    }

    #[tokio::test]
    async fn test_item_count_is_last_header_field() {
        let parsed = parse_all("N,4,1,2,99,1\n5,1,3\n").await.unwrap();
        match &parsed[0] {
            Instruction::NewOrder(req) => assert_eq!(req.items.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tag_skipped() {
        let mut reader = InstructionReader::new("X,1,2\n\nT\n".as_bytes());

        assert_eq!(
            reader.next_instruction().await.unwrap(),
            Some(Instruction::TopBalance)
        );
        assert_eq!(reader.skipped(), 1);
        assert_eq!(reader.line_number(), 3);
        assert!(reader.next_instruction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_number_is_fatal() {
        let err = parse_all("P,1,two,3,10\n").await.unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { field: "dId", .. }));

        let err = parse_all("P,1,2,3,ten\n").await.unwrap_err();
        assert!(matches!(err, ParseError::InvalidDecimal { field: "payment", .. }));

        let err = parse_all("D,1,-1\n").await.unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { field: "carrierId", .. }));
    }

    #[tokio::test]
    async fn test_carrier_id_beyond_i32_rejected() {
        let err = parse_all("D,1,4294967295\n").await.unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { field: "carrierId", .. }));

        let parsed = parse_all("D,1,2147483647\n").await.unwrap();
        assert_eq!(
            parsed[0],
            Instruction::Delivery(DeliveryRequest {
                warehouse_id: 1,
                carrier_id: i32::MAX,
            })
        );
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let err = parse_all("O,1,2\n").await.unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "cId", .. }));

        let err = parse_all("N,4,1,2\n").await.unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "itemCount", .. }));
    }

    #[tokio::test]
    async fn test_truncated_item_block() {
        let err = parse_all("N,4,1,2,3\n5,1,3\n").await.unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedEof {
                expected: 3,
                found: 1
            }
        ));

        let err = parse_all("N,4,1,2,0\n").await.unwrap_err();
        assert!(matches!(err, ParseError::EmptyItemBlock));
    }

    #[tokio::test]
    async fn test_huge_item_count_reports_truncation() {
        let err = parse_all("N,1,1,1,18446744073709551615\n5,1,3\n")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedEof {
                expected: usize::MAX,
                found: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_handler() {
        let store = MemoryStore::new();
        test_utils::seed_items(&store, 5).await.unwrap();
        test_utils::seed_warehouse(&store, 1, 2, 5).await.unwrap();
        let session = store.session();

        let parsed = parse_all("N,1,1,1,1\n3,1,2\nO,1,1,1\n").await.unwrap();
        let first = dispatch(&session, &parsed[0]).await.unwrap();
        let second = dispatch(&session, &parsed[1]).await.unwrap();

        assert_eq!(first.kind(), "new-order");
        match second {
            TransactionOutput::OrderStatus(status) => {
                assert_eq!(status.last_order_id, Some(1));
                assert_eq!(status.lines.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
