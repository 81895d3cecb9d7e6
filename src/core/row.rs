//! Keyed column layouts for the positional worksheet contract
//!
//! The destination worksheets are append-only and positional: a row is a list
//! of cells matched to the sheet's existing header purely by index. Rows are
//! therefore described as an ordered list of [`Column`] keys and only turned
//! into positional cells at the last moment.

use crate::core::error::ConfigError;
use crate::core::order::OrderRecord;
use serde::{Deserialize, Serialize};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(i64),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// A column a worksheet row can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Left blank; the sheet owner numbers rows by hand
    RowNumber,
    Timestamp,
    BuyerName,
    Address,
    Phone,
    Coordinator,
    Quantity,
    /// All items in one cell: `Baju 1: M-Pendek; Baju 2: L-Panjang`
    ItemDetail,
    /// Item sizes only, comma separated
    Sizes,
    /// Item sleeve styles only, comma separated
    Sleeves,
    PaymentStatus,
    ProofUrl,
}

impl Column {
    fn cell(&self, record: &OrderRecord, item_label: &str) -> CellValue {
        match self {
            Column::RowNumber => CellValue::Text(String::new()),
            Column::Timestamp => CellValue::Text(record.timestamp()),
            Column::BuyerName => record.buyer_name.as_str().into(),
            Column::Address => record.address.as_str().into(),
            Column::Phone => record.phone.as_str().into(),
            Column::Coordinator => record.coordinator.as_str().into(),
            Column::Quantity => CellValue::Number(record.quantity() as i64),
            Column::ItemDetail => CellValue::Text(record.item_detail(item_label)),
            Column::Sizes => CellValue::Text(
                record
                    .items
                    .iter()
                    .map(|item| item.size.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Column::Sleeves => CellValue::Text(
                record
                    .items
                    .iter()
                    .map(|item| item.sleeve.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Column::PaymentStatus => record.payment_status.as_str().into(),
            Column::ProofUrl => record.proof_reference().into(),
        }
    }
}

/// Ordered column list matching a worksheet header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowLayout(Vec<Column>);

impl RowLayout {
    pub fn new(columns: Vec<Column>) -> Self {
        Self(columns)
    }

    /// Default layout of the detail worksheet
    pub fn detail() -> Self {
        Self(vec![
            Column::RowNumber,
            Column::Timestamp,
            Column::BuyerName,
            Column::Address,
            Column::Phone,
            Column::ItemDetail,
            Column::PaymentStatus,
            Column::Coordinator,
            Column::ProofUrl,
        ])
    }

    /// Default layout of the summary worksheet
    pub fn summary() -> Self {
        Self(vec![
            Column::RowNumber,
            Column::Timestamp,
            Column::BuyerName,
            Column::Address,
            Column::Quantity,
            Column::PaymentStatus,
            Column::Coordinator,
            Column::ProofUrl,
        ])
    }

    pub fn columns(&self) -> &[Column] {
        &self.0
    }

    /// Turn a record into positional cells
    pub fn project(&self, record: &OrderRecord, item_label: &str) -> Vec<CellValue> {
        self.0
            .iter()
            .map(|column| column.cell(record, item_label))
            .collect()
    }

    pub(crate) fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.0.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: "[]".to_string(),
                message: "a row layout needs at least one column".to_string(),
            });
        }
        Ok(())
    }
}
