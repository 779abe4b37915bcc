use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppResult, FieldErrors};
use crate::transactions::repo::{Transaction, TransactionType};

/// Request body for creating a transaction. The caller supplies the date;
/// it becomes both the creation and update timestamp of the record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub description: Option<String>,
}

/// Partial update: absent fields keep their stored value. `date` replaces
/// the creation timestamp; the update timestamp is always refreshed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub category: Option<Vec<String>>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    25
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// Request body for the list procedure: pagination plus optional filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub category: Option<Vec<String>>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl ListRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::default();
        if self.pagination.page < 1 {
            errors.push("pagination.page", "must be at least 1");
        }
        if !(1..=100).contains(&self.pagination.page_size) {
            errors.push("pagination.pageSize", "must be between 1 and 100");
        }
        errors.into_result()
    }
}

/// Acknowledgment returned by the write procedures. Delete carries no id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteAck {
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<Uuid>,
}

/// One page of transactions plus the window bookkeeping.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// `ceil(total / page_size)`; zero matches means zero pages.
pub fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if total_count == 0 {
        0
    } else {
        (total_count + page_size - 1) / page_size
    }
}
