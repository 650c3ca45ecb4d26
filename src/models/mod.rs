//! Wire types for the domain records the UI round-trips through the client.
//!
//! These are thin payload shapes only; aggregation, chart math, and
//! validation rules live with the consumers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload for creating or updating a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One page of the transaction list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// Filters and pagination for the transaction list. Unset fields are
/// omitted from the query string.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TransactionQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref category) = self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(kind) = self.kind {
            let kind = match kind {
                TransactionKind::Income => "income",
                TransactionKind::Expense => "expense",
            };
            pairs.push(("type", kind.to_string()));
        }
        if let Some(date) = self.start_date {
            pairs.push(("startDate", date.to_string()));
        }
        if let Some(date) = self.end_date {
            pairs.push(("endDate", date.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "_id")]
    pub id: String,
    pub month: DateTime<Utc>,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBudget {
    pub month: DateTime<Utc>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub category_data: Vec<CategorySpend>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: f64,
}
