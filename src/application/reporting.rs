use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Entry, ProductBalance};

/// Name used on reports that cover every account.
pub const ALL_ACCOUNTS_LABEL: &str = "All Accounts";

pub const ALL_TIME_LABEL: &str = "All time";

/// Per-product balances of one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalances {
    pub account: Account,
    pub balances: BTreeMap<String, ProductBalance>,
}

/// Parameters for building a report dataset.
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    /// Raw account id as received from the caller; `None` covers all accounts
    pub account_id: Option<String>,
    /// Inclusive lower bound on `entry_date`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `entry_date`
    pub to: Option<DateTime<Utc>>,
    /// Explicit period label, e.g. "December 2024"
    pub period: Option<String>,
}

impl ReportQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn covers(&self, entry: &Entry) -> bool {
        self.from.is_none_or(|from| entry.entry_date >= from)
            && self.to.is_none_or(|to| entry.entry_date < to)
    }

    /// The label printed on the report.
    pub fn period_label(&self) -> String {
        if let Some(period) = self.period.as_deref().filter(|p| !p.trim().is_empty()) {
            return period.to_string();
        }

        let fmt = |date: Option<DateTime<Utc>>| {
            date.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "…".to_string())
        };

        match (self.from, self.to) {
            (None, None) => ALL_TIME_LABEL.to_string(),
            (from, to) => format!("{} to {}", fmt(from), fmt(to)),
        }
    }
}
