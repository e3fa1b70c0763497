use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

use crate::application::{LedgerService, ReportQuery};
use crate::domain::{Account, AccountId, Entry};

/// Database snapshot for a full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub entries: Vec<Entry>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export live entries to CSV format
    pub async fn export_entries_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.service.list_entries().await?;
        let names = self.account_names().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "entry_date",
            "transaction_type",
            "source_account",
            "target_account",
            "product_group",
            "product_name",
            "unit",
            "dozen",
            "half_dozen",
            "case",
            "series",
            "total_items",
            "pin_verified",
        ])?;

        let name_of = |id: AccountId| names.get(&id).cloned().unwrap_or_else(|| id.to_string());

        for entry in &entries {
            let q = &entry.quantities;
            csv_writer.write_record([
                entry.id.to_string(),
                entry.entry_date.to_rfc3339(),
                entry.transaction_type.to_string(),
                name_of(entry.source_account_id),
                entry.target_account_id.map(&name_of).unwrap_or_default(),
                entry.product_group.clone(),
                entry.product_name.clone(),
                q.unit.to_string(),
                q.dozen.to_string(),
                q.half_dozen.to_string(),
                q.case.to_string(),
                q.series.to_string(),
                entry.total_items().to_string(),
                entry.pin_verified.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }

    /// Export every account's per-product balances to CSV format
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let all = self.service.all_account_balances().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["account_id", "account", "product", "supply", "waste"])?;

        let mut count = 0;
        for account_balances in &all {
            let account = &account_balances.account;
            for (product, balance) in &account_balances.balances {
                csv_writer.write_record([
                    account.id.to_string(),
                    account.display_name().to_string(),
                    product.clone(),
                    balance.supply.to_string(),
                    balance.waste.to_string(),
                ])?;
                count += 1;
            }
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export a report dataset to CSV format
    pub async fn export_report_csv<W: Write>(&self, query: &ReportQuery, writer: W) -> Result<usize> {
        let report = self.service.build_report(query).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["level", "supply", "disposal", "net"])?;
        for record in &report.records {
            csv_writer.write_record([
                record.level.clone(),
                record.supply.to_string(),
                record.disposal.to_string(),
                record.net().to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(report.records.len())
    }

    /// Export full database as JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let accounts = self.service.list_accounts(None).await?;
        let entries = self.service.list_entries().await?;

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts,
            entries,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }

    async fn account_names(&self) -> Result<HashMap<AccountId, String>> {
        Ok(self
            .service
            .list_accounts(None)
            .await?
            .into_iter()
            .map(|a| (a.id, a.display_name().to_string()))
            .collect())
    }
}
