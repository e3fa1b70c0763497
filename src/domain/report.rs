use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Entry, ItemCount, TransactionType};

/// Structured summary handed to the report renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDataset {
    pub account_name: String,
    pub period: String,
    pub records: Vec<ReportRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Product name the row aggregates
    pub level: String,
    pub supply: ItemCount,
    pub disposal: ItemCount,
}

impl ReportRecord {
    pub fn net(&self) -> ItemCount {
        self.supply - self.disposal
    }
}

impl ReportDataset {
    pub fn total_supply(&self) -> ItemCount {
        self.records.iter().map(|r| r.supply).sum()
    }

    pub fn total_disposal(&self) -> ItemCount {
        self.records.iter().map(|r| r.disposal).sum()
    }
}

/// Group supply and return entries by product. Transfers are not part of
/// this view, and products with nothing supplied or disposed are dropped.
pub fn build_report(
    account_name: impl Into<String>,
    period: impl Into<String>,
    entries: &[Entry],
) -> ReportDataset {
    let mut rows: BTreeMap<&str, (ItemCount, ItemCount)> = BTreeMap::new();

    for entry in entries {
        let total = entry.total_items();
        let row = rows.entry(entry.product_name.as_str()).or_insert((0, 0));
        match entry.transaction_type {
            TransactionType::Supply => row.0 += total,
            TransactionType::Return => row.1 += total,
            TransactionType::Transfer => {}
        }
    }

    let records = rows
        .into_iter()
        .filter(|(_, (supply, disposal))| *supply != 0 || *disposal != 0)
        .map(|(level, (supply, disposal))| ReportRecord {
            level: level.to_string(),
            supply,
            disposal,
        })
        .collect();

    ReportDataset {
        account_name: account_name.into(),
        period: period.into(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::Quantities;

    #[test]
    fn test_groups_supply_and_disposal() {
        let maker = Uuid::new_v4();
        let home = Uuid::new_v4();
        let entries = vec![
            Entry::supply(maker, "Water", Quantities::cases(2), Utc::now()),
            Entry::supply(maker, "Water", Quantities::units(2), Utc::now()),
            Entry::return_of(home, "Water", Quantities::units(5), Utc::now()),
            Entry::supply(maker, "Flour", Quantities::units(1), Utc::now()),
        ];

        let report = build_report("Acme", "December 2024", &entries);

        assert_eq!(report.account_name, "Acme");
        assert_eq!(report.period, "December 2024");
        assert_eq!(
            report.records,
            vec![
                ReportRecord {
                    level: "Flour".into(),
                    supply: 1,
                    disposal: 0
                },
                ReportRecord {
                    level: "Water".into(),
                    supply: 50,
                    disposal: 5
                },
            ]
        );
        assert_eq!(report.records[1].net(), 45);
        assert_eq!(report.total_supply(), 51);
        assert_eq!(report.total_disposal(), 5);
    }

    #[test]
    fn test_transfer_only_products_omitted() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let entries = vec![
            Entry::transfer(a, b, "Sugar", Quantities::units(9), Utc::now()),
            Entry::supply(a, "Water", Quantities::default(), Utc::now()),
        ];

        assert!(build_report("Acme", "All time", &entries).records.is_empty());
    }

    #[test]
    fn test_serializes_renderer_shape() {
        let a = Uuid::new_v4();
        let entries = vec![Entry::supply(a, "Water", Quantities::units(3), Utc::now())];
        let report = build_report("Acme", "All time", &entries);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "account_name": "Acme",
                "period": "All time",
                "records": [{"level": "Water", "supply": 3, "disposal": 0}]
            })
        );
    }
}
