use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Account, AccountId, Entry, ItemCount, KycStatus, TransactionType};

/// System-wide rollup shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub manufactured: ItemCount,
    pub distributed: ItemCount,
    pub returned: ItemCount,
    pub top_distributors: Vec<DistributorVolume>,
    pub categories: Vec<CategoryVolume>,
    pub total_accounts: usize,
    pub pending_kyc: usize,
}

/// Items received through transfers, per receiving account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorVolume {
    pub account_id: AccountId,
    /// Empty when the account no longer exists
    pub name: String,
    pub total: ItemCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVolume {
    pub product_group: String,
    pub total: ItemCount,
}

/// Fold every entry into the dashboard rollup.
///
/// Only the manufactured/distributed/returned triad is filtered by
/// transaction type; categories count every entry.
pub fn system_stats(entries: &[Entry], accounts: &[Account]) -> DashboardStats {
    let mut manufactured = 0;
    let mut distributed = 0;
    let mut returned = 0;
    let mut by_target: HashMap<AccountId, ItemCount> = HashMap::new();
    let mut by_group: HashMap<&str, ItemCount> = HashMap::new();

    for entry in entries {
        let total = entry.total_items();
        if total == 0 {
            continue;
        }

        match entry.transaction_type {
            TransactionType::Supply => manufactured += total,
            TransactionType::Transfer => {
                distributed += total;
                if let Some(target) = entry.target_account_id {
                    *by_target.entry(target).or_insert(0) += total;
                }
            }
            TransactionType::Return => returned += total,
        }

        *by_group.entry(entry.product_group.as_str()).or_insert(0) += total;
    }

    let names: HashMap<AccountId, &str> = accounts
        .iter()
        .map(|account| (account.id, account.display_name()))
        .collect();

    let mut top_distributors: Vec<DistributorVolume> = by_target
        .into_iter()
        .map(|(account_id, total)| DistributorVolume {
            account_id,
            name: names.get(&account_id).copied().unwrap_or_default().to_string(),
            total,
        })
        .collect();
    top_distributors.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.account_id.cmp(&b.account_id))
    });

    let mut categories: Vec<CategoryVolume> = by_group
        .into_iter()
        .map(|(group, total)| CategoryVolume {
            product_group: group.to_string(),
            total,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.product_group.cmp(&b.product_group))
    });

    DashboardStats {
        manufactured,
        distributed,
        returned,
        top_distributors,
        categories,
        total_accounts: accounts.len(),
        pending_kyc: accounts
            .iter()
            .filter(|account| account.kyc_status == KycStatus::Pending)
            .count(),
    }
}
