use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Account, AccountId, AccountType, Direction, Entry, ItemCount, KycStatus, TransactionType};

/// Net supply and cumulative waste of one product for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductBalance {
    /// Stock currently held; negative means more left than was recorded arriving
    pub supply: ItemCount,
    /// Packaging returned for disposal
    pub waste: ItemCount,
}

impl ProductBalance {
    pub fn is_zero(&self) -> bool {
        self.supply == 0 && self.waste == 0
    }

    fn apply(&mut self, transaction_type: TransactionType, direction: Direction, total: ItemCount) {
        match (transaction_type, direction) {
            (TransactionType::Supply, Direction::Source) => self.supply += total,
            (TransactionType::Transfer, Direction::Source) => self.supply -= total,
            (TransactionType::Transfer, Direction::Target) => self.supply += total,
            (TransactionType::Return, Direction::Source) => self.waste += total,
            (TransactionType::Supply, Direction::Target)
            | (TransactionType::Return, Direction::Target) => {}
        }
    }
}

/// Fold the entry history into per-product balances for one account.
/// Products whose supply and waste are both zero are left out.
pub fn account_balances(account_id: AccountId, entries: &[Entry]) -> BTreeMap<String, ProductBalance> {
    let mut balances: BTreeMap<String, ProductBalance> = BTreeMap::new();

    for entry in entries {
        let total = entry.total_items();
        if total == 0 {
            continue;
        }

        for direction in entry.directions_for(account_id) {
            balances
                .entry(entry.product_name.clone())
                .or_default()
                .apply(entry.transaction_type, direction, total);
        }
    }

    balances.retain(|_, balance| !balance.is_zero());
    balances
}

/// Dashboard figures for the account a user owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub supply_received: ItemCount,
    pub distributed: ItemCount,
    pub returned: ItemCount,
    /// supply_received - distributed - returned, not clamped
    pub balance: ItemCount,
    pub kyc_status: KycStatus,
    pub account_type: AccountType,
}

/// Fold an account's entries into its user-facing totals.
///
/// Stock received through a transfer counts as supply received, alongside
/// the account's own supply entries.
pub fn user_stats(account: &Account, entries: &[Entry]) -> UserStats {
    let mut supply_received = 0;
    let mut distributed = 0;
    let mut returned = 0;

    for entry in entries {
        let total = entry.total_items();
        for direction in entry.directions_for(account.id) {
            match (entry.transaction_type, direction) {
                (TransactionType::Supply, Direction::Source) => supply_received += total,
                (TransactionType::Transfer, Direction::Source) => distributed += total,
                (TransactionType::Transfer, Direction::Target) => supply_received += total,
                (TransactionType::Return, Direction::Source) => returned += total,
                (TransactionType::Supply, Direction::Target)
                | (TransactionType::Return, Direction::Target) => {}
            }
        }
    }

    UserStats {
        supply_received,
        distributed,
        returned,
        balance: supply_received - distributed - returned,
        kyc_status: account.kyc_status,
        account_type: account.account_type,
    }
}
