use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{AccountId, UserId};

pub type EntryId = Uuid;

/// Canonical item count. Signed because balances can go negative.
pub type ItemCount = i64;

pub const ITEMS_PER_UNIT: ItemCount = 1;
pub const ITEMS_PER_DOZEN: ItemCount = 12;
pub const ITEMS_PER_HALF_DOZEN: ItemCount = 6;
pub const ITEMS_PER_CASE: ItemCount = 24;
pub const ITEMS_PER_SERIES: ItemCount = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Goods put into circulation by the source account
    Supply,
    /// Goods moved from the source account to the target account
    Transfer,
    /// Packaging handed back for disposal by the source account
    Return,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Supply => "supply",
            TransactionType::Transfer => "transfer",
            TransactionType::Return => "return",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "supply" => Some(TransactionType::Supply),
            "transfer" => Some(TransactionType::Transfer),
            "return" => Some(TransactionType::Return),
            _ => None,
        }
    }

    /// Only transfers name a target account.
    pub fn requires_target(&self) -> bool {
        matches!(self, TransactionType::Transfer)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Package counts as recorded on the entry form, one field per packaging size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantities {
    #[serde(default)]
    pub unit: u32,
    #[serde(default)]
    pub dozen: u32,
    #[serde(default)]
    pub half_dozen: u32,
    #[serde(default)]
    pub case: u32,
    #[serde(default)]
    pub series: u32,
}

impl Quantities {
    pub fn units(unit: u32) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    pub fn cases(case: u32) -> Self {
        Self {
            case,
            ..Self::default()
        }
    }

    /// Normalize the mixed packaging sizes into a single item count.
    pub fn total_items(&self) -> ItemCount {
        ItemCount::from(self.unit) * ITEMS_PER_UNIT
            + ItemCount::from(self.dozen) * ITEMS_PER_DOZEN
            + ItemCount::from(self.half_dozen) * ITEMS_PER_HALF_DOZEN
            + ItemCount::from(self.case) * ITEMS_PER_CASE
            + ItemCount::from(self.series) * ITEMS_PER_SERIES
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}

/// Which side of an entry an account sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Source,
    Target,
}

/// A recorded supply, transfer or return of packaged goods.
/// Entries are never edited; reversing one only sets `deleted_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub transaction_type: TransactionType,
    pub source_account_id: AccountId,
    /// Set if and only if the entry is a transfer
    pub target_account_id: Option<AccountId>,
    pub product_group: String,
    pub product_name: String,
    #[serde(flatten)]
    pub quantities: Quantities,
    /// When the movement happened in the real world
    pub entry_date: DateTime<Utc>,
    /// User who recorded the entry
    pub created_by: UserId,
    /// True when the source account's PIN was checked and matched
    pub pin_verified: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(
        transaction_type: TransactionType,
        source_account_id: AccountId,
        product_name: impl Into<String>,
        quantities: Quantities,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_type,
            source_account_id,
            target_account_id: None,
            product_group: String::new(),
            product_name: product_name.into(),
            quantities,
            entry_date,
            created_by: Uuid::nil(),
            pin_verified: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn supply(
        source: AccountId,
        product_name: impl Into<String>,
        quantities: Quantities,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            TransactionType::Supply,
            source,
            product_name,
            quantities,
            entry_date,
        )
    }

    pub fn transfer(
        source: AccountId,
        target: AccountId,
        product_name: impl Into<String>,
        quantities: Quantities,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            TransactionType::Transfer,
            source,
            product_name,
            quantities,
            entry_date,
        )
        .with_target(target)
    }

    pub fn return_of(
        source: AccountId,
        product_name: impl Into<String>,
        quantities: Quantities,
        entry_date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            TransactionType::Return,
            source,
            product_name,
            quantities,
            entry_date,
        )
    }

    pub fn with_target(mut self, target: AccountId) -> Self {
        self.target_account_id = Some(target);
        self
    }

    pub fn with_product_group(mut self, group: impl Into<String>) -> Self {
        self.product_group = group.into();
        self
    }

    pub fn with_created_by(mut self, user: UserId) -> Self {
        self.created_by = user;
        self
    }

    pub fn total_items(&self) -> ItemCount {
        self.quantities.total_items()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The sides of this entry the account appears on (at most two).
    pub fn directions_for(&self, account: AccountId) -> impl Iterator<Item = Direction> {
        let source = (self.source_account_id == account).then_some(Direction::Source);
        let target = (self.target_account_id == Some(account)).then_some(Direction::Target);
        source.into_iter().chain(target)
    }

    pub fn involves(&self, account: AccountId) -> bool {
        self.directions_for(account).next().is_some()
    }

    /// Check the structural invariants before the entry is stored.
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.product_name.trim().is_empty() {
            return Err(EntryError::MissingProduct);
        }

        match (self.transaction_type.requires_target(), self.target_account_id) {
            (true, None) => Err(EntryError::MissingTarget),
            (true, Some(target)) if target == self.source_account_id => {
                Err(EntryError::SelfTransfer)
            }
            (false, Some(_)) => Err(EntryError::UnexpectedTarget(self.transaction_type)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("a transfer needs a target account")]
    MissingTarget,

    #[error("a {0} entry cannot name a target account")]
    UnexpectedTarget(TransactionType),

    #[error("source and target account must differ")]
    SelfTransfer,

    #[error("product name is required")]
    MissingProduct,
}
