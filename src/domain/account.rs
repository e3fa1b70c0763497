use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type AccountId = Uuid;
pub type UserId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Manufacturer,
    Distributor,
    Institution,
    Household,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Manufacturer => "manufacturer",
            AccountType::Distributor => "distributor",
            AccountType::Institution => "institution",
            AccountType::Household => "household",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manufacturer" => Some(AccountType::Manufacturer),
            "distributor" => Some(AccountType::Distributor),
            "institution" => Some(AccountType::Institution),
            "household" => Some(AccountType::Household),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(KycStatus::Pending),
            "approved" => Some(KycStatus::Approved),
            "rejected" => Some(KycStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Blocked,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
            AccountStatus::Suspended => "suspended",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "blocked" => Some(AccountStatus::Blocked),
            "suspended" => Some(AccountStatus::Suspended),
            _ => None,
        }
    }

    /// Blocked is terminal; suspension can be lifted or escalated to a block.
    pub fn can_transition_to(&self, next: AccountStatus) -> bool {
        matches!(
            (self, next),
            (AccountStatus::Active, AccountStatus::Blocked)
                | (AccountStatus::Active, AccountStatus::Suspended)
                | (AccountStatus::Suspended, AccountStatus::Active)
                | (AccountStatus::Suspended, AccountStatus::Blocked)
        )
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A participant that supplies, receives or disposes of packaging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub account_type: AccountType,
    pub name: String,
    pub company_name: Option<String>,
    pub plot_number: Option<String>,
    pub area: Option<String>,
    pub contact: Option<String>,
    pub is_international: bool,
    pub kyc_status: KycStatus,
    pub status: AccountStatus,
    /// Salted SHA-256 of the authorization PIN, never exported
    #[serde(skip)]
    pub pin_hash: Option<String>,
    /// The user that registered (and owns) this account
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: impl Into<String>, account_type: AccountType, created_by: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_type,
            name: name.into(),
            company_name: None,
            plot_number: None,
            area: None,
            contact: None,
            is_international: false,
            kyc_status: KycStatus::Pending,
            status: AccountStatus::Active,
            pin_hash: None,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn with_company_name(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }

    pub fn with_location(mut self, plot_number: Option<String>, area: Option<String>) -> Self {
        self.plot_number = plot_number;
        self.area = area;
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn with_international(mut self, international: bool) -> Self {
        self.is_international = international;
        self
    }

    pub fn with_pin(mut self, pin: &str) -> Result<Self, bcrypt::BcryptError> {
        self.pin_hash = Some(hash_pin(pin)?);
        Ok(self)
    }

    /// Name shown on dashboards: the company name when there is one.
    pub fn display_name(&self) -> &str {
        match self.company_name.as_deref() {
            Some(company) if !company.trim().is_empty() => company,
            _ => &self.name,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn has_pin(&self) -> bool {
        self.pin_hash.is_some()
    }

    /// Check a supplied PIN. `Ok(true)` means a configured PIN matched,
    /// `Ok(false)` means the account has no PIN to check.
    pub fn verify_pin(&self, pin: Option<&str>) -> Result<bool, PinError> {
        let Some(expected) = self.pin_hash.as_deref() else {
            return Ok(false);
        };
        let pin = pin.filter(|p| !p.is_empty()).ok_or(PinError::Missing)?;

        // An unreadable stored hash can never match.
        match bcrypt::verify(pin, expected) {
            Ok(true) => Ok(true),
            Ok(false) | Err(_) => Err(PinError::Mismatch),
        }
    }
}

/// bcrypt hash of an authorization PIN, with a fresh random salt.
pub fn hash_pin(pin: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(pin, bcrypt::DEFAULT_COST)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    #[error("authorization PIN is required")]
    Missing,

    #[error("authorization PIN does not match")]
    Mismatch,
}
