use thiserror::Error;

use crate::domain::{AccountStatus, EntryError, PinError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(#[from] EntryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account {name} is {status} and cannot record entries")]
    AccountInactive { name: String, status: AccountStatus },

    #[error("Account {name} is blocked and cannot receive transfers")]
    TargetBlocked { name: String },

    #[error("PIN check failed for account {account}: {source}")]
    PinRejected {
        account: String,
        #[source]
        source: PinError,
    },

    #[error("Account cannot go from {from} to {to}")]
    InvalidStatusTransition {
        from: AccountStatus,
        to: AccountStatus,
    },

    #[error("Report service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
