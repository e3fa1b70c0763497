use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    self, Account, AccountId, AccountStatus, AccountType, DashboardStats, Entry, EntryId, KycStatus,
    Quantities, ReportDataset, TransactionType, UserId, UserStats, is_catalog_product,
};
use crate::io::RendererClient;
use crate::storage::Repository;

use super::{ALL_ACCOUNTS_LABEL, AccountBalances, AppError, ReportQuery};

/// How many of the latest entries are sent for analysis.
pub const INSIGHTS_WINDOW: u32 = 50;

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, API, etc.).
///
/// Every aggregation fetches a snapshot from the store once and folds it
/// with the pure functions in `domain`.
pub struct LedgerService {
    repo: Repository,
    renderer: Option<RendererClient>,
}

/// Registration details for a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub company_name: Option<String>,
    pub plot_number: Option<String>,
    pub area: Option<String>,
    pub contact: Option<String>,
    pub is_international: bool,
    pub pin: Option<String>,
    pub created_by: UserId,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, account_type: AccountType, created_by: UserId) -> Self {
        Self {
            name: name.into(),
            account_type,
            company_name: None,
            plot_number: None,
            area: None,
            contact: None,
            is_international: false,
            pin: None,
            created_by,
        }
    }

    pub fn with_company_name(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }

    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }
}

/// A transaction as submitted from the entry form
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub transaction_type: TransactionType,
    pub source_account_id: AccountId,
    pub target_account_id: Option<AccountId>,
    pub product_group: String,
    pub product_name: String,
    pub quantities: Quantities,
    pub entry_date: DateTime<Utc>,
    pub created_by: UserId,
    /// PIN of the source account, checked when the account has one
    pub pin: Option<String>,
}

impl NewEntry {
    pub fn new(
        transaction_type: TransactionType,
        source_account_id: AccountId,
        product_name: impl Into<String>,
        quantities: Quantities,
    ) -> Self {
        Self {
            transaction_type,
            source_account_id,
            target_account_id: None,
            product_group: String::new(),
            product_name: product_name.into(),
            quantities,
            entry_date: Utc::now(),
            created_by: Uuid::nil(),
            pin: None,
        }
    }

    pub fn supply(source: AccountId, product_name: impl Into<String>, quantities: Quantities) -> Self {
        Self::new(TransactionType::Supply, source, product_name, quantities)
    }

    pub fn transfer(
        source: AccountId,
        target: AccountId,
        product_name: impl Into<String>,
        quantities: Quantities,
    ) -> Self {
        Self::new(TransactionType::Transfer, source, product_name, quantities).with_target(target)
    }

    pub fn return_of(source: AccountId, product_name: impl Into<String>, quantities: Quantities) -> Self {
        Self::new(TransactionType::Return, source, product_name, quantities)
    }

    pub fn with_target(mut self, target: AccountId) -> Self {
        self.target_account_id = Some(target);
        self
    }

    pub fn with_product_group(mut self, group: impl Into<String>) -> Self {
        self.product_group = group.into();
        self
    }

    pub fn on(mut self, entry_date: DateTime<Utc>) -> Self {
        self.entry_date = entry_date;
        self
    }

    pub fn by(mut self, user: UserId) -> Self {
        self.created_by = user;
        self
    }

    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }
}

/// Parse a required identifier received from a caller.
pub fn parse_id(param: &str, value: Option<&str>) -> Result<Uuid, AppError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidQuery(format!("{param} is required")))?;

    Uuid::parse_str(value)
        .map_err(|_| AppError::InvalidQuery(format!("{param} is not a valid id: {value}")))
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            renderer: None,
        }
    }

    /// Attach the client used for report rendering and insights.
    pub fn with_renderer(mut self, renderer: RendererClient) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account operations
    // ========================

    /// Register a new account. KYC starts as pending and the account is active.
    pub async fn create_account(&self, new_account: NewAccount) -> Result<Account, AppError> {
        let name = new_account.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("account name is required".to_string()));
        }

        let mut account = Account::new(name, new_account.account_type, new_account.created_by)
            .with_location(new_account.plot_number, new_account.area)
            .with_international(new_account.is_international);
        if let Some(company) = new_account.company_name {
            account = account.with_company_name(company);
        }
        if let Some(contact) = new_account.contact {
            account = account.with_contact(contact);
        }
        if let Some(pin) = new_account.pin.as_deref().filter(|p| !p.is_empty()) {
            account = account.with_pin(pin).context("Failed to hash PIN")?;
        }

        self.repo.save_account(&account).await?;
        info!(account = %account.id, account_type = %account.account_type, "account created");
        Ok(account)
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// List accounts, optionally only those of one type.
    pub async fn list_accounts(
        &self,
        account_type: Option<AccountType>,
    ) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts(account_type).await?)
    }

    pub async fn block_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.change_status(id, AccountStatus::Blocked).await
    }

    pub async fn suspend_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.change_status(id, AccountStatus::Suspended).await
    }

    pub async fn unsuspend_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.change_status(id, AccountStatus::Active).await
    }

    async fn change_status(&self, id: AccountId, next: AccountStatus) -> Result<Account, AppError> {
        let mut account = self.get_account(id).await?;
        if !account.status.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition {
                from: account.status,
                to: next,
            });
        }

        self.repo.update_account_status(id, next).await?;
        info!(account = %id, from = %account.status, to = %next, "account status changed");
        account.status = next;
        Ok(account)
    }

    pub async fn update_kyc(&self, id: AccountId, kyc_status: KycStatus) -> Result<Account, AppError> {
        let mut account = self.get_account(id).await?;
        self.repo.update_kyc_status(id, kyc_status).await?;
        info!(account = %id, kyc_status = %kyc_status, "KYC status updated");
        account.kyc_status = kyc_status;
        Ok(account)
    }

    /// Administrative override: removes the account but keeps its entries.
    pub async fn delete_account(&self, id: AccountId) -> Result<Account, AppError> {
        let account = self.get_account(id).await?;
        if !self.repo.delete_account(id).await? {
            return Err(AppError::AccountNotFound(id.to_string()));
        }
        info!(account = %id, "account deleted");
        Ok(account)
    }

    // ========================
    // Entry operations
    // ========================

    /// Record a supply, transfer or return.
    ///
    /// The account checks and the insert share one database transaction, so
    /// an entry is only stored against the account state it was verified with.
    pub async fn record_entry(&self, new_entry: NewEntry) -> Result<Entry, AppError> {
        let mut entry = Entry::new(
            new_entry.transaction_type,
            new_entry.source_account_id,
            new_entry.product_name.trim(),
            new_entry.quantities,
            new_entry.entry_date,
        )
        .with_product_group(new_entry.product_group.trim())
        .with_created_by(new_entry.created_by);
        entry.target_account_id = new_entry.target_account_id;
        entry.validate()?;

        if !is_catalog_product(&entry.product_name) {
            debug!(product = %entry.product_name, "product is not in the catalog");
        }

        let mut tx = self.repo.begin().await?;

        let source = Repository::get_account_in(&mut *tx, entry.source_account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(entry.source_account_id.to_string()))?;
        if !source.is_active() {
            return Err(AppError::AccountInactive {
                name: source.name,
                status: source.status,
            });
        }

        if let Some(target_id) = entry.target_account_id {
            let target = Repository::get_account_in(&mut *tx, target_id)
                .await?
                .ok_or_else(|| AppError::AccountNotFound(target_id.to_string()))?;
            if target.status == AccountStatus::Blocked {
                return Err(AppError::TargetBlocked { name: target.name });
            }
        }

        entry.pin_verified = source
            .verify_pin(new_entry.pin.as_deref())
            .map_err(|e| AppError::PinRejected {
                account: source.name.clone(),
                source: e,
            })?;

        Repository::insert_entry_in(&mut *tx, &entry).await?;
        tx.commit().await.context("Failed to commit entry")?;

        info!(
            entry = %entry.id,
            transaction_type = %entry.transaction_type,
            product = %entry.product_name,
            total_items = entry.total_items(),
            "entry recorded"
        );
        Ok(entry)
    }

    pub async fn get_entry(&self, id: EntryId) -> Result<Entry, AppError> {
        self.repo
            .get_entry(id)
            .await?
            .ok_or_else(|| AppError::EntryNotFound(id.to_string()))
    }

    pub async fn list_entries(&self) -> Result<Vec<Entry>, AppError> {
        Ok(self.repo.list_entries().await?)
    }

    pub async fn list_entries_for_account(&self, account_id: AccountId) -> Result<Vec<Entry>, AppError> {
        self.get_account(account_id).await?;
        Ok(self.repo.list_entries_for_account(account_id).await?)
    }

    /// Reverse an entry by soft-deleting it. It stops counting everywhere.
    pub async fn reverse_entry(&self, id: EntryId) -> Result<Entry, AppError> {
        let mut entry = self.get_entry(id).await?;
        if !self.repo.soft_delete_entry(id).await? {
            return Err(AppError::EntryNotFound(id.to_string()));
        }
        entry.deleted_at = Some(Utc::now());
        info!(entry = %id, "entry reversed");
        Ok(entry)
    }

    // ========================
    // Aggregations
    // ========================

    /// Per-product supply and waste for one account, identified by the raw
    /// id the caller sent.
    pub async fn account_balances(&self, account_id: Option<&str>) -> Result<AccountBalances, AppError> {
        let account_id = parse_id("account_id", account_id)?;
        let account = self.get_account(account_id).await?;
        let entries = self.repo.list_entries_for_account(account_id).await?;
        debug!(account = %account_id, entries = entries.len(), "computing account balances");

        Ok(AccountBalances {
            balances: domain::account_balances(account_id, &entries),
            account,
        })
    }

    /// Balances for every account, folded from a single entry snapshot.
    pub async fn all_account_balances(&self) -> Result<Vec<AccountBalances>, AppError> {
        let accounts = self.repo.list_accounts(None).await?;
        let entries = self.repo.list_entries().await?;
        debug!(accounts = accounts.len(), entries = entries.len(), "computing all balances");

        Ok(accounts
            .into_iter()
            .map(|account| AccountBalances {
                balances: domain::account_balances(account.id, &entries),
                account,
            })
            .collect())
    }

    /// System-wide dashboard figures. `top` caps the distributor ranking.
    pub async fn system_stats(&self, top: Option<usize>) -> Result<DashboardStats, AppError> {
        let entries = self.repo.list_entries().await?;
        let accounts = self.repo.list_accounts(None).await?;
        debug!(accounts = accounts.len(), entries = entries.len(), "computing dashboard");

        let mut stats = domain::system_stats(&entries, &accounts);
        if let Some(limit) = top {
            stats.top_distributors.truncate(limit);
        }
        Ok(stats)
    }

    /// Dashboard figures for the account the user registered.
    pub async fn user_stats(&self, user_id: UserId) -> Result<UserStats, AppError> {
        let account = self
            .repo
            .get_account_by_owner(user_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(format!("no account owned by user {user_id}")))?;
        let entries = self.repo.list_entries_for_account(account.id).await?;
        debug!(user = %user_id, account = %account.id, entries = entries.len(), "computing user stats");

        Ok(domain::user_stats(&account, &entries))
    }

    /// Build the dataset that is handed to the report renderer.
    pub async fn build_report(&self, query: &ReportQuery) -> Result<ReportDataset, AppError> {
        let (account_name, entries) = match &query.account_id {
            Some(raw) => {
                let account_id = parse_id("account_id", Some(raw))?;
                let account = self.get_account(account_id).await?;
                let entries = self.repo.list_entries_for_account(account_id).await?;
                (account.display_name().to_string(), entries)
            }
            None => (ALL_ACCOUNTS_LABEL.to_string(), self.repo.list_entries().await?),
        };

        let entries: Vec<Entry> = entries.into_iter().filter(|e| query.covers(e)).collect();
        debug!(entries = entries.len(), "building report dataset");

        Ok(domain::build_report(account_name, query.period_label(), &entries))
    }

    /// Build the report dataset and have the renderer turn it into a document.
    pub async fn export_report(&self, query: &ReportQuery) -> Result<Vec<u8>, AppError> {
        let renderer = self.renderer()?;
        let dataset = self.build_report(query).await?;
        renderer.render_report(&dataset).await
    }

    /// Send a summary of recent activity to the analysis service.
    pub async fn insights(&self) -> Result<serde_json::Value, AppError> {
        let renderer = self.renderer()?;
        let summary: Vec<String> = self
            .repo
            .recent_entries(INSIGHTS_WINDOW)
            .await?
            .iter()
            .map(|e| format!("{}: {}", e.transaction_type, e.product_name))
            .collect();

        renderer.analyze(&summary).await
    }

    fn renderer(&self) -> Result<&RendererClient, AppError> {
        self.renderer
            .as_ref()
            .ok_or_else(|| AppError::UpstreamUnavailable("no report renderer configured".to_string()))
    }
}
