use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountStatus, AccountType, Entry, EntryId, KycStatus, Quantities,
    TransactionType, UserId,
};

use super::MIGRATION_001_INITIAL;

const ACCOUNT_COLUMNS: &str = "id, account_type, name, company_name, plot_number, area, contact, \
     is_international, kyc_status, status, pin_hash, created_by, created_at";

const ENTRY_COLUMNS: &str = "id, transaction_type, source_account_id, target_account_id, \
     product_group, product_name, qty_unit, qty_dozen, qty_half_dozen, qty_case, qty_series, \
     entry_date, created_by, pin_verified, created_at, deleted_at";

/// Account and entry store backed by SQLite.
///
/// Entries are append-only: the only mutation is the soft-delete marker,
/// and every entry query skips soft-deleted rows.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Start a transaction for check-then-write sequences.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool.begin().await.context("Failed to begin transaction")
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, account_type, name, company_name, plot_number, area, contact,
                                  is_international, kyc_status, status, pin_hash, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.account_type.as_str())
        .bind(&account.name)
        .bind(&account.company_name)
        .bind(&account.plot_number)
        .bind(&account.area)
        .bind(&account.contact)
        .bind(account.is_international)
        .bind(account.kyc_status.as_str())
        .bind(account.status.as_str())
        .bind(&account.pin_hash)
        .bind(account.created_by.to_string())
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::get_account_in(&mut *conn, id).await
    }

    /// Get an account by ID inside an open transaction or connection.
    pub async fn get_account_in(conn: &mut SqliteConnection, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(conn)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// Get the account a user registered. The oldest one wins if there are several.
    pub async fn get_account_by_owner(&self, user_id: UserId) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE created_by = ? ORDER BY created_at LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by owner")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// List accounts, optionally restricted to one account type.
    pub async fn list_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>> {
        let rows = match account_type {
            Some(account_type) => {
                sqlx::query(&format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_type = ? ORDER BY name"
                ))
                .bind(account_type.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY name"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    pub async fn update_account_status(&self, id: AccountId, status: AccountStatus) -> Result<()> {
        sqlx::query("UPDATE accounts SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update account status")?;
        Ok(())
    }

    pub async fn update_kyc_status(&self, id: AccountId, kyc_status: KycStatus) -> Result<()> {
        sqlx::query("UPDATE accounts SET kyc_status = ? WHERE id = ?")
            .bind(kyc_status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update KYC status")?;
        Ok(())
    }

    /// Hard-delete an account. Its entries are left in place.
    pub async fn delete_account(&self, id: AccountId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let account_type_str: String = row.get("account_type");
        let kyc_status_str: String = row.get("kyc_status");
        let status_str: String = row.get("status");

        Ok(Account {
            id: parse_uuid(row, "id")?,
            account_type: AccountType::from_str(&account_type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid account type: {}", account_type_str))?,
            name: row.get("name"),
            company_name: row.get("company_name"),
            plot_number: row.get("plot_number"),
            area: row.get("area"),
            contact: row.get("contact"),
            is_international: row.get::<i32, _>("is_international") != 0,
            kyc_status: KycStatus::from_str(&kyc_status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid KYC status: {}", kyc_status_str))?,
            status: AccountStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid account status: {}", status_str))?,
            pin_hash: row.get("pin_hash"),
            created_by: parse_uuid(row, "created_by")?,
            created_at: parse_timestamp(row, "created_at")?,
        })
    }

    // ========================
    // Entry operations
    // ========================

    /// Insert an entry inside an open transaction or connection.
    pub async fn insert_entry_in(conn: &mut SqliteConnection, entry: &Entry) -> Result<()> {
        let q = &entry.quantities;

        sqlx::query(
            r#"
            INSERT INTO entries (id, transaction_type, source_account_id, target_account_id,
                                 product_group, product_name, qty_unit, qty_dozen, qty_half_dozen,
                                 qty_case, qty_series, entry_date, created_by, pin_verified,
                                 created_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.transaction_type.as_str())
        .bind(entry.source_account_id.to_string())
        .bind(entry.target_account_id.map(|id| id.to_string()))
        .bind(&entry.product_group)
        .bind(&entry.product_name)
        .bind(i64::from(q.unit))
        .bind(i64::from(q.dozen))
        .bind(i64::from(q.half_dozen))
        .bind(i64::from(q.case))
        .bind(i64::from(q.series))
        .bind(entry.entry_date.to_rfc3339())
        .bind(entry.created_by.to_string())
        .bind(entry.pin_verified)
        .bind(entry.created_at.to_rfc3339())
        .bind(entry.deleted_at.map(|dt| dt.to_rfc3339()))
        .execute(conn)
        .await
        .context("Failed to save entry")?;

        Ok(())
    }

    /// Get a live (not soft-deleted) entry by ID.
    pub async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>> {
        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch entry")?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    /// List every live entry, oldest first.
    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE deleted_at IS NULL ORDER BY entry_date, created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// List live entries where the account is source or target.
    pub async fn list_entries_for_account(&self, account_id: AccountId) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE deleted_at IS NULL AND (source_account_id = ? OR target_account_id = ?)
            ORDER BY entry_date, created_at
            "#
        ))
        .bind(account_id.to_string())
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list entries for account")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// The most recently recorded live entries, newest first.
    pub async fn recent_entries(&self, limit: u32) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE deleted_at IS NULL ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Mark an entry as deleted. Returns false if it was missing or already deleted.
    pub async fn soft_delete_entry(&self, id: EntryId) -> Result<bool> {
        let result = sqlx::query("UPDATE entries SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete entry")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_entry(row: &SqliteRow) -> Result<Entry> {
        let transaction_type_str: String = row.get("transaction_type");
        let target_str: Option<String> = row.get("target_account_id");
        let deleted_at_str: Option<String> = row.get("deleted_at");

        Ok(Entry {
            id: parse_uuid(row, "id")?,
            transaction_type: TransactionType::from_str(&transaction_type_str).ok_or_else(|| {
                anyhow::anyhow!("Invalid transaction type: {}", transaction_type_str)
            })?,
            source_account_id: parse_uuid(row, "source_account_id")?,
            target_account_id: target_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid target_account_id")?,
            product_group: row.get("product_group"),
            product_name: row.get("product_name"),
            quantities: Quantities {
                unit: parse_count(row, "qty_unit")?,
                dozen: parse_count(row, "qty_dozen")?,
                half_dozen: parse_count(row, "qty_half_dozen")?,
                case: parse_count(row, "qty_case")?,
                series: parse_count(row, "qty_series")?,
            },
            entry_date: parse_timestamp(row, "entry_date")?,
            created_by: parse_uuid(row, "created_by")?,
            pin_verified: row.get::<i32, _>("pin_verified") != 0,
            created_at: parse_timestamp(row, "created_at")?,
            deleted_at: deleted_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid deleted_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.get(column);
    Uuid::parse_str(&value).with_context(|| format!("Invalid {} ID", column))
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let value: String = row.get(column);
    Ok(DateTime::parse_from_rfc3339(&value)
        .with_context(|| format!("Invalid {} timestamp", column))?
        .with_timezone(&Utc))
}

fn parse_count(row: &SqliteRow, column: &str) -> Result<u32> {
    let value: i64 = row.get(column);
    u32::try_from(value).with_context(|| format!("Invalid {} count: {}", column, value))
}
