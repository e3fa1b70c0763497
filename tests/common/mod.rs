// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use packledger::application::{LedgerService, NewAccount, NewEntry};
use packledger::domain::{Account, AccountType, Entry, Quantities};
use tempfile::TempDir;
use uuid::Uuid;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: one account per step of the supply chain
pub struct SupplyChain {
    pub owner: Uuid,
    pub maker: Account,
    pub distributor: Account,
    pub household: Account,
}

impl SupplyChain {
    pub async fn create(service: &LedgerService) -> Result<Self> {
        let owner = Uuid::new_v4();
        let maker = service
            .create_account(
                NewAccount::new("Ama Mensah", AccountType::Manufacturer, owner)
                    .with_company_name("Acme Bottling"),
            )
            .await?;
        let distributor = service
            .create_account(NewAccount::new(
                "Kofi Boateng",
                AccountType::Distributor,
                Uuid::new_v4(),
            ))
            .await?;
        let household = service
            .create_account(NewAccount::new(
                "Esi Owusu",
                AccountType::Household,
                Uuid::new_v4(),
            ))
            .await?;

        Ok(Self {
            owner,
            maker,
            distributor,
            household,
        })
    }

    pub async fn supply(
        &self,
        service: &LedgerService,
        product: &str,
        quantities: Quantities,
    ) -> Result<Entry> {
        Ok(service
            .record_entry(NewEntry::supply(self.maker.id, product, quantities))
            .await?)
    }

    pub async fn ship(
        &self,
        service: &LedgerService,
        product: &str,
        quantities: Quantities,
    ) -> Result<Entry> {
        Ok(service
            .record_entry(NewEntry::transfer(
                self.maker.id,
                self.distributor.id,
                product,
                quantities,
            ))
            .await?)
    }
}
