mod common;

use anyhow::Result;
use common::test_service;
use packledger::application::{AppError, NewAccount, NewEntry};
use packledger::domain::{AccountStatus, AccountType, KycStatus, Quantities};
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_fetch_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = Uuid::new_v4();

    let new_account = NewAccount {
        plot_number: Some("14B".to_string()),
        area: Some("Tema".to_string()),
        is_international: true,
        ..NewAccount::new("  Ama Mensah  ", AccountType::Manufacturer, owner)
            .with_company_name("Acme Bottling")
            .with_pin("4321")
    };
    let created = service.create_account(new_account).await?;

    let fetched = service.get_account(created.id).await?;
    assert_eq!(fetched.name, "Ama Mensah");
    assert_eq!(fetched.display_name(), "Acme Bottling");
    assert_eq!(fetched.account_type, AccountType::Manufacturer);
    assert_eq!(fetched.kyc_status, KycStatus::Pending);
    assert_eq!(fetched.status, AccountStatus::Active);
    assert_eq!(fetched.plot_number.as_deref(), Some("14B"));
    assert_eq!(fetched.area.as_deref(), Some("Tema"));
    assert!(fetched.is_international);
    assert!(fetched.has_pin());
    assert_eq!(fetched.created_by, owner);

    Ok(())
}

#[tokio::test]
async fn test_blank_name_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .create_account(NewAccount::new("   ", AccountType::Household, Uuid::new_v4()))
        .await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(service.list_accounts(None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_list_accounts_by_type() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = Uuid::new_v4();

    for (name, account_type) in [
        ("Zed Depot", AccountType::Distributor),
        ("Alpha Depot", AccountType::Distributor),
        ("City Hospital", AccountType::Institution),
    ] {
        service
            .create_account(NewAccount::new(name, account_type, owner))
            .await?;
    }

    let all = service.list_accounts(None).await?;
    assert_eq!(all.len(), 3);

    let distributors = service.list_accounts(Some(AccountType::Distributor)).await?;
    let names: Vec<&str> = distributors.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha Depot", "Zed Depot"]);

    Ok(())
}

#[tokio::test]
async fn test_status_transitions() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service
        .create_account(NewAccount::new("Depot", AccountType::Distributor, Uuid::new_v4()))
        .await?;

    let suspended = service.suspend_account(account.id).await?;
    assert_eq!(suspended.status, AccountStatus::Suspended);

    let active = service.unsuspend_account(account.id).await?;
    assert_eq!(active.status, AccountStatus::Active);

    // Only a suspension can be lifted
    let result = service.unsuspend_account(account.id).await;
    assert!(matches!(
        result,
        Err(AppError::InvalidStatusTransition {
            from: AccountStatus::Active,
            to: AccountStatus::Active
        })
    ));

    service.block_account(account.id).await?;
    let result = service.unsuspend_account(account.id).await;
    assert!(matches!(result, Err(AppError::InvalidStatusTransition { .. })));
    assert_eq!(
        service.get_account(account.id).await?.status,
        AccountStatus::Blocked
    );

    Ok(())
}

#[tokio::test]
async fn test_update_kyc() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service
        .create_account(NewAccount::new("Depot", AccountType::Distributor, Uuid::new_v4()))
        .await?;

    service.update_kyc(account.id, KycStatus::Approved).await?;
    assert_eq!(
        service.get_account(account.id).await?.kyc_status,
        KycStatus::Approved
    );

    let result = service.update_kyc(Uuid::new_v4(), KycStatus::Rejected).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_account_keeps_entries() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let maker = service
        .create_account(NewAccount::new("Maker", AccountType::Manufacturer, Uuid::new_v4()))
        .await?;
    let depot = service
        .create_account(NewAccount::new("Depot", AccountType::Distributor, Uuid::new_v4()))
        .await?;

    service
        .record_entry(NewEntry::transfer(
            maker.id,
            depot.id,
            "Water",
            Quantities::cases(1),
        ))
        .await?;

    service.delete_account(depot.id).await?;
    assert!(matches!(
        service.get_account(depot.id).await,
        Err(AppError::AccountNotFound(_))
    ));

    // The entry survives and still shows up, unnamed, in the dashboard
    assert_eq!(service.list_entries().await?.len(), 1);
    let stats = service.system_stats(None).await?;
    assert_eq!(stats.total_accounts, 1);
    assert_eq!(stats.top_distributors.len(), 1);
    assert_eq!(stats.top_distributors[0].account_id, depot.id);
    assert_eq!(stats.top_distributors[0].name, "");

    let result = service.delete_account(depot.id).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}
