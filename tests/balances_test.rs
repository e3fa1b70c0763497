mod common;

use anyhow::Result;
use common::{SupplyChain, test_service};
use packledger::application::{AppError, NewAccount, NewEntry, parse_id};
use packledger::domain::{AccountType, KycStatus, ProductBalance, Quantities};
use uuid::Uuid;

#[tokio::test]
async fn test_transfer_moves_stock_between_accounts() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;

    chain.supply(&service, "Water", Quantities::cases(2)).await?;
    chain.ship(&service, "Water", Quantities::units(10)).await?;

    let maker = service.account_balances(Some(&chain.maker.id.to_string())).await?;
    assert_eq!(
        maker.balances["Water"],
        ProductBalance {
            supply: 38,
            waste: 0
        }
    );
    assert_eq!(maker.account.id, chain.maker.id);

    let distributor = service.account_balances(Some(&chain.distributor.id.to_string())).await?;
    assert_eq!(distributor.balances["Water"].supply, 10);
    assert_eq!(distributor.balances["Water"].waste, 0);

    let household = service.account_balances(Some(&chain.household.id.to_string())).await?;
    assert!(household.balances.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_returns_accumulate_waste() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;

    for units in [5, 7] {
        service
            .record_entry(NewEntry::return_of(
                chain.household.id,
                "Soda",
                Quantities::units(units),
            ))
            .await?;
    }

    let balances = service.account_balances(Some(&chain.household.id.to_string())).await?;
    assert_eq!(
        balances.balances["Soda"],
        ProductBalance {
            supply: 0,
            waste: 12
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_zero_entries_change_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;

    chain.supply(&service, "Water", Quantities::cases(1)).await?;
    let before = service.account_balances(Some(&chain.maker.id.to_string())).await?.balances;
    let stats_before = service.system_stats(None).await?;

    chain.supply(&service, "Juice", Quantities::default()).await?;
    chain.ship(&service, "Water", Quantities::default()).await?;

    let after = service.account_balances(Some(&chain.maker.id.to_string())).await?.balances;
    assert_eq!(before, after);
    assert!(!after.contains_key("Juice"));
    assert_eq!(service.system_stats(None).await?, stats_before);

    Ok(())
}

#[tokio::test]
async fn test_balance_requires_valid_account_id() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(matches!(parse_id("account", None), Err(AppError::InvalidQuery(_))));
    assert!(matches!(parse_id("account", Some("  ")), Err(AppError::InvalidQuery(_))));
    assert!(matches!(
        parse_id("account", Some("not-a-uuid")),
        Err(AppError::InvalidQuery(_))
    ));

    for raw in [None, Some(""), Some(" "), Some("not-a-uuid")] {
        let result = service.account_balances(raw).await;
        assert!(
            matches!(result, Err(AppError::InvalidQuery(_))),
            "expected InvalidQuery for {raw:?}"
        );
    }

    let result = service.account_balances(Some(&Uuid::new_v4().to_string())).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_all_account_balances() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;

    chain.supply(&service, "Water", Quantities::cases(2)).await?;
    chain.ship(&service, "Water", Quantities::units(10)).await?;

    let all = service.all_account_balances().await?;
    assert_eq!(all.len(), 3);

    let total: i64 = all
        .iter()
        .filter_map(|a| a.balances.get("Water"))
        .map(|b| b.supply)
        .sum();
    // Transfers conserve stock across the system
    assert_eq!(total, 48);

    Ok(())
}

#[tokio::test]
async fn test_dashboard_totals() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;

    service
        .record_entry(
            NewEntry::supply(chain.maker.id, "Water", Quantities::cases(2))
                .with_product_group("Beverages"),
        )
        .await?;
    service
        .record_entry(
            NewEntry::transfer(
                chain.maker.id,
                chain.distributor.id,
                "Water",
                Quantities::units(10),
            )
            .with_product_group("Beverages"),
        )
        .await?;
    service
        .record_entry(
            NewEntry::return_of(chain.household.id, "Shampoo", Quantities::units(5))
                .with_product_group("Toiletries"),
        )
        .await?;
    service.update_kyc(chain.maker.id, KycStatus::Approved).await?;

    let stats = service.system_stats(None).await?;
    assert_eq!(stats.manufactured, 48);
    assert_eq!(stats.distributed, 10);
    assert_eq!(stats.returned, 5);
    assert_eq!(stats.total_accounts, 3);
    assert_eq!(stats.pending_kyc, 2);

    assert_eq!(stats.top_distributors.len(), 1);
    assert_eq!(stats.top_distributors[0].account_id, chain.distributor.id);
    assert_eq!(stats.top_distributors[0].name, "Kofi Boateng");
    assert_eq!(stats.top_distributors[0].total, 10);

    let categories: Vec<(&str, i64)> = stats
        .categories
        .iter()
        .map(|c| (c.product_group.as_str(), c.total))
        .collect();
    assert_eq!(categories, vec![("Beverages", 58), ("Toiletries", 5)]);

    Ok(())
}

#[tokio::test]
async fn test_top_distributors_ranking() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;
    let second = service
        .create_account(NewAccount::new(
            "Yaw Depot",
            AccountType::Distributor,
            Uuid::new_v4(),
        ))
        .await?;

    chain.supply(&service, "Water", Quantities::cases(10)).await?;
    chain.ship(&service, "Water", Quantities::units(10)).await?;
    service
        .record_entry(NewEntry::transfer(
            chain.maker.id,
            second.id,
            "Water",
            Quantities::units(30),
        ))
        .await?;

    let stats = service.system_stats(None).await?;
    let ranking: Vec<i64> = stats.top_distributors.iter().map(|d| d.total).collect();
    assert_eq!(ranking, vec![30, 10]);
    assert_eq!(stats.top_distributors[0].name, "Yaw Depot");

    let capped = service.system_stats(Some(1)).await?;
    assert_eq!(capped.top_distributors.len(), 1);
    assert_eq!(capped.distributed, 40);

    Ok(())
}

#[tokio::test]
async fn test_user_stats() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;

    chain.supply(&service, "Water", Quantities::cases(2)).await?;
    chain.ship(&service, "Water", Quantities::units(10)).await?;
    service
        .record_entry(NewEntry::return_of(chain.maker.id, "Water", Quantities::units(3)))
        .await?;

    let stats = service.user_stats(chain.owner).await?;
    assert_eq!(stats.supply_received, 48);
    assert_eq!(stats.distributed, 10);
    assert_eq!(stats.returned, 3);
    assert_eq!(stats.balance, 35);
    assert_eq!(stats.account_type, AccountType::Manufacturer);
    assert_eq!(stats.kyc_status, KycStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn test_user_stats_counts_received_transfers() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;

    chain.supply(&service, "Water", Quantities::cases(2)).await?;
    chain.ship(&service, "Water", Quantities::units(10)).await?;

    let stats = service.user_stats(chain.distributor.created_by).await?;
    assert_eq!(stats.supply_received, 10);
    assert_eq!(stats.distributed, 0);
    assert_eq!(stats.balance, 10);

    Ok(())
}

#[tokio::test]
async fn test_user_stats_without_entries_or_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = Uuid::new_v4();
    service
        .create_account(NewAccount::new("Home", AccountType::Household, owner))
        .await?;

    let stats = service.user_stats(owner).await?;
    assert_eq!(stats.supply_received, 0);
    assert_eq!(stats.distributed, 0);
    assert_eq!(stats.returned, 0);
    assert_eq!(stats.balance, 0);

    let result = service.user_stats(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}
