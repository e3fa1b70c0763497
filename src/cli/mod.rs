use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{LedgerService, NewAccount, NewEntry, ReportQuery, parse_id};
use crate::config::{Config, DEFAULT_RENDERER_TIMEOUT_SECS, DEFAULT_RENDERER_URL};
use crate::domain::{AccountType, KycStatus, PRODUCT_CATALOG, Quantities, TransactionType};
use crate::io::{Exporter, RendererClient};

/// packledger - packaging supply and waste ledger
#[derive(Parser)]
#[command(name = "packledger")]
#[command(about = "Track packaging supply, transfers and returns for waste-management reporting")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "PACKLEDGER_DATABASE", default_value = "packledger.db")]
    pub database: String,

    /// Base URL of the report renderer / analysis service
    #[arg(long, env = "PACKLEDGER_RENDERER_URL", default_value = DEFAULT_RENDERER_URL, global = true)]
    pub renderer_url: String,

    /// Renderer request timeout in seconds
    #[arg(long, env = "PACKLEDGER_RENDERER_TIMEOUT", default_value_t = DEFAULT_RENDERER_TIMEOUT_SECS, global = true)]
    pub renderer_timeout: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Entry recording commands
    #[command(subcommand)]
    Entry(EntryCommands),

    /// Show per-product supply and waste for an account
    Balance {
        /// Account ID
        #[arg(long)]
        account: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// System-wide dashboard statistics
    Stats {
        /// Only show this many top distributors
        #[arg(long)]
        top: Option<usize>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Statistics for the account a user registered
    UserStats {
        /// User ID
        user: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Build the supply/disposal report
    Report {
        /// Restrict to one account (ID)
        #[arg(long)]
        account: Option<String>,

        /// Start date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date, exclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Period label printed on the report (e.g. "December 2024")
        #[arg(long)]
        period: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,

        /// Render the report through the renderer and write the document here
        #[arg(long)]
        pdf: Option<String>,
    },

    /// Ask the analysis service about recent activity
    Insights,

    /// List the product catalog
    Products,

    /// Export data to CSV or JSON
    Export {
        /// What to export: entries, balances, report, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Register a new account
    Create {
        /// Account holder name
        name: String,

        /// Account type: manufacturer, distributor, institution, household
        #[arg(short = 't', long = "type")]
        account_type: String,

        /// Owning user ID
        #[arg(long)]
        owner: String,

        /// Company name (shown instead of the holder name)
        #[arg(long)]
        company: Option<String>,

        /// Plot number
        #[arg(long)]
        plot: Option<String>,

        /// Area
        #[arg(long)]
        area: Option<String>,

        /// Contact details
        #[arg(long)]
        contact: Option<String>,

        /// Mark the account as international
        #[arg(long)]
        international: bool,

        /// Authorization PIN required when this account records entries
        #[arg(long)]
        pin: Option<String>,
    },

    /// List accounts
    List {
        /// Filter by account type
        #[arg(short = 't', long = "type")]
        account_type: Option<String>,
    },

    /// Show account details
    Show {
        /// Account ID
        id: String,
    },

    /// Block an account
    Block {
        /// Account ID
        id: String,
    },

    /// Suspend an account
    Suspend {
        /// Account ID
        id: String,
    },

    /// Lift a suspension
    Unsuspend {
        /// Account ID
        id: String,
    },

    /// Set the KYC status
    Kyc {
        /// Account ID
        id: String,

        /// pending, approved or rejected
        status: String,
    },

    /// Delete an account (its entries are kept)
    Delete {
        /// Account ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Record a supply, transfer or return
    Record {
        /// Transaction type: supply, transfer, return
        transaction_type: String,

        /// Source account ID
        #[arg(long)]
        from: String,

        /// Target account ID (transfers only)
        #[arg(long)]
        to: Option<String>,

        /// Product name
        #[arg(short, long)]
        product: String,

        /// Product group
        #[arg(short, long, default_value = "")]
        group: String,

        #[arg(long, default_value_t = 0)]
        unit: u32,

        #[arg(long, default_value_t = 0)]
        dozen: u32,

        #[arg(long, default_value_t = 0)]
        half_dozen: u32,

        #[arg(long, default_value_t = 0)]
        case: u32,

        #[arg(long, default_value_t = 0)]
        series: u32,

        /// Date of the movement (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Recording user ID
        #[arg(long)]
        user: Option<String>,

        /// PIN of the source account
        #[arg(long)]
        pin: Option<String>,
    },

    /// List entries
    List {
        /// Only entries involving this account
        #[arg(long)]
        account: Option<String>,

        /// Maximum number of entries to show (newest)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Reverse (soft-delete) an entry
    Reverse {
        /// Entry ID
        id: String,
    },
}

impl Cli {
    pub fn config(&self) -> Config {
        Config::new(self.database.clone())
            .with_renderer(
                self.renderer_url.clone(),
                Duration::from_secs(self.renderer_timeout),
            )
            .with_verbose(self.verbose)
    }

    async fn service(&self, config: &Config) -> Result<LedgerService> {
        let renderer = RendererClient::from_config(config)?;
        Ok(LedgerService::connect(&config.database)
            .await?
            .with_renderer(renderer))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();

        if matches!(self.command, Commands::Init) {
            LedgerService::init(&config.database).await?;
            println!("Database initialized: {}", config.database);
            return Ok(());
        }

        let service = self.service(&config).await?;

        match self.command {
            Commands::Init => {}

            Commands::Account(cmd) => run_account_command(&service, cmd).await?,

            Commands::Entry(cmd) => run_entry_command(&service, cmd).await?,

            Commands::Balance { account, format } => {
                run_balance_command(&service, account.as_deref(), &format).await?
            }

            Commands::Stats { top, format } => run_stats_command(&service, top, &format).await?,

            Commands::UserStats { user, format } => {
                let user_id = parse_id("user", Some(&user))?;
                let stats = service.user_stats(user_id).await?;
                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!("Account type:     {}", stats.account_type);
                    println!("KYC status:       {}", stats.kyc_status);
                    println!("Supply received:  {}", stats.supply_received);
                    println!("Distributed:      {}", stats.distributed);
                    println!("Returned:         {}", stats.returned);
                    println!("Balance:          {}", stats.balance);
                }
            }

            Commands::Report {
                account,
                from,
                to,
                period,
                format,
                pdf,
            } => {
                let mut query = ReportQuery::all().between(
                    from.as_deref().map(parse_date).transpose().context("Invalid --from")?,
                    to.as_deref().map(parse_date).transpose().context("Invalid --to")?,
                );
                query.account_id = account;
                query.period = period;

                run_report_command(&service, &query, &format, pdf.as_deref()).await?
            }

            Commands::Insights => {
                let insights = service.insights().await?;
                match insights {
                    serde_json::Value::String(text) => println!("{}", text),
                    other => println!("{}", serde_json::to_string_pretty(&other)?),
                }
            }

            Commands::Products => {
                for product in PRODUCT_CATALOG {
                    println!("{}", product);
                }
            }

            Commands::Export {
                export_type,
                output,
            } => run_export_command(&service, &export_type, output.as_deref()).await?,
        }

        Ok(())
    }
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            account_type,
            owner,
            company,
            plot,
            area,
            contact,
            international,
            pin,
        } => {
            let account_type = AccountType::from_str(&account_type).with_context(|| {
                format!(
                    "Invalid account type '{}'. Use manufacturer, distributor, institution or household",
                    account_type
                )
            })?;
            let owner = parse_id("owner", Some(&owner))?;

            let new_account = NewAccount {
                company_name: company,
                plot_number: plot,
                area,
                contact,
                is_international: international,
                pin,
                ..NewAccount::new(name, account_type, owner)
            };

            let account = service.create_account(new_account).await?;
            println!("Created {} account '{}'", account.account_type, account.display_name());
            println!("ID: {}", account.id);
        }

        AccountCommands::List { account_type } => {
            let filter = account_type
                .map(|t| {
                    AccountType::from_str(&t)
                        .with_context(|| format!("Invalid account type '{}'", t))
                })
                .transpose()?;
            let accounts = service.list_accounts(filter).await?;

            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!(
                    "{:<36}  {:<24} {:<13} {:<9} {:<9}",
                    "ID", "NAME", "TYPE", "KYC", "STATUS"
                );
                println!("{}", "-".repeat(96));
                for account in accounts {
                    println!(
                        "{:<36}  {:<24} {:<13} {:<9} {:<9}",
                        account.id,
                        truncate(account.display_name(), 24),
                        account.account_type,
                        account.kyc_status,
                        account.status
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let account = service.get_account(parse_id("account", Some(&id))?).await?;

            println!("Account:        {}", account.display_name());
            println!("ID:             {}", account.id);
            println!("Holder:         {}", account.name);
            println!("Type:           {}", account.account_type);
            println!("KYC:            {}", account.kyc_status);
            println!("Status:         {}", account.status);
            if let Some(plot) = &account.plot_number {
                println!("Plot:           {}", plot);
            }
            if let Some(area) = &account.area {
                println!("Area:           {}", area);
            }
            if let Some(contact) = &account.contact {
                println!("Contact:        {}", contact);
            }
            println!("International:  {}", if account.is_international { "yes" } else { "no" });
            println!("PIN protected:  {}", if account.has_pin() { "yes" } else { "no" });
            println!("Owner:          {}", account.created_by);
            println!("Created:        {}", account.created_at.format("%Y-%m-%d %H:%M"));
        }

        AccountCommands::Block { id } => {
            let account = service.block_account(parse_id("account", Some(&id))?).await?;
            println!("Blocked '{}'", account.display_name());
        }

        AccountCommands::Suspend { id } => {
            let account = service.suspend_account(parse_id("account", Some(&id))?).await?;
            println!("Suspended '{}'", account.display_name());
        }

        AccountCommands::Unsuspend { id } => {
            let account = service.unsuspend_account(parse_id("account", Some(&id))?).await?;
            println!("Reactivated '{}'", account.display_name());
        }

        AccountCommands::Kyc { id, status } => {
            let kyc_status = KycStatus::from_str(&status).with_context(|| {
                format!("Invalid KYC status '{}'. Use pending, approved or rejected", status)
            })?;
            let account = service
                .update_kyc(parse_id("account", Some(&id))?, kyc_status)
                .await?;
            println!("KYC for '{}' is now {}", account.display_name(), account.kyc_status);
        }

        AccountCommands::Delete { id } => {
            let account = service.delete_account(parse_id("account", Some(&id))?).await?;
            println!("Deleted '{}'", account.display_name());
        }
    }
    Ok(())
}

async fn run_entry_command(service: &LedgerService, cmd: EntryCommands) -> Result<()> {
    match cmd {
        EntryCommands::Record {
            transaction_type,
            from,
            to,
            product,
            group,
            unit,
            dozen,
            half_dozen,
            case,
            series,
            date,
            user,
            pin,
        } => {
            let transaction_type = TransactionType::from_str(&transaction_type).with_context(|| {
                format!(
                    "Invalid transaction type '{}'. Use supply, transfer or return",
                    transaction_type
                )
            })?;

            let quantities = Quantities {
                unit,
                dozen,
                half_dozen,
                case,
                series,
            };

            let mut new_entry = NewEntry::new(
                transaction_type,
                parse_id("from", Some(&from))?,
                product,
                quantities,
            )
            .with_product_group(group);

            if let Some(to) = to {
                new_entry = new_entry.with_target(parse_id("to", Some(&to))?);
            }
            if let Some(date_str) = date {
                new_entry = new_entry.on(parse_date(&date_str).with_context(|| {
                    format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
                })?);
            }
            if let Some(user) = user {
                new_entry = new_entry.by(parse_id("user", Some(&user))?);
            }
            if let Some(pin) = pin {
                new_entry = new_entry.with_pin(pin);
            }

            let entry = service.record_entry(new_entry).await?;
            println!(
                "Recorded {} of {} items of '{}'{}",
                entry.transaction_type,
                entry.total_items(),
                entry.product_name,
                if entry.pin_verified { " (PIN verified)" } else { "" }
            );
            println!("ID: {}", entry.id);
        }

        EntryCommands::List { account, limit } => {
            let entries = match account {
                Some(id) => {
                    service
                        .list_entries_for_account(parse_id("account", Some(&id))?)
                        .await?
                }
                None => service.list_entries().await?,
            };

            if entries.is_empty() {
                println!("No entries found.");
                return Ok(());
            }

            let names = service.list_accounts(None).await?;
            let name_of = |id: Uuid| {
                names
                    .iter()
                    .find(|a| a.id == id)
                    .map(|a| a.display_name().to_string())
                    .unwrap_or_else(|| "?".to_string())
            };

            println!(
                "{:<12} {:<9} {:<18} {:<18} {:>8}  PRODUCT",
                "DATE", "TYPE", "FROM", "TO", "ITEMS"
            );
            println!("{}", "-".repeat(90));

            let skip = limit.map_or(0, |l| entries.len().saturating_sub(l));
            for entry in entries.iter().skip(skip).rev() {
                println!(
                    "{:<12} {:<9} {:<18} {:<18} {:>8}  {}",
                    entry.entry_date.format("%Y-%m-%d"),
                    entry.transaction_type,
                    truncate(&name_of(entry.source_account_id), 18),
                    entry
                        .target_account_id
                        .map(|id| truncate(&name_of(id), 18))
                        .unwrap_or_default(),
                    entry.total_items(),
                    entry.product_name
                );
            }
        }

        EntryCommands::Reverse { id } => {
            let entry = service.reverse_entry(parse_id("entry", Some(&id))?).await?;
            println!(
                "Reversed {} of {} items of '{}'",
                entry.transaction_type,
                entry.total_items(),
                entry.product_name
            );
        }
    }
    Ok(())
}

async fn run_balance_command(
    service: &LedgerService,
    account: Option<&str>,
    format: &str,
) -> Result<()> {
    let result = service.account_balances(account).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result.balances)?);
        return Ok(());
    }

    println!("Balances for {}", result.account.display_name());
    println!();
    if result.balances.is_empty() {
        println!("No stock or waste recorded.");
        return Ok(());
    }

    println!("{:<40} {:>12} {:>12}", "PRODUCT", "SUPPLY", "WASTE");
    println!("{}", "-".repeat(66));
    for (product, balance) in &result.balances {
        println!(
            "{:<40} {:>12} {:>12}",
            truncate(product, 40),
            balance.supply,
            balance.waste
        );
    }
    Ok(())
}

async fn run_stats_command(service: &LedgerService, top: Option<usize>, format: &str) -> Result<()> {
    let stats = service.system_stats(top).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Manufactured:   {}", stats.manufactured);
    println!("Distributed:    {}", stats.distributed);
    println!("Returned:       {}", stats.returned);
    println!("Accounts:       {} ({} pending KYC)", stats.total_accounts, stats.pending_kyc);

    if !stats.top_distributors.is_empty() {
        println!();
        println!("{:<30} {:>12}", "TOP DISTRIBUTORS", "RECEIVED");
        println!("{}", "-".repeat(43));
        for distributor in &stats.top_distributors {
            let name = if distributor.name.is_empty() {
                distributor.account_id.to_string()
            } else {
                distributor.name.clone()
            };
            println!("{:<30} {:>12}", truncate(&name, 30), distributor.total);
        }
    }

    if !stats.categories.is_empty() {
        println!();
        println!("{:<30} {:>12}", "CATEGORY", "ITEMS");
        println!("{}", "-".repeat(43));
        for category in &stats.categories {
            let group = if category.product_group.is_empty() {
                "(none)"
            } else {
                category.product_group.as_str()
            };
            println!("{:<30} {:>12}", truncate(group, 30), category.total);
        }
    }
    Ok(())
}

async fn run_report_command(
    service: &LedgerService,
    query: &ReportQuery,
    format: &str,
    pdf: Option<&str>,
) -> Result<()> {
    if let Some(path) = pdf {
        let document = service.export_report(query).await?;
        std::fs::write(path, &document)
            .with_context(|| format!("Failed to write report to {}", path))?;
        println!("Report written to {} ({} bytes)", path, document.len());
        return Ok(());
    }

    match format {
        "csv" => {
            Exporter::new(service)
                .export_report_csv(query, std::io::stdout())
                .await?;
        }
        "json" => {
            let report = service.build_report(query).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            let report = service.build_report(query).await?;
            println!("Waste Report: {}", report.account_name);
            println!("Period: {}", report.period);
            println!();
            println!(
                "{:<40} {:>12} {:>12} {:>12}",
                "PRODUCT", "SUPPLY", "DISPOSAL", "NET"
            );
            println!("{}", "-".repeat(79));
            for record in &report.records {
                println!(
                    "{:<40} {:>12} {:>12} {:>12}",
                    truncate(&record.level, 40),
                    record.supply,
                    record.disposal,
                    record.net()
                );
            }
            println!("{}", "-".repeat(79));
            println!(
                "{:<40} {:>12} {:>12} {:>12}",
                "TOTAL",
                report.total_supply(),
                report.total_disposal(),
                report.total_supply() - report.total_disposal()
            );
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    let writer: Box<dyn std::io::Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let exporter = Exporter::new(service);
    let count = match export_type {
        "entries" => exporter.export_entries_csv(writer).await?,
        "balances" => exporter.export_balances_csv(writer).await?,
        "report" => exporter.export_report_csv(&ReportQuery::all(), writer).await?,
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            snapshot.accounts.len() + snapshot.entries.len()
        }
        other => anyhow::bail!(
            "Unknown export type '{}'. Use entries, balances, report or full",
            other
        ),
    };

    if let Some(path) = output {
        eprintln!("Exported {} records to {}", count, path);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .context("Date must be in YYYY-MM-DD format")?;

    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;

    Ok(DateTime::from_naive_utc_and_offset(naive_datetime, Utc))
}
