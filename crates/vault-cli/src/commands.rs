use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use vault_archive::{ArchiveConfig, ArchiveOrchestrator, WaitPolicy};
use vault_connector::InMemoryArchive;
use vault_records::{DepositRecordStore, JournalRecordStore};
use vault_types::{
    BusinessObject, Collection, DataFile, DataItem, DepositId, DepositRecord, DepositStatus,
    ObjectType,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Demo(args) => cmd_demo(args, format),
        Command::Records(args) => cmd_records(args, format),
        Command::Status(args) => cmd_status(args, format),
        Command::Config(args) => cmd_config(args),
    }
}

fn cmd_demo(args: DemoArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ArchiveConfig::load(path)?,
        None => ArchiveConfig {
            wait: WaitPolicy {
                initial_ms: 50,
                ..WaitPolicy::default()
            },
            ..ArchiveConfig::default()
        },
    };
    if args.journal.is_some() {
        config.journal_path = args.journal;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let records = runtime.block_on(run_demo(config, args.resolve_after))?;
    print_records(&records, format)
}

/// Deposit, update, and list a small collection tree against a simulated
/// archive. Returns every deposit record, oldest first.
pub async fn run_demo(config: ArchiveConfig, resolve_after: u32) -> anyhow::Result<Vec<DepositRecord>> {
    let archive = Arc::new(InMemoryArchive::with_resolve_after(resolve_after));
    let orch = Arc::new(ArchiveOrchestrator::from_config(
        archive.clone(),
        archive,
        config,
    )?);
    let reconciler = orch.spawn_reconciler();

    let ocean: BusinessObject = Collection::new("C1", "Ocean").into();
    let first = orch.deposit_and_await(None, &ocean).await?;
    step("deposited", &ocean, &first);

    let renamed: BusinessObject = Collection::new("C1", "Ocean Observations")
        .with_summary("Sea surface measurements")
        .into();
    let second = orch.deposit_and_await(None, &renamed).await?;
    step("updated", &renamed, &second);

    for (id, name) in [("D1", "Temperature"), ("D2", "Salinity")] {
        let item: BusinessObject = DataItem::new(id, name).with_parent("C1").into();
        let deposit = orch.deposit_and_await(Some(second), &item).await?;
        step("deposited", &item, &deposit);
    }

    let composite = orch
        .deposit_item_with_files(
            Some(second),
            DataItem::new("D3", "Buoys").with_parent("C1"),
            vec![DataFile::new("F1", "positions.csv", b"lat,lon\n0,0\n".to_vec())
                .with_format("text/csv")],
        )
        .await?;
    println!(
        "{} D3 with {} file(s) submitted",
        "✓".green().bold(),
        composite.len() - 1
    );

    let retrieved = orch.retrieve(&second).await?;
    if let Some(object) = &retrieved {
        println!("Retrieved {} as {}", second.short_id().yellow(), object.display_name().bold());
    }

    let children = orch
        .list_children(
            &second,
            |a, b| a.display_name().cmp(b.display_name()),
            0,
            0,
        )
        .await?;
    println!("Children of {}:", "C1".bold());
    for child in &children {
        println!("  {} {}", child.id().to_string().cyan(), child.display_name());
    }

    // The files of D3 were submitted without waiting.
    let mut summary = orch.poll_once().await?;
    for delay in orch.config().wait.delays() {
        if summary.still_pending + summary.busy + summary.errored == 0 {
            break;
        }
        tokio::time::sleep(delay).await;
        summary = orch.poll_once().await?;
    }
    if summary.still_pending > 0 {
        println!("{} deposit(s) still pending", summary.still_pending);
    }

    match reconciler {
        Some(handle) => handle.shutdown().await?,
        None => orch.stop(),
    }

    Ok(orch.records().list(None, None)?)
}

fn step(action: &str, object: &BusinessObject, deposit_id: &DepositId) {
    println!(
        "{} {} {} {} ({})",
        "✓".green().bold(),
        action,
        object.object_type(),
        object.id().to_string().bold(),
        deposit_id.short_id().yellow()
    );
}

fn cmd_records(args: RecordsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let records = load_records(
        &args.journal,
        args.object_type.as_deref(),
        args.status.as_deref(),
    )?;
    print_records(&records, format)
}

/// Records in `journal`, optionally filtered by object type tag and status.
pub fn load_records(
    journal: &Path,
    object_type: Option<&str>,
    status: Option<&str>,
) -> anyhow::Result<Vec<DepositRecord>> {
    let object_type = object_type.map(str::parse::<ObjectType>).transpose()?;
    let status = status.map(str::parse::<DepositStatus>).transpose()?;
    let store = open_journal(journal)?;
    Ok(store.list(object_type, status)?)
}

fn cmd_status(args: StatusArgs, format: OutputFormat) -> anyhow::Result<()> {
    let deposit_id: DepositId = args.deposit_id.parse()?;
    let store = open_journal(&args.journal)?;
    let Some(record) = store.lookup(&deposit_id)? else {
        anyhow::bail!("deposit {deposit_id} not found in {}", args.journal.display());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("Deposit {}", record.deposit_id.to_string().yellow().bold());
            println!("  Object:   {} {}", record.object_type, record.business_id.to_string().bold());
            println!("  Status:   {}", colored_status(record.status));
            if let Some(reason) = &record.status_reason {
                println!("  Reason:   {}", reason.red());
            }
            if let Some(parent) = &record.parent_deposit_id {
                println!("  Parent:   {}", parent.short_id().yellow());
            }
            if let Some(archive_id) = &record.archive_id {
                println!("  Root DU:  {}", archive_id.to_string().cyan());
            }
            if let Some(state_id) = &record.state_id {
                println!("  State DU: {}", state_id.to_string().cyan());
            }
            println!("  Ticket:   {}", record.ticket.to_string().dimmed());
            println!("  At:       {}", record.deposit_timestamp.to_rfc3339());
        }
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = match &args.file {
        Some(path) => ArchiveConfig::load(path)?,
        None => ArchiveConfig::default(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn open_journal(path: &Path) -> anyhow::Result<JournalRecordStore> {
    if !path.exists() {
        anyhow::bail!("journal {} does not exist", path.display());
    }
    Ok(JournalRecordStore::open(path, Default::default())?)
}

fn print_records(records: &[DepositRecord], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No deposit records.");
            }
            for record in records {
                println!(
                    "{}  {:<10} {:<14} {:<8} {}",
                    record.deposit_id.short_id().yellow(),
                    colored_status(record.status),
                    record.object_type.to_string(),
                    record.business_id.to_string().bold(),
                    record
                        .archive_id
                        .as_ref()
                        .map(|id| id.to_string())
                        .unwrap_or_default()
                        .dimmed()
                );
            }
        }
    }
    Ok(())
}

fn colored_status(status: DepositStatus) -> colored::ColoredString {
    match status {
        DepositStatus::Pending => status.as_str().yellow(),
        DepositStatus::Deposited => status.as_str().green(),
        DepositStatus::Failed => status.as_str().red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_config(journal: &Path) -> ArchiveConfig {
        ArchiveConfig {
            poll_interval_ms: 0,
            journal_path: Some(journal.to_path_buf()),
            wait: WaitPolicy {
                initial_ms: 5,
                ..WaitPolicy::default()
            },
            ..ArchiveConfig::default()
        }
    }

    #[tokio::test]
    async fn demo_deposits_every_object() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("demo.journal");
        let records = run_demo(demo_config(&journal), 1).await.unwrap();

        // C1 twice, D1, D2, D3, F1.
        assert_eq!(records.len(), 6);
        let deposited = records
            .iter()
            .filter(|r| r.status == DepositStatus::Deposited)
            .count();
        assert_eq!(deposited, 6);

        let items = load_records(&journal, Some("data-item"), None).unwrap();
        assert_eq!(items.len(), 3);
        let files = load_records(&journal, Some("data-file"), Some("DEPOSITED")).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn unknown_filters_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("empty.journal");
        JournalRecordStore::open(&journal, Default::default()).unwrap();
        assert!(load_records(&journal, Some("spreadsheet"), None).is_err());
        assert!(load_records(&journal, None, Some("LOST")).is_err());
        assert!(load_records(&journal, None, None).unwrap().is_empty());
    }

    #[test]
    fn missing_journal_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_records(&dir.path().join("absent.journal"), None, None).is_err());
    }
}
