use std::fs;

use anyhow::{bail, Context};
use colored::Colorize;
use notary_server::{ContentStore, NotaryServer, ServerConfig};
use notary_service::{NotarizationService, VerificationResult};
use notary_types::{Identifier, SubmissionReceipt};
use serde::Serialize;
use tracing::warn;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Submit(args) => cmd_submit(&config.open_service()?, &config, format, args),
        Command::Verify(args) => cmd_verify(&config.open_service()?, format, args),
        Command::List => cmd_list(&config.open_service()?, format),
        Command::Stats => cmd_stats(&config.open_service()?, format),
        Command::History(args) => cmd_history(&config.open_service()?, format, args),
        Command::CheckLedger => cmd_check_ledger(&config.open_service()?, format),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_submit(
    service: &NotarizationService,
    config: &ServerConfig,
    format: OutputFormat,
    args: SubmitArgs,
) -> anyhow::Result<()> {
    let file = fs::File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let filename = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let entry = service.submit(file, &filename, &args.actor)?;
    let retained = ContentStore::open(config.content_dir()).and_then(|content| {
        let file = fs::File::open(&args.file)?;
        content.put_reader(&entry.fingerprint, file)
    });
    if let Err(e) = retained {
        warn!(identifier = %entry.identifier, error = %e, "content not retained");
    }

    match format {
        OutputFormat::Json => print_json(&SubmissionReceipt::from(&entry)),
        OutputFormat::Text => {
            println!("{} Notarized {}", "✓".green().bold(), entry.filename.bold());
            println!("  Identifier:  {}", entry.identifier.to_string().yellow());
            println!("  Fingerprint: {}", entry.fingerprint.to_hex().cyan());
            println!("  Timestamp:   {}", entry.submitted_at.format("%Y-%m-%d %H:%M:%S%.3f UTC"));
            println!("  Size:        {} bytes", entry.size_bytes);
            Ok(())
        }
    }
}

fn cmd_verify(
    service: &NotarizationService,
    format: OutputFormat,
    args: VerifyArgs,
) -> anyhow::Result<()> {
    let identifier = Identifier::new(args.identifier)?;
    let result = match &args.file {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            service.verify_with_content(&identifier, file, &args.actor)?
        }
        None => service.verify_by_identifier(&identifier)?,
    };

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => print_verification(&result),
    }
    if !result.valid {
        bail!("{} could not be verified", identifier);
    }
    Ok(())
}

fn print_verification(result: &VerificationResult) {
    if result.valid {
        println!("{} {} verified", "✓".green().bold(), result.identifier.to_string().yellow());
    } else if result.is_resolved() {
        println!("{} {} does not match the anchored document", "✗".red().bold(), result.identifier.to_string().yellow());
    } else {
        println!("{} {} is unknown", "✗".red().bold(), result.identifier.to_string().yellow());
        return;
    }
    if let Some(name) = &result.stored_filename {
        println!("  Filename:    {name}");
    }
    if let Some(ts) = result.timestamp {
        println!("  Anchored:    {}", ts.format("%Y-%m-%d %H:%M:%S%.3f UTC"));
    }
    if let Some(fp) = &result.stored_fingerprint {
        println!("  Anchored fp: {}", fp.to_hex().cyan());
    }
    if let Some(fp) = &result.computed_fingerprint {
        println!("  Computed fp: {}", fp.to_hex().cyan());
    }
}

fn cmd_list(service: &NotarizationService, format: OutputFormat) -> anyhow::Result<()> {
    let entries = service.list_archives()?;
    if format == OutputFormat::Json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No archived documents.");
    }
    for e in &entries {
        println!(
            "{}  {}  {}  {} ({})",
            e.identifier.to_string().yellow(),
            e.submitted_at.format("%Y-%m-%d %H:%M:%S"),
            e.fingerprint.short_hex().dimmed(),
            e.filename.bold(),
            e.submitted_by,
        );
    }
    Ok(())
}

fn cmd_stats(service: &NotarizationService, format: OutputFormat) -> anyhow::Result<()> {
    let stats = service.stats()?;
    match format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Text => {
            println!("Archived documents:       {}", stats.total_archived.to_string().bold());
            println!("Verifications:            {}", stats.total_verifications.to_string().bold());
            println!("Successful verifications: {}", stats.successful_verifications.to_string().green());
            Ok(())
        }
    }
}

fn cmd_history(
    service: &NotarizationService,
    format: OutputFormat,
    args: HistoryArgs,
) -> anyhow::Result<()> {
    let identifier = Identifier::new(args.identifier)?;
    let Some(history) = service.history(&identifier)? else {
        bail!("no archive for {identifier}");
    };
    if format == OutputFormat::Json {
        return print_json(&history);
    }

    println!("{} ({})", history.entry.filename.bold(), identifier.to_string().yellow());
    if history.verifications.is_empty() {
        println!("  No verifications.");
    }
    for v in &history.verifications {
        let outcome = if v.outcome { "valid".green() } else { "mismatch".red() };
        println!(
            "  {}  {:<8}  {}",
            v.verified_at.format("%Y-%m-%d %H:%M:%S"),
            outcome,
            v.verified_by,
        );
    }
    Ok(())
}

fn cmd_check_ledger(service: &NotarizationService, format: OutputFormat) -> anyhow::Result<()> {
    let report = service.check_ledger()?;
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            println!("{} Ledger hash chain verified", "✓".green().bold());
            println!("  Records: {}", report.records.to_string().bold());
            if let Some(last) = &report.last_identifier {
                println!("  Latest:  {}", last.to_string().yellow());
            }
            Ok(())
        }
    }
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(NotaryServer::new(config).serve())?;
    Ok(())
}
