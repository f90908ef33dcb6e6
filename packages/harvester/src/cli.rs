//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::InMemoryCatalog;
use crate::config::SourceConfig;
use crate::error::{HarvesterError, Result};
use crate::harvester::Harvester;
use crate::metadata::{DifVariant, ReaderRegistry};
use crate::oai::OaiClient;
use crate::store::InMemoryStore;
use crate::types::{HarvestJob, HarvestSource, UnitStatus};

/// OAI-PMH Harvester - Harvest metadata records into catalog packages.
#[derive(Parser)]
#[command(name = "oaipmh-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a repository with the Identify verb.
    Identify {
        /// OAI-PMH base URL
        url: String,

        /// Source configuration as JSON (e.g. '{"force_http_get": true}')
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Gather, fetch and import all records of a repository.
    Harvest {
        /// OAI-PMH base URL
        url: String,

        /// Source configuration as JSON (e.g. '{"metadata_prefix": "oai_dc", "set": "ocean"}')
        #[arg(short, long)]
        config: Option<String>,

        /// Field granularity of the DIF reader
        #[arg(long, value_enum, default_value_t = DifVariantArg::Fine)]
        dif_variant: DifVariantArg,

        /// Fetch and import at most this many records
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write imported packages as JSON into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DifVariantArg {
    Coarse,
    Fine,
}

impl From<DifVariantArg> for DifVariant {
    fn from(arg: DifVariantArg) -> Self {
        match arg {
            DifVariantArg::Coarse => DifVariant::Coarse,
            DifVariantArg::Fine => DifVariant::Fine,
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Identify { url, config } => identify_command(&url, config.as_deref()),
        Commands::Harvest {
            url,
            config,
            dif_variant,
            limit,
            output,
        } => harvest_command(
            &url,
            config.as_deref(),
            dif_variant.into(),
            limit,
            output.as_deref(),
        ),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the identify command.
fn identify_command(url: &str, config: Option<&str>) -> Result<()> {
    let config = SourceConfig::from_json(config.unwrap_or("{}"));
    let client = OaiClient::new(url, &config)?;

    let pb = spinner("Contacting repository...");
    let identify = match client.identify() {
        Ok(identify) => identify,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!("{} {}", style("Repository").bold(), style(&identify.repository_name).green());
    println!("  Base URL: {}", identify.base_url);
    println!("  Protocol version: {}", identify.protocol_version);
    if let Some(earliest) = &identify.earliest_datestamp {
        println!("  Earliest datestamp: {earliest}");
    }
    if let Some(granularity) = &identify.granularity {
        println!("  Granularity: {granularity}");
    }
    for email in &identify.admin_emails {
        println!("  Admin: {}", style(email).cyan());
    }
    Ok(())
}

fn check_output_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        return Err(HarvesterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Output directory does not exist: {}", output_dir.display()),
        )));
    }
    if !output_dir.is_dir() {
        return Err(HarvesterError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Output path is not a directory: {}", output_dir.display()),
        )));
    }
    Ok(())
}

/// Execute the harvest command.
fn harvest_command(
    url: &str,
    config: Option<&str>,
    dif_variant: DifVariant,
    limit: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    // Validate before making HTTP requests
    if let Some(output_dir) = output {
        check_output_dir(output_dir)?;
    }

    let harvester = Harvester::new(ReaderRegistry::builtin(dif_variant)?);
    let job = HarvestJob {
        id: "cli".to_string(),
        source: HarvestSource::new("cli-source", url, config.unwrap_or("{}")),
    };
    let mut store = InMemoryStore::new();
    let mut catalog = InMemoryCatalog::new();

    println!(
        "{} {} as {}",
        style("Harvesting").bold(),
        style(url).cyan(),
        style(&job.source.config.metadata_prefix).green()
    );
    println!();

    let pb = spinner("Gathering identifiers...");
    let gathered = match harvester.gather(&job, &mut store) {
        Ok(count) => count,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();
    println!("  Discovered: {gathered}");

    let units: Vec<_> = store
        .units()
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    let pb = ProgressBar::new(units.len() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("valid template"),
    );

    let mut fetched = 0;
    let mut imported = Vec::new();
    for mut unit in units {
        pb.set_message(unit.guid.clone());
        if harvester.fetch(&job, &mut unit, &mut store).is_ok() {
            fetched += 1;
            if let Ok(record) = harvester.import(&job, &mut unit, &mut store, &mut catalog) {
                imported.push(record);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("  Fetched: {fetched}");
    println!("  Imported: {}", style(store.count(UnitStatus::Imported)).green());
    let failed = store.count(UnitStatus::FetchFailed) + store.count(UnitStatus::ImportFailed);
    if failed > 0 {
        println!("  Failed: {}", style(failed).yellow().bold());
        for error in store.errors() {
            println!(
                "    [{}] {}: {}",
                error.stage,
                error.guid.as_deref().unwrap_or("-"),
                error.message
            );
        }
    }

    if let Some(output_dir) = output {
        for record in &imported {
            let path = output_dir.join(format!("{}.json", record.name));
            std::fs::write(&path, serde_json::to_string_pretty(record)?)?;
        }
        println!();
        println!(
            "{} {} packages to {}",
            style("Wrote").green().bold(),
            imported.len(),
            output_dir.display()
        );
    }

    Ok(())
}
