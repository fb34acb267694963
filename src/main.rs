use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stock_merge::config::{IdentifierField, OutputFormat, StockLayout};
use stock_merge::{MergeConfig, MergeError, NoMatchPolicy, Result, merge_files};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Merge(args) => execute_merge(args),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| MergeError::Logging(error.to_string()))
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let report = merge_files(
        args.primary.as_deref(),
        args.secondary.as_deref(),
        &args.output,
        &config,
    )?;
    println!(
        "wrote {} records to {} ({} matched, {} without match, {} dropped)",
        report.records.len(),
        args.output.display(),
        report.stats.matched,
        report.stats.placeholders,
        report.stats.dropped
    );
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile stock exports from two storefronts into one report."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge a primary and a secondary export into a stock report.
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Primary storefront export (CSV or xlsx).
    #[arg(long)]
    primary: Option<PathBuf>,

    /// Secondary storefront export (CSV or xlsx).
    #[arg(long)]
    secondary: Option<PathBuf>,

    /// Report file path.
    #[arg(long)]
    output: PathBuf,

    /// JSON profile with column names and merge settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// What to do with primary records that have no secondary match.
    #[arg(long, value_enum)]
    on_no_match: Option<NoMatchKind>,

    /// Identifier column used on the primary side.
    #[arg(long, value_enum)]
    primary_key: Option<KeyKind>,

    /// Identifier column used on the secondary side.
    #[arg(long, value_enum)]
    secondary_key: Option<KeyKind>,

    /// Secondary location column to sum; repeat for each location.
    #[arg(long = "location")]
    locations: Vec<String>,

    /// Secondary single-location stock column.
    #[arg(long, conflicts_with = "locations")]
    on_hand_column: Option<String>,

    /// Report format; defaults to the output file extension.
    #[arg(long, value_enum)]
    format: Option<FormatKind>,

    /// Split delimited input without honouring quotes (legacy output parity).
    #[arg(long)]
    legacy_split: bool,
}

impl MergeArgs {
    fn resolve_config(&self) -> Result<MergeConfig> {
        let mut config = match (&self.config, self.on_no_match) {
            (Some(path), _) => MergeConfig::load(path)?,
            (None, Some(policy)) => MergeConfig::new(policy.into()),
            (None, None) => {
                return Err(MergeError::InvalidConfig(
                    "choose --on-no-match drop|placeholder or provide --config".into(),
                ));
            }
        };

        if let Some(policy) = self.on_no_match {
            config.on_no_match = policy.into();
        }
        if let Some(key) = self.primary_key {
            config.key.primary = key.into();
        }
        if let Some(key) = self.secondary_key {
            config.key.secondary = key.into();
        }
        if !self.locations.is_empty() {
            config.secondary.stock = StockLayout::Locations {
                names: self.locations.clone(),
            };
        }
        if let Some(column) = &self.on_hand_column {
            config.secondary.stock = StockLayout::OnHand {
                column: column.clone(),
            };
        }
        if let Some(format) = self.format {
            config.report.format = Some(format.into());
        }
        if self.legacy_split {
            config.parsing.legacy_split = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum NoMatchKind {
    Drop,
    Placeholder,
}

impl From<NoMatchKind> for NoMatchPolicy {
    fn from(kind: NoMatchKind) -> Self {
        match kind {
            NoMatchKind::Drop => NoMatchPolicy::Drop,
            NoMatchKind::Placeholder => NoMatchPolicy::Placeholder,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KeyKind {
    Sku,
    Barcode,
}

impl From<KeyKind> for IdentifierField {
    fn from(kind: KeyKind) -> Self {
        match kind {
            KeyKind::Sku => IdentifierField::Sku,
            KeyKind::Barcode => IdentifierField::Barcode,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatKind {
    Csv,
    Xlsx,
}

impl From<FormatKind> for OutputFormat {
    fn from(kind: FormatKind) -> Self {
        match kind {
            FormatKind::Csv => OutputFormat::Csv,
            FormatKind::Xlsx => OutputFormat::Xlsx,
        }
    }
}
