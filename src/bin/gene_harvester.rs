use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{CommandFactory, Parser};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use gene_harvester::config::{ConfigLoader, resolve_contact};
use gene_harvester::domain::{OrganismQuery, OutputFormat};
use gene_harvester::error::HarvestError;
use gene_harvester::ncbi::EutilsHttpClient;
use gene_harvester::output::{JsonOutput, OutputSink};
use gene_harvester::pipeline::{HarvestSettings, Harvester};
use gene_harvester::progress::TextProgress;

#[derive(Parser)]
#[command(name = "gene-harvester")]
#[command(about = "Fetch the names of every NCBI gene recorded for an organism")]
#[command(version, author)]
struct Cli {
    /// Organism name, e.g. "Homo sapiens"
    organism: Option<String>,

    /// Contact email sent to NCBI with every gene request
    contact: Option<String>,

    /// Write names to this file (truncated first) instead of stdout
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Names)]
    format: OutputFormat,

    /// JSON config file (default: ./gene-harvester.json, then the user config dir)
    #[arg(long)]
    config: Option<String>,

    /// Print the run summary as JSON on stderr
    #[arg(long)]
    summary_json: bool,

    /// Only report chunk failures
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging when RUST_LOG is unset
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.organism.is_none() {
        eprintln!("{}", Cli::command().render_help());
        return ExitCode::SUCCESS;
    }
    init_tracing(cli.verbose);

    if let Err(report) = run(cli) {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::UnknownOrganism(_) | HarvestError::NoGenesFound(_) => 1,
        HarvestError::EutilsHttp(_)
        | HarvestError::EutilsStatus { .. }
        | HarvestError::MalformedResponse(_) => 1,
        HarvestError::MissingContact
        | HarvestError::InvalidTaxonomyId(_)
        | HarvestError::ConfigRead(_)
        | HarvestError::ConfigParse(_)
        | HarvestError::Output(_) => 1,
    }
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

fn init_tracing(verbose: bool) {
    let filter = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_filter(verbose))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> miette::Result<()> {
    let Cli {
        organism,
        contact,
        output,
        format,
        config,
        summary_json,
        quiet,
        verbose: _,
    } = cli;
    let organism = organism.ok_or_else(|| miette::Report::msg("organism name required"))?;

    let resolved = ConfigLoader::resolve(config.as_deref())?;
    let contact = resolve_contact(contact, &resolved)?;
    let query = OrganismQuery::new(organism, contact);

    let mut sink = OutputSink::open(output.as_deref(), format)?;
    let client = EutilsHttpClient::new(&resolved)?;
    let harvester = Harvester::new(client, HarvestSettings::default());

    let progress = TextProgress::stderr(quiet);
    let summary = harvester.run(&query, &mut sink, &progress)?;

    if summary_json {
        JsonOutput::print_summary(&summary).into_diagnostic()?;
    }
    Ok(())
}
