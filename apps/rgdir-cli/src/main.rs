//! rgdir - research-group directory from the terminal
//!
//! Browse members, their publications and conferences, and edit profiles,
//! tags, and publication types against a running directory backend.

mod commands;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use rgdir_api::{MemberId, ProviderType, PublicationId, PublicationSort};
use rgdir_core::{DirectoryConfig, DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES};

#[derive(Parser)]
#[command(name = "rgdir")]
#[command(about = "Research-group directory client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API root, overriding config and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List group members
    Members {
        /// 1-based page
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        size: u32,
    },

    /// Import a member from an external provider
    FetchMember {
        /// Author ID at the provider
        source_id: String,

        /// openalex or serpapi
        #[arg(long, default_value = "openalex")]
        provider: ProviderType,
    },

    /// Show a member's profile, chart, conferences, and publications
    Show(ShowArgs),

    /// List a member's conferences
    Conferences { member_id: MemberId },

    /// Add a conference to a member
    AddConference {
        member_id: MemberId,

        #[arg(long)]
        name: String,

        #[arg(long)]
        year: String,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Update a member's description and/or photo
    EditProfile {
        member_id: MemberId,

        /// New description (HTML)
        #[arg(long)]
        description: Option<String>,

        /// Image file to upload
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Change a publication's tags and/or type
    EditPublication {
        member_id: MemberId,
        publication_id: PublicationId,

        #[arg(long = "add-tag")]
        add_tags: Vec<String>,

        #[arg(long = "remove-tag")]
        remove_tags: Vec<String>,

        #[arg(long = "type")]
        publication_type: Option<String>,
    },

    /// List the provider's work types
    WorkTypes,

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct ShowArgs {
    member_id: MemberId,

    /// publicationYear, publicationYearAsc, citedByCount, citedByCountAsc, or id
    #[arg(long, default_value = "publicationYear")]
    sort: PublicationSort,

    /// 1-based page, ignored for year sorts
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Page size, ignored for year sorts
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    size: u32,

    /// Only publications of this type (repeatable)
    #[arg(long = "type")]
    types: Vec<String>,

    /// Only publications with this tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Year group to expand
    #[arg(long)]
    open_year: Option<String>,
}

fn parse_page_size(value: &str) -> Result<u32, String> {
    let size: u32 = value
        .parse()
        .map_err(|_| format!("not a number: {}", value))?;
    if PAGE_SIZE_CHOICES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("page size must be one of {:?}", PAGE_SIZE_CHOICES))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("rgdir error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<DirectoryConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => DirectoryConfig::load(path)?,
        None => DirectoryConfig::load_default()?,
    };
    if let Some(url) = &cli.api_url {
        config.api = config.api.with_base_url(url.clone());
        config.validate()?;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;
    tracing::debug!(base_url = %config.api.base_url, "using API");
    commands::dispatch(cli.command, &config).await
}
