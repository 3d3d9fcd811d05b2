//! Tagsift main entry point
//!
//! This is the command-line interface for the Tagsift booru tag harvester.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tagsift::config::{self, load_config, parse_post_ids, seed_tasks, Config};
use tagsift::crawler::{FetchScheduler, HttpFetcher, TaskPipeline};
use tagsift::output::OutputWriter;
use tagsift::site::SiteProfile;
use tracing_subscriber::EnvFilter;

/// Tagsift: harvest tag lists from booru post pages
///
/// Tagsift fetches post pages from Safebooru, Danbooru, Gelbooru (or sites
/// declared in the config file), extracts the requested tag categories, and
/// writes each page's tags to its own file in the output directory.
#[derive(Parser, Debug)]
#[command(name = "tagsift")]
#[command(version)]
#[command(about = "Harvest tag lists from booru post pages", long_about = None)]
struct Cli {
    /// Post page URLs to fetch
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Site to harvest (safebooru/safe, danbooru/dan, gelbooru/gel, ...)
    #[arg(short, long, value_name = "ID")]
    site: Option<String>,

    /// Directory to write tag files to
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Tag categories to keep, in output order
    #[arg(short, long, value_name = "CATEGORIES", value_delimiter = ',')]
    tags: Option<Vec<String>>,

    /// Post ids to fetch, e.g. 1-20,42
    #[arg(long, value_name = "IDS")]
    ids: Option<String>,

    /// Maximum concurrent fetches
    #[arg(long, value_name = "N")]
    parallelism: Option<u32>,

    /// Maximum concurrent fetches per domain
    #[arg(long, value_name = "N")]
    per_domain: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Minimum delay between requests to one domain, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be fetched without fetching
    #[arg(long, conflicts_with = "list_sites")]
    dry_run: bool,

    /// List the known sites and their tag categories, then exit
    #[arg(long)]
    list_sites: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli).context("Invalid settings")?;
    let registry = config.registry();

    if cli.list_sites {
        for id in registry.site_ids() {
            if let Some(profile) = registry.get(id) {
                print_site(&profile);
            }
        }
        return Ok(());
    }

    let profile = registry
        .resolve(config.tags.site_name())
        .context("Failed to select site")?;

    let ids = match &cli.ids {
        Some(ids) => parse_post_ids(ids).context("Failed to parse --ids")?,
        None => Vec::new(),
    };
    let mut urls = config.tags.seeds.clone();
    urls.extend(cli.urls.iter().cloned());
    let seeds = seed_tasks(&profile, &urls, &ids)?;

    if cli.dry_run {
        handle_dry_run(&config, &profile, &seeds);
        return Ok(());
    }

    if seeds.is_empty() {
        bail!("Nothing to fetch: pass post URLs, --ids, or [tags] seeds in the config file");
    }

    handle_crawl(config, profile, seeds, registry.allowed_domains()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tagsift=info,warn"),
            1 => EnvFilter::new("tagsift=debug,info"),
            2 => EnvFilter::new("tagsift=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_ansi(true)
        .init();
}

/// Loads the config file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> tagsift::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(site) = &cli.site {
        config.tags.site = Some(site.clone());
    }
    if let Some(out) = &cli.out {
        config.output.directory = out.clone();
    }
    if let Some(tags) = &cli.tags {
        config.tags.categories = tags.iter().map(|t| t.trim().to_string()).collect();
    }
    if let Some(n) = cli.parallelism {
        config.crawler.max_parallelism = n;
    }
    if let Some(n) = cli.per_domain {
        config.crawler.per_domain_limit = n;
    }
    if let Some(secs) = cli.timeout {
        config.crawler.request_timeout_secs = secs;
    }
    if let Some(ms) = cli.delay_ms {
        config.crawler.domain_delay_ms = ms;
    }

    config::validate(&config)?;
    Ok(config)
}

fn print_site(profile: &SiteProfile) {
    let aliases = if profile.aliases.is_empty() {
        String::new()
    } else {
        format!(" ({})", profile.aliases.join(", "))
    };
    println!("{}{}", profile.id, aliases);
    println!("  Domain: {}", profile.allowed_domain);
    println!(
        "  Categories: {}",
        profile.categories().collect::<Vec<_>>().join(", ")
    );
    if let Some(template) = &profile.post_url_template {
        println!("  Post URL: {}", template);
    }
}

/// Handles the --dry-run mode: shows the resolved settings and seed list
fn handle_dry_run(config: &Config, profile: &SiteProfile, seeds: &[tagsift::FetchTask]) {
    println!("=== Tagsift Dry Run ===\n");

    println!("Site:");
    print_site(profile);

    println!("\nCrawler Configuration:");
    println!("  Max parallelism: {}", config.crawler.max_parallelism);
    println!("  Per-domain limit: {}", config.crawler.per_domain_limit);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Domain delay: {}ms", config.crawler.domain_delay_ms);

    println!("\nUser Agent: {}/{}", config.user_agent.crawler_name, config.user_agent.crawler_version);
    println!("Output directory: {}", config.output.directory.display());
    println!("Categories: {}", config.tags.categories.join(", "));

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed.url);
    }

    println!("\n✓ Settings are valid");
}

/// Creates the output directory and wires fetcher, pipeline and scheduler
fn build_scheduler(
    config: &Config,
    profile: Arc<SiteProfile>,
    allow_list: tagsift::AllowList,
) -> tagsift::Result<FetchScheduler> {
    std::fs::create_dir_all(&config.output.directory)?;

    let fetcher = HttpFetcher::from_config(
        &config.user_agent,
        config.crawler.limits().request_timeout,
        allow_list.clone(),
    )?;
    let pipeline = TaskPipeline::new(
        Arc::new(fetcher),
        profile,
        config.tags.categories.clone(),
        OutputWriter::new(&config.output.directory),
    );

    Ok(FetchScheduler::new(allow_list, pipeline))
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    profile: Arc<SiteProfile>,
    seeds: Vec<tagsift::FetchTask>,
    allow_list: tagsift::AllowList,
) -> anyhow::Result<()> {
    let limits = config.crawler.limits();
    let scheduler = build_scheduler(&config, Arc::clone(&profile), allow_list).with_context(|| {
        format!(
            "Failed to set up output in {}",
            config.output.directory.display()
        )
    })?;

    tracing::info!(
        "Harvesting {} tags from {} for {} seeds into {}",
        config.tags.categories.join(", "),
        profile.id,
        seeds.len(),
        config.output.directory.display()
    );

    for task in seeds {
        // Rejections are already reported and counted by the scheduler
        let _ = scheduler.submit(task);
    }

    let shutdown = scheduler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight requests");
            shutdown.shutdown();
        }
    });

    let report = scheduler.run(limits).await;
    report.write_to_stderr();

    Ok(())
}
