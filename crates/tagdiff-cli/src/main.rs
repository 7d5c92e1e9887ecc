//! tagdiff - release reconciliation CLI
//!
//! Compares the service versions a deployment reports against the versions a
//! repository's `.env` declares, and lists the tickets referenced by commits
//! between the two tags of every changed service.
//!
//! ## Commands
//!
//! - `fetch-version`: Fetch and print a deployed version document
//! - `compare`: Show differences between deployed and declared versions
//! - `compare-tags`: Show commits and file changes between two tags
//! - `generate-input`: Write the per-service tag pairs for `process`
//! - `process`: Extract and enrich tickets for every changed service
//! - `tickets`: Extract tickets for one tag range, or for every range listed
//!   in a file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Instrument};

use tagdiff_core::obs::{self, RunSpan};
use tagdiff_core::{
    level_for, plan_service_inputs, process_services, read_service_inputs, reconcile,
    render_ticket_listing, repository_slug, write_json_artifact, write_report_json,
    write_text_artifact, ChangeRecord, ChangeStatus, ChangeSummary, CommitSource, IssueTracker,
    Normalizer, ProcessOptions, ReconciliationReport, ServiceCatalog, ServiceVersionMap, Ticket,
    TicketEnricher, TicketExtractor,
};
use tagdiff_sources::{
    resolve_target, ChangedFile, Comparison, GithubClient, LinearClient, LocalGitCommitSource,
    SourceConfig, SourceFetcher, SourceLocation, ENVIRONMENTS,
};

const DEFAULT_INPUT: &str = "generated_files/input_file/input.json";
const DEFAULT_REPORT: &str = "generated_files/final_tag_differences.json";

#[derive(Parser)]
#[command(name = "tagdiff")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Reconcile deployed and declared service versions and list the tickets in between",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace-level output (includes HTTP response bodies)
    #[arg(long, global = true)]
    debug: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print a deployed version document
    FetchVersion {
        /// Environment preset, URL, git:<rev>:<path>, or file path
        target: Option<String>,

        /// List the environment presets and exit
        #[arg(long)]
        list: bool,
    },

    /// Compare deployed versions with the versions a repository declares
    Compare {
        /// Repository holding the .env file (owner/repo)
        repo: String,

        /// Path of the .env file in the repository
        #[arg(short = 'e', long, default_value = ".env")]
        env_file: String,

        /// Branch to read the .env file from
        #[arg(short, long, default_value = "main")]
        branch: String,

        /// Deployed versions: environment preset, URL, git:<rev>:<path>, or file
        #[arg(long)]
        deployed: String,

        /// Read the .env from this location instead of the GitHub repository
        #[arg(long)]
        env_source: Option<String>,

        /// Service catalog JSON file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the commits and file changes between two tags of a repository
    CompareTags {
        /// Repository (owner/repo or URL)
        repo: String,

        /// Older tag, branch or commit
        from: String,

        /// Newer tag, branch or commit
        to: String,

        /// Leave out the commit list
        #[arg(long)]
        no_commits: bool,

        /// Leave out the file list
        #[arg(long)]
        no_files: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Reconcile versions and write the per-service tag pairs
    GenerateInput {
        /// Deployed versions: environment preset, URL, git:<rev>:<path>, or file
        #[arg(long)]
        deployed: String,

        /// Location of the declared .env (URL, git:<rev>:<path>, github:..., or file)
        #[arg(long, required_unless_present = "repo", conflicts_with = "repo")]
        env_source: Option<String>,

        /// Repository holding the .env file (owner/repo)
        #[arg(long)]
        repo: Option<String>,

        /// Branch to read the .env file from
        #[arg(short, long, default_value = "main")]
        branch: String,

        /// Path of the .env file in the repository
        #[arg(short = 'e', long, default_value = ".env")]
        env_file: String,

        /// Service catalog JSON file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// GitHub organisation for services the catalog has no repository for
        #[arg(long)]
        github_org: Option<String>,

        /// Output file
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        output: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Extract tickets for every changed service and write the report
    Process {
        /// Service inputs written by generate-input
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Report file
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        output: PathBuf,

        /// Also list services whose tags did not change
        #[arg(long)]
        include_unchanged: bool,

        /// Do not fetch ticket details from Linear
        #[arg(long)]
        no_fetch_details: bool,

        /// Ticket pattern inside the brackets (default: [A-Z]+-\d+)
        #[arg(long)]
        pattern: Option<String>,

        /// Record per-service failures and continue
        #[arg(long)]
        keep_going: bool,

        /// Linear API key (overrides LINEAR_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Extract tickets between two tags of one repository
    Tickets {
        /// Repository (owner/repo or URL)
        #[arg(required_unless_present = "from_file")]
        repo: Option<String>,

        /// Older tag
        #[arg(required_unless_present = "from_file")]
        from: Option<String>,

        /// Newer tag
        #[arg(required_unless_present = "from_file")]
        to: Option<String>,

        /// Process every `owner/repo:from:to` (or `owner/repo from to`) line of FILE
        #[arg(long, value_name = "FILE", conflicts_with_all = ["repo", "from", "to", "output"])]
        from_file: Option<PathBuf>,

        /// Write the listing to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the per-range listings of --from-file
        #[arg(long, default_value = ".", requires = "from_file")]
        output_dir: PathBuf,

        /// Also write a summary of the --from-file run to this file
        #[arg(long, requires = "from_file")]
        summary: Option<PathBuf>,

        /// Ticket pattern inside the brackets (default: [A-Z]+-\d+)
        #[arg(long)]
        pattern: Option<String>,

        /// Do not fetch ticket details from Linear
        #[arg(long)]
        no_fetch_details: bool,

        /// Linear API key (overrides LINEAR_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Read commits from this local clone instead of GitHub
        #[arg(long)]
        git_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tagdiff_core::init_tracing(cli.json, level_for(cli.verbose, cli.debug));

    let config = SourceConfig::from_env();
    debug!(config = ?config, "loaded configuration");

    match cli.command {
        Commands::FetchVersion { target, list } => {
            cmd_fetch_version(&config, target.as_deref(), list).await
        }
        Commands::Compare {
            repo,
            env_file,
            branch,
            deployed,
            env_source,
            catalog,
            format,
        } => {
            let declared = match env_source {
                Some(location) => location.parse::<SourceLocation>()?,
                None => SourceLocation::github(&repo, &branch, &env_file),
            };
            cmd_compare(
                &config,
                &declared,
                &deployed,
                catalog.as_deref(),
                format,
                cli.verbose,
            )
            .await
        }
        Commands::CompareTags {
            repo,
            from,
            to,
            no_commits,
            no_files,
            format,
        } => {
            let github = GithubClient::new(&config).context("Failed to create GitHub client")?;
            let view = TagComparisonView {
                commits: !no_commits,
                files: !no_files,
                format,
            };
            cmd_compare_tags(&github, &repo, &from, &to, view).await
        }
        Commands::GenerateInput {
            deployed,
            env_source,
            repo,
            branch,
            env_file,
            catalog,
            github_org,
            output,
            pretty,
        } => {
            let declared = match (env_source, repo) {
                (Some(location), _) => location.parse::<SourceLocation>()?,
                (None, Some(repo)) => SourceLocation::github(&repo, &branch, &env_file),
                (None, None) => bail!("either --env-source or --repo is required"),
            };
            cmd_generate_input(
                &config,
                &declared,
                &deployed,
                catalog.as_deref(),
                github_org.as_deref(),
                &output,
                pretty,
            )
            .await
        }
        Commands::Process {
            input,
            output,
            include_unchanged,
            no_fetch_details,
            pattern,
            keep_going,
            api_key,
            pretty,
        } => {
            let options = ProcessOptions {
                include_unchanged,
                keep_going,
                run_id: None,
            };
            cmd_process(
                &config,
                &input,
                &output,
                &options,
                pattern.as_deref(),
                linear_client(&config, api_key.as_deref(), no_fetch_details)?,
                pretty,
            )
            .await
        }
        Commands::Tickets {
            repo,
            from,
            to,
            from_file,
            output,
            output_dir,
            summary,
            pattern,
            no_fetch_details,
            api_key,
            git_dir,
        } => {
            let commits: Box<dyn CommitSource> = match git_dir {
                Some(dir) => Box::new(LocalGitCommitSource::new(dir)),
                None => Box::new(GithubClient::new(&config)?),
            };
            let linear = linear_client(&config, api_key.as_deref(), no_fetch_details)?;
            let tracker = linear.as_ref().map(|l| l as &dyn IssueTracker);
            let extractor = ticket_extractor(pattern.as_deref())?;

            match (from_file, repo, from, to) {
                (Some(file), ..) => {
                    let batch = cmd_tickets_batch(
                        &*commits,
                        tracker,
                        &extractor,
                        &file,
                        &output_dir,
                        summary.as_deref(),
                    )
                    .await?;
                    if batch.failed() > 0 {
                        bail!("{} of {} ranges failed", batch.failed(), batch.outcomes.len());
                    }
                    Ok(())
                }
                (None, Some(repo), Some(from), Some(to)) => {
                    cmd_tickets(
                        &*commits,
                        tracker,
                        &extractor,
                        &repo,
                        &from,
                        &to,
                        output.as_deref(),
                    )
                    .await
                }
                _ => bail!("either <REPO> <FROM> <TO> or --from-file is required"),
            }
        }
    }
}

// ========== Shared helpers ==========

fn source_fetcher(config: &SourceConfig) -> Result<SourceFetcher> {
    SourceFetcher::new(config.clone()).context("Failed to create HTTP client")
}

async fn fetch_text(fetcher: &SourceFetcher, location: &SourceLocation, what: &str) -> Result<String> {
    fetcher
        .fetch(location)
        .await
        .with_context(|| format!("Failed to fetch {} from {}", what, location))
}

fn load_catalog(path: Option<&Path>) -> Result<ServiceCatalog> {
    match path {
        Some(path) => ServiceCatalog::load(path),
        None => Ok(ServiceCatalog::default()),
    }
}

fn ticket_extractor(pattern: Option<&str>) -> Result<TicketExtractor> {
    match pattern {
        Some(pattern) => TicketExtractor::with_pattern(pattern)
            .with_context(|| format!("Invalid ticket pattern: {}", pattern)),
        None => Ok(TicketExtractor::new()),
    }
}

/// Linear client for enrichment, or `None` when disabled or unconfigured.
fn linear_client(
    config: &SourceConfig,
    api_key: Option<&str>,
    disabled: bool,
) -> Result<Option<LinearClient>> {
    if disabled {
        return Ok(None);
    }
    let config = match api_key {
        Some(key) => config.clone().with_linear_api_key(key),
        None => config.clone(),
    };
    let client = LinearClient::from_config(&config).context("Failed to create Linear client")?;
    if client.is_none() {
        info!("LINEAR_API_KEY not set; ticket details will not be fetched");
    }
    Ok(client)
}

/// Fetch and normalize both sides. Deployed is JSON, declared is `.env` text.
async fn load_version_maps(
    config: &SourceConfig,
    declared_location: &SourceLocation,
    deployed_target: &str,
    catalog: &ServiceCatalog,
) -> Result<(ServiceVersionMap, ServiceVersionMap)> {
    let deployed_location = resolve_target(deployed_target, &config.version_url_template)?;
    let normalizer =
        Normalizer::for_catalog(catalog).context("Failed to build rules from catalog")?;
    let fetcher = source_fetcher(config)?;

    let deployed_text = fetch_text(&fetcher, &deployed_location, "deployed versions").await?;
    let deployed = normalizer
        .parse_json(&deployed_text)
        .with_context(|| format!("Failed to parse deployed versions from {}", deployed_location))?;
    let deployed = catalog.canonicalize(&deployed);
    obs::emit_versions_parsed(&deployed_location.to_string(), deployed.len());

    let declared_text = fetch_text(&fetcher, declared_location, "declared versions").await?;
    let declared = catalog.canonicalize(&normalizer.parse_env(&declared_text));
    obs::emit_versions_parsed(&declared_location.to_string(), declared.len());

    Ok((deployed, declared))
}

fn reconcile_and_log(
    deployed: &ServiceVersionMap,
    declared: &ServiceVersionMap,
) -> (Vec<ChangeRecord>, ChangeSummary) {
    let records = reconcile(deployed, declared);
    let summary = ChangeSummary::from_records(&records);
    obs::emit_reconcile_completed(records.len(), summary.total() - summary.unchanged);
    (records, summary)
}

// ========== Version Commands ==========

async fn cmd_fetch_version(config: &SourceConfig, target: Option<&str>, list: bool) -> Result<()> {
    let target = match target {
        Some(target) if !list => target,
        _ => {
            println!("{}", render_environment_list(&config.version_url_template));
            return Ok(());
        }
    };

    let location = resolve_target(target, &config.version_url_template)?;
    let content = fetch_text(&source_fetcher(config)?, &location, "version document").await?;

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", content),
    }
    Ok(())
}

fn render_environment_list(url_template: &str) -> String {
    let mut out = String::from("Available environments:\n");
    for env in ENVIRONMENTS.iter() {
        out.push_str(&format!(
            "  {:<12} {}\n",
            env.name,
            env.version_url(url_template)
        ));
    }
    out.trim_end().to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareOutput<'a> {
    declared: String,
    deployed: &'a str,
    summary: ChangeSummary,
    changes: &'a [ChangeRecord],
}

async fn cmd_compare(
    config: &SourceConfig,
    declared_location: &SourceLocation,
    deployed_target: &str,
    catalog: Option<&Path>,
    format: OutputFormat,
    show_matches: bool,
) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let (deployed, declared) =
        load_version_maps(config, declared_location, deployed_target, &catalog).await?;
    let (records, summary) = reconcile_and_log(&deployed, &declared);

    match format {
        OutputFormat::Json => {
            let output = CompareOutput {
                declared: declared_location.to_string(),
                deployed: deployed_target,
                summary,
                changes: &records,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => println!(
            "{}",
            render_comparison_text(
                &declared_location.to_string(),
                deployed_target,
                &records,
                show_matches
            )
        ),
    }
    Ok(())
}

fn render_comparison_text(
    declared: &str,
    deployed: &str,
    records: &[ChangeRecord],
    show_matches: bool,
) -> String {
    let summary = ChangeSummary::from_records(records);
    let mut out = String::new();
    out.push_str("Version Comparison\n");
    out.push_str("==================\n");
    out.push_str(&format!("declared: {}\n", declared));
    out.push_str(&format!("deployed: {}\n", deployed));

    let section = |out: &mut String, title: &str, status: ChangeStatus, marker: char| {
        let rows: Vec<_> = records.iter().filter(|r| r.status() == status).collect();
        if rows.is_empty() {
            return;
        }
        out.push_str(&format!("\n{} ({}):\n", title, rows.len()));
        for r in rows {
            let current = r.current_version.as_deref().unwrap_or("-");
            let new = r.new_version.as_deref().unwrap_or("-");
            let line = match status {
                ChangeStatus::Changed => format!("  {} {}: {} -> {}\n", marker, r.service, current, new),
                ChangeStatus::DeclaredOnly => format!("  {} {}: {}\n", marker, r.service, new),
                _ => format!("  {} {}: {}\n", marker, r.service, current),
            };
            out.push_str(&line);
        }
    };

    section(&mut out, "Differences", ChangeStatus::Changed, '~');
    section(&mut out, "Only deployed", ChangeStatus::DeployedOnly, '-');
    section(&mut out, "Only declared", ChangeStatus::DeclaredOnly, '+');
    if show_matches {
        section(&mut out, "Matching", ChangeStatus::Unchanged, '=');
    }

    out.push_str(&format!(
        "\nSummary: {} changed, {} unchanged, {} deployed only, {} declared only",
        summary.changed, summary.unchanged, summary.deployed_only, summary.declared_only
    ));
    if !summary.has_differences() {
        out.push_str("\nAll versions match.");
    }
    out
}

async fn cmd_generate_input(
    config: &SourceConfig,
    declared_location: &SourceLocation,
    deployed_target: &str,
    catalog: Option<&Path>,
    github_org: Option<&str>,
    output: &Path,
    pretty: bool,
) -> Result<()> {
    let run = RunSpan::start();
    async {
        let catalog = load_catalog(catalog)?;
        let (deployed, declared) =
            load_version_maps(config, declared_location, deployed_target, &catalog).await?;
        let (records, summary) = reconcile_and_log(&deployed, &declared);

        let inputs = plan_service_inputs(&records, &catalog, github_org);
        write_json_artifact(output, &inputs, pretty).context("Failed to write service inputs")?;

        info!(path = ?output, services = inputs.len(), "wrote service inputs");
        println!(
            "Wrote {} services ({} with version changes) to {}",
            inputs.len(),
            summary.total() - summary.unchanged,
            output.display()
        );
        Ok(())
    }
    .instrument(run.span())
    .await
}

// ========== Ticket Commands ==========

async fn cmd_process(
    config: &SourceConfig,
    input: &Path,
    output: &Path,
    options: &ProcessOptions,
    pattern: Option<&str>,
    linear: Option<LinearClient>,
    pretty: bool,
) -> Result<()> {
    let inputs = read_service_inputs(input)
        .with_context(|| format!("Failed to read service inputs from {:?}", input))?;
    let extractor = ticket_extractor(pattern)?;
    let github = GithubClient::new(config).context("Failed to create GitHub client")?;
    if !github.is_authenticated() {
        info!("no GitHub token configured; requests are subject to anonymous rate limits");
    }

    let report = run_process(
        &inputs,
        &github,
        linear.as_ref().map(|l| l as &dyn IssueTracker),
        &extractor,
        options,
        output,
        pretty,
    )
    .await?;
    println!("{}", render_process_summary(&report, output));
    Ok(())
}

async fn run_process(
    inputs: &[tagdiff_core::ServiceInput],
    commits: &dyn CommitSource,
    tracker: Option<&dyn IssueTracker>,
    extractor: &TicketExtractor,
    options: &ProcessOptions,
    output: &Path,
    pretty: bool,
) -> Result<ReconciliationReport> {
    let run = RunSpan::start();
    let options = ProcessOptions {
        run_id: Some(run.run_id().to_string()),
        ..options.clone()
    };

    async {
        let mut enricher = TicketEnricher::new(tracker);
        let report = process_services(inputs, commits, extractor, &mut enricher, &options)
            .await
            .context("Ticket extraction failed")?;

        let stats = enricher.stats();
        info!(
            lookups = stats.lookups,
            enriched = stats.enriched,
            degraded = stats.degraded,
            cache_hits = stats.cache_hits,
            "enrichment finished"
        );

        write_report_json(output, &report, pretty)?;
        Ok(report)
    }
    .instrument(run.span())
    .await
}

fn render_process_summary(report: &ReconciliationReport, output: &Path) -> String {
    let meta = &report.metadata;
    let mut out = String::new();
    out.push_str(&format!("Total services: {}\n", meta.total_services));
    out.push_str(&format!("Processed: {}\n", meta.processed));
    out.push_str(&format!("Skipped (no changes): {}\n", meta.skipped));
    out.push_str(&format!("Failed: {}\n", meta.failed));
    out.push_str(&format!(
        "Unique tickets across all services: {}\n",
        meta.total_unique_tickets
    ));
    if !report.tickets_by_project.is_empty() {
        out.push_str("\nTickets by project:\n");
        for (project, ids) in &report.tickets_by_project {
            out.push_str(&format!("  - {}: {} tickets\n", project, ids.len()));
        }
    }
    out.push_str(&format!("\nReport written to {}", output.display()));
    out
}

/// Tickets found in one tag range.
struct RangeTickets {
    slug: String,
    commits_ahead: usize,
    tickets: Vec<Ticket>,
}

async fn collect_range_tickets(
    commits: &dyn CommitSource,
    tracker: Option<&dyn IssueTracker>,
    extractor: &TicketExtractor,
    repo: &str,
    from: &str,
    to: &str,
) -> Result<RangeTickets> {
    let slug = repository_slug(repo).with_context(|| format!("Invalid repository: {}", repo))?;
    let messages = commits
        .commit_messages(&slug, from, to)
        .await
        .with_context(|| format!("Failed to list commits in {} between {} and {}", slug, from, to))?;
    let extraction = extractor.extract(&messages);
    let tickets = TicketEnricher::new(tracker).enrich(&extraction.tickets).await;
    obs::emit_service_processed(&slug, "success", extraction.commits_ahead, tickets.len());

    Ok(RangeTickets {
        slug,
        commits_ahead: extraction.commits_ahead,
        tickets,
    })
}

async fn cmd_tickets(
    commits: &dyn CommitSource,
    tracker: Option<&dyn IssueTracker>,
    extractor: &TicketExtractor,
    repo: &str,
    from: &str,
    to: &str,
    output: Option<&Path>,
) -> Result<()> {
    let found = collect_range_tickets(commits, tracker, extractor, repo, from, to).await?;
    let listing = render_ticket_listing(&found.slug, from, to, &found.tickets, chrono::Utc::now());
    match output {
        Some(path) => {
            write_text_artifact(path, &listing)?;
            println!(
                "Found {} tickets in {} commits; listing written to {}",
                found.tickets.len(),
                found.commits_ahead,
                path.display()
            );
        }
        None => {
            println!("Commits examined: {}", found.commits_ahead);
            println!("{}", listing);
        }
    }
    Ok(())
}

// ========== Batch Tickets ==========

/// One `repo from to` line of a `--from-file` list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeRequest {
    repo: String,
    from: String,
    to: String,
}

impl RangeRequest {
    /// Listing file name, e.g. `tickets_acme_ui_v1_to_v2.txt`.
    fn listing_name(&self) -> String {
        let repo = self.repo.replace(['/', ':'], "_");
        format!("tickets_{}_{}_to_{}.txt", repo, self.from, self.to)
    }
}

/// Parse `owner/repo:from:to` or `owner/repo from to`.
fn parse_range_request(line: &str) -> Option<RangeRequest> {
    let line = line.trim();
    let colon: Vec<&str> = line.split(':').map(str::trim).collect();
    let parts = if colon.len() == 3 {
        colon
    } else {
        line.split_whitespace().collect()
    };
    match parts.as_slice() {
        [repo, from, to] if !repo.is_empty() && !from.is_empty() && !to.is_empty() => {
            Some(RangeRequest {
                repo: repo.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            })
        }
        _ => None,
    }
}

#[derive(Debug)]
struct RangeOutcome {
    /// The request, or the raw line when it could not be parsed.
    request: std::result::Result<RangeRequest, String>,
    result: std::result::Result<(PathBuf, usize), String>,
    at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
struct BatchOutcome {
    outcomes: Vec<RangeOutcome>,
}

impl BatchOutcome {
    fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    fn total_tickets(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Extract tickets for every range listed in `file`, one listing per range.
/// A failed range is recorded and the remaining ranges still run.
async fn cmd_tickets_batch(
    commits: &dyn CommitSource,
    tracker: Option<&dyn IssueTracker>,
    extractor: &TicketExtractor,
    file: &Path,
    output_dir: &Path,
    summary: Option<&Path>,
) -> Result<BatchOutcome> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read range list {:?}", file))?;

    let mut batch = BatchOutcome::default();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(request) = parse_range_request(line) else {
            warn!(line = %line, "skipping malformed range line");
            batch.outcomes.push(RangeOutcome {
                request: Err(line.to_string()),
                result: Err("expected owner/repo:from:to or owner/repo from to".to_string()),
                at: chrono::Utc::now(),
            });
            continue;
        };

        let result = async {
            let found = collect_range_tickets(
                commits,
                tracker,
                extractor,
                &request.repo,
                &request.from,
                &request.to,
            )
            .await?;
            let path = output_dir.join(request.listing_name());
            let listing = render_ticket_listing(
                &found.slug,
                &request.from,
                &request.to,
                &found.tickets,
                chrono::Utc::now(),
            );
            write_text_artifact(&path, &listing)?;
            anyhow::Ok((path, found.tickets.len()))
        }
        .await
        .map_err(|err| format!("{:#}", err));

        match &result {
            Ok((path, count)) => println!(
                "{} ({} -> {}): {} tickets, saved to {}",
                request.repo,
                request.from,
                request.to,
                count,
                path.display()
            ),
            Err(err) => {
                warn!(repo = %request.repo, from = %request.from, to = %request.to, error = %err, "range failed");
                println!("{} ({} -> {}): failed: {}", request.repo, request.from, request.to, err);
            }
        }
        batch.outcomes.push(RangeOutcome {
            request: Ok(request),
            result,
            at: chrono::Utc::now(),
        });
    }

    println!("{}", render_batch_totals(&batch));
    if let Some(path) = summary {
        write_text_artifact(path, &render_batch_summary(&batch, chrono::Utc::now()))?;
        println!("Summary report saved to {}", path.display());
    }
    Ok(batch)
}

fn render_batch_totals(batch: &BatchOutcome) -> String {
    let rule = "=".repeat(60);
    format!(
        "{rule}\nPROCESSING SUMMARY\n{rule}\nTotal requests: {}\nSuccessful: {}\nFailed: {}\nTotal tickets found: {}",
        batch.outcomes.len(),
        batch.succeeded(),
        batch.failed(),
        batch.total_tickets()
    )
}

fn render_batch_summary(batch: &BatchOutcome, generated_at: chrono::DateTime<chrono::Utc>) -> String {
    let stamp = |at: &chrono::DateTime<chrono::Utc>| at.format("%Y-%m-%d %H:%M:%S").to_string();
    let label = |request: &std::result::Result<RangeRequest, String>| match request {
        Ok(r) => format!("{} ({} -> {})", r.repo, r.from, r.to),
        Err(line) => line.clone(),
    };

    let mut out = String::new();
    out.push_str("SINGLE REPOSITORY TICKET PROCESSING SUMMARY\n");
    out.push_str(&format!("{}\n\n", "=".repeat(60)));
    out.push_str(&format!("Generated: {}\n", stamp(&generated_at)));
    out.push_str(&format!("Total requests processed: {}\n", batch.outcomes.len()));
    out.push_str(&format!("Successful requests: {}\n", batch.succeeded()));
    out.push_str(&format!("Failed requests: {}\n", batch.failed()));
    out.push_str(&format!("Total tickets found: {}\n", batch.total_tickets()));

    let succeeded: Vec<_> = batch.outcomes.iter().filter(|o| o.result.is_ok()).collect();
    if !succeeded.is_empty() {
        out.push_str(&format!("\nSUCCESSFUL REQUESTS\n{}\n", "-".repeat(30)));
        for outcome in succeeded {
            if let Ok((path, count)) = &outcome.result {
                out.push_str(&format!("{}: {} tickets\n", label(&outcome.request), count));
                out.push_str(&format!("  Output file: {}\n", path.display()));
                out.push_str(&format!("  Processed: {}\n\n", stamp(&outcome.at)));
            }
        }
    }

    let failed: Vec<_> = batch.outcomes.iter().filter(|o| o.result.is_err()).collect();
    if !failed.is_empty() {
        out.push_str(&format!("\nFAILED REQUESTS\n{}\n", "-".repeat(30)));
        for outcome in failed {
            if let Err(err) = &outcome.result {
                out.push_str(&format!("{}\n", label(&outcome.request)));
                out.push_str(&format!("  Error: {}\n", err));
                out.push_str(&format!("  Attempted: {}\n\n", stamp(&outcome.at)));
            }
        }
    }
    out
}

// ========== Tag Comparison ==========

#[derive(Clone, Copy, Debug)]
struct TagComparisonView {
    commits: bool,
    files: bool,
    format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitLine<'a> {
    sha: &'a str,
    subject: &'a str,
    author: Option<&'a str>,
    date: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagComparisonOutput<'a> {
    repository: &'a str,
    from: &'a str,
    to: &'a str,
    status: Option<&'a str>,
    ahead_by: u64,
    behind_by: u64,
    total_commits: u64,
    missing_commits: u64,
    html_url: Option<&'a str>,
    commits: Vec<CommitLine<'a>>,
    files: &'a [ChangedFile],
}

async fn cmd_compare_tags(
    github: &GithubClient,
    repo: &str,
    from: &str,
    to: &str,
    view: TagComparisonView,
) -> Result<()> {
    let slug = repository_slug(repo).with_context(|| format!("Invalid repository: {}", repo))?;
    let comparison = github
        .compare(&slug, from, to)
        .await
        .with_context(|| format!("Failed to compare {} and {} in {}", from, to, slug))?;

    match view.format {
        OutputFormat::Json => {
            let output = tag_comparison_output(&slug, from, to, &comparison);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => println!(
            "{}",
            render_tag_comparison(&slug, from, to, &comparison, view.commits, view.files)
        ),
    }
    Ok(())
}

fn tag_comparison_output<'a>(
    slug: &'a str,
    from: &'a str,
    to: &'a str,
    comparison: &'a Comparison,
) -> TagComparisonOutput<'a> {
    TagComparisonOutput {
        repository: slug,
        from,
        to,
        status: comparison.status.as_deref(),
        ahead_by: comparison.ahead_by,
        behind_by: comparison.behind_by,
        total_commits: comparison.total_commits,
        missing_commits: comparison.missing_commits(),
        html_url: comparison.html_url.as_deref(),
        commits: comparison
            .commits
            .iter()
            .map(|c| CommitLine {
                sha: &c.sha,
                subject: c.subject(),
                author: c.commit.author.as_ref().map(|a| a.name.as_str()),
                date: c.commit.author.as_ref().and_then(|a| a.date.as_deref()),
            })
            .collect(),
        files: &comparison.files,
    }
}

/// `2026-01-02T10:30:00Z` as `2026-01-02 10:30`; other text unchanged.
fn short_commit_date(date: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(date) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => date.to_string(),
    }
}

fn file_status_marker(status: &str) -> char {
    match status {
        "added" => 'A',
        "removed" => 'D',
        "renamed" => 'R',
        _ => 'M',
    }
}

fn render_tag_comparison(
    slug: &str,
    from: &str,
    to: &str,
    comparison: &Comparison,
    show_commits: bool,
    show_files: bool,
) -> String {
    let rule = "=".repeat(80);
    let status = comparison.status.as_deref().unwrap_or("unknown");
    let mut out = String::new();
    out.push_str(&format!("{rule}\nTAG COMPARISON SUMMARY\n{rule}\n"));
    out.push_str(&format!("Repository: {}\n", slug));
    out.push_str(&format!("From: {}\n", from));
    out.push_str(&format!("To: {}\n", to));
    out.push_str(&format!("Status: {}\n", status));
    if status == "identical" {
        out.push_str("Tags are identical - no differences found\n");
    }
    out.push_str(&format!("Commits ahead: {}\n", comparison.ahead_by));
    out.push_str(&format!("Commits behind: {}\n", comparison.behind_by));
    out.push_str(&format!("Total commits: {}\n", comparison.total_commits));
    out.push_str(&format!("Files changed: {}\n", comparison.files.len()));
    if let Some(url) = &comparison.html_url {
        out.push_str(&format!("Compare: {}\n", url));
    }

    if show_commits {
        if comparison.commits.is_empty() {
            out.push_str("\nNo commits found\n");
        } else {
            out.push_str(&format!("\nCOMMITS ({}):\n{}\n", comparison.commits.len(), "-".repeat(60)));
            for commit in &comparison.commits {
                let (author, date) = match &commit.commit.author {
                    Some(a) => (a.name.as_str(), a.date.as_deref().map(short_commit_date)),
                    None => ("unknown", None),
                };
                out.push_str(&format!(
                    "  {} - {} ({}, {})\n",
                    commit.short_sha(),
                    commit.subject(),
                    author,
                    date.as_deref().unwrap_or("-")
                ));
            }
            if comparison.is_truncated() {
                out.push_str(&format!(
                    "  ... {} more commits not listed by GitHub\n",
                    comparison.missing_commits()
                ));
            }
        }
    }

    if show_files {
        if comparison.files.is_empty() {
            out.push_str("\nNo file changes found\n");
        } else {
            let stats = comparison.file_stats();
            out.push_str(&format!("\nFILE CHANGES ({} files):\n{}\n", comparison.files.len(), "-".repeat(60)));
            out.push_str(&format!(
                "Added: {}, Modified: {}, Deleted: {}\n",
                stats.added, stats.modified, stats.removed
            ));
            out.push_str(&format!("Total changes: +{}/-{}\n\n", stats.additions, stats.deletions));
            for file in &comparison.files {
                out.push_str(&format!(
                    "  {} {} ({})",
                    file_status_marker(&file.status),
                    file.filename,
                    file.status
                ));
                if file.changes > 0 {
                    out.push_str(&format!(" [+{}/-{}]", file.additions, file.deletions));
                }
                out.push('\n');
            }
        }
    }
    out.push_str(&rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tagdiff_core::fakes::{MemoryIssueTracker, StaticCommitSource};
    use tagdiff_core::{ParseError, ServiceInput, ServiceStatus, TicketDetails};

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn file_location(path: &Path) -> SourceLocation {
        SourceLocation::File(path.to_path_buf())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_process_defaults() {
        let cli = Cli::try_parse_from(["tagdiff", "process"]).unwrap();
        match cli.command {
            Commands::Process {
                input,
                output,
                keep_going,
                ..
            } => {
                assert_eq!(input, PathBuf::from(DEFAULT_INPUT));
                assert_eq!(output, PathBuf::from(DEFAULT_REPORT));
                assert!(!keep_going);
            }
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn test_generate_input_requires_a_declared_source() {
        assert!(Cli::try_parse_from(["tagdiff", "generate-input", "--deployed", "production"]).is_err());
        assert!(Cli::try_parse_from([
            "tagdiff",
            "generate-input",
            "--deployed",
            "production",
            "--repo",
            "acme/dist",
            "--env-source",
            ".env"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "tagdiff",
            "-v",
            "generate-input",
            "--deployed",
            "production",
            "--repo",
            "acme/dist",
        ])
        .is_ok());
    }

    #[tokio::test]
    async fn test_generate_input_from_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let env = write(dir.path(), ".env", "APPCD_VERSION=v1.0.0\nUI_TAG=v2.0.0\n# comment\n");
        let deployed = write(dir.path(), "version.json", r#"{"appcd":"v1.0.0","ui":"v1.9.0"}"#);
        let output = dir.path().join("generated_files").join("input.json");

        cmd_generate_input(
            &SourceConfig::new(),
            &file_location(&env),
            deployed.to_str().unwrap(),
            None,
            Some("acme"),
            &output,
            true,
        )
        .await
        .unwrap();

        let inputs = read_service_inputs(&output).unwrap();
        assert_eq!(
            inputs,
            vec![
                ServiceInput {
                    service: "appcd".to_string(),
                    repository: "https://github.com/acme/appcd".to_string(),
                    version_key: None,
                    current_tag: "v1.0.0".to_string(),
                    new_tag: "v1.0.0".to_string(),
                },
                ServiceInput {
                    service: "ui".to_string(),
                    repository: "https://github.com/acme/ui".to_string(),
                    version_key: None,
                    current_tag: "v1.9.0".to_string(),
                    new_tag: "v2.0.0".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_deployed_json_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let env = write(dir.path(), ".env", "APPCD_VERSION=v1.0.0\n");
        let deployed = write(dir.path(), "version.json", r#"{"appcd": "v1.0.0""#);
        let output = dir.path().join("input.json");

        let err = cmd_generate_input(
            &SourceConfig::new(),
            &file_location(&env),
            deployed.to_str().unwrap(),
            None,
            None,
            &output,
            false,
        )
        .await
        .unwrap_err();

        assert!(err.chain().any(|cause| cause.is::<ParseError>()));
        assert!(format!("{:#}", err).contains("Failed to parse deployed versions"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_declared_file_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let deployed = write(dir.path(), "version.json", r#"{"appcd":"v1.0.0"}"#);
        let missing = dir.path().join("missing.env");

        let err = cmd_compare(
            &SourceConfig::new(),
            &file_location(&missing),
            deployed.to_str().unwrap(),
            None,
            OutputFormat::Text,
            false,
        )
        .await
        .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("declared versions"), "got: {msg}");
        assert!(msg.contains("missing.env"), "got: {msg}");
    }

    #[test]
    fn test_comparison_text_render_is_stable() {
        let records = vec![
            ChangeRecord::new("appcd", Some("v1.0.0".into()), Some("v1.0.0".into())),
            ChangeRecord::new("ui", Some("v1.9.0".into()), Some("v2.0.0".into())),
            ChangeRecord::new("vault", Some("v0.5.0".into()), None),
            ChangeRecord::new("agents", None, Some("v0.1.0".into())),
        ];

        let actual = render_comparison_text("github:acme/dist@main:.env", "production", &records, true);
        let expected = "Version Comparison\n==================\ndeclared: github:acme/dist@main:.env\ndeployed: production\n\nDifferences (1):\n  ~ ui: v1.9.0 -> v2.0.0\n\nOnly deployed (1):\n  - vault: v0.5.0\n\nOnly declared (1):\n  + agents: v0.1.0\n\nMatching (1):\n  = appcd: v1.0.0\n\nSummary: 1 changed, 1 unchanged, 1 deployed only, 1 declared only";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_comparison_text_all_match() {
        let records = vec![ChangeRecord::new("appcd", Some("v1".into()), Some("v1".into()))];
        let out = render_comparison_text("a", "b", &records, false);
        assert!(!out.contains("Matching"));
        assert!(out.ends_with("All versions match."));
    }

    #[tokio::test]
    async fn test_run_process_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("final_tag_differences.json");
        let commits = StaticCommitSource::new().with_range(
            "acme/ui",
            "v1.9.0",
            "v2.0.0",
            ["[ENG-100] add x", "unrelated commit", "[ENG-100] follow-up", "[PROD-5] fix"],
        );
        let tracker = MemoryIssueTracker::new().with_ticket(
            "PROD-5",
            TicketDetails {
                title: "Fix prod".to_string(),
                state: None,
                assignee: None,
            },
        );
        let inputs = vec![ServiceInput {
            service: "ui".to_string(),
            repository: "https://github.com/acme/ui".to_string(),
            version_key: None,
            current_tag: "v1.9.0".to_string(),
            new_tag: "v2.0.0".to_string(),
        }];

        let report = run_process(
            &inputs,
            &commits,
            Some(&tracker),
            &TicketExtractor::new(),
            &ProcessOptions::default(),
            &output,
            false,
        )
        .await
        .unwrap();

        assert_eq!(report.services[0].status, ServiceStatus::Success);
        assert!(report.metadata.run_id.is_some());

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(raw["allTickets"], serde_json::json!(["ENG-100", "PROD-5"]));
        assert_eq!(raw["services"][0]["commitsAhead"], 4);
        assert_eq!(raw["services"][0]["tickets"][1]["title"], "Fix prod");

        let summary = render_process_summary(&report, &output);
        assert!(summary.contains("Unique tickets across all services: 2"));
        assert!(summary.contains("  - ENG: 1 tickets"));
    }

    #[tokio::test]
    async fn test_run_process_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let inputs = vec![ServiceInput {
            service: "ui".to_string(),
            repository: "acme/ui".to_string(),
            version_key: None,
            current_tag: "v1".to_string(),
            new_tag: "v2".to_string(),
        }];

        let err = run_process(
            &inputs,
            &StaticCommitSource::new(),
            None,
            &TicketExtractor::new(),
            &ProcessOptions::default(),
            &output,
            false,
        )
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains("tags or repository not found"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_tickets_writes_listing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tickets.txt");
        let commits =
            StaticCommitSource::new().with_range("acme/ui", "v1", "v2", ["[ENG-1][ENG-2] fix bug"]);

        cmd_tickets(
            &commits,
            None,
            &TicketExtractor::new(),
            "https://github.com/acme/ui.git",
            "v1",
            "v2",
            Some(&output),
        )
        .await
        .unwrap();

        let listing = std::fs::read_to_string(&output).unwrap();
        assert!(listing.contains("Repository: acme/ui"));
        assert!(listing.contains("Total tickets found: 2"));
        assert!(listing.contains("\nENG-1\n"));
    }

    #[test]
    fn test_tickets_rejects_bad_pattern() {
        let err = ticket_extractor(Some("[A-Z")).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid ticket pattern"));
    }

    #[test]
    fn test_run_process_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let commits = StaticCommitSource::new();
        let tracker = MemoryIssueTracker::new();
        let extractor = TicketExtractor::new();
        let options = ProcessOptions::default();

        let work = run_process(&[], &commits, Some(&tracker), &extractor, &options, &output, false);
        assert_send(&work);
        drop(work);
        assert!(!output.exists());
    }

    // ========== Batch tickets ==========

    #[test]
    fn test_tickets_needs_a_range_or_a_file() {
        assert!(Cli::try_parse_from(["tagdiff", "tickets"]).is_err());
        assert!(Cli::try_parse_from(["tagdiff", "tickets", "acme/ui", "v1"]).is_err());
        assert!(Cli::try_parse_from(["tagdiff", "tickets", "acme/ui", "v1", "v2"]).is_ok());
        assert!(Cli::try_parse_from(["tagdiff", "tickets", "--from-file", "ranges.txt"]).is_ok());
        assert!(Cli::try_parse_from([
            "tagdiff",
            "tickets",
            "acme/ui",
            "v1",
            "v2",
            "--from-file",
            "ranges.txt"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["tagdiff", "tickets", "acme/ui", "v1", "v2", "--summary", "s.txt"]).is_err());
    }

    #[test]
    fn test_range_request_formats() {
        let expected = RangeRequest {
            repo: "acme/ui".to_string(),
            from: "v0.56.0".to_string(),
            to: "v0.58.0".to_string(),
        };
        assert_eq!(parse_range_request("acme/ui:v0.56.0:v0.58.0"), Some(expected.clone()));
        assert_eq!(parse_range_request("  acme/ui  v0.56.0\tv0.58.0 "), Some(expected.clone()));
        assert_eq!(
            parse_range_request("https://github.com/acme/ui v1 v2").map(|r| r.repo),
            Some("https://github.com/acme/ui".to_string())
        );
        assert_eq!(parse_range_request("acme/ui:v1"), None);
        assert_eq!(parse_range_request("acme/ui v1 v2 v3"), None);
        assert_eq!(parse_range_request("acme/ui::v2"), None);
        assert_eq!(expected.listing_name(), "tickets_acme_ui_v0.56.0_to_v0.58.0.txt");
    }

    #[tokio::test]
    async fn test_batch_continues_past_failed_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let ranges = write(
            dir.path(),
            "ranges.txt",
            "# release 42\nacme/ui:v1:v2\n\nacme/api v3 v4\nacme/missing:v1:v2\nnot a valid line at all\n",
        );
        let out_dir = dir.path().join("listings");
        let summary = dir.path().join("summary.txt");
        let commits = StaticCommitSource::new()
            .with_range("acme/ui", "v1", "v2", ["[ENG-1] one", "[ENG-2] two"])
            .with_range("acme/api", "v3", "v4", ["[OPS-7] deploy"]);

        let batch = cmd_tickets_batch(
            &commits,
            None,
            &TicketExtractor::new(),
            &ranges,
            &out_dir,
            Some(&summary),
        )
        .await
        .unwrap();

        assert_eq!(batch.outcomes.len(), 4);
        assert_eq!(batch.succeeded(), 2);
        assert_eq!(batch.failed(), 2);
        assert_eq!(batch.total_tickets(), 3);

        let ui = std::fs::read_to_string(out_dir.join("tickets_acme_ui_v1_to_v2.txt")).unwrap();
        assert!(ui.contains("Total tickets found: 2"));
        assert!(out_dir.join("tickets_acme_api_v3_to_v4.txt").exists());
        assert!(!out_dir.join("tickets_acme_missing_v1_to_v2.txt").exists());

        let report = std::fs::read_to_string(&summary).unwrap();
        assert!(report.starts_with("SINGLE REPOSITORY TICKET PROCESSING SUMMARY\n"));
        assert!(report.contains("Successful requests: 2\n"));
        assert!(report.contains("Failed requests: 2\n"));
        assert!(report.contains("acme/ui (v1 -> v2): 2 tickets\n"));
        assert!(report.contains("acme/missing (v1 -> v2)\n  Error: Failed to list commits"));
        assert!(report.contains("not a valid line at all\n  Error: expected owner/repo"));

        let totals = render_batch_totals(&batch);
        assert!(totals.ends_with("Total requests: 4\nSuccessful: 2\nFailed: 2\nTotal tickets found: 3"));
    }

    #[tokio::test]
    async fn test_batch_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_tickets_batch(
            &StaticCommitSource::new(),
            None,
            &TicketExtractor::new(),
            &dir.path().join("nope.txt"),
            dir.path(),
            None,
        )
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains("nope.txt"));
    }

    // ========== Tag comparison ==========

    const TAG_COMPARISON: &str = r#"{
        "status": "ahead", "ahead_by": 3, "behind_by": 0, "total_commits": 3,
        "html_url": "https://github.com/acme/ui/compare/v1...v2",
        "commits": [
            {"sha": "0123456789abcdef", "commit": {"message": "[ENG-1] add x\n\nbody",
                "author": {"name": "Jane Doe", "date": "2026-01-02T10:30:00Z"}}},
            {"sha": "fedcba9876543210", "commit": {"message": "no author"}}
        ],
        "files": [
            {"filename": "src/a.rs", "status": "added", "additions": 10, "deletions": 0, "changes": 10},
            {"filename": "old.txt", "status": "removed", "additions": 0, "deletions": 7, "changes": 7},
            {"filename": "c.rs", "status": "renamed"}
        ]
    }"#;

    #[test]
    fn test_compare_tags_parses_flags() {
        let cli = Cli::try_parse_from([
            "tagdiff",
            "compare-tags",
            "acme/ui",
            "v1",
            "v2",
            "--no-files",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::CompareTags {
                no_commits,
                no_files,
                format,
                ..
            } => {
                assert!(!no_commits);
                assert!(no_files);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected compare-tags command"),
        }
    }

    #[test]
    fn test_tag_comparison_text_render() {
        let comparison = tagdiff_sources::parse_comparison(TAG_COMPARISON).unwrap();
        let out = render_tag_comparison("acme/ui", "v1", "v2", &comparison, true, true);

        assert!(out.starts_with(&format!("{}\nTAG COMPARISON SUMMARY\n", "=".repeat(80))));
        assert!(out.contains("Status: ahead\nCommits ahead: 3\nCommits behind: 0\nTotal commits: 3\nFiles changed: 3\n"));
        assert!(out.contains("\nCOMMITS (2):\n"));
        assert!(out.contains("  0123456 - [ENG-1] add x (Jane Doe, 2026-01-02 10:30)\n"));
        assert!(out.contains("  fedcba9 - no author (unknown, -)\n"));
        assert!(out.contains("  ... 1 more commits not listed by GitHub\n"));
        assert!(out.contains("Added: 1, Modified: 0, Deleted: 1\nTotal changes: +10/-7\n"));
        assert!(out.contains("  A src/a.rs (added) [+10/-0]\n"));
        assert!(out.contains("  R c.rs (renamed)\n"));
        assert!(!out.contains("identical"));
    }

    #[test]
    fn test_tag_comparison_identical_and_sections_off() {
        let comparison = tagdiff_sources::parse_comparison(r#"{"status":"identical"}"#).unwrap();
        let out = render_tag_comparison("acme/ui", "v1", "v1", &comparison, false, false);
        assert!(out.contains("Tags are identical - no differences found\n"));
        assert!(!out.contains("COMMITS"));
        assert!(!out.contains("No file changes found"));

        let out = render_tag_comparison("acme/ui", "v1", "v1", &comparison, true, true);
        assert!(out.contains("No commits found"));
        assert!(out.contains("No file changes found"));
    }

    #[test]
    fn test_tag_comparison_json_keys() {
        let comparison = tagdiff_sources::parse_comparison(TAG_COMPARISON).unwrap();
        let value = serde_json::to_value(tag_comparison_output("acme/ui", "v1", "v2", &comparison)).unwrap();
        assert_eq!(value["repository"], "acme/ui");
        assert_eq!(value["aheadBy"], 3);
        assert_eq!(value["missingCommits"], 1);
        assert_eq!(value["commits"][0]["subject"], "[ENG-1] add x");
        assert_eq!(value["commits"][1]["author"], Value::Null);
        assert_eq!(value["files"][0]["filename"], "src/a.rs");
    }

    #[test]
    fn test_short_commit_date_falls_back_to_input() {
        assert_eq!(short_commit_date("2026-01-02T10:30:00+02:00"), "2026-01-02 10:30");
        assert_eq!(short_commit_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_environment_list_includes_presets() {
        let out = render_environment_list("https://{env}.stackgen.com/version.json");
        assert!(out.contains("production"));
        assert!(out.contains("https://stage.dev.stackgen.com/version.json"));
    }
}
