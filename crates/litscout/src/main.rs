//! litscout - command line entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use futures::{StreamExt, pin_mut};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use litscout::engine::{DiscoveryEngine, DiscoveryEvent, DiscoveryParams};
use litscout::{Config, EntrezClient, GeminiScorer, ProjectManager, RateLimiter, export};

#[derive(Parser, Debug)]
#[command(name = "litscout")]
#[command(about = "Relevance-guided citation-graph discovery for PubMed literature")]
#[command(version)]
struct Cli {
    /// Directory holding project data
    #[arg(long, default_value = "projects", env = "LITSCOUT_PROJECTS_DIR")]
    projects_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover related articles from a seed publication
    Search {
        /// Project to record evaluations in (created if absent)
        #[arg(long)]
        project: String,

        /// Seed article: a PMID or a pubmed.ncbi.nlm.nih.gov URL
        #[arg(long)]
        seed: String,

        /// Research theme the articles are scored against
        #[arg(long)]
        theme: String,

        /// Relevance score cutoff (0-100)
        #[arg(long, default_value_t = litscout::config::defaults::RELEVANCE_THRESHOLD)]
        threshold: u8,

        /// Maximum traversal depth from the seed
        #[arg(long, default_value_t = litscout::config::defaults::MAX_DEPTH)]
        max_depth: u32,

        /// Maximum number of articles to visit
        #[arg(long, default_value_t = litscout::config::defaults::MAX_ARTICLES)]
        max_articles: usize,

        /// Only keep articles published in or after this year
        #[arg(long)]
        year_from: Option<i32>,

        /// Skip similar-article links
        #[arg(long)]
        no_similar: bool,

        /// Skip cited-by links
        #[arg(long)]
        no_cited_by: bool,

        /// Also follow reference links
        #[arg(long)]
        include_references: bool,

        /// Re-score articles already in the project cache
        #[arg(long)]
        force_reevaluate: bool,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Export a project's records
    Export {
        /// Project to export
        #[arg(long)]
        project: String,

        /// Output format
        #[arg(long, default_value = "json", value_parser = ["json", "markdown", "csv"])]
        format: String,

        /// Relevance threshold used to mark records
        #[arg(long, default_value_t = litscout::config::defaults::RELEVANCE_THRESHOLD)]
        threshold: u8,

        /// Only export records that clear the threshold
        #[arg(long)]
        relevant_only: bool,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectAction {
    /// List projects, most recently updated first
    List,
    /// Create an empty project
    Create {
        /// Project name
        name: String,
        /// Research theme
        #[arg(long)]
        theme: String,
    },
    /// Show a project's metadata and session history
    Show {
        /// Project name
        name: String,
    },
    /// Delete a project and all its data
    Delete {
        /// Project name
        name: String,
    },
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let mut config = Config::from_env();
    config.projects_dir = cli.projects_dir.clone();
    let manager = ProjectManager::new(&config.projects_dir)?;

    match cli.command {
        Command::Search {
            project,
            seed,
            theme,
            threshold,
            max_depth,
            max_articles,
            year_from,
            no_similar,
            no_cited_by,
            include_references,
            force_reevaluate,
        } => {
            let seed_id = litscout::client::extract_pmid(&seed)
                .with_context(|| format!("could not extract a PMID from '{seed}'"))?;

            if config.gemini_api_key.is_none() {
                bail!("GEMINI_API_KEY is not set; the relevance scorer needs it");
            }

            let mut project = manager.load_or_create(&project, &theme)?;
            if project.metadata().research_theme != theme {
                tracing::warn!(
                    stored = %project.metadata().research_theme,
                    "project was created for a different theme; cached scores will be reused as-is \
                     (use --force-reevaluate to re-score)"
                );
            }

            let limiter = Arc::new(RateLimiter::new(config.request_delay));
            let client = Arc::new(EntrezClient::new(&config, limiter)?);
            let scorer = Arc::new(GeminiScorer::new(&config)?);
            let engine = DiscoveryEngine::new(client, scorer);

            // Ctrl-C stops between articles, never mid-fetch.
            let stop = engine.stop_signal();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, finishing current article");
                    stop.request_stop();
                }
            });

            let mut params = DiscoveryParams::new(seed_id, theme);
            params.relevance_threshold = threshold;
            params.max_depth = max_depth;
            params.max_articles = max_articles;
            params.year_from = year_from;
            params.include_similar = !no_similar;
            params.include_cited_by = !no_cited_by;
            params.include_references = include_references;
            params.force_reevaluate = force_reevaluate;

            let mut final_stats = None;
            {
                let stream = engine.run(&mut project, params);
                pin_mut!(stream);
    
                while let Some(event) = stream.next().await {
                    match event? {
                        DiscoveryEvent::Article(hit) => {
                            let marker = if hit.errored {
                                "✗"
                            } else if hit.is_relevant {
                                "✓"
                            } else {
                                "·"
                            };
                            let origin = if hit.from_cache { "cache" } else { "fresh" };
                            println!(
                                "{marker} [{}] depth={} score={:>3} ({origin}) {}",
                                hit.id,
                                hit.depth,
                                hit.score,
                                if hit.article.title.is_empty() {
                                    &hit.justification
                                } else {
                                    &hit.article.title
                                }
                            );
                        }
                        DiscoveryEvent::Done(stats) => final_stats = Some(stats),
                    }
                }
            }

            if let Some(stats) = final_stats {
                println!(
                    "\nVisited {} | evaluated {} | from cache {} | errored {} | relevant {} | depth reached {}",
                    stats.total_visited,
                    stats.total_evaluated,
                    stats.total_skipped,
                    stats.total_errored,
                    stats.total_relevant,
                    stats.depth_reached,
                );
            }

            println!("\nTop articles by score:");
            let records = project.records();
            for record in export::sorted_by_score(records).iter().take(10) {
                println!(
                    "  {:>3}  [{}] {}",
                    record.evaluation.score,
                    record.article.id,
                    record.article.title
                );
            }
        }

        Command::Project { action } => match action {
            ProjectAction::List => {
                for metadata in manager.list()? {
                    println!(
                        "{}  ({} articles, updated {})",
                        metadata.name,
                        metadata.stats.total_articles,
                        metadata.updated_at.format("%Y-%m-%d %H:%M"),
                    );
                }
            }
            ProjectAction::Create { name, theme } => {
                manager.create(&name, &theme)?;
                println!("Created project '{name}'");
            }
            ProjectAction::Show { name } => {
                let project = manager.load(&name)?;
                let metadata = project.metadata();
                println!("Name: {}", metadata.name);
                println!("Theme: {}", metadata.research_theme);
                println!("Created: {}", metadata.created_at.format("%Y-%m-%d %H:%M"));
                println!("Articles: {}", metadata.stats.total_articles);
                println!("Sessions:");
                for session in &metadata.sessions {
                    println!(
                        "  {}  ({} new articles)",
                        session.timestamp.format("%Y-%m-%d %H:%M"),
                        session.article_count
                    );
                }
            }
            ProjectAction::Delete { name } => {
                manager.delete(&name)?;
                println!("Deleted project '{name}'");
            }
        },

        Command::Export { project, format, threshold, relevant_only, output } => {
            let project = manager.load(&project)?;
            let records = if relevant_only {
                project.relevant_records(threshold)
            } else {
                project.records()
            };

            let rendered = match format.as_str() {
                "markdown" => export::format_records_markdown(&records, threshold),
                "csv" => export::format_records_csv(&records, threshold),
                _ => export::format_records_json(&records, threshold)?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Wrote {} records to {}", records.len(), path.display());
                }
                None => println!("{rendered}"),
            }
        }
    }

    Ok(())
}
