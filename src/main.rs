use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use site_risk::error::InputError;
use site_risk::output::{self, RankedSite};
use site_risk::records::{Inspection, Site, Vendor, WorkOrder};
use site_risk::scoring::{self, RiskScorer};
use site_risk::signals::{self, LateWorkOrderDetector, PrecomputedExtractor, SignalFilter};
use site_risk::store::{self, Store};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_INPUT: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_STORE: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Register or update a site from a JSON file
    AddSite { file: PathBuf },
    /// Register or update a vendor from a JSON file
    AddVendor { file: PathBuf },
    /// Store a work order and flag it if it is past due
    IngestWorkOrder { file: PathBuf },
    /// Store an inspection and the signals extracted from its notes
    IngestInspection {
        file: PathBuf,
        /// JSON file with candidate signals for the inspection notes
        #[arg(long)]
        candidates: PathBuf,
    },
    /// Mark a signal resolved
    Resolve { signal_id: String },
    /// Score one site, or every known site
    Score { site_id: Option<String> },
    /// List sites by latest risk score, highest first
    Rank {
        #[arg(long, default_value_t = 50.0)]
        min_score: f64,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Print JSON instead of a table
        #[arg(long, conflicts_with = "tsv")]
        json: bool,
        /// Print tab-separated values
        #[arg(long)]
        tsv: bool,
    },
    /// Show a site's signals and score history, newest first
    History {
        site_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Signal statistics
    Signals {
        #[arg(long)]
        site: Option<String>,
        #[arg(long = "type")]
        signal_type: Option<String>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        resolved: Option<bool>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "site-risk")]
#[command(about = "Facility execution-risk scoring CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/site-risk/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the record store (overrides the config file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Evaluation time as RFC 3339 (defaults to now)
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", value, e))
}

/// Read a JSON record, reporting parse failures as invalid input.
fn read_record<T: DeserializeOwned>(kind: &'static str, path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} record at {}", kind, path.display()))?;
    let record = serde_json::from_reader(BufReader::new(file)).map_err(|e| InputError::Malformed {
        kind,
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(record)
}

struct RunContext {
    scorer: RiskScorer,
    detector: LateWorkOrderDetector,
    now: DateTime<Utc>,
    verbose: bool,
}

/// Run a command against the store. Returns whether the store changed.
fn run(command: Commands, ctx: &RunContext, store: &mut Store) -> Result<bool> {
    let use_colors = output::should_use_colors();

    match command {
        Commands::InitConfig { .. } => Ok(false),
        Commands::AddSite { file } => {
            let site: Site = read_record("site", &file)?;
            site.validate()?;
            println!("Stored site {} ({})", site.site_id, site.name);
            store.upsert_site(site);
            Ok(true)
        }
        Commands::AddVendor { file } => {
            let vendor: Vendor = read_record("vendor", &file)?;
            vendor.validate()?;
            println!("Stored vendor {} ({})", vendor.vendor_id, vendor.name);
            store.upsert_vendor(vendor);
            Ok(true)
        }
        Commands::IngestWorkOrder { file } => {
            let work_order: WorkOrder = read_record("work order", &file)?;
            work_order.validate()?;

            match ctx.detector.detect(&work_order, ctx.now) {
                Some(signal) => {
                    let summary = format!("{} ({}): {}", signal.signal_id, signal.severity, signal.explanation);
                    if store.insert_signal(signal) {
                        println!("Detected {}", summary);
                    } else {
                        println!("Already recorded {}", summary);
                    }
                }
                None => println!("Work order {} is not late", work_order.work_order_id),
            }
            store.upsert_work_order(work_order);
            Ok(true)
        }
        Commands::IngestInspection { file, candidates } => {
            let inspection: Inspection = read_record("inspection", &file)?;
            inspection.validate()?;

            let extractor = PrecomputedExtractor::from_path(&candidates)?;
            let extracted = signals::extract_from_inspection(&extractor, &inspection, ctx.now)?;
            for signal in &extracted {
                signal.validate()?;
            }

            let total = extracted.len();
            let recorded = extracted
                .into_iter()
                .map(|signal| store.insert_signal(signal))
                .filter(|inserted| *inserted)
                .count();
            println!(
                "Extracted {} signal(s) from inspection {} ({} new)",
                total, inspection.inspection_id, recorded
            );
            store.upsert_inspection(inspection);
            Ok(true)
        }
        Commands::Resolve { signal_id } => {
            if !store.resolve_signal(&signal_id, ctx.now) {
                anyhow::bail!("No signal with id '{}'", signal_id);
            }
            println!("Resolved {}", signal_id);
            Ok(true)
        }
        Commands::Score { site_id } => {
            let site_ids = match site_id {
                Some(id) => {
                    if store.site(&id).is_none() && store.signals_for_site(&id).is_empty() {
                        anyhow::bail!("Unknown site '{}'", id);
                    }
                    vec![id]
                }
                None => store.site_ids(),
            };

            if site_ids.is_empty() {
                println!("No sites to score.");
                return Ok(false);
            }

            // validate everything before any snapshot is appended
            let batches = site_ids
                .into_iter()
                .map(|id| {
                    let site_signals = store.signals_for_site(&id);
                    scoring::check_signals(&id, &site_signals)?;
                    Ok((id, site_signals))
                })
                .collect::<Result<Vec<_>, InputError>>()?;

            for (id, site_signals) in batches {
                let previous = store.latest_score(&id).cloned();
                let risk = ctx
                    .scorer
                    .calculate_site_risk(&id, &site_signals, previous.as_ref(), ctx.now);
                info!(site_id = %id, score = risk.score, trend = risk.trend.as_str(), "scored site");

                let ranked = RankedSite {
                    score: &risk,
                    site: store.site(&id),
                };
                println!("{}", output::format_score_detail(&ranked, use_colors));
                if ctx.verbose {
                    let active: Vec<_> = site_signals.into_iter().filter(|s| !s.resolved).collect();
                    if !active.is_empty() {
                        println!("  Contributions:");
                        println!(
                            "{}",
                            output::format_contributions(&ctx.scorer.contributions(&active, ctx.now))
                        );
                    }
                }
                println!();

                store.push_score(risk);
            }
            Ok(true)
        }
        Commands::Rank {
            min_score,
            limit,
            json,
            tsv,
        } => {
            let latest = scoring::latest_per_site(&store.risk_scores);
            let ranked_scores = scoring::at_risk(latest, min_score, limit);
            debug!(count = ranked_scores.len(), min_score, limit, "ranked sites");

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ranked_scores).context("Failed to serialize ranking")?
                );
                return Ok(false);
            }

            let ranked: Vec<RankedSite> = ranked_scores
                .iter()
                .map(|score| RankedSite {
                    score,
                    site: store.site(&score.site_id),
                })
                .collect();

            if tsv {
                if !ranked.is_empty() {
                    println!("{}", output::format_tsv(&ranked));
                }
            } else {
                println!("{}", output::format_ranked_table(&ranked, use_colors));
            }
            Ok(false)
        }
        Commands::History { site_id, json } => {
            let history = store
                .history(&site_id)
                .with_context(|| format!("Unknown site '{}'", site_id))?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&history).context("Failed to serialize site history")?
                );
            } else {
                println!("{}", output::format_history(&history, ctx.now, use_colors));
            }
            Ok(false)
        }
        Commands::Signals {
            site,
            signal_type,
            severity,
            resolved,
            json,
        } => {
            let filter = SignalFilter {
                site_id: site,
                signal_type: signal_type.map(signals::SignalType::from),
                severity: severity.map(signals::Severity::from),
                resolved,
            };
            let summary = signals::summarize(&store.signals, &filter);

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("Failed to serialize signal statistics")?
                );
            } else {
                println!("{}", output::format_signal_summary(&summary));
            }
            Ok(false)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    site_risk::logging::init_logging(cli.verbose);

    if let Commands::InitConfig { force } = cli.command {
        let path = cli.config.clone().unwrap_or_else(site_risk::config::get_config_path);
        if let Err(e) = site_risk::config::write_default_config(&path, force) {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        println!("Wrote default config to {}", path.display());
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config = match site_risk::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate scoring and detection config at startup
    let effective_scoring = config.effective_scoring();
    let effective_detection = config.effective_detection();
    let mut errors = Vec::new();
    if let Err(e) = scoring::validate_scoring(&effective_scoring) {
        errors.extend(e);
    }
    if let Err(e) = scoring::validate_detection(&effective_detection) {
        errors.extend(e);
    }
    if !errors.is_empty() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let engines = RiskScorer::from_config(&effective_scoring).and_then(|scorer| {
        LateWorkOrderDetector::from_config(&effective_detection).map(|detector| (scorer, detector))
    });
    let (scorer, detector) = match engines {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path());
    let mut record_store = match store::load_store(&store_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Store error: {:#}", e);
            std::process::exit(EXIT_STORE);
        }
    };
    debug!(path = %store_path.display(), signals = record_store.signals.len(), "loaded store");

    let ctx = RunContext {
        scorer,
        detector,
        now: cli.now.unwrap_or_else(Utc::now),
        verbose: cli.verbose,
    };
    debug!(now = %ctx.now, "evaluation time");

    let changed = match run(cli.command, &ctx, &mut record_store) {
        Ok(changed) => changed,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = if e.downcast_ref::<InputError>().is_some() {
                EXIT_INPUT
            } else {
                EXIT_FAILURE
            };
            std::process::exit(code);
        }
    };

    if changed {
        if let Err(e) = store::save_store(&store_path, &record_store) {
            eprintln!("Store error: {:#}", e);
            std::process::exit(EXIT_STORE);
        }
    }

    debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}
