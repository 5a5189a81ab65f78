use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use quote_guide::cache::{self, EstimateCache};
use quote_guide::config::{self, QuoteDefinition};
use quote_guide::output;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the form and price guide
    Check,
    /// List the questions visible for a set of answers
    Visible {
        /// Answers file (.json, or YAML otherwise)
        #[arg(short, long)]
        answers: Option<PathBuf>,
    },
    /// Compute the price estimate for a set of answers
    Estimate {
        /// Answers file (.json, or YAML otherwise)
        #[arg(short, long)]
        answers: PathBuf,

        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,

        /// Show each applied rule and what it did to the range
        #[arg(long)]
        breakdown: bool,

        /// Skip the estimate cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Write a starter quote definition
    Init {
        /// Where to save the definition
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "quote-guide")]
#[command(about = "Conditional quote forms and price estimates", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to quote definition (defaults to ~/.config/quote-guide/quote.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the definition and refuse to continue if it does not validate.
fn load_validated(path: Option<PathBuf>) -> QuoteDefinition {
    let definition = match config::load_definition(path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = definition.validate() {
        eprintln!("Quote definition errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    info!(
        form = %definition.form.id,
        form_version = definition.form.version,
        guide_version = definition.guide.version,
        questions = definition.form.questions.len(),
        rules = definition.guide.rules.len(),
        "loaded quote definition"
    );
    if !definition.form.published {
        warn!(form = %definition.form.id, "form is not published");
    }

    definition
}

fn load_answers_or_exit(path: &Path) -> quote_guide::Answers {
    match config::load_answers(path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Answers error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();
    let use_colors = output::should_use_colors();

    match cli.command {
        Commands::Init { path } => {
            if let Err(e) = config::init::run_init_wizard(path.or(cli.config)) {
                eprintln!("Init failed: {:#}", e);
                std::process::exit(EXIT_INPUT);
            }
        }
        Commands::Check => {
            let definition = load_validated(cli.config);
            println!(
                "OK: form '{}' v{} ({} questions), guide v{} ({} rules)",
                definition.form.id,
                definition.form.version,
                definition.form.questions.len(),
                definition.guide.version,
                definition.guide.rules.len()
            );
        }
        Commands::Visible { answers } => {
            let definition = load_validated(cli.config);
            let answers = answers
                .map(|p| load_answers_or_exit(&p))
                .unwrap_or_default();

            for issue in quote_guide::check_answers(&definition.form, &answers) {
                warn!("{}", issue);
            }

            let visible = quote_guide::visible_questions(&definition.form, &answers);
            println!(
                "{}",
                output::format_question_list(&visible, &answers, use_colors)
            );
        }
        Commands::Estimate {
            answers,
            json,
            breakdown,
            no_cache,
        } => {
            let definition = load_validated(cli.config);
            let answers = load_answers_or_exit(&answers);
            let form = &definition.form;
            let guide = &definition.guide;

            for issue in quote_guide::check_answers(form, &answers) {
                warn!("{}", issue);
            }

            // Cache trouble never blocks an estimate
            let cache_state = if no_cache {
                None
            } else {
                match cache::get_cache_path().and_then(|path| {
                    let cache = cache::load_cache(&path)?;
                    let key = EstimateCache::key(form, &answers)?;
                    Ok((path, cache, key))
                }) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        warn!("estimate cache unavailable: {:#}", e);
                        None
                    }
                }
            };

            let cached = cache_state
                .as_ref()
                .and_then(|(_, cache, key)| cache.lookup(key, form.version, guide.version))
                .cloned();

            let estimate = match cached {
                Some(estimate) => {
                    debug!("estimate cache hit");
                    estimate
                }
                None => {
                    let estimate = quote_guide::estimate(form, guide, &answers);
                    if let Some((path, mut cache, key)) = cache_state {
                        let pruned = cache.prune_stale(&form.id, form.version, guide.version);
                        if pruned > 0 {
                            debug!(pruned, "dropped stale cached estimates");
                        }
                        cache.store(key, form.version, estimate.clone());
                        if let Err(e) = cache::save_cache(&path, &cache) {
                            warn!("failed to save estimate cache: {:#}", e);
                        }
                    }
                    estimate
                }
            };

            if json {
                match output::format_json(&estimate) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("{:#}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                }
            } else {
                println!("{}", output::format_estimate(&estimate, use_colors));
                if breakdown {
                    println!();
                    println!("{}", output::format_breakdown(&estimate, use_colors));
                }
            }
        }
    }

    debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}
