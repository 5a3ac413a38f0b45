//! # CLI Module
//!
//! Command-line interface for imagesearch.
//!
//! ## Usage
//! ```bash
//! # Rank every image under ~/Photos by distance to ref.jpg
//! imagesearch search ref.jpg ~/Photos
//!
//! # Only close matches, stop at the first one
//! imagesearch search ref.jpg ~/Photos --threshold 5 --stop-on-first-match
//!
//! # Group identical fingerprints, human-readable
//! imagesearch dupe ~/Photos --algorithm dhash --format text
//!
//! # Wavelet hash with parameters
//! imagesearch dupe ~/Photos -a whash-haar -p hash_size=16,remove_max_haar_ll=
//! ```

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use imagesearch::core::hasher::{Algorithm, AlgorithmConfig};
use imagesearch::core::pipeline::{Pipeline, SkippedPath};
use imagesearch::core::reporter::{self, OutputFormat};
use imagesearch::core::scanner::ScanConfig;
use imagesearch::core::search::SearchOptions;
use imagesearch::error::Result;
use imagesearch::events::{Event, EventChannel, EventSender, HashEvent, PipelineEvent, ScanEvent};
use imagesearch::ImageSearchError;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::thread;

/// Find visually similar and duplicate images
#[derive(Parser, Debug)]
#[command(name = "imagesearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Hide the progress bar and skip summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Hashing threads (default: one per CPU)
    #[arg(short, long, global = true, value_name = "N")]
    jobs: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank images by similarity to a reference image
    #[command(alias = "compare")]
    Search {
        /// The image to compare against
        reference: PathBuf,

        /// Files and directories to search
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only report images at most this distance away
        #[arg(short, long, value_name = "N")]
        threshold: Option<u32>,

        /// Report only the first image within the threshold (distance 0
        /// without one)
        #[arg(short = '1', long)]
        stop_on_first_match: bool,

        #[command(flatten)]
        hashing: HashingArgs,
    },

    /// Find groups of images with identical fingerprints
    Dupe {
        /// Files and directories to search
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        hashing: HashingArgs,
    },

    /// List the available algorithms and their parameters
    Algorithms,
}

#[derive(Args, Debug)]
struct HashingArgs {
    /// Fingerprint algorithm
    #[arg(short, long, value_enum, default_value_t = AlgorithmArg::Ahash, ignore_case = true)]
    algorithm: AlgorithmArg,

    /// Algorithm parameters, e.g. hash_size=16,highfreq_factor=4
    #[arg(short = 'p', long = "algo-params", value_name = "K=V,...", default_value = "")]
    algo_params: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json, ignore_case = true)]
    format: FormatArg,

    /// Skip hidden files and directories
    #[arg(long)]
    skip_hidden: bool,

    /// Follow symbolic links inside directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Only consider these extensions inside directories, e.g. jpg,png
    #[arg(long, value_delimiter = ',', value_name = "EXT")]
    ext: Vec<String>,

    /// Maximum directory depth
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    /// Average hashing
    #[value(name = "ahash")]
    Ahash,
    /// 2-axis perceptual hashing
    #[value(name = "phash")]
    Phash,
    /// 1-axis perceptual hashing
    #[value(name = "phash-simple")]
    PhashSimple,
    /// Horizontal difference hashing
    #[value(name = "dhash")]
    Dhash,
    /// Vertical difference hashing
    #[value(name = "dhash-vert")]
    DhashVert,
    /// Haar wavelet hashing
    #[value(name = "whash-haar")]
    WhashHaar,
    /// Daubechies wavelet hashing
    #[value(name = "whash-db4")]
    WhashDb4,
    /// HSV color hashing
    #[value(name = "colorhash")]
    Colorhash,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(algo: AlgorithmArg) -> Self {
        match algo {
            AlgorithmArg::Ahash => Algorithm::Ahash,
            AlgorithmArg::Phash => Algorithm::Phash,
            AlgorithmArg::PhashSimple => Algorithm::PhashSimple,
            AlgorithmArg::Dhash => Algorithm::Dhash,
            AlgorithmArg::DhashVert => Algorithm::DhashVert,
            AlgorithmArg::WhashHaar => Algorithm::WhashHaar,
            AlgorithmArg::WhashDb4 => Algorithm::WhashDb4,
            AlgorithmArg::Colorhash => Algorithm::Colorhash,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// One result per line
    Text,
    /// Pretty-printed JSON for scripting
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    imagesearch::init_tracing(cli.verbose);

    match cli.command {
        Commands::Search {
            reference,
            paths,
            threshold,
            stop_on_first_match,
            hashing,
        } => {
            let options = SearchOptions {
                threshold,
                stop_on_first_match,
            };
            run_search(reference, paths, options, &hashing, cli.jobs, cli.quiet)
        }
        Commands::Dupe { paths, hashing } => run_dupe(paths, &hashing, cli.jobs, cli.quiet),
        Commands::Algorithms => print_algorithms(),
    }
}

/// Print a fatal error to stderr
pub fn print_error(error: &ImageSearchError) {
    let term = Term::stderr();
    term.write_line(&format!("{} {}", style("error:").red().bold(), error))
        .ok();
}

fn build_pipeline(
    paths: Vec<PathBuf>,
    hashing: &HashingArgs,
    jobs: Option<usize>,
) -> Result<Pipeline> {
    let algorithm = AlgorithmConfig::parse(hashing.algorithm.into(), &hashing.algo_params)?;
    tracing::debug!(algorithm = %algorithm, "using algorithm");

    let scan_config = ScanConfig {
        follow_symlinks: hashing.follow_symlinks,
        skip_hidden: hashing.skip_hidden,
        max_depth: hashing.max_depth,
        extensions: if hashing.ext.is_empty() {
            None
        } else {
            Some(hashing.ext.clone())
        },
    };

    Pipeline::builder()
        .paths(paths)
        .algorithm(algorithm)
        .scan_config(scan_config)
        .jobs(jobs)
        .build()
}

fn run_search(
    reference: PathBuf,
    paths: Vec<PathBuf>,
    options: SearchOptions,
    hashing: &HashingArgs,
    jobs: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let pipeline = build_pipeline(paths, hashing, jobs)?;
    let result = with_progress(quiet, |events| pipeline.search(&reference, &options, events))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    reporter::write_search(&result.matches, hashing.format.into(), &mut out)?;
    out.flush().map_err(imagesearch::error::ReportError::from)?;

    if !quiet {
        print_skipped(&result.skipped);
    }
    Ok(())
}

fn run_dupe(
    paths: Vec<PathBuf>,
    hashing: &HashingArgs,
    jobs: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let pipeline = build_pipeline(paths, hashing, jobs)?;
    let result = with_progress(quiet, |events| pipeline.dupe(events))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    reporter::write_dupes(&result.groups, hashing.format.into(), &mut out)?;
    out.flush().map_err(imagesearch::error::ReportError::from)?;

    if !quiet {
        print_skipped(&result.skipped);
    }
    Ok(())
}

/// Run `job` while a background thread turns its events into a progress
/// bar on stderr.
fn with_progress<T, F>(quiet: bool, job: F) -> Result<T>
where
    F: FnOnce(&EventSender) -> Result<T>,
{
    let (sender, receiver) = EventChannel::new();

    let progress = if quiet || !Term::stderr().is_term() {
        None
    } else {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    };

    let progress_clone = progress.clone();

    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            // Drain so senders never hold events for nobody
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Completed { total_files }) => {
                    pb.set_length(total_files as u64);
                }
                Event::Hash(HashEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    pb.set_message(format!(
                        "hashed {}, skipped {}",
                        p.completed.saturating_sub(p.skipped),
                        p.skipped
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = job(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    result
}

fn print_skipped(skipped: &[SkippedPath]) {
    if skipped.is_empty() {
        return;
    }

    let explicit = skipped.iter().filter(|s| s.explicit).count();
    let term = Term::stderr();
    term.write_line(&format!(
        "{}",
        style(format!(
            "skipped {} path(s), {} named explicitly (use -v for details)",
            skipped.len(),
            explicit
        ))
        .dim()
    ))
    .ok();
}

fn print_algorithms() -> Result<()> {
    let term = Term::stdout();

    for algorithm in Algorithm::ALL {
        term.write_line(&format!(
            "{:<14}{}",
            style(algorithm.name()).bold(),
            algorithm.description()
        ))
        .ok();

        for param in algorithm.parameters() {
            term.write_line(&format!(
                "    {:<22}{}",
                format!("{}={}", param.name, param.default),
                style(param.help).dim()
            ))
            .ok();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn value_names_match_library_names() {
        for arg in AlgorithmArg::value_variants() {
            let name = arg.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(Algorithm::from(*arg).name(), name);
        }
    }

    #[test]
    fn compare_is_an_alias_for_search() {
        let cli = Cli::try_parse_from(["imagesearch", "compare", "ref.png", "dir"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { .. }));
    }

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from([
            "imagesearch",
            "-vv",
            "search",
            "ref.png",
            "a",
            "b",
            "-t",
            "10",
            "-1",
            "-a",
            "whash-db4",
            "-p",
            "hash_size=16",
            "-f",
            "text",
            "--ext",
            "jpg,png",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search {
                paths,
                threshold,
                stop_on_first_match,
                hashing,
                ..
            } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(threshold, Some(10));
                assert!(stop_on_first_match);
                assert!(matches!(hashing.algorithm, AlgorithmArg::WhashDb4));
                assert!(matches!(hashing.format, FormatArg::Text));
                assert_eq!(hashing.ext, vec!["jpg", "png"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn defaults_are_ahash_and_json() {
        let cli = Cli::try_parse_from(["imagesearch", "dupe", "dir"]).unwrap();
        match cli.command {
            Commands::Dupe { hashing, .. } => {
                assert!(matches!(hashing.algorithm, AlgorithmArg::Ahash));
                assert!(matches!(hashing.format, FormatArg::Json));
                assert!(hashing.algo_params.is_empty());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let result = Cli::try_parse_from(["imagesearch", "search", "ref.png", "dir", "-t", "-1"]);
        assert!(result.is_err());
    }

    #[test]
    fn search_needs_a_path() {
        assert!(Cli::try_parse_from(["imagesearch", "search", "ref.png"]).is_err());
    }
}
