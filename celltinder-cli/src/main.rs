//! celltinder CLI
//!
//! Command-line front end for thresholding and triaging cells in a cell table.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{ArgGroup, Parser, Subcommand};

use celltinder_core::TriageConfig;
use celltinder_io::CellImageSet;
use celltinder_triage::{CellRecord, TriageSession};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    CelltinderIo(#[from] celltinder_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] celltinder_core::Error),

    #[error("Triage error: {0}")]
    Triage(#[from] celltinder_triage::Error),

    #[error("Config error in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Threshold and triage segmented cells by fluorescence ratio.
#[derive(Parser)]
#[command(name = "celltinder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (crop settings and table column names)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the crop size (pixels)
    #[arg(long, global = true)]
    crop_size: Option<usize>,

    /// Override the number of frames per cell
    #[arg(long, global = true)]
    n_frames: Option<u32>,

    /// Zero mask pixels belonging to other cells
    #[arg(long, global = true, overrides_with = "no_isolate_masks")]
    isolate_masks: bool,

    /// Keep mask pixels of neighbouring cells
    #[arg(long, global = true, overrides_with = "isolate_masks")]
    no_isolate_masks: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ratio range of a cell table
    Bounds {
        /// Cell table (CSV)
        table: PathBuf,
    },

    /// Count cells whose ratio lies in a window (bounds included)
    Count {
        /// Cell table (CSV)
        table: PathBuf,

        /// Lower ratio bound
        #[arg(long, allow_negative_numbers = true)]
        lower: f64,

        /// Upper ratio bound
        #[arg(long, allow_negative_numbers = true)]
        upper: f64,
    },

    /// Store a threshold window in the table
    CommitWindow {
        /// Cell table (CSV)
        table: PathBuf,

        /// Lower ratio bound
        #[arg(long, allow_negative_numbers = true)]
        lower: f64,

        /// Upper ratio bound
        #[arg(long, allow_negative_numbers = true)]
        upper: f64,
    },

    /// List the active subset in triage order
    Subset {
        /// Cell table (CSV)
        table: PathBuf,
    },

    /// Load the cropped frames of one cell and print their statistics
    Inspect {
        /// Cell table (CSV)
        table: PathBuf,

        /// Position in the active subset
        #[arg(short, long)]
        index: usize,
    },

    /// Keep or reject cells of the active subset and save the decision
    #[command(group(ArgGroup::new("decision").required(true).args(["keep", "reject"])))]
    Mark {
        /// Cell table (CSV)
        table: PathBuf,

        /// Positions in the active subset
        #[arg(short, long = "index", required = true)]
        indices: Vec<usize>,

        /// Keep the cells
        #[arg(long)]
        keep: bool,

        /// Reject the cells
        #[arg(long)]
        reject: bool,
    },

    /// Summarize the table, window, and triage progress
    Summary {
        /// Cell table (CSV)
        table: PathBuf,
    },
}

impl Cli {
    /// Mask isolation requested on the command line, if any.
    fn isolate_override(&self) -> Option<bool> {
        match (self.isolate_masks, self.no_isolate_masks) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn load_config(cli: &Cli) -> Result<TriageConfig> {
    let config = match &cli.config {
        Some(path) => {
            let file = File::open(path)?;
            serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Config {
                path: path.clone(),
                source,
            })?
        }
        None => TriageConfig::default(),
    };
    let config = apply_overrides(cli, config);
    config.crop.validate()?;
    log::debug!("using {:?}", config);
    Ok(config)
}

fn apply_overrides(cli: &Cli, mut config: TriageConfig) -> TriageConfig {
    if let Some(size) = cli.crop_size {
        config.crop = config.crop.with_crop_size(size);
    }
    if let Some(n) = cli.n_frames {
        config.crop = config.crop.with_n_frames(n);
    }
    if let Some(isolate) = cli.isolate_override() {
        config.crop = config.crop.with_isolate_masks(isolate);
    }
    config
}

fn open(table: &Path, config: &TriageConfig) -> Result<TriageSession> {
    Ok(TriageSession::open(table, config.clone())?)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Bounds { table } => {
            let session = open(&table, &config)?;
            let (lower, upper) = session.get_default_bounds();
            println!("Cells: {}", session.table().len());
            println!("Ratio range: {} - {}", lower, upper);
        }

        Commands::Count {
            table,
            lower,
            upper,
        } => {
            let session = open(&table, &config)?;
            println!("{}", session.get_count(lower, upper));
        }

        Commands::CommitWindow {
            table,
            lower,
            upper,
        } => {
            let mut session = open(&table, &config)?;
            let column = session.commit_window(lower, upper)?;
            println!("Committed window: {}", column);
            println!("Active cells: {}", session.subset_len());
        }

        Commands::Subset { table } => {
            let session = open(&table, &config)?;
            let subset = session.get_active_subset()?;
            println!(
                "{:>5} | {:>5} | {:>10} | {:<12} | {:>6} | {:<5}",
                "Index", "Row", "Ratio", "Field", "Label", "Kept"
            );
            println!("{:-<58}", "");
            for (index, record) in subset.iter().enumerate() {
                print_record(index, record);
            }
        }

        Commands::Inspect { table, index } => {
            let mut session = open(&table, &config)?;
            session.begin_triage()?;
            let record = session.cell_record(index)?;
            let set = session.get_cell_image_set(index)?;
            println!(
                "Cell {} (row {}): field {}, label {}, ratio {}",
                index, record.row, record.field_id, record.mask_label, record.ratio
            );
            println!(
                "Centroid: ({:.2}, {:.2})",
                record.centroid.y, record.centroid.x
            );
            print_image_set(&set, record.mask_label);
        }

        Commands::Mark {
            table,
            indices,
            keep,
            reject: _,
        } => {
            let mut session = open(&table, &config)?;
            session.begin_triage()?;
            for &index in &indices {
                session.mark_kept(index, keep)?;
            }
            let written = session.commit_selection()?;
            println!(
                "{} {} cell(s); {} kept in total",
                if keep { "Kept" } else { "Rejected" },
                written,
                session.selected_count()
            );
        }

        Commands::Summary { table } => {
            let session = open(&table, &config)?;
            let (lower, upper) = session.get_default_bounds();
            println!("Table: {}", table.display());
            println!("Cells: {}", session.table().len());
            println!("Ratio range: {} - {}", lower, upper);
            match session.table().active_column() {
                Some(column) => {
                    let active = session.get_active_subset()?.len();
                    println!("Window: {} ({} active)", column, active);
                }
                None => println!("Window: none committed"),
            }
            println!("Kept: {}", session.selected_count());
        }
    }

    Ok(())
}

fn print_record(index: usize, record: &CellRecord) {
    let kept = match record.kept {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };
    println!(
        "{:>5} | {:>5} | {:>10.4} | {:<12} | {:>6} | {:<5}",
        index, record.row, record.ratio, record.field_id, record.mask_label, kept
    );
}

fn print_image_set(set: &CellImageSet, label: u32) {
    println!(
        "{:>5} | {:>9} | {:>12} | {:>12} | {:>10}",
        "Frame", "Shape", "Min", "Max", "Cell px"
    );
    println!("{:-<60}", "");
    for (frame, image) in &set.images {
        let (min, max) = image
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let cell_pixels = set
            .mask(*frame)
            .map_or(0, |mask| mask.iter().filter(|&&px| px == label).count());
        let (rows, cols) = image.dim();
        println!(
            "{:>5} | {:>9} | {:>12.2} | {:>12.2} | {:>10}",
            frame,
            format!("{}x{}", rows, cols),
            min,
            max,
            cell_pixels
        );
    }
}
