//! xai-rs CLI for laying out, rendering and exchanging image explanations.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xai_core::ImageBatch;
use xai_explain::{estimate_num_per_row, GridLayout, PlainExplanation, DEFAULT_TARGET_ELONGATION};
use xai_plot::{InteractiveBackend, PlotConfig, StaticBackend};

#[derive(Parser)]
#[command(name = "xai")]
#[command(author, version)]
#[command(about = "Lay out and render image explanations as static or interactive figures")]
#[command(long_about = "xai-rs: plain image explanations, grid layout and figure backends.

EXAMPLES:
  # How would 16 landscape images be tiled?
  xai layout --count 16 --width 20 --height 10

  # Render a directory of images as a PNG mosaic
  xai mosaic ./heatmaps --output mosaic.png

  # Same images as an interactive plotly page, 4 per row
  xai html ./heatmaps --output mosaic.html --per-row 4

  # Export to JSON and check the export round-trips
  xai export ./heatmaps --output explanation.json
  xai roundtrip explanation.json")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Plot config file (JSON); flags override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the grid layout estimated for a batch
    Layout {
        /// Number of images
        #[arg(long, value_name = "N")]
        count: usize,

        /// Width of one image in pixels
        #[arg(long, value_name = "PX")]
        width: u32,

        /// Height of one image in pixels
        #[arg(long, value_name = "PX")]
        height: u32,

        /// Target elongation
        #[arg(long, value_name = "T")]
        target: Option<usize>,
    },
    /// Render a directory of images as a static figure (PNG, JPEG or SVG)
    Mosaic {
        /// Directory of images; file names become captions
        dir: PathBuf,

        /// Output file
        #[arg(long, short, default_value = "mosaic.png")]
        output: PathBuf,

        /// Images per row (skips the layout estimate)
        #[arg(long, value_name = "K")]
        per_row: Option<usize>,

        /// Side of each square tile in pixels
        #[arg(long, value_name = "PX")]
        tile_size: Option<u32>,

        /// Do not use file names as captions
        #[arg(long, default_value = "false")]
        no_names: bool,
    },
    /// Render a directory of images as an interactive HTML page
    Html {
        /// Directory of images; file names become subplot titles
        dir: PathBuf,

        /// Output file
        #[arg(long, short, default_value = "mosaic.html")]
        output: PathBuf,

        /// Images per row (skips the layout estimate)
        #[arg(long, value_name = "K")]
        per_row: Option<usize>,

        /// Page title
        #[arg(long, default_value = "Plain explanation")]
        title: String,

        /// Do not use file names as subplot titles
        #[arg(long, default_value = "false")]
        no_names: bool,
    },
    /// Export a directory of images as a plain explanation (JSON)
    Export {
        /// Directory of images
        dir: PathBuf,

        /// Output file
        #[arg(long, short, default_value = "explanation.json")]
        output: PathBuf,
    },
    /// Check that an exported explanation survives import and re-export
    Roundtrip {
        /// Exported explanation (JSON)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    let config = match &cli.config {
        Some(path) => PlotConfig::load(path)
            .with_context(|| format!("Failed to load plot config {:?}", path))?,
        None => PlotConfig::default(),
    };

    match cli.command {
        Commands::Layout {
            count,
            width,
            height,
            target,
        } => handle_layout(count, width, height, target.unwrap_or(config.target_elongation)),
        Commands::Mosaic {
            dir,
            output,
            per_row,
            tile_size,
            no_names,
        } => {
            let mut config = config;
            if let Some(tile_size) = tile_size {
                config.tile_size = tile_size;
            }
            handle_mosaic(dir, output, per_row, no_names, config)
        }
        Commands::Html {
            dir,
            output,
            per_row,
            title,
            no_names,
        } => handle_html(dir, output, per_row, title, no_names, config),
        Commands::Export { dir, output } => handle_export(dir, output),
        Commands::Roundtrip { file } => handle_roundtrip(file),
    }
}

fn handle_layout(count: usize, width: u32, height: u32, target: usize) -> Result<()> {
    let columns = estimate_num_per_row(count, width, height, target)
        .context("Cannot estimate layout")?;
    let layout = GridLayout::new(count, columns)?;

    println!("{} x {}", layout.rows(), layout.columns());
    if target != DEFAULT_TARGET_ELONGATION {
        println!("  (target elongation {})", target);
    }
    if layout.empty_cells(count) > 0 {
        println!("  {} empty cell(s) in the last row", layout.empty_cells(count));
    }
    Ok(())
}

/// Load a directory into a plain explanation, optionally dropping captions.
fn load_explanation(dir: &Path, no_names: bool) -> Result<PlainExplanation> {
    let batch = ImageBatch::from_dir(dir)
        .with_context(|| format!("Failed to load images from {:?}", dir))?;
    if !batch.is_uniform() {
        tracing::warn!("Images in {:?} differ in size; layout uses the first one", dir);
    }
    let mut explanation = PlainExplanation::new();
    if no_names {
        let (images, _) = batch.into_parts();
        explanation.add(images, None)?;
    } else {
        explanation.add_batch(batch);
    }
    Ok(explanation)
}

fn handle_mosaic(
    dir: PathBuf,
    output: PathBuf,
    per_row: Option<usize>,
    no_names: bool,
    config: PlotConfig,
) -> Result<()> {
    let explanation = load_explanation(&dir, no_names)?;
    let Some(figure) = explanation.plot(&StaticBackend::new(config), per_row)? else {
        bail!("Nothing to plot in {:?}", dir);
    };
    figure
        .save(&output)
        .with_context(|| format!("Failed to write {:?}", output))?;

    let layout = figure.layout();
    println!(
        "Wrote {:?}: {} image(s) in {} x {} grid",
        output,
        figure.panels().len(),
        layout.rows(),
        layout.columns()
    );
    Ok(())
}

fn handle_html(
    dir: PathBuf,
    output: PathBuf,
    per_row: Option<usize>,
    title: String,
    no_names: bool,
    config: PlotConfig,
) -> Result<()> {
    let explanation = load_explanation(&dir, no_names)?;
    let Some(figure) = explanation.plot(&InteractiveBackend::new(config), per_row)? else {
        bail!("Nothing to plot in {:?}", dir);
    };
    figure
        .save_html(&output, &title)
        .with_context(|| format!("Failed to write {:?}", output))?;

    println!(
        "Wrote {:?}: {} image(s), {} px tall",
        output,
        figure.panels().len(),
        figure.height()
    );
    Ok(())
}

fn handle_export(dir: PathBuf, output: PathBuf) -> Result<()> {
    let explanation = load_explanation(&dir, false)?;
    explanation
        .save(&output)
        .with_context(|| format!("Failed to write {:?}", output))?;
    println!("Exported {} to {:?}", explanation, output);
    Ok(())
}

fn handle_roundtrip(file: PathBuf) -> Result<()> {
    let json = std::fs::read_to_string(&file).with_context(|| format!("Failed to read {:?}", file))?;
    let explanation = PlainExplanation::from_json(&json).context("Failed to import explanation")?;
    let first = explanation.dump()?;
    let second = PlainExplanation::from_json(&first)?.dump()?;

    if first != second {
        bail!("Re-export of {:?} is not stable", file);
    }
    if first != json.trim_end() {
        println!("Note: {:?} is not in canonical form; re-export differs from the file", file);
    }
    println!("OK: {:?} round-trips ({} bytes)", file, first.len());
    Ok(())
}
