//! Command-line entry points: per-dashboard generation, deck merging,
//! and the batch run that does both.

use anyhow::Context;
use clap::{Parser, Subcommand};
use longan::dashboard;
use longan::generate::{GenerateOptions, Generator};
use longan::merge::merge_presentations;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "longan",
    version,
    about = "Fill PowerPoint dashboard templates from Excel workbooks and merge the resulting decks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one dashboard deck from a template and a workbook
    Generate {
        /// Registry name of the dashboard to generate
        dashboard: String,

        /// Template package (defaults to a co-located template.pptx)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Where the generated deck is written
        #[arg(long, default_value = "output.pptx")]
        output: PathBuf,

        /// Blank all text fields instead of filling values
        #[arg(long)]
        fill_empty: bool,

        /// Strip shapes lacking a title before filling
        #[arg(long)]
        clean: bool,

        /// Directory receiving the per-section separate chart exports
        #[arg(long, default_value = "separate-charts")]
        separate_charts_dir: PathBuf,

        /// Input workbook holding the cell values
        workbook: PathBuf,
    },

    /// Merge generated decks into one multi-slide deck
    Merge {
        /// Where the merged deck is written
        #[arg(long, default_value = "output.pptx")]
        output: PathBuf,

        /// Decks to merge, in slide order; the first is the base
        #[arg(required = true)]
        decks: Vec<PathBuf>,
    },

    /// Generate every registered dashboard, then merge the results
    Batch {
        /// Where the merged deck is written
        #[arg(long, default_value = "output.pptx")]
        output: PathBuf,

        /// Directory holding one subdirectory per dashboard with its
        /// template.pptx; outputs land next to each template
        #[arg(long, default_value = "dashboards")]
        dir: PathBuf,

        /// Input workbook holding the cell values
        workbook: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Generate {
            dashboard: name,
            template,
            output,
            fill_empty,
            clean,
            separate_charts_dir,
            workbook,
        } => {
            let dashboard =
                dashboard::find(&name).ok_or(longan::Error::UnknownDashboard(name.clone()))?;
            let mut options = GenerateOptions::new(
                template.unwrap_or_else(|| PathBuf::from("template.pptx")),
                workbook,
            );
            options.output = output;
            options.fill_empty = fill_empty;
            options.clean = clean;
            options.separate_charts_dir = separate_charts_dir;
            Generator::run(dashboard.as_ref(), options)
                .with_context(|| format!("generating dashboard '{name}'"))
        },
        Command::Merge { output, decks } => {
            merge_presentations(&decks, &output).context("merging decks")
        },
        Command::Batch { output, dir, workbook } => {
            let mut decks = Vec::new();
            for dashboard in dashboard::registry() {
                let dashboard_dir = dir.join(dashboard.name());
                let mut options =
                    GenerateOptions::new(dashboard_dir.join("template.pptx"), &workbook);
                options.output = dashboard_dir.join("output.pptx");
                options.separate_charts_dir = dashboard_dir.join("separate-charts");
                let deck = options.output.clone();
                Generator::run(dashboard.as_ref(), options)
                    .with_context(|| format!("generating dashboard '{}'", dashboard.name()))?;
                decks.push(deck);
            }
            merge_presentations(&decks, &output).context("merging generated decks")
        },
    }
}
