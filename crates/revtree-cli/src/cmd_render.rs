use anyhow::{Context, Result};
use clap::Subcommand;
use revtree::v1::{Rgb, Style};
use revtree_svg::RenderOptions;
use std::path::PathBuf;

use crate::input::read_doc;

#[derive(Subcommand, Debug)]
pub enum RenderFormat {
    /// Render as an SVG revision tree
    Svg {
        /// Input file (reads stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (writes stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL for changeset and browser links
        #[arg(long)]
        base_url: Option<String>,

        /// Stack changesets at a uniform pitch instead of on a timeline
        #[arg(long)]
        compact: bool,

        /// Font size in pixels
        #[arg(long)]
        font_size: Option<f64>,

        /// Font family
        #[arg(long)]
        font_family: Option<String>,

        /// Lane drawn with the trunk color (repeatable)
        #[arg(long = "trunk")]
        trunks: Vec<String>,

        /// Trunk lane color (#rrggbb, #rgb, or a color name)
        #[arg(long)]
        trunk_color: Option<Rgb>,

        /// Layout scale
        #[arg(long, default_value_t = 1.0, value_parser = positive)]
        scale: f64,

        /// Display zoom
        #[arg(long, default_value_t = 1.0, value_parser = positive)]
        zoom: f64,
    },
}

pub fn run(format: RenderFormat) -> Result<()> {
    match format {
        RenderFormat::Svg {
            input,
            output,
            base_url,
            compact,
            font_size,
            font_family,
            trunks,
            trunk_color,
            scale,
            zoom,
        } => {
            let options = RenderOptions {
                scale,
                zoom,
                style: compact.then_some(Style::Compact),
                base_url,
                font_size,
                font_family,
                trunks,
                trunk_color,
            };
            run_svg(input, output, &options)
        }
    }
}

fn positive(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("{:?} is not a number", s))?;
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("must be greater than 0, got {}", value))
    }
}

fn run_svg(input: Option<PathBuf>, output: Option<PathBuf>, options: &RenderOptions) -> Result<()> {
    let doc = read_doc(input.as_ref())?;
    let svg = revtree_svg::render(&doc, options).context("Failed to lay out revision tree")?;
    write_output(output, &svg)
}

fn write_output(output: Option<PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))
        }
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}
