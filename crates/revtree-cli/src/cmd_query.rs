use anyhow::{Context, Result, bail};
use clap::Subcommand;
use revtree::v1::{Document, Revision, Tree, query};
use serde::Serialize;
use std::path::PathBuf;

use crate::input::read_doc;

#[derive(Subcommand, Debug)]
pub enum QueryOp {
    /// Summarize each lane
    Lanes {
        /// Input file (reads stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// List every declared cross-lane action
    Actions {
        /// Input file (reads stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Only actions that are drawn
        #[arg(long)]
        drawn: bool,
    },
    /// Show where a revision is drawn
    Locate {
        /// Revision to locate
        rev: Revision,

        /// Input file (reads stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

pub fn run(op: QueryOp, pretty: bool) -> Result<()> {
    match op {
        QueryOp::Lanes { input } => run_lanes(input, pretty),
        QueryOp::Actions { input, drawn } => run_actions(input, drawn, pretty),
        QueryOp::Locate { rev, input } => run_locate(input, rev, pretty),
    }
}

fn build_tree(doc: &Document) -> Result<Tree> {
    let mut tree = Tree::from_document(doc).context("Invalid revision graph")?;
    tree.build(1.0);
    Ok(tree)
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn run_lanes(input: Option<PathBuf>, pretty: bool) -> Result<()> {
    let doc = read_doc(input.as_ref())?;
    let tree = build_tree(&doc)?;
    print_json(&query::summary(&tree), pretty)
}

fn run_actions(input: Option<PathBuf>, drawn: bool, pretty: bool) -> Result<()> {
    let doc = read_doc(input.as_ref())?;
    let tree = build_tree(&doc)?;
    let actions: Vec<_> = query::actions(&tree)
        .into_iter()
        .filter(|a| !drawn || a.drawn)
        .collect();
    print_json(&actions, pretty)
}

fn run_locate(input: Option<PathBuf>, rev: Revision, pretty: bool) -> Result<()> {
    let doc = read_doc(input.as_ref())?;
    let tree = build_tree(&doc)?;
    let Some(location) = query::locate(&tree, rev) else {
        bail!("Revision {} is not displayed", rev);
    };
    print_json(&location, pretty)
}
