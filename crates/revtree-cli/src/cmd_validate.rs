use anyhow::{Context, Result};
use revtree::v1::Tree;
use std::path::PathBuf;

use crate::input::read_doc;

pub fn run(input: PathBuf) -> Result<()> {
    let doc = read_doc(Some(&input))?;
    let tree =
        Tree::from_document(&doc).with_context(|| format!("Invalid revision graph {:?}", input))?;
    println!(
        "Valid: {} lanes, {} changesets",
        tree.branches().len(),
        tree.changeset_count()
    );
    Ok(())
}
