use anyhow::{Context, Result, anyhow};
use revtree::v1::Document;
use std::io::Read;
use std::path::PathBuf;

/// Read a document from `path`, or from stdin when no path is given.
pub fn read_doc(path: Option<&PathBuf>) -> Result<Document> {
    match path {
        Some(path) => Document::load(path).map_err(|e| {
            if e.is_not_found() {
                anyhow!("No revision graph found at {:?}", path)
            } else {
                anyhow::Error::new(e).context(format!("Failed to load {:?}", path))
            }
        }),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            if content.trim().is_empty() {
                return Err(anyhow!("No revision graph found on stdin"));
            }
            Document::from_json(&content).context("Failed to parse stdin")
        }
    }
}
