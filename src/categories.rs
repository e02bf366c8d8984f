//! Category label map for the classifier output

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Maps classifier output row indices to human-readable category names.
///
/// The source file has one category per line, name first, optionally followed
/// by the numeric class index. Only the name column is consumed; when an index
/// column is present it must match the line's position.
pub struct CategoryMap {
    names: Vec<String>,
}

impl CategoryMap {
    /// Load the category map from a text file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read category file {}", path.display()))?;
        let map = Self::parse(&text)
            .with_context(|| format!("malformed category file {}", path.display()))?;
        info!(path = %path.display(), categories = map.len(), "Category map loaded");
        Ok(map)
    }

    fn parse(text: &str) -> Result<Self> {
        let mut names = Vec::new();

        for (lineno, line) in text.lines().enumerate() {
            let mut columns = line.split_whitespace();
            let Some(name) = columns.next() else {
                continue;
            };
            if let Some(index) = columns.next() {
                let index: usize = index
                    .parse()
                    .with_context(|| format!("invalid class index on line {}", lineno + 1))?;
                if index != names.len() {
                    bail!(
                        "class index {} on line {} is out of order (expected {})",
                        index,
                        lineno + 1,
                        names.len()
                    );
                }
            }
            names.push(name.to_string());
        }

        if names.is_empty() {
            bail!("no categories found");
        }

        Ok(Self { names })
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for a class index, if in range
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
}
