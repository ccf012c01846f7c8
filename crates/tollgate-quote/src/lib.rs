//! # tollgate-quote
//!
//! An in-memory store of text quotes, the example payload served behind the
//! proof-of-work gate. Quotes are loaded from raw text buffers split on a
//! separator byte; empty lines are dropped.

use std::path::Path;

use rand::Rng;
use tracing::debug;

/// Error types for the quote store.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    /// A random quote was requested from an empty store.
    #[error("the quote store is empty")]
    Empty,

    /// A data file could not be read.
    #[error("failed to read quotes from {path:?}: {source}")]
    DataFile {
        /// The offending file.
        path: std::path::PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for quote operations.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// Uniform index selection, injectable so tests stay deterministic.
pub trait IndexRng {
    /// A uniform draw from `[0, bound)`; `bound` is always positive.
    fn pick(&mut self, bound: usize) -> usize;
}

impl IndexRng for rand::rngs::ThreadRng {
    fn pick(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

/// The in-memory quote store.
#[derive(Debug, Default)]
pub struct QuoteStore {
    quotes: Vec<String>,
}

impl QuoteStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `data` on `separator` and keep every non-empty trimmed line.
    pub fn load_from_text(&mut self, data: &[u8], separator: u8) {
        let before = self.quotes.len();
        for raw in data.split(|&byte| byte == separator) {
            let line = String::from_utf8_lossy(raw);
            let line = line.trim();
            if !line.is_empty() {
                self.quotes.push(line.to_string());
            }
        }
        debug!(
            added = self.quotes.len() - before,
            total = self.quotes.len(),
            "loaded quotes"
        );
    }

    /// Read every regular file directly inside `dir` and load its lines.
    /// Subdirectories are skipped.
    pub fn load_from_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = std::fs::read_dir(dir).map_err(|source| QuoteError::DataFile {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| QuoteError::DataFile {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let data = std::fs::read(&path).map_err(|source| QuoteError::DataFile {
                path: path.clone(),
                source,
            })?;
            self.load_from_text(&data, b'\n');
        }
        Ok(())
    }

    /// How many quotes are loaded.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the store holds no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// A uniformly random quote drawn with the given selector.
    pub fn random_quote_with(&self, rng: &mut impl IndexRng) -> Result<&str> {
        if self.quotes.is_empty() {
            return Err(QuoteError::Empty);
        }
        Ok(&self.quotes[rng.pick(self.quotes.len())])
    }

    /// A uniformly random quote from the thread-local generator.
    pub fn random_quote(&self) -> Result<&str> {
        self.random_quote_with(&mut rand::thread_rng())
    }
}
