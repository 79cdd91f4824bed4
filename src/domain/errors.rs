use thiserror::Error;

/// Failure to obtain a usable page from the upstream listing.
///
/// Both variants are handled the same way by the fetcher: the page is
/// skipped and pagination continues after a cooldown.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Transport failure on page {page}: {reason}")]
    Transport { page: u32, reason: String },

    #[error("Page {page} undecodable: {reason}")]
    Undecodable { page: u32, reason: String },
}

impl PageError {
    pub fn page(&self) -> u32 {
        match self {
            Self::Transport { page, .. } | Self::Undecodable { page, .. } => *page,
        }
    }
}

/// Errors that abort a single ingestion cycle.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Upstream returned no records; previous snapshot kept")]
    EmptySnapshot,

    #[error("Snapshot store write failed: {0:#}")]
    Store(#[source] anyhow::Error),
}
