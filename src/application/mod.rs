// Ingestion cycle: paginated fetch, snapshot replace, cache mirror
pub mod ingestion;

// Periodic, non-overlapping cycle trigger
pub mod scheduler;

// One-shot single page export
pub mod export;
