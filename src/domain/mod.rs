// Coin listing types and normalization
pub mod coin;

// Domain-specific error types
pub mod errors;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;
