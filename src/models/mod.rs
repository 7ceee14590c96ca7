pub mod catalog;
pub mod company;
pub mod price_matrix;

// Re-exports for convenience
pub use catalog::*;
pub use company::*;
pub use price_matrix::*;
