//! Filter implementations and the filter modes users can pick.

pub mod highly_rated;
pub mod mode;

// Re-export for convenience
pub use highly_rated::HighlyRatedFilter;
pub use mode::FilterMode;
