pub mod analyzer;
pub mod cycles;

pub use analyzer::FunnelAnalyzer;
pub use cycles::has_cycle;
