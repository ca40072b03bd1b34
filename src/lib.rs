pub mod artifact;
pub mod error;
pub mod geometry;
pub mod plugin;
pub mod session;
pub mod types;
pub mod units;
pub mod utils;

pub use plugin::MeasurePlugin;
