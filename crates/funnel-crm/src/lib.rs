pub mod config;
pub mod error;
pub mod funnel;
pub mod prospects;
pub mod telemetry;
