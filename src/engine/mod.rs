pub mod band;
pub mod metrics;
