// Library target shared by the `bandr` binary, the integration tests and the
// criterion benchmarks. The binary entry point is main.rs.

pub mod app;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod event;
pub mod exam;
pub mod logging;
pub mod session;
pub mod ui;
