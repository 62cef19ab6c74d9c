// Flowboard — Terminal workspace for AI/human workflows
// License: Apache-2.0

pub mod api;
pub mod config;
pub mod editor;
pub mod list;
pub mod logger;
pub mod model;
pub mod nav;
pub mod tui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
