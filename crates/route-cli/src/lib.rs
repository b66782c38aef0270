//! Command-line front end for route resolution.

pub mod config;
pub mod navdata;
pub mod render;

pub use config::Config;
pub use navdata::{LoadedNavdata, Navdata};
pub use render::{render_json, render_text};
