pub mod config;
pub mod profile;

pub use config::*;
pub use profile::*;
