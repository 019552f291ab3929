mod api;
mod config;
mod error;
mod rule;

pub use api::*;
pub use config::*;
pub use error::*;
pub use rule::*;
