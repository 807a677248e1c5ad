pub mod config;
pub mod distribution;
pub mod error;
pub mod record;

pub use config::Config;
pub use distribution::*;
pub use error::*;
pub use record::*;
