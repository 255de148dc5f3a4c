pub mod config;
pub mod error;
pub mod filter;
pub mod job;

pub use config::Config;
pub use error::*;
pub use filter::FilterCriteria;
pub use job::*;
