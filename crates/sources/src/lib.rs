//! Job posting sources.
//!
//! Each source produces postings from one origin behind the [`JobSource`]
//! trait. Sources fail independently; callers decide how to isolate them.

pub mod google;
pub mod traits;
pub mod validating;

pub use google::GoogleSearchSource;
pub use traits::{JobSource, SourceError};
pub use validating::ValidatingSource;
