//! Durable storage for the set of already-notified links.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use file::FileLinkStore;
pub use memory::MemoryLinkStore;
pub use traits::LinkStore;
