pub mod backend;
pub mod store;

pub use backend::{BlobStore, MemoryBlobStore};
pub use store::{EntryStore, LoadReport, StoreError};
