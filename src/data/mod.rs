// Dataset I/O: document store, seed words, and where they live on disk.

pub mod paths;
pub mod seeds;
pub mod store;
