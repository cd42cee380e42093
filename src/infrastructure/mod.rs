//! Session store adapters.

pub mod file;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
