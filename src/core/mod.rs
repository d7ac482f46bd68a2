// src/core/mod.rs
//! Infrastructure shared by the editing session and the skills cache

pub mod config_manager;
pub mod database;
pub mod fs_ops;
pub mod kv_store;
pub mod service_client;

pub use config_manager::ConfigManager;
pub use database::Database;
pub use fs_ops::FsOps;
pub use kv_store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use service_client::ServiceClient;
