pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod storage;
pub mod store;
pub mod task_api;
