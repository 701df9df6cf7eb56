pub mod config;
pub mod logging;

pub mod api;
pub mod assets;
pub mod batch;
pub mod cache;
pub mod catalog;
pub mod details;
pub mod maintenance;
pub mod model;
pub mod partition;
pub mod storage;
