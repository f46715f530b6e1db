//! Core translation session module

pub mod client;
pub mod config;
pub mod errors;
pub mod export;
pub mod host;
pub mod languages;
pub mod models;
pub mod session;
pub mod status;
pub mod storage;
