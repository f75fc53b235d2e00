pub mod app;
pub mod cli;
pub mod client;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod recorder;
pub mod runner;
pub mod storage;
