pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod prompt;
pub mod scanner;
pub mod worker;
