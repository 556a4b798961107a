#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod keys;
pub mod mirror;
pub mod report;
pub mod storage;
pub mod unit;
pub mod upload;
pub mod walk;

mod format;
mod logger;
mod stats;
mod task;

#[cfg(test)]
mod testing;

pub use stats::CommandStats;
