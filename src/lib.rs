pub mod board;
pub mod config;
pub mod enrichment;
pub mod humanize;
pub mod input;
pub mod observability;
pub mod runner;
