//! Core library for astdiff.
//!
//! Parses source files of several languages into one generic tree model,
//! matches trees with the GumTree algorithm, derives Chawathe-style edit
//! scripts and turns them into similarity scores for every pair of files.

#![allow(
    clippy::similar_names,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module defining the generic tree model shared by all languages.
pub mod tree;

/// Module containing the language adapters that build generic trees.
pub mod lang;

/// Module containing tree matching and edit script generation.
pub mod diff;

/// Module for turning edit scripts into similarity scores.
pub mod scoring;

/// Module orchestrating pairwise comparison of a batch of files.
pub mod detector;

/// Module building match groups out of a finished batch.
pub mod report;

/// Module for loading configuration.
pub mod config;

/// Module containing shared constants.
pub mod constants;

/// Module containing utility functions.
pub mod utils;

/// Module defining the entry point logic shared by the binaries.
pub mod entry_point;

/// Module for log subscriber setup.
pub mod telemetry;

/// Module for rich CLI output formatting with colored text and progress bars.
pub mod output;

/// Module defining the command-line interface arguments and structs.
pub mod cli;
