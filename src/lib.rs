//! Helpers for A/B-test style analysis of content-viewing records.
//!
//! Load a [`data::model::Dataset`] from a file or a PostgreSQL query, label
//! viewings as complete or incomplete, partition by a group field and run the
//! appropriate hypothesis tests. Every test returns a structured
//! [`stats::TestVerdict`]; [`report`] turns verdicts into text.

pub mod config;
pub mod data;
pub mod db;
pub mod report;
pub mod stats;
