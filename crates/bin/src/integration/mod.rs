//! Integration module for the sort pipeline.
//!
//! This module resolves the research database location and drives the
//! per-variable sorts with progress reporting.

pub(crate) mod db_manager;
pub(crate) mod pipeline;
