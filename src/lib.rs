//! Filter-and-aggregate core of the SBB delay dashboard.
//!
//! Load the delay dataset once with [`data::loader::load_file`], then run
//! [`data::pipeline::DashboardAggregates::run`] whenever a filter changes.

pub mod config;
pub mod data;
