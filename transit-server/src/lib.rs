//! Transit feed server.
//!
//! Loads the routes, stops, trips and stop times of a GTFS feed into
//! memory, answers questions such as "which routes call at this stop?" and
//! "which trip comes next?", and writes edited tables back out.

pub mod config;
pub mod feed;
pub mod store;
pub mod web;
