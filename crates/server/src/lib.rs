//! HTTP front end for the iris classifier

pub mod api;
pub mod config;
