//! HTTP transport for the online-learning model server

pub mod api;
pub mod config;
