//! Core catalog client library (session, gateways, view-models, config).

pub mod api;
pub mod config;
pub mod models;
pub mod session;
pub mod views;
