//! Leads, opportunities and the sales pipeline.

pub mod csv;
pub mod handlers;
pub mod models;
pub mod repo;
pub mod service;
