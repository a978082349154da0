//! Employee records and headcount.

pub mod handlers;
pub mod models;
pub mod repo;
pub mod service;
