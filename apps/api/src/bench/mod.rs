//! Bench resources awaiting allocation, matched against open requisitions.

pub mod handlers;
pub mod models;
pub mod repo;
pub mod service;
