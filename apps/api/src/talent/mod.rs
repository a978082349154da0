//! Requisitions, candidates and candidate/requisition matching.

pub mod handlers;
pub mod models;
pub mod repo;
pub mod service;
