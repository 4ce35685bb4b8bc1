//! Read-only HTTP API over baseball player biographical records, kept in
//! sync with a CSV snapshot.

pub mod config;
pub mod db;
pub mod error;
pub mod hasher;
pub mod models;
pub mod parser;
pub mod reconcile;
pub mod retry;
pub mod routes;
