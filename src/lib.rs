pub mod cache;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod remote;
pub mod routes;
pub mod services;
pub mod state;
