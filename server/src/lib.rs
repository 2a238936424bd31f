pub mod config;
pub mod context;
pub mod filters;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod validation;
