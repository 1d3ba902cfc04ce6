pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod feedback;
pub mod forms;
pub mod media;
pub mod models;
pub mod presentation;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
