pub mod db;
pub mod image;
pub mod models;
pub mod service;
pub mod state;
pub mod store;
pub mod validation;
