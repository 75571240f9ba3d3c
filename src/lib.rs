pub mod config;
pub mod credentials;
pub mod duration;
pub mod harvest;
pub mod models;
pub mod summary;
