pub mod board;
pub mod config;
pub mod forms;
pub mod hierarchy;
pub mod models;
pub mod progress;
pub mod store;
pub mod web;
