pub mod api;
pub mod bot;
pub mod config;
pub mod db;
pub mod due;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod telegram;
pub mod wizard;
