//! Foodgram Library
//!
//! Recipe sharing with favorites, subscriptions and shopping list export.

pub mod build_info;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod mcp;
pub mod models;
pub mod services;
pub mod shopping_list;
