//! Frontend System Design: curriculum content store, rich-text renderer,
//! animation spec validation and an offline-caching proxy.

pub mod animation;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod offline;
pub mod render;
pub mod site;
