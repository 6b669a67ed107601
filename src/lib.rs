pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod geo;
pub mod lookup;
pub mod map_widget;
pub mod models;
pub mod popup;
pub mod preferences;
pub mod registry;
pub mod template_engine;
pub mod theme;
pub mod utils;
pub mod view;
