pub mod config;
pub mod error;
pub mod interaction;
pub mod layer;
pub mod map;
pub mod models;
pub mod panel;
pub mod proj;
pub mod tile;
pub mod view;
