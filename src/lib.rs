//! A single-screen terminal map: drop numbered pins by typing coordinates,
//! get driving directions from where you are to any of them, and clear
//! everything in one go.

pub mod app;
pub mod config;
pub mod controller;
pub mod directions;
pub mod error;
pub mod events;
pub mod geo;
pub mod location;
pub mod logging;
pub mod map;
pub mod models;
pub mod state;
pub mod ui;
