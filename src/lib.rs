//! Terminal editor for georeferenced shapes drawn over a web-mercator tile raster.

pub mod app;
pub mod braille;
pub mod config;
pub mod error;
pub mod map;
pub mod persist;
pub mod selection;
pub mod shapes;
pub mod ui;
