mod camera;
mod detector;
mod draw;

pub mod app;
pub mod compliance;
pub mod config;
pub mod detection;
pub mod geometry;
pub mod labels;
pub mod sampling;

pub use app::start_app;
