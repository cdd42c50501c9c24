pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod similarity;
