//! Application services: rendering, staging, hosting, and navigation mediation.

pub mod error;
pub mod host;
pub mod lifecycle;
pub mod navigation;
pub mod render;
pub mod staging;
pub mod surface;
