//! Infrastructure adapters: asset bundles, surfaces, platform openers, and runtime bootstrap.

pub mod assets;
pub mod error;
pub mod headless;
pub(crate) mod lock;
pub mod opener;
pub mod telemetry;
pub mod termination;
