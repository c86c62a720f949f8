//! Domain types shared by the host, the mediator, and surface implementations.

pub mod navigation;
pub mod options;
