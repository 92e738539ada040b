//! Core business logic for safenet.

pub mod services;

pub use services::*;
