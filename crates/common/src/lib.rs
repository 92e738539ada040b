//! Common utilities and shared types for safenet.
//!
//! This crate provides foundational components used across all safenet crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Tokens**: Tracking codes and session tokens via [`IdGenerator`]
//! - **Hashing**: Keyed client-address hashing via [`IpHasher`]
//! - **Storage**: Attachment storage backends
//!
//! # Example
//!
//! ```no_run
//! use safenet_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let code = id_gen.generate_tracking_code();
//!     println!("{} issued tracking code {}", config.server.url, code);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use crypto::IpHasher;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{
    LocalStorage, StorageBackend, StoredFile, file_extension, generate_storage_key,
    sanitize_filename,
};
