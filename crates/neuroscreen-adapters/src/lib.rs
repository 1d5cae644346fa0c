//! NeuroScreen Adapters - External adapters for neuroscreen.
//!
//! This crate provides adapters for:
//! - Upload storage and input discovery on the filesystem
//! - The model file registry
//! - The Gemini chat API

pub mod fs;
pub mod gemini;
pub mod models;

pub use fs::{FsImageSource, UploadDir};
pub use gemini::GeminiChat;
pub use models::{model_path, models_dir, ModelOverrides};
