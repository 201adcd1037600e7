//! Eden AI vision client.
//!
//! One client serves both collaborators: landmark detection (Google
//! provider by default) and object detection (Clarifai by default).

pub mod client;
pub mod types;

pub use client::{EdenAiClient, EdenAiConfig};
