//! Request handlers.

pub mod health;
pub mod site_detection;

pub use health::*;
pub use site_detection::*;
