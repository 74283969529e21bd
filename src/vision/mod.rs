//! Google Cloud Vision API によるOCR

mod auth;
mod client;

pub use auth::ServiceAccountCredentials;
pub use client::VisionClient;
