//! Batch Image Analysis & Renaming Service
//!
//! This library provides the core functionality for the image-namer system:
//! an authenticated operator uploads batches of images, each image is
//! described by an external vision API (OpenAI gpt-4o or Perplexity sonar),
//! and the per-image reports with suggested filenames are persisted as
//! timestamped records with a 24-hour retention window.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
