//! Data models for expiry date extraction.

pub mod config;
pub mod expiry;
