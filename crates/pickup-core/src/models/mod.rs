//! Data models for pickup extraction.

pub mod config;
pub mod parcel;
pub mod rule;
