//! Core types and definitions for the SKYWARD wave engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, level data, path segments, events, errors and constants.
//! It has no dependency on the scheduler or any host framework.

pub mod components;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod path;
pub mod types;
