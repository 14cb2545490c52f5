//! Utilities shared across wya? components.

#![warn(clippy::pedantic)]

/// Module for JWT header parsing and claim timing checks
pub mod jwt;
