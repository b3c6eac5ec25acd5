//! Presentation layer: fragment templates and rendering helpers.

pub mod views;
