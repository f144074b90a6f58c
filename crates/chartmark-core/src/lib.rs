//! Core chartmark library (markup transformer, chart hydration, rendering, config).

pub mod config;
pub mod html;
pub mod hydrate;
pub mod markup;
pub mod turn;
