//! Terminal client for an ML training backend: a configuration editor and a
//! live system monitor with a log viewer.

pub mod cli;
pub mod client;
pub mod dashboard;
pub mod diagnostics;
pub mod editor;
pub mod feed;
pub mod notice;
pub mod render;
pub mod settings;
