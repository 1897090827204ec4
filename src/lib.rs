// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A terminal kinetic-typography player: reads a bracket-delimited `.clip`
//! script, optionally syncs it to a background MP3, and renders the result
//! as ANSI escape sequences onto a double-buffered virtual screen.
//!
//! The pipeline is three stages, one module each:
//! [`script`] parses text into [`script::ScriptElement`]s, [`screen`] is the
//! virtual terminal those elements get painted onto, and [`engine`] is the
//! cooperative timeline that drives the two together.

pub mod ansi;
pub mod audio;
pub mod char_metrics;
pub mod color;
pub mod engine;
pub mod error;
pub mod log;
pub mod screen;
pub mod script;
pub mod style;
pub mod terminal;

pub use error::{ClipError, ClipResult};
