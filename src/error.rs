// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A single diagnostic error type for the whole crate.
//!
//! Parse, IO, terminal, and internal runtime failures all produce a
//! [`ClipError`]; audio faults and missing-function lookups never do — those
//! are design choices, not faults, and are handled locally where they occur.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ClipError {
    #[error("parse error at line {line}: {message}")]
    #[diagnostic(code(clip_player::parse))]
    Parse { line: usize, message: String },

    #[error("failed to read {path}")]
    #[diagnostic(code(clip_player::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("terminal write failed")]
    #[diagnostic(code(clip_player::terminal))]
    Terminal {
        #[source]
        source: std::io::Error,
    },

    /// Internal faults that aren't a parse/IO/terminal problem, e.g. a
    /// supporting task panicking instead of returning normally. Never raised
    /// for the "missing function/coroutine" runtime cases, which are
    /// swallowed and logged at the call site instead.
    #[error("internal runtime fault: {message}")]
    #[diagnostic(code(clip_player::runtime))]
    Runtime { message: String },
}

pub type ClipResult<T> = Result<T, ClipError>;

impl ClipError {
    #[must_use]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, message: message.into() }
    }

    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime { message: message.into() }
    }
}
