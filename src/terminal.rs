// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Abstracts the real terminal behind a trait, the same way the teacher's
//! `OutputDevice` abstracts stdout/stderr — so the render loop and the
//! "wait for a keypress" step can run against a recording double in tests.

use std::io;
use std::sync::{Arc, Mutex};

use crate::error::ClipResult;

pub trait Terminal: Send + Sync {
    fn size(&self) -> io::Result<(u16, u16)>;
    fn write_all(&self, bytes: &[u8]) -> io::Result<()>;
    fn read_one_byte(&self) -> io::Result<u8>;
    fn set_cursor_visible(&self, visible: bool) -> io::Result<()>;
}

/// The real terminal: raw mode stdin/stdout via `crossterm`.
pub struct CrosstermTerminal {
    stdout: Mutex<io::Stdout>,
}

impl CrosstermTerminal {
    pub fn new() -> ClipResult<Self> {
        crossterm::terminal::enable_raw_mode()
            .map_err(|source| crate::error::ClipError::Terminal { source })?;
        Ok(Self { stdout: Mutex::new(io::stdout()) })
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        use io::Write;
        let mut out = self.stdout.lock().unwrap();
        out.write_all(bytes)?;
        out.flush()
    }

    fn read_one_byte(&self) -> io::Result<u8> {
        use io::Read;
        let mut buf = [0u8; 1];
        io::stdin().read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn set_cursor_visible(&self, visible: bool) -> io::Result<()> {
        let seq = if visible {
            crate::ansi::AnsiSequenceGenerator::show_cursor()
        } else {
            crate::ansi::AnsiSequenceGenerator::hide_cursor()
        };
        self.write_all(seq.as_bytes())
    }
}

/// A fake terminal that records every write and can be fed canned input,
/// used by integration tests that exercise a full run without a real tty.
pub struct RecordingTerminal {
    written: Mutex<Vec<u8>>,
    width: u16,
    height: u16,
    input: Mutex<std::collections::VecDeque<u8>>,
}

impl RecordingTerminal {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let mut input = std::collections::VecDeque::new();
        input.push_back(b'\n');
        Self { written: Mutex::new(Vec::new()), width, height, input: Mutex::new(input) }
    }

    #[must_use]
    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.written.lock().unwrap()).into_owned()
    }
}

impl Terminal for RecordingTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        self.written.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }

    fn read_one_byte(&self) -> io::Result<u8> {
        self.input
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more canned input"))
    }

    fn set_cursor_visible(&self, _visible: bool) -> io::Result<()> {
        Ok(())
    }
}

#[must_use]
pub fn shared(terminal: impl Terminal + 'static) -> Arc<dyn Terminal> {
    Arc::new(terminal)
}
