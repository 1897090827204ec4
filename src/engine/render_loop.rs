// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The detached task that repeatedly diffs the [`Screen`] and writes the
//! result to the real terminal, independent of however many script
//! coroutines are currently mutating the screen.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::ansi::AnsiSequenceGenerator;
use crate::screen::Screen;
use crate::terminal::Terminal;

const TARGET_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Spawns the render loop. Any terminal write error is recorded into
/// `error_slot` and ends the loop; the caller is responsible for checking
/// it after the task is aborted or returns.
pub fn spawn(
    screen: Screen,
    terminal: Arc<dyn Terminal>,
    error_slot: Arc<StdMutex<Option<std::io::Error>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(source) = terminal.write_all(AnsiSequenceGenerator::hide_cursor().as_bytes()) {
            tracing::warn!(error = %source, "render loop: failed to hide cursor on first frame");
            *error_slot.lock().unwrap() = Some(source);
            return;
        }
        loop {
            let frame_start = Instant::now();
            let diff = screen.generate_diff_and_swap();
            if !diff.is_empty() {
                if let Err(source) = terminal.write_all(diff.as_bytes()) {
                    tracing::warn!(error = %source, "render loop: terminal write failed, stopping");
                    *error_slot.lock().unwrap() = Some(source);
                    break;
                }
            }
            let elapsed = frame_start.elapsed();
            let sleep_for = TARGET_FRAME_INTERVAL
                .checked_sub(elapsed)
                .unwrap_or(Duration::from_millis(1));
            tokio::time::sleep(sleep_for).await;
        }
    })
}
