// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Structured logging setup. A rolling file sink under the platform cache
//! directory is always installed; `--verbose` additionally mirrors events
//! to stderr, since by default nothing should touch the alternate screen
//! the player is drawing into.

use tracing_subscriber::prelude::*;

/// Installs the global `tracing` subscriber and returns the file-writer
/// guard; the caller must keep it alive for the duration of `main`.
pub fn init(verbose: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("clip_player");
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::never(&log_dir, "clip_player.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::INFO);

    let registry = tracing_subscriber::registry().with(file_layer);

    if verbose {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);
        registry.with(stderr_layer).init();
    } else {
        registry.init();
    }

    guard
}
