// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;

use clip_player::engine::ScriptEngine;
use clip_player::error::{ClipError, ClipResult};
use clip_player::log;
use clip_player::screen::Screen;
use clip_player::script::parse;
use clip_player::terminal::CrosstermTerminal;
use clip_player::{audio, terminal};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "clip-player", about = "Play a bracket-delimited kinetic typography script")]
struct CliArgs {
    /// Path to the `.clip` script to run.
    script_path: PathBuf,

    /// Background MP3 to play alongside the script.
    #[arg(short = 'm', long = "music")]
    music: Option<PathBuf>,

    /// Mirror log events to stderr in addition to the log file.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main_impl() -> ClipResult<()> {
    let args = CliArgs::parse();
    let _guard = log::init(args.verbose);

    let script_text = std::fs::read_to_string(&args.script_path).map_err(|source| ClipError::Io {
        path: args.script_path.clone(),
        source,
    })?;
    let lines: Vec<&str> = script_text.lines().collect();
    let elements = parse(&lines)?;

    let raw_terminal = CrosstermTerminal::new()?;
    let (width, height) = raw_terminal.size().map_err(|source| ClipError::Terminal { source })?;
    let terminal: Arc<dyn clip_player::terminal::Terminal> = terminal::shared(raw_terminal);

    let screen = Screen::new(width as usize, height as usize);
    let audio_sink = audio::build(args.music.as_deref());

    let engine = ScriptEngine::new(elements, screen, terminal, audio_sink);
    engine.run().await
}

fn main() {
    if let Err(error) = main_impl() {
        println!("\x1b[31mclip-player: {error:?}\x1b[0m");
        std::process::exit(1);
    }
}
