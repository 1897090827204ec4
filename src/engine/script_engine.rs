// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Drives a parsed script against a shared [`Screen`]: a pre-scan collects
//! every alias and function definition, then the remaining "main stream"
//! elements run on a single timeline that can fork into coroutine branches,
//! mirroring the teacher's [`crate::animator`]-style start/stop task model.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::ansi::AnsiSequenceGenerator;
use crate::audio::AudioSink;
use crate::error::{ClipError, ClipResult};
use crate::script::{
    parse, parse_line_content, substitute_params, AliasDef, Command, FunctionDef, ScriptElement,
    Timestamp,
};
use crate::screen::{Cursor, Screen};
use crate::terminal::Terminal;

use super::cancel::CancelFlag;
use super::render_loop;
use super::time::resolve_offset_ms;

const DEFAULT_BPM: f64 = 120.0;
/// How long the render loop keeps running after the main timeline finishes,
/// so the final frame's diff has a chance to reach the terminal.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(1000);

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The read-only, cheaply-cloneable part of the engine: what a coroutine
/// task needs to keep running after its parent scope has moved on.
#[derive(Clone)]
struct EngineCore {
    functions: Arc<HashMap<String, FunctionDef>>,
    aliases: Arc<HashMap<String, AliasDef>>,
    screen: Screen,
}

impl EngineCore {
    fn execute_scope<'a>(
        &'a self,
        elements: Vec<ScriptElement>,
        cursor: &'a mut Cursor,
        scope_start: Instant,
        parent_bpm: f64,
        cancel: &'a CancelFlag,
    ) -> BoxFuture<'a, ClipResult<()>> {
        Box::pin(async move {
            let mut current_bpm = parent_bpm;
            let mut last_offset_ms: i64 = 0;
            let mut children: Vec<JoinHandle<()>> = Vec::new();
            let mut error: Option<ClipError> = None;

            for element in elements {
                if cancel.is_cancelled() {
                    break;
                }
                match element {
                    ScriptElement::Timestamp(ts) => {
                        let target_ms = resolve_offset_ms(ts, current_bpm, last_offset_ms);
                        if !matches!(ts, Timestamp::Continuation) {
                            last_offset_ms = target_ms;
                        }
                        let target_instant =
                            scope_start + Duration::from_millis(target_ms.max(0) as u64);
                        let now = Instant::now();
                        if target_instant > now {
                            tokio::time::sleep(target_instant - now).await;
                        }
                    }
                    ScriptElement::Command(cmd) => {
                        if let Err(e) = self
                            .execute_command(
                                cmd,
                                cursor,
                                scope_start,
                                &mut current_bpm,
                                &mut last_offset_ms,
                                cancel,
                                &mut children,
                            )
                            .await
                        {
                            error = Some(e);
                            break;
                        }
                    }
                }
            }

            for handle in children {
                handle.abort();
                let _ = handle.await;
            }

            match error {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_command(
        &self,
        cmd: Command,
        cursor: &mut Cursor,
        scope_start: Instant,
        current_bpm: &mut f64,
        last_offset_ms: &mut i64,
        cancel: &CancelFlag,
        children: &mut Vec<JoinHandle<()>>,
    ) -> ClipResult<()> {
        match cmd {
            Command::SetBpm(bpm) => *current_bpm = bpm,
            Command::NewLine => cursor.new_line(),
            Command::ClearScreen => {
                self.screen.clear_screen();
                cursor.reset_style();
            }
            Command::ClearScreenNoReset => self.screen.clear_screen(),
            Command::MoveAbsolute(row, col) => cursor.move_to(row - 1, col - 1),
            Command::MoveRelative(d_row, d_col) => cursor.move_relative(d_row, d_col),
            Command::SetColor(r, g, b) => cursor.fg = Some(crate::color::Rgb { r, g, b }),
            Command::ClearColor => cursor.fg = None,
            Command::SetBackground(r, g, b, a) => cursor.bg = Some(crate::color::Rgba { r, g, b, a }),
            Command::ClearBackground => cursor.bg = None,
            Command::SetStyle { bold, italic, underline, strikethrough } => {
                cursor.style = crate::style::StyleFlags { bold, italic, underline, strikethrough };
            }
            Command::ClearStyle => cursor.style = crate::style::StyleFlags::default(),
            Command::PrintSpace(n) => cursor.print_text(&" ".repeat(n as usize)),
            Command::PrintText(text) => cursor.print_text(&text),
            Command::DefineAlias { .. } | Command::DefineFunction { .. } => {
                // Definitions are inert once pre-scanned; encountering one
                // mid-stream (e.g. inside a function body) is a no-op.
            }
            Command::CallFunction { name, args } => {
                self.call_named(&name, &args, cursor, scope_start, *current_bpm, *last_offset_ms, cancel)
                    .await?;
            }
            Command::CallCoroutine { name, args } => {
                self.spawn_coroutine(&name, &args, cursor, scope_start, *current_bpm, *last_offset_ms, children);
            }
        }
        Ok(())
    }

    async fn call_named(
        &self,
        name: &str,
        args: &[String],
        cursor: &mut Cursor,
        scope_start: Instant,
        bpm: f64,
        last_offset_ms: i64,
        cancel: &CancelFlag,
    ) -> ClipResult<()> {
        let rebased_start = scope_start + Duration::from_millis(last_offset_ms.max(0) as u64);

        if let Some(alias) = self.aliases.get(name) {
            let wrapped = format!("[{}]", alias.raw_content);
            let resolved = parse_line_content(&wrapped)?;
            return self.execute_scope(resolved, cursor, rebased_start, bpm, cancel).await;
        }

        if let Some(func) = self.functions.get(name).cloned() {
            let resolved = expand_function(&func, args)?;
            return self.execute_scope(resolved, cursor, rebased_start, bpm, cancel).await;
        }

        tracing::trace!(name, "call to unknown function/alias; printing literal fallback");
        cursor.print_text(&format!("[{name}]"));
        Ok(())
    }

    fn spawn_coroutine(
        &self,
        name: &str,
        args: &[String],
        cursor: &Cursor,
        scope_start: Instant,
        bpm: f64,
        last_offset_ms: i64,
        children: &mut Vec<JoinHandle<()>>,
    ) {
        let Some(func) = self.functions.get(name).cloned() else {
            tracing::trace!(name, "coroutine call names an unknown function; ignored");
            return;
        };

        let resolved = match expand_function(&func, args) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(name, error = %e, "coroutine body failed to parse; ignored");
                return;
            }
        };

        let mut sub_cursor = cursor.clone_as(false, func.allow_override);
        let rebased_start = scope_start + Duration::from_millis(last_offset_ms.max(0) as u64);
        let core = self.clone();
        let cancel = CancelFlag::new();

        let handle = tokio::spawn(async move {
            let _ = core.execute_scope(resolved, &mut sub_cursor, rebased_start, bpm, &cancel).await;
        });
        children.push(handle);
    }
}

fn expand_function(func: &FunctionDef, args: &[String]) -> ClipResult<Vec<ScriptElement>> {
    let substituted: Vec<String> = func
        .raw_body_lines
        .iter()
        .map(|line| substitute_params(line, &func.params, args))
        .collect();
    parse(&substituted)
}

/// Top-level driver: owns the terminal and the optional audio track, and
/// runs the full render-loop + timeline lifecycle described by the script.
pub struct ScriptEngine {
    core: EngineCore,
    terminal: Arc<dyn Terminal>,
    audio: Box<dyn AudioSink>,
    main_elements: Vec<ScriptElement>,
}

impl ScriptEngine {
    /// Pre-scans `elements` for alias/function definitions and retains the
    /// rest as the main stream, per the script's declaration order.
    #[must_use]
    pub fn new(
        elements: Vec<ScriptElement>,
        screen: Screen,
        terminal: Arc<dyn Terminal>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        let mut functions = HashMap::new();
        let mut aliases = HashMap::new();
        let mut main_elements = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                ScriptElement::Command(Command::DefineFunction { name, params, raw_body_lines, allow_override }) => {
                    functions.insert(name.clone(), FunctionDef { name, params, raw_body_lines, allow_override });
                }
                ScriptElement::Command(Command::DefineAlias { name, raw_content }) => {
                    aliases.insert(name.clone(), AliasDef { name, raw_content });
                }
                other => main_elements.push(other),
            }
        }

        Self {
            core: EngineCore { functions: Arc::new(functions), aliases: Arc::new(aliases), screen },
            terminal,
            audio,
            main_elements,
        }
    }

    /// Waits for a keypress, then runs the main timeline to completion (or
    /// until it errors out), tearing down the render loop and audio
    /// playback gracefully either way.
    pub async fn run(self) -> ClipResult<()> {
        let ScriptEngine { core, terminal, audio, main_elements } = self;

        let render_error: Arc<StdMutex<Option<std::io::Error>>> = Arc::new(StdMutex::new(None));
        let render_handle = render_loop::spawn(core.screen.clone(), terminal.clone(), render_error.clone());

        let wait_terminal = terminal.clone();
        let wait_result = tokio::task::spawn_blocking(move || wait_terminal.read_one_byte()).await;

        let mut run_result = wait_result
            .map_err(|join_error| ClipError::runtime(format!("keypress wait task failed: {join_error}")))
            .map(|_| ());

        if run_result.is_ok() {
            core.screen.clear_screen();
            audio.play();
            let start = Instant::now();

            let cancel = CancelFlag::new();
            let mut main_cursor = Cursor::new(core.screen.clone(), true, true);
            run_result =
                core.execute_scope(main_elements, &mut main_cursor, start, DEFAULT_BPM, &cancel).await;
            if run_result.is_err() {
                cancel.cancel();
            }
        }

        tokio::time::sleep(SHUTDOWN_GRACE).await;
        audio.stop();
        render_handle.abort();
        let _ = render_handle.await;

        let last_row = core.screen.height().saturating_sub(1);
        let _ = terminal.write_all(AnsiSequenceGenerator::cursor_position(last_row, 0).as_bytes());
        let _ = terminal.write_all(AnsiSequenceGenerator::show_cursor().as_bytes());

        if let Some(source) = render_error.lock().unwrap().take() {
            return Err(ClipError::Terminal { source });
        }
        run_result
    }
}
