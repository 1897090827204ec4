// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use clip_player::audio::NullAudioSink;
use clip_player::engine::ScriptEngine;
use clip_player::screen::Screen;
use clip_player::script::parse;
use clip_player::terminal::RecordingTerminal;

async fn run_script(source: &str, width: u16, height: u16) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let elements = parse(&lines).expect("script should parse");

    let screen = Screen::new(width as usize, height as usize);
    let terminal = Arc::new(RecordingTerminal::new(width, height));
    let engine = ScriptEngine::new(elements, screen, terminal.clone(), Box::new(NullAudioSink));

    tokio::time::timeout(Duration::from_secs(5), engine.run())
        .await
        .expect("script should finish well within the timeout")
        .expect("script should run without error");

    terminal.written_string()
}

#[tokio::test]
async fn prints_plain_text_at_the_origin() {
    let output = run_script("[0b]hello", 80, 24).await;
    assert!(output.contains("hello"));
    assert!(output.contains("\x1b[1;1H"));
}

#[tokio::test]
async fn relative_timestamps_advance_from_the_last_absolute_one() {
    // Two beats at 120 bpm without a sleep-dependent assertion: we only
    // check that both pieces of text eventually reach the terminal.
    let output = run_script("[bpm 120]\n[0b]a\n[+1b]b", 80, 24).await;
    assert!(output.contains('a'));
    assert!(output.contains('b'));
}

#[tokio::test]
async fn function_call_expands_and_substitutes_parameters() {
    let script = "[#greet name]\n[<][0b]hi [name]\n[0b][greet world]";
    let output = run_script(script, 80, 24).await;
    // Whitespace outside brackets is not preserved, so "hi [name]" collapses
    // to "hiworld" once the parameter is substituted and re-tokenized.
    assert!(output.contains("hiworld"));
}

#[tokio::test]
async fn alias_expands_to_a_full_bracket_command() {
    let script = "[@red color #ff0000]\n[0b][red]X";
    let output = run_script(script, 80, 24).await;
    assert!(output.contains("38;2;255;0;0"));
    assert!(output.contains('X'));
}

#[tokio::test]
async fn coroutine_branch_runs_alongside_the_main_timeline() {
    // The coroutine moves to a different row before printing so its write
    // never contends with the main timeline's cell.
    let script = "[#blip]\n[<][0b][mv 2,1]Y\n[0b][++blip]main";
    let output = run_script(script, 80, 24).await;
    assert!(output.contains("main"));
    assert!(output.contains('Y'));
}

#[tokio::test]
async fn unknown_function_call_prints_literal_fallback() {
    let output = run_script("[0b][nosuchfunction]", 80, 24).await;
    assert!(output.contains("[nosuchfunction]"));
}

#[tokio::test]
async fn clear_screen_resets_style_and_color() {
    let script = "[0b][color #00ff00]a[clear]b";
    let output = run_script(script, 80, 24).await;
    assert!(output.contains('b'));
}

#[tokio::test]
async fn wide_characters_render_as_a_single_code_point() {
    let output = run_script("[0b]一二", 80, 24).await;
    assert_eq!(output.matches('一').count(), 1);
    assert_eq!(output.matches('二').count(), 1);
}
