// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The parsed, timeline-agnostic representation of a `.clip` script: a flat
//! sequence of [`ScriptElement`], each either a timestamp or a command.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
    /// Absolute offset from the scope's start, in milliseconds.
    AbsoluteMs(i64),
    /// Absolute offset expressed in beats (fractional beats allowed).
    AbsoluteBeat(f64),
    /// Absolute beat offset, plus a literal millisecond nudge.
    AbsoluteBeatPlusMs(f64, i64),
    /// Absolute beat offset, plus `numerator/denominator` of one beat.
    AbsoluteBeatPlusFraction(f64, i64, i64),
    /// Offset from the previous timestamp in this scope, in milliseconds.
    RelativeMs(i64),
    /// Offset from the previous timestamp in this scope, in beats.
    RelativeBeat(f64),
    /// Offset from the previous timestamp, in `numerator/denominator` beats.
    RelativeFractionBeat(i64, i64),
    /// A continuation line (`[>]` on the previous line): inherits the
    /// previous timestamp exactly, in both value and kind.
    Continuation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetBpm(f64),
    NewLine,
    ClearScreen,
    ClearScreenNoReset,
    /// 1-based row/column; converted to 0-based when it reaches the cursor.
    MoveAbsolute(i64, i64),
    MoveRelative(i64, i64),
    SetColor(u8, u8, u8),
    ClearColor,
    SetBackground(u8, u8, u8, u8),
    ClearBackground,
    SetStyle { bold: bool, italic: bool, underline: bool, strikethrough: bool },
    ClearStyle,
    PrintSpace(u32),
    PrintText(String),
    DefineAlias {
        name: String,
        raw_content: String,
    },
    DefineFunction {
        name: String,
        params: Vec<String>,
        raw_body_lines: Vec<String>,
        allow_override: bool,
    },
    CallFunction {
        name: String,
        args: Vec<String>,
    },
    CallCoroutine {
        name: String,
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptElement {
    Timestamp(Timestamp),
    Command(Command),
}

impl From<Command> for ScriptElement {
    fn from(command: Command) -> Self {
        ScriptElement::Command(command)
    }
}

/// Names that cannot be used for an alias, a function, or (transitively) a
/// call — they are the DSL's own keywords.
pub const RESERVED_NAMES: &[&str] = &[
    "bpm",
    "newline",
    "clear",
    "clearn",
    "mv",
    "color",
    "clearcolor",
    "background",
    "clearbackground",
    "style",
    "clearstyle",
    "space",
    "override",
];

#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}
