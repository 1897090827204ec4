// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Stateless generator for the ANSI sequences the screen diff emits.
//!
//! Mirrors the teacher's `AnsiSequenceGenerator`: one struct, only
//! associated functions, no raw `format!("\x1b[...")` calls anywhere else
//! in the crate.

use super::constants;
use crate::color::{Rgb, Rgba};

#[derive(Debug)]
pub struct AnsiSequenceGenerator;

impl AnsiSequenceGenerator {
    /// Absolute cursor position. `row`/`col` are 0-based; the wire format is 1-based.
    #[must_use]
    pub fn cursor_position(row: usize, col: usize) -> String {
        format!("\x1b[{};{}H", row + 1, col + 1)
    }

    #[must_use]
    pub fn fg_color(color: Option<Rgb>) -> String {
        match color {
            Some(rgb) => format!("\x1b[38;2;{};{};{}m", rgb.r, rgb.g, rgb.b),
            None => constants::FG_RESET.to_string(),
        }
    }

    #[must_use]
    pub fn bg_color(color: Option<Rgba>) -> String {
        match color {
            Some(rgba) => format!("\x1b[48;2;{};{};{}m", rgba.r, rgba.g, rgba.b),
            None => constants::BG_RESET.to_string(),
        }
    }

    #[must_use]
    pub fn toggle_bold(on: bool) -> &'static str {
        if on { constants::SGR_BOLD_ON } else { constants::SGR_BOLD_OFF }
    }

    #[must_use]
    pub fn toggle_italic(on: bool) -> &'static str {
        if on { constants::SGR_ITALIC_ON } else { constants::SGR_ITALIC_OFF }
    }

    #[must_use]
    pub fn toggle_underline(on: bool) -> &'static str {
        if on { constants::SGR_UNDERLINE_ON } else { constants::SGR_UNDERLINE_OFF }
    }

    #[must_use]
    pub fn toggle_strikethrough(on: bool) -> &'static str {
        if on { constants::SGR_STRIKETHROUGH_ON } else { constants::SGR_STRIKETHROUGH_OFF }
    }

    #[must_use]
    pub fn reset() -> &'static str {
        constants::SGR_RESET
    }

    #[must_use]
    pub fn clear_screen() -> &'static str {
        constants::ERASE_DISPLAY_ALL
    }

    #[must_use]
    pub fn show_cursor() -> &'static str {
        constants::SHOW_CURSOR
    }

    #[must_use]
    pub fn hide_cursor() -> &'static str {
        constants::HIDE_CURSOR
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cursor_position_is_one_based() {
        assert_eq!(AnsiSequenceGenerator::cursor_position(0, 0), "\x1b[1;1H");
        assert_eq!(AnsiSequenceGenerator::cursor_position(4, 9), "\x1b[5;10H");
    }

    #[test]
    fn fg_color_none_resets() {
        assert_eq!(AnsiSequenceGenerator::fg_color(None), "\x1b[39m");
    }

    #[test]
    fn fg_color_some_emits_truecolor() {
        assert_eq!(
            AnsiSequenceGenerator::fg_color(Some(Rgb { r: 255, g: 0, b: 128 })),
            "\x1b[38;2;255;0;128m"
        );
    }
}
