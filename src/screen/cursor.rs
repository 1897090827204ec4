// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A cursor is a position plus a pen (color, background, style) that writes
//! into a shared [`Screen`]. The main timeline owns one; every coroutine
//! branch gets its own clone.

use crate::color::{Rgb, Rgba};
use crate::style::StyleFlags;

use super::grid::Screen;

#[derive(Clone)]
pub struct Cursor {
    screen: Screen,
    pub row: i64,
    pub col: i64,
    pub fg: Option<Rgb>,
    pub bg: Option<Rgba>,
    pub style: StyleFlags,
    pub is_main: bool,
    pub can_override: bool,
}

impl Cursor {
    #[must_use]
    pub fn new(screen: Screen, is_main: bool, can_override: bool) -> Self {
        Self {
            screen,
            row: 0,
            col: 0,
            fg: None,
            bg: None,
            style: StyleFlags::default(),
            is_main,
            can_override,
        }
    }

    /// Clones this cursor's position and pen for a coroutine branch, with
    /// its own main/override permissions.
    #[must_use]
    pub fn clone_as(&self, is_main: bool, can_override: bool) -> Self {
        Self {
            screen: self.screen.clone(),
            row: self.row,
            col: self.col,
            fg: self.fg,
            bg: self.bg,
            style: self.style,
            is_main,
            can_override,
        }
    }

    pub fn print_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.new_line();
                continue;
            }
            let advance = self.screen.write(
                self.row, self.col, ch, self.fg, self.bg, self.style, self.is_main,
                self.can_override,
            );
            self.col += i64::from(advance);
        }
    }

    pub fn new_line(&mut self) {
        self.row += 1;
        self.col = 0;
        let last_row = self.screen.height() as i64 - 1;
        if self.row > last_row {
            self.row = last_row;
        }
    }

    pub fn move_to(&mut self, row: i64, col: i64) {
        self.row = row;
        self.col = col;
    }

    pub fn move_relative(&mut self, d_row: i64, d_col: i64) {
        self.row += d_row;
        self.col += d_col;
    }

    pub fn reset_style(&mut self) {
        self.style = StyleFlags::default();
        self.fg = None;
        self.bg = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn print_text_advances_column_by_visual_width() {
        let screen = Screen::new(10, 3);
        let mut cursor = Cursor::new(screen, true, true);
        cursor.print_text("a一b");
        assert_eq!(cursor.row, 0);
        assert_eq!(cursor.col, 4);
    }

    #[test]
    fn newline_resets_column_and_clamps_at_last_row() {
        let screen = Screen::new(10, 2);
        let mut cursor = Cursor::new(screen, true, true);
        cursor.print_text("x");
        cursor.new_line();
        assert_eq!((cursor.row, cursor.col), (1, 0));
        cursor.new_line();
        assert_eq!((cursor.row, cursor.col), (1, 0));
    }
}
