// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The unit of the virtual screen's grid.

use crate::color::{Rgb, Rgba};
use crate::style::StyleFlags;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Rgb>,
    pub bg: Option<Rgba>,
    pub style: StyleFlags,
    /// First column of a double-width character.
    pub is_wide_head: bool,
    /// Trailing column occupied by the character written at `col - 1`.
    pub is_wide_placeholder: bool,
    /// Set when the main cursor wrote this cell; a non-main cursor without
    /// override permission refuses to overwrite it.
    pub locked_by_main: bool,
}

impl Cell {
    #[must_use]
    pub fn blank() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            style: StyleFlags::default(),
            is_wide_head: false,
            is_wide_placeholder: false,
            locked_by_main: false,
        }
    }

    /// Equality ignoring `locked_by_main`, which has no visual effect.
    #[must_use]
    pub fn visual_equals(&self, other: &Cell) -> bool {
        self.ch == other.ch
            && self.fg == other.fg
            && self.bg == other.bg
            && self.style == other.style
            && self.is_wide_head == other.is_wide_head
            && self.is_wide_placeholder == other.is_wide_placeholder
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}
