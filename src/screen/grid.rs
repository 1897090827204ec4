// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The double-buffered virtual screen.
//!
//! `front` is what the script has written so far this frame; `shadow` is
//! what the real terminal currently shows. [`Screen::generate_diff_and_swap`]
//! walks both, emits the minimal ANSI needed to make the terminal match
//! `front`, then copies `front` into `shadow`.

use std::sync::{Arc, Mutex};

use crate::ansi::AnsiSequenceGenerator;
use crate::char_metrics::CharMetrics;
use crate::color::{Rgb, Rgba};
use crate::style::StyleFlags;

use super::cell::Cell;

struct ScreenState {
    width: usize,
    height: usize,
    front: Vec<Cell>,
    shadow: Vec<Cell>,
}

impl ScreenState {
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    fn get(&self, row: usize, col: usize) -> Cell {
        self.front[self.index(row, col)]
    }

    fn set(&mut self, row: usize, col: usize, cell: Cell) {
        let i = self.index(row, col);
        self.front[i] = cell;
    }
}

/// A cheaply-cloneable handle onto a shared, mutex-guarded grid pair.
///
/// All clones refer to the same underlying buffers — the main cursor and
/// every coroutine's cursor share one `Screen`, and every write takes the
/// same lock, which is what makes the write-protection rule meaningful.
#[derive(Clone)]
pub struct Screen {
    inner: Arc<Mutex<ScreenState>>,
}

impl Screen {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let cells = vec![Cell::blank(); width * height];
        Self {
            inner: Arc::new(Mutex::new(ScreenState {
                width,
                height,
                front: cells.clone(),
                shadow: cells,
            })),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.inner.lock().unwrap().width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.inner.lock().unwrap().height
    }

    /// Writes one character at `(row, col)` and returns the column advance
    /// (0, 1, or 2) the caller should apply to its cursor.
    ///
    /// `row`/`col` may be negative or past the grid edge; such writes are
    /// silently dropped (no panics, no clamping into the visible area).
    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &self,
        row: i64,
        col: i64,
        ch: char,
        fg: Option<Rgb>,
        bg: Option<Rgba>,
        style: StyleFlags,
        is_main: bool,
        can_override: bool,
    ) -> u8 {
        let width = CharMetrics::width(ch);
        if width == 0 || row < 0 || col < 0 {
            return 0;
        }
        let (row, col) = (row as usize, col as usize);

        let mut state = self.inner.lock().unwrap();
        if row >= state.height || col + (width as usize) > state.width {
            return 0;
        }

        if !is_main && !can_override {
            let head_locked = state.get(row, col).locked_by_main;
            let tail_locked =
                width == 2 && col + 1 < state.width && state.get(row, col + 1).locked_by_main;
            if head_locked || tail_locked {
                return width;
            }
        }

        repair_wide_neighbors(&mut state, row, col, width);

        state.set(
            row,
            col,
            Cell {
                ch,
                fg,
                bg,
                style,
                is_wide_head: width == 2,
                is_wide_placeholder: false,
                locked_by_main: is_main,
            },
        );
        if width == 2 {
            state.set(
                row,
                col + 1,
                Cell {
                    ch: ' ',
                    fg,
                    bg,
                    style,
                    is_wide_head: false,
                    is_wide_placeholder: true,
                    locked_by_main: is_main,
                },
            );
        }

        width
    }

    /// Resets every cell in `front` to blank. Takes effect on the next diff.
    pub fn clear_screen(&self) {
        let mut state = self.inner.lock().unwrap();
        state.front.iter_mut().for_each(|c| *c = Cell::blank());
    }

    /// Diffs `front` against `shadow`, returns the ANSI needed to reconcile
    /// the real terminal, and copies `front` into `shadow`.
    pub fn generate_diff_and_swap(&self) -> String {
        let mut state = self.inner.lock().unwrap();
        let (width, height) = (state.width, state.height);

        let mut out = String::new();
        let mut cursor_at: Option<(usize, usize)> = None;
        let mut tracked_fg: Option<Rgb> = None;
        let mut tracked_bg: Option<Rgba> = None;
        let mut tracked_style = StyleFlags::default();
        let mut any_change = false;

        for row in 0..height {
            for col in 0..width {
                let idx = row * width + col;
                let front = state.front[idx];
                let shadow = state.shadow[idx];
                if front.visual_equals(&shadow) {
                    continue;
                }

                if front.is_wide_placeholder {
                    state.shadow[idx] = front;
                    continue;
                }

                any_change = true;
                if cursor_at != Some((row, col)) {
                    out.push_str(&AnsiSequenceGenerator::cursor_position(row, col));
                }

                if tracked_fg != front.fg {
                    out.push_str(&AnsiSequenceGenerator::fg_color(front.fg));
                    tracked_fg = front.fg;
                }
                if tracked_bg != front.bg {
                    out.push_str(&AnsiSequenceGenerator::bg_color(front.bg));
                    tracked_bg = front.bg;
                }
                if tracked_style.bold != front.style.bold {
                    out.push_str(AnsiSequenceGenerator::toggle_bold(front.style.bold));
                }
                if tracked_style.italic != front.style.italic {
                    out.push_str(AnsiSequenceGenerator::toggle_italic(front.style.italic));
                }
                if tracked_style.underline != front.style.underline {
                    out.push_str(AnsiSequenceGenerator::toggle_underline(front.style.underline));
                }
                if tracked_style.strikethrough != front.style.strikethrough {
                    out.push_str(AnsiSequenceGenerator::toggle_strikethrough(
                        front.style.strikethrough,
                    ));
                }
                tracked_style = front.style;

                out.push(front.ch);

                let advance = if front.is_wide_head { 2 } else { 1 };
                cursor_at = Some((row, col + advance));

                state.shadow[idx] = front;
            }
        }

        if any_change {
            out.push_str(AnsiSequenceGenerator::reset());
        }
        out
    }
}

/// Blanks out the other half of any wide pair disturbed by a write at
/// `(row, col)` of the given `new_width`, so a screen can never end up with
/// an orphaned head or placeholder cell.
fn repair_wide_neighbors(state: &mut ScreenState, row: usize, col: usize, new_width: u8) {
    let current = state.get(row, col);
    if current.is_wide_placeholder && col > 0 {
        state.set(row, col - 1, Cell::blank());
    }
    if current.is_wide_head && col + 1 < state.width {
        state.set(row, col + 1, Cell::blank());
    }
    if new_width == 2 && col + 1 < state.width {
        let next = state.get(row, col + 1);
        if next.is_wide_head && col + 2 < state.width {
            state.set(row, col + 2, Cell::blank());
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn write_then_diff_emits_one_character() {
        let screen = Screen::new(10, 2);
        screen.write(0, 0, 'A', None, None, StyleFlags::default(), true, true);
        let diff = screen.generate_diff_and_swap();
        assert!(diff.contains('A'));
        assert!(diff.contains("\x1b[1;1H"));
    }

    #[test]
    fn unchanged_cells_produce_no_diff() {
        let screen = Screen::new(10, 2);
        screen.write(0, 0, 'A', None, None, StyleFlags::default(), true, true);
        let _ = screen.generate_diff_and_swap();
        let second = screen.generate_diff_and_swap();
        assert!(second.is_empty());
    }

    #[test]
    fn wide_character_occupies_two_columns_and_blocks_overlap() {
        let screen = Screen::new(10, 2);
        let advance = screen.write(0, 0, '一', None, None, StyleFlags::default(), true, true);
        assert_eq!(advance, 2);
        let diff = screen.generate_diff_and_swap();
        assert!(diff.contains('一'));
        // Only one code point should be emitted even though it spans two cells.
        assert_eq!(diff.matches('一').count(), 1);
    }

    #[test]
    fn non_main_writer_without_override_cannot_overwrite_main_cell() {
        let screen = Screen::new(10, 2);
        screen.write(0, 0, 'A', None, None, StyleFlags::default(), true, true);
        let advance = screen.write(0, 0, 'B', None, None, StyleFlags::default(), false, false);
        assert_eq!(advance, 1);
        let diff = screen.generate_diff_and_swap();
        assert!(diff.contains('A'));
        assert!(!diff.contains('B'));
    }

    #[test]
    fn non_main_writer_with_override_can_overwrite_main_cell() {
        let screen = Screen::new(10, 2);
        screen.write(0, 0, 'A', None, None, StyleFlags::default(), true, true);
        let _ = screen.generate_diff_and_swap();
        screen.write(0, 0, 'B', None, None, StyleFlags::default(), false, true);
        let diff = screen.generate_diff_and_swap();
        assert!(diff.contains('B'));
    }

    #[test]
    fn out_of_bounds_write_is_a_no_op() {
        let screen = Screen::new(4, 2);
        let advance = screen.write(10, 10, 'X', None, None, StyleFlags::default(), true, true);
        assert_eq!(advance, 0);
        let diff = screen.generate_diff_and_swap();
        assert!(diff.is_empty());
    }
}
