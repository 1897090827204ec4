// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Raw ANSI/SGR byte sequences. No other module is allowed to hand-roll an
//! escape sequence; everything goes through [`super::generator::AnsiSequenceGenerator`].

pub const SGR_RESET: &str = "\x1b[0m";

pub const SGR_BOLD_ON: &str = "\x1b[1m";
pub const SGR_BOLD_OFF: &str = "\x1b[22m";
pub const SGR_ITALIC_ON: &str = "\x1b[3m";
pub const SGR_ITALIC_OFF: &str = "\x1b[23m";
pub const SGR_UNDERLINE_ON: &str = "\x1b[4m";
pub const SGR_UNDERLINE_OFF: &str = "\x1b[24m";
pub const SGR_STRIKETHROUGH_ON: &str = "\x1b[9m";
pub const SGR_STRIKETHROUGH_OFF: &str = "\x1b[29m";

pub const FG_RESET: &str = "\x1b[39m";
pub const BG_RESET: &str = "\x1b[49m";

pub const ERASE_DISPLAY_ALL: &str = "\x1b[2J";

pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
