// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The bracket-delimited script grammar.
//!
//! [`parse`] handles a whole `.clip` file: blank/comment skipping, the
//! leading-timestamp rule, continuation lines, and function-body capture.
//! [`parse_line_content`] handles a single already-extracted line of text —
//! it is what the engine calls to re-parse an alias's or a function's body
//! after parameter substitution.

use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{char, digit1};
use nom::combinator::{map_res, opt, recognize};
use nom::sequence::pair;
use nom::IResult;

use crate::error::{ClipError, ClipResult};

use super::element::{is_reserved, Command, ScriptElement, Timestamp};

/// One token of a tokenized line: literal text (whitespace already dropped)
/// or the interior of a `[...]` bracket group (whitespace preserved).
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Bracket(String),
}

/// What a bracket's interior dispatches to. `Header` is only meaningful as
/// the first token of a top-level line; everywhere else it is an error.
enum BracketForm {
    Element(ScriptElement),
    Header { name: String, params: Vec<String> },
}

/// Parses a whole script: every raw line of the file, in order.
pub fn parse<S: AsRef<str>>(lines: &[S]) -> ClipResult<Vec<ScriptElement>> {
    let mut out = Vec::new();
    let mut pending_continuation = false;
    let mut i = 0usize;
    let n = lines.len();

    while i < n {
        let raw_line = lines[i].as_ref();
        let line_no = i + 1;
        let trimmed = raw_line.trim();

        if trimmed.is_empty() || trimmed.starts_with("//") {
            i += 1;
            continue;
        }

        let is_continuation_consumer = pending_continuation;
        pending_continuation = false;

        let mut tokens = tokenize_line(raw_line);

        let is_producer = matches!(tokens.last(), Some(Token::Bracket(inner)) if inner.trim() == ">");
        if is_producer {
            tokens.pop();
        }

        let header = match tokens.first() {
            Some(Token::Bracket(inner)) => peek_header(inner),
            _ => None,
        };

        if let Some((name, params)) = header {
            if is_continuation_consumer {
                return Err(ClipError::parse(
                    line_no,
                    "a continuation line cannot open a function definition",
                ));
            }
            validate_not_reserved(&name, line_no)?;

            let mut allow_override = false;
            for token in tokens.into_iter().skip(1) {
                if let Token::Bracket(inner) = token {
                    if let BracketForm::Element(ScriptElement::Command(Command::PrintText(text))) =
                        parse_bracket_content(&inner, line_no)?
                    {
                        if text == "[override]" {
                            allow_override = true;
                        }
                    }
                }
            }

            let mut body_lines = Vec::new();
            i += 1;
            while i < n {
                let body_trim = lines[i].as_ref().trim();
                if body_trim.is_empty() || body_trim.starts_with("//") {
                    i += 1;
                    continue;
                }
                match body_trim.strip_prefix("[<]") {
                    Some(rest) => {
                        body_lines.push(rest.to_string());
                        i += 1;
                    }
                    None => break,
                }
            }

            out.push(ScriptElement::Command(Command::DefineFunction {
                name,
                params,
                raw_body_lines: body_lines,
                allow_override,
            }));
            continue;
        }

        let mut elements = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token {
                Token::Text(text) => {
                    if !text.is_empty() {
                        elements.push(ScriptElement::Command(Command::PrintText(text)));
                    }
                }
                Token::Bracket(inner) => match parse_bracket_content(&inner, line_no)? {
                    BracketForm::Element(element) => elements.push(element),
                    BracketForm::Header { .. } => {
                        return Err(ClipError::parse(
                            line_no,
                            "a function header must be the first token on its line",
                        ));
                    }
                },
            }
        }

        if is_continuation_consumer {
            let already_has_timestamp = matches!(elements.first(), Some(ScriptElement::Timestamp(_)));
            if !already_has_timestamp {
                out.push(ScriptElement::Timestamp(Timestamp::Continuation));
            }
        } else {
            let starts_with_time_or_bpm_or_alias = matches!(
                elements.first(),
                Some(ScriptElement::Timestamp(_))
                    | Some(ScriptElement::Command(Command::SetBpm(_)))
                    | Some(ScriptElement::Command(Command::DefineAlias { .. }))
            );
            if !starts_with_time_or_bpm_or_alias {
                return Err(ClipError::parse(line_no, "line must begin with a timestamp"));
            }
        }

        out.extend(elements);
        pending_continuation = is_producer;
        i += 1;
    }

    Ok(out)
}

/// Re-parses a single line of already-expanded text (an alias's raw content
/// wrapped in brackets, or a function's substituted body line). No leading
/// timestamp is required and no function header may appear.
pub fn parse_line_content(line: &str) -> ClipResult<Vec<ScriptElement>> {
    let tokens = tokenize_line(line);
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Text(text) => {
                if !text.is_empty() {
                    out.push(ScriptElement::Command(Command::PrintText(text)));
                }
            }
            Token::Bracket(inner) => match parse_bracket_content(&inner, 0)? {
                BracketForm::Element(element) => out.push(element),
                BracketForm::Header { .. } => {
                    return Err(ClipError::parse(
                        0,
                        "function definitions are not allowed inside macro expansions",
                    ));
                }
            },
        }
    }
    Ok(out)
}

/// Scans `line` left to right, dropping whitespace outside of `[...]`
/// groups and resolving the escapes `\[ \] \\ \n \t \>` wherever they occur.
/// An unterminated `[` is treated as a literal character.
fn tokenize_line(line: &str) -> Vec<Token> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut text_acc = String::new();
    let mut idx = 0usize;

    while idx < chars.len() {
        let c = chars[idx];

        if c == '\\' && idx + 1 < chars.len() {
            let (resolved, consumed) = resolve_escape(chars[idx + 1]);
            text_acc.push(resolved);
            idx += consumed;
            continue;
        }

        if c == '[' {
            if let Some((inner, next_idx)) = scan_bracket(&chars, idx + 1) {
                if !text_acc.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text_acc)));
                }
                tokens.push(Token::Bracket(inner));
                idx = next_idx;
            } else {
                text_acc.push('[');
                idx += 1;
            }
            continue;
        }

        if c.is_whitespace() {
            idx += 1;
            continue;
        }

        text_acc.push(c);
        idx += 1;
    }

    if !text_acc.is_empty() {
        tokens.push(Token::Text(text_acc));
    }
    tokens
}

/// Resolves a two-character escape starting at `\` (chars[idx] == '\\');
/// returns the literal character and how many source characters it consumed.
fn resolve_escape(next: char) -> (char, usize) {
    match next {
        '[' => ('[', 2),
        ']' => (']', 2),
        '\\' => ('\\', 2),
        'n' => ('\n', 2),
        't' => ('\t', 2),
        '>' => ('>', 2),
        _ => ('\\', 1),
    }
}

/// Scans for the matching unescaped `]` starting at `start` (just past the
/// opening `[`). Returns the (escape-resolved) interior and the index just
/// past the closing `]`, or `None` if the bracket never closes.
fn scan_bracket(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut inner = String::new();
    let mut j = start;
    while j < chars.len() {
        let c = chars[j];
        if c == '\\' && j + 1 < chars.len() {
            let (resolved, consumed) = resolve_escape(chars[j + 1]);
            inner.push(resolved);
            j += consumed;
            continue;
        }
        if c == ']' {
            return Some((inner, j + 1));
        }
        inner.push(c);
        j += 1;
    }
    None
}

fn peek_header(inner: &str) -> Option<(String, Vec<String>)> {
    let rest = inner.trim().strip_prefix('#')?;
    let (name, params) = split_name_and_csv(rest);
    if name.is_empty() {
        None
    } else {
        Some((name, params))
    }
}

fn validate_not_reserved(name: &str, line_no: usize) -> ClipResult<()> {
    if is_reserved(name) {
        Err(ClipError::parse(line_no, format!("'{name}' is a reserved name")))
    } else {
        Ok(())
    }
}

fn split_name_and_csv(rest: &str) -> (String, Vec<String>) {
    let rest = rest.trim();
    match rest.split_once(char::is_whitespace) {
        Some((name, csv)) => {
            let csv = csv.trim();
            let params = if csv.is_empty() {
                Vec::new()
            } else {
                csv.split(',').map(|p| p.trim().to_string()).collect()
            };
            (name.to_string(), params)
        }
        None => (rest.to_string(), Vec::new()),
    }
}

fn split_keyword(trimmed: &str) -> (&str, &str) {
    match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (trimmed, ""),
    }
}

fn keyword_command(keyword: &str) -> Option<Command> {
    Some(match keyword {
        "newline" => Command::NewLine,
        "clear" => Command::ClearScreen,
        "clearn" => Command::ClearScreenNoReset,
        "clearcolor" => Command::ClearColor,
        "clearbackground" => Command::ClearBackground,
        "clearstyle" => Command::ClearStyle,
        _ => return None,
    })
}

fn parse_bracket_content(raw: &str, line_no: usize) -> ClipResult<BracketForm> {
    let trimmed = raw.trim();

    if let Some(ts) = parse_timestamp(trimmed) {
        return Ok(BracketForm::Element(ScriptElement::Timestamp(ts)));
    }

    let (keyword, rest) = split_keyword(trimmed);

    if keyword == "bpm" {
        return parse_bpm(rest, line_no).map(BracketForm::Element);
    }
    if keyword == "space" {
        return Ok(BracketForm::Element(parse_space(rest)));
    }
    if rest.is_empty() {
        if let Some(command) = keyword_command(keyword) {
            return Ok(BracketForm::Element(ScriptElement::Command(command)));
        }
    }
    if keyword == "mv" {
        return parse_mv(rest, line_no).map(BracketForm::Element);
    }
    if keyword == "color" {
        return parse_color(rest, line_no).map(BracketForm::Element);
    }
    if keyword == "background" {
        return parse_background(rest, line_no).map(BracketForm::Element);
    }
    if keyword == "style" {
        return Ok(BracketForm::Element(parse_style(rest)));
    }
    if let Some(rest) = trimmed.strip_prefix('#') {
        let (name, params) = split_name_and_csv(rest);
        if !name.is_empty() {
            return Ok(BracketForm::Header { name, params });
        }
    }
    if let Some(rest) = trimmed.strip_prefix('@') {
        return parse_alias(rest, line_no).map(BracketForm::Element);
    }
    if let Some(rest) = trimmed.strip_prefix("++") {
        let (name, args) = split_name_and_csv(rest);
        return Ok(BracketForm::Element(ScriptElement::Command(Command::CallCoroutine {
            name,
            args,
        })));
    }
    if is_valid_ident_call(trimmed) {
        let (name, args) = split_name_and_csv(trimmed);
        if !is_reserved(&name) {
            return Ok(BracketForm::Element(ScriptElement::Command(Command::CallFunction {
                name,
                args,
            })));
        }
    }

    Ok(BracketForm::Element(ScriptElement::Command(Command::PrintText(format!(
        "[{trimmed}]"
    )))))
}

fn is_valid_ident_call(trimmed: &str) -> bool {
    let (name, _) = split_name_and_csv(trimmed);
    is_valid_ident(&name)
}

fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_bpm(rest: &str, line_no: usize) -> ClipResult<ScriptElement> {
    rest.parse::<f64>()
        .map(|bpm| ScriptElement::Command(Command::SetBpm(bpm)))
        .map_err(|_| ClipError::parse(line_no, format!("invalid bpm value: '{rest}'")))
}

fn parse_space(rest: &str) -> ScriptElement {
    let n = if rest.is_empty() {
        1
    } else {
        rest.parse::<u32>().unwrap_or(1).max(1)
    };
    ScriptElement::Command(Command::PrintSpace(n))
}

fn parse_mv(rest: &str, line_no: usize) -> ClipResult<ScriptElement> {
    let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(ClipError::parse(line_no, format!("invalid mv arguments: '{rest}'")));
    }
    let signed = parts.iter().any(|p| p.starts_with('+') || p.starts_with('-'));
    let a = parts[0]
        .parse::<i64>()
        .map_err(|_| ClipError::parse(line_no, format!("invalid mv row: '{}'", parts[0])))?;
    let b = parts[1]
        .parse::<i64>()
        .map_err(|_| ClipError::parse(line_no, format!("invalid mv col: '{}'", parts[1])))?;
    if signed {
        Ok(ScriptElement::Command(Command::MoveRelative(a, b)))
    } else {
        Ok(ScriptElement::Command(Command::MoveAbsolute(a, b)))
    }
}

fn parse_color(rest: &str, line_no: usize) -> ClipResult<ScriptElement> {
    let hex = rest.trim().trim_start_matches('#');
    let (r, g, b) = parse_hex_rgb(hex)
        .ok_or_else(|| ClipError::parse(line_no, format!("invalid color: '{rest}'")))?;
    Ok(ScriptElement::Command(Command::SetColor(r, g, b)))
}

fn parse_background(rest: &str, line_no: usize) -> ClipResult<ScriptElement> {
    let hex = rest.trim().trim_start_matches('#');
    let (r, g, b, a) = parse_hex_rgba(hex)
        .ok_or_else(|| ClipError::parse(line_no, format!("invalid background: '{rest}'")))?;
    Ok(ScriptElement::Command(Command::SetBackground(r, g, b, a)))
}

fn parse_style(rest: &str) -> ScriptElement {
    let lower = rest.to_lowercase();
    ScriptElement::Command(Command::SetStyle {
        bold: lower.contains("bold"),
        italic: lower.contains("italic"),
        underline: lower.contains("underline"),
        strikethrough: lower.contains("strikethrough") || lower.contains("strike"),
    })
}

fn parse_alias(rest: &str, line_no: usize) -> ClipResult<ScriptElement> {
    let rest = rest.trim_start();
    let (name, content) = match rest.split_once(char::is_whitespace) {
        Some((n, c)) => (n.trim(), c.trim_start()),
        None => (rest.trim(), ""),
    };
    validate_not_reserved(name, line_no)?;
    Ok(ScriptElement::Command(Command::DefineAlias {
        name: name.to_string(),
        raw_content: content.to_string(),
    }))
}

// --- Hex color parsing, grounded in the teacher's `hex_color_parser` idiom. ---

fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |s: &str| {
        u8::from_str_radix(s, 16)
    })(input)
}

#[must_use]
pub fn parse_hex_rgb(input: &str) -> Option<(u8, u8, u8)> {
    let parser = |i| -> IResult<&str, (u8, u8, u8)> {
        let (i, r) = hex_byte(i)?;
        let (i, g) = hex_byte(i)?;
        let (i, b) = hex_byte(i)?;
        Ok((i, (r, g, b)))
    };
    match parser(input) {
        Ok(("", value)) => Some(value),
        _ => None,
    }
}

#[must_use]
pub fn parse_hex_rgba(input: &str) -> Option<(u8, u8, u8, u8)> {
    let parser = |i| -> IResult<&str, (u8, u8, u8, u8)> {
        let (i, r) = hex_byte(i)?;
        let (i, g) = hex_byte(i)?;
        let (i, b) = hex_byte(i)?;
        let (i, a) = hex_byte(i)?;
        Ok((i, (r, g, b, a)))
    };
    match parser(input) {
        Ok(("", value)) => Some(value),
        _ => None,
    }
}

// --- Timestamp parsing. ---
//
// Concrete grammar (one fractional part allowed on any beat number):
//   mm:ss.xxx      AbsoluteMs
//   Nb             AbsoluteBeat
//   Nb+K           AbsoluteBeatPlusMs        (K: integer ms)
//   Nb+M/Db        AbsoluteBeatPlusFraction  (M/D: a fraction of one beat)
//   +Nb            RelativeBeat
//   +M/Db          RelativeFractionBeat
//   +N             RelativeMs

fn decimal(input: &str) -> IResult<&str, f64> {
    map_res(recognize(pair(digit1, opt(pair(char('.'), digit1)))), |s: &str| s.parse::<f64>())(
        input,
    )
}

fn signed_int(input: &str) -> IResult<&str, i64> {
    map_res(digit1, |s: &str| s.parse::<i64>())(input)
}

fn mmss(input: &str) -> IResult<&str, Timestamp> {
    let (input, mm) = signed_int(input)?;
    let (input, _) = char(':')(input)?;
    let (input, ss) = signed_int(input)?;
    let (input, _) = char('.')(input)?;
    let (input, frac) = digit1(input)?;
    let millis = parse_fraction_millis(frac);
    Ok((input, Timestamp::AbsoluteMs(mm * 60_000 + ss * 1_000 + millis)))
}

fn parse_fraction_millis(frac: &str) -> i64 {
    let padded: String = frac.chars().chain(std::iter::repeat('0')).take(3).collect();
    padded.parse::<i64>().unwrap_or(0)
}

fn beat_plus_fraction(input: &str) -> IResult<&str, Timestamp> {
    let (input, beat) = decimal(input)?;
    let (input, _) = char('b')(input)?;
    let (input, _) = char('+')(input)?;
    let (input, num) = signed_int(input)?;
    let (input, _) = char('/')(input)?;
    let (input, den) = signed_int(input)?;
    let (input, _) = char('b')(input)?;
    Ok((input, Timestamp::AbsoluteBeatPlusFraction(beat, num, den)))
}

fn beat_plus_ms(input: &str) -> IResult<&str, Timestamp> {
    let (input, beat) = decimal(input)?;
    let (input, _) = char('b')(input)?;
    let (input, _) = char('+')(input)?;
    let (input, ms) = signed_int(input)?;
    Ok((input, Timestamp::AbsoluteBeatPlusMs(beat, ms)))
}

fn beat_absolute(input: &str) -> IResult<&str, Timestamp> {
    let (input, beat) = decimal(input)?;
    let (input, _) = char('b')(input)?;
    Ok((input, Timestamp::AbsoluteBeat(beat)))
}

fn relative_fraction_beat(input: &str) -> IResult<&str, Timestamp> {
    let (input, _) = char('+')(input)?;
    let (input, num) = signed_int(input)?;
    let (input, _) = char('/')(input)?;
    let (input, den) = signed_int(input)?;
    let (input, _) = char('b')(input)?;
    Ok((input, Timestamp::RelativeFractionBeat(num, den)))
}

fn relative_beat(input: &str) -> IResult<&str, Timestamp> {
    let (input, _) = char('+')(input)?;
    let (input, beat) = decimal(input)?;
    let (input, _) = char('b')(input)?;
    Ok((input, Timestamp::RelativeBeat(beat)))
}

fn relative_ms(input: &str) -> IResult<&str, Timestamp> {
    let (input, _) = char('+')(input)?;
    let (input, ms) = signed_int(input)?;
    Ok((input, Timestamp::RelativeMs(ms)))
}

fn full<'a, F>(mut parser: F, input: &'a str) -> Option<Timestamp>
where
    F: FnMut(&'a str) -> IResult<&'a str, Timestamp>,
{
    match parser(input) {
        Ok(("", ts)) => Some(ts),
        _ => None,
    }
}

#[must_use]
pub fn parse_timestamp(input: &str) -> Option<Timestamp> {
    let trimmed = input.trim();
    full(mmss, trimmed)
        .or_else(|| full(beat_plus_fraction, trimmed))
        .or_else(|| full(beat_plus_ms, trimmed))
        .or_else(|| full(beat_absolute, trimmed))
        .or_else(|| full(relative_fraction_beat, trimmed))
        .or_else(|| full(relative_beat, trimmed))
        .or_else(|| full(relative_ms, trimmed))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case("0b", Timestamp::AbsoluteBeat(0.0); "bare beat")]
    #[test_case("4.5b", Timestamp::AbsoluteBeat(4.5); "fractional beat")]
    #[test_case("4b+50", Timestamp::AbsoluteBeatPlusMs(4.0, 50); "beat plus ms")]
    #[test_case("4b+1/2b", Timestamp::AbsoluteBeatPlusFraction(4.0, 1, 2); "beat plus fraction")]
    #[test_case("+1b", Timestamp::RelativeBeat(1.0); "relative beat")]
    #[test_case("+1/2b", Timestamp::RelativeFractionBeat(1, 2); "relative fraction beat")]
    #[test_case("+100", Timestamp::RelativeMs(100); "relative ms")]
    #[test_case("00:00.250", Timestamp::AbsoluteMs(250); "mm ss millis")]
    #[test_case("00:01.000", Timestamp::AbsoluteMs(1_000); "mm ss one second")]
    fn parses_every_timestamp_form(input: &str, expected: Timestamp) {
        assert_eq!(parse_timestamp(input), Some(expected));
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert_eq!(parse_timestamp("not-a-timestamp"), None);
    }

    #[test]
    fn parse_line_content_dispatches_color_and_text() {
        let elements = parse_line_content("hi[color #ff0000]there").unwrap();
        assert_eq!(
            elements,
            vec![
                ScriptElement::Command(Command::PrintText("hi".to_string())),
                ScriptElement::Command(Command::SetColor(0xff, 0, 0)),
                ScriptElement::Command(Command::PrintText("there".to_string())),
            ]
        );
    }

    #[test]
    fn unrecognized_bracket_falls_back_to_literal_text() {
        let elements = parse_line_content("[not a real command]").unwrap();
        assert_eq!(
            elements,
            vec![ScriptElement::Command(Command::PrintText(
                "[not a real command]".to_string()
            ))]
        );
    }

    #[test]
    fn full_parse_requires_leading_timestamp() {
        let err = parse(&["hello"]).unwrap_err();
        assert!(matches!(err, ClipError::Parse { line: 1, .. }));
    }

    #[test]
    fn full_parse_accepts_bpm_only_line() {
        let elements = parse(&["[bpm 120]"]).unwrap();
        assert_eq!(elements, vec![ScriptElement::Command(Command::SetBpm(120.0))]);
    }

    #[test]
    fn full_parse_captures_function_definition_and_call() {
        let lines = vec!["[#greet name]", "[<][0b]hi [name]", "[0b][greet world]"];
        let elements = parse(&lines).unwrap();
        assert_eq!(elements.len(), 3);
        match &elements[0] {
            ScriptElement::Command(Command::DefineFunction {
                name,
                params,
                raw_body_lines,
                allow_override,
            }) => {
                assert_eq!(name, "greet");
                assert_eq!(params, &vec!["name".to_string()]);
                assert_eq!(raw_body_lines, &vec!["[0b]hi [name]".to_string()]);
                assert!(!allow_override);
            }
            other => panic!("expected DefineFunction, got {other:?}"),
        }
        match &elements[1] {
            ScriptElement::Timestamp(Timestamp::AbsoluteBeat(b)) => assert_eq!(*b, 0.0),
            other => panic!("expected a timestamp, got {other:?}"),
        }
    }

    #[test]
    fn continuation_marker_is_stripped_and_next_line_becomes_continuation() {
        let lines = vec!["[0b]main[>]", "tail"];
        let elements = parse(&lines).unwrap();
        assert!(elements
            .iter()
            .any(|e| matches!(e, ScriptElement::Timestamp(Timestamp::Continuation))));
        assert!(elements
            .iter()
            .any(|e| matches!(e, ScriptElement::Command(Command::PrintText(t)) if t == "tail")));
    }

    #[test]
    fn reserved_name_rejected_as_function_name() {
        let err = parse(&["[#mv x]", "[<][0b]hi"]).unwrap_err();
        assert!(matches!(err, ClipError::Parse { .. }));
    }
}
