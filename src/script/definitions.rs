// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The two kinds of reusable script fragments a pre-scan collects:
//! single-bracket aliases and multi-line, parameterized functions.

#[derive(Debug, Clone)]
pub struct AliasDef {
    pub name: String,
    /// Verbatim text that goes between the brackets on re-parse, e.g. for
    /// `[@red color #ff0000]` this is `"color #ff0000"`.
    pub raw_content: String,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    /// Each entry is one `[<]`-prefixed body line, raw text after the marker.
    pub raw_body_lines: Vec<String>,
    pub allow_override: bool,
}

/// Replaces every `[param]` occurrence in `line` with the matching
/// positional argument. Missing arguments substitute the empty string.
#[must_use]
pub fn substitute_params(line: &str, params: &[String], args: &[String]) -> String {
    let mut out = line.to_string();
    for (i, param) in params.iter().enumerate() {
        let arg = args.get(i).map(String::as_str).unwrap_or("");
        let needle = format!("[{param}]");
        out = out.replace(&needle, arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn substitutes_known_params_and_blanks_missing_ones() {
        let params = vec!["name".to_string(), "color".to_string()];
        let args = vec!["world".to_string()];
        let result = substitute_params("hi [name], feeling [color]?", &params, &args);
        assert_eq!(result, "hi world, feeling ?");
    }
}
