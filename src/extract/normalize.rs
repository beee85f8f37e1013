//! Best-effort recovery of a JSON object from free-form model output.
//!
//! Small models rarely answer with clean JSON. They wrap it in markdown fences,
//! surround it with prose, copy `// comments` from the format instructions, or
//! drop the commas between fields. The helpers here undo those habits before the
//! text reaches `serde_json`; they never invent keys or values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap()
});

/// Finds the first JSON object in `text` and parses it.
///
/// Fenced code blocks are tried first, then every balanced `{...}` span in the
/// raw text, in order of appearance.
pub fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Some(body) = caps.get(1) {
            if let Some(object) = first_object_in(body.as_str()) {
                return Some(object);
            }
        }
    }
    first_object_in(text)
}

fn first_object_in(text: &str) -> Option<Map<String, Value>> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = matching_brace(text, start) {
            let candidate = sanitize(&text[start..=end]);
            if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(&candidate) {
                return Some(object);
            }
        }
        search_from = start + 1;
    }
    None
}

/// Byte index of the `}` closing the `{` at `start`, honoring string literals
/// and `//` line comments.
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;
    let mut chars = text[start..].char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '/' if matches!(chars.peek(), Some((_, '/'))) => in_comment = true,
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Repairs common defects in model-written JSON outside of string literals:
/// strips `//` line comments, drops trailing commas and inserts missing commas
/// between adjacent members.
pub fn sanitize(candidate: &str) -> String {
    let chars: Vec<char> = candidate.chars().collect();
    let mut out = String::with_capacity(candidate.len());
    let mut in_string = false;
    let mut escaped = false;
    // Last significant character emitted outside a string
    let mut last: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    in_string = false;
                    last = Some('"');
                }
                _ => {}
            }
            i += 1;
            continue;
        }

        match c {
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            ',' => {
                if matches!(last, Some(',') | Some('{') | Some('[')) {
                    i += 1;
                    continue;
                }
            }
            '}' | ']' => {
                let kept = out.trim_end().len();
                if out[..kept].ends_with(',') {
                    out.truncate(kept - 1);
                }
            }
            '"' => {
                if ends_value(last) {
                    out.push(',');
                }
                in_string = true;
            }
            _ => {}
        }

        out.push(c);
        if !c.is_whitespace() {
            last = Some(c);
        }
        i += 1;
    }

    out
}

fn ends_value(last: Option<char>) -> bool {
    match last {
        Some(c) => c == '"' || c == '}' || c == ']' || c.is_ascii_alphanumeric(),
        None => false,
    }
}

/// Rewrites alias keys to their canonical names.
///
/// Keys are compared after trimming and lowercasing. A canonical key already
/// present in the object wins over any alias.
pub fn normalize_keys(object: Map<String, Value>, aliases: &[(&str, &str)], canonical: &[&str]) -> Map<String, Value> {
    let mut normalized = Map::new();
    let mut deferred = Vec::new();

    for (key, value) in object {
        let folded = key.trim().to_lowercase();
        if canonical.contains(&folded.as_str()) {
            normalized.insert(folded, value);
            continue;
        }
        match aliases.iter().find(|(alias, _)| *alias == folded) {
            Some((_, target)) => deferred.push((target.to_string(), value)),
            None => {
                normalized.insert(key, value);
            }
        }
    }

    for (target, value) in deferred {
        normalized.entry(target).or_insert(value);
    }
    normalized
}

/// Reads a non-negative integer that may have been written as a number, an
/// integral float or a numeric string.
pub fn coerce_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return u32::try_from(v).ok();
            }
            n.as_f64().and_then(integral_f64)
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

fn integral_f64(v: f64) -> Option<u32> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}
