//! Best-effort JSON recovery from noisy model output.
//!
//! Models asked for JSON still wrap it in prose, use smart quotes, or leave
//! trailing commas. `extract_json` finds the largest `{...}` / `[...]` span,
//! repairs those two stylistic errors, and returns the cleaned span only if
//! it actually parses; otherwise the caller gets the input back unchanged
//! and must treat the downstream parse failure as a data-processing error.
//!
//! Known precision limit: the span search is greedy first-to-last boundary
//! matching, not bracket-depth-aware, so braces inside string literals can
//! widen the candidate. The parse check keeps that from producing garbage.

/// Extract the most plausible JSON payload from `text`.
///
/// Returns the cleaned candidate when it parses as JSON, otherwise the
/// original input unchanged (including when no brace or bracket exists).
pub fn extract_json(text: &str) -> String {
    let Some(candidate) = largest_span(text) else {
        return text.to_string();
    };

    let cleaned = strip_trailing_commas(&normalize_quotes(candidate));
    if serde_json::from_str::<serde_json::Value>(&cleaned).is_ok() {
        cleaned
    } else {
        text.to_string()
    }
}

/// The longer of the first-`{`-to-last-`}` and first-`[`-to-last-`]` spans.
fn largest_span(text: &str) -> Option<&str> {
    let object = bounded_span(text, '{', '}');
    let array = bounded_span(text, '[', ']');

    match (object, array) {
        (Some(o), Some(a)) => Some(if o.len() >= a.len() { o } else { a }),
        (Some(o), None) => Some(o),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

fn bounded_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Replace typographic double quotes with plain `"`.
fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{201C}', '\u{201D}'], "\"")
}

/// Remove commas that sit (modulo whitespace) directly before a closing
/// brace or bracket, skipping commas inside string literals.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let dangling = matches!(chars.get(j), Some('}') | Some(']'));
                if !dangling {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}
