/// Truncate a string to at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Locate the first JSON object in a model response that may wrap it in prose
/// or code fences.
///
/// Scans from the first `{` to its matching `}`, ignoring braces inside
/// string literals. When the braces never balance, falls back to the span
/// from the first `{` to the last `}`; with no object at all the whole text
/// is returned.
pub fn extract_json_object(text: &str) -> &str {
    let Some(start) = text.find('{') else {
        return text;
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &text[start..start + offset + 1];
                }
            }
            _ => {}
        }
    }

    match text.rfind('}') {
        Some(end) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Escape raw newline, carriage return and tab characters that appear inside
/// JSON string literals, and drop every other ASCII control character.
/// Whitespace between tokens is left alone.
pub fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => {}
                c => out.push(c),
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '\n' | '\r' | '\t' => out.push(ch),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }

    out
}

/// Parse the JSON object embedded in a model response: strict parse first,
/// then one retry after control-character cleanup.
pub fn parse_model_json(text: &str) -> Result<serde_json::Value, serde_json::Error> {
    let candidate = extract_json_object(text);
    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(error = %e, "Strict JSON parse failed, retrying after cleanup");
            serde_json::from_str(&escape_control_chars(candidate))
        }
    }
}
