// ═══════════════════════════════════════════════════════════════
//  Delimiter & quoting rules
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
#[error("CSV: delimiter must be a single character other than '\"', '\\r' or '\\n', got {0:?}")]
pub struct DelimiterError(pub String);

/// Parse a configured delimiter. `"\t"` may be given as an escape.
pub fn parse_delimiter(s: &str) -> Result<char, DelimiterError> {
    let mut chars = s.chars();
    let c = match (s, chars.next(), chars.next()) {
        ("\\t", _, _) => '\t',
        (_, Some(c), None) => c,
        _ => return Err(DelimiterError(s.to_string())),
    };
    if matches!(c, '"' | '\r' | '\n') {
        return Err(DelimiterError(s.to_string()));
    }
    Ok(c)
}

pub(crate) fn needs_quotes(field: &str, delimiter: char) -> bool {
    field.starts_with(' ')
        || field.contains(delimiter)
        || field.contains(['"', '\r', '\n'])
}

pub(crate) fn push_field(out: &mut String, field: &str, delimiter: char, quoting: bool) {
    if quoting && needs_quotes(field, delimiter) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
