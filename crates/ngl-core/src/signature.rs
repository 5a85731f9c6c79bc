//! Parameter-name recovery from signature text.
//!
//! A factory's dependencies are the names of its declared parameters. When a
//! factory is described by its signature text (for example
//! `"function ($scope, taskService)"`), [`annotate_signature`] recovers those
//! names in declaration order, which is also resolution and argument order.
//!
//! Rules:
//!
//! 1. `// ...` comments (to end of line) and `/* ... */` comments are removed.
//! 2. The first parenthesized list that closes on the same line is used.
//! 3. The list is split on `,` and each name is trimmed.
//! 4. A missing or empty list yields no names.

/// Ordered parameter names declared by `signature`.
#[must_use]
pub fn annotate_signature(signature: &str) -> Vec<String> {
    let stripped = strip_comments(signature);
    match first_parameter_list(&stripped) {
        Some(list) if !list.is_empty() => list.split(',').map(|p| p.trim().to_owned()).collect(),
        _ => Vec::new(),
    }
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("//") {
            // Keep the newline itself; only the comment text goes.
            let end = after.find('\n').unwrap_or(after.len());
            rest = &after[end..];
        } else if let Some(end) = rest.strip_prefix("/*").and_then(|after| after.find("*/")) {
            rest = &rest[end + 4..];
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}

fn first_parameter_list(source: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(open) = source[search_from..].find('(') {
        let start = search_from + open + 1;
        let line_rest = &source[start..];
        let line_end = line_rest.find('\n').unwrap_or(line_rest.len());
        if let Some(close) = line_rest[..line_end].find(')') {
            return Some(&line_rest[..close]);
        }
        search_from = start;
    }
    None
}
