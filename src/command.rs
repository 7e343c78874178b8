//! Outbound command composition.
//!
//! Builds the lines the client writes to the server: the `id` identity
//! command, normalized query text, and the structured mutation commands
//! (`add`, `change`, `delete`). Field values are interpolated quoted,
//! with embedded double quotes and backslashes backslash-escaped so the
//! server's tokenizer reconstructs them verbatim.
//!
//! # Example
//!
//! ```
//! use pharos_client::command::{add_command, normalize_query};
//!
//! assert_eq!(normalize_query("hostname=x"), "query hostname=x");
//! assert_eq!(
//!     add_command(&[("type", "machine"), ("note", "rack \"B\"")]),
//!     r#"add type="machine" note="rack \"B\"""#
//! );
//! ```

/// Command verbs the server recognizes; caller text starting with one
/// of these is sent unmodified.
pub const RECOGNIZED_VERBS: [&str; 5] = ["query", "ph", "add", "change", "delete"];

/// Default verb prefixed to free-text queries.
pub const DEFAULT_VERB: &str = "query";

/// Session-closing command, written best-effort at teardown.
pub const QUIT: &str = "quit";

/// Build the identity command sent in response to the banner.
pub fn id_command(client_id: &str) -> String {
    format!("id {client_id}")
}

/// Normalize caller-supplied query text into a wire command.
///
/// Trims surrounding whitespace; if the text does not already begin
/// with a recognized verb, prefixes the default query verb.
pub fn normalize_query(text: &str) -> String {
    let trimmed = text.trim();
    if has_verb_prefix(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_VERB} {trimmed}")
    }
}

/// True if the text starts with a recognized verb followed by
/// whitespace or end-of-string. Verbs match case-insensitively, as the
/// server lowercases keywords.
fn has_verb_prefix(text: &str) -> bool {
    RECOGNIZED_VERBS.iter().any(|verb| match text.get(..verb.len()) {
        Some(head) if head.eq_ignore_ascii_case(verb) => text[verb.len()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace),
        _ => false,
    })
}

/// Quote a field value for interpolation into a command line.
///
/// Backslashes and double quotes are backslash-escaped; the server's
/// tokenizer unescapes both.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn pairs(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(name, value)| format!("{name}={}", quote(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an `add` command from structured fields.
pub fn add_command(fields: &[(&str, &str)]) -> String {
    format!("add {}", pairs(fields))
}

/// Build a `change` command: selections pick the records to modify,
/// modifications follow the `make` keyword (`force` overrides it when
/// the change must apply regardless of match count).
pub fn change_command(
    selections: &[(&str, &str)],
    modifications: &[(&str, &str)],
    force: bool,
) -> String {
    let keyword = if force { "force" } else { "make" };
    format!("change {} {keyword} {}", pairs(selections), pairs(modifications))
}

/// Build a `delete` command from selection fields.
pub fn delete_command(selections: &[(&str, &str)]) -> String {
    format!("delete {}", pairs(selections))
}
