//! Quote-aware splitting of migration bodies into statements.

/// Longest statement prefix written to logs.
pub const STATEMENT_PREVIEW_CHARS: usize = 100;

/// Split `sql` on semicolons that sit outside quoted strings.
///
/// Single and double quotes open a string; only the same quote character
/// closes it. A quote preceded by a backslash never toggles string state.
/// Statements are trimmed, whitespace-only statements are dropped, and
/// trailing text without a terminating semicolon becomes the last statement.
///
/// # Examples
///
/// ```
/// use backend::domain::split_statements;
///
/// let statements = split_statements("INSERT INTO t VALUES ('a;b'); UPDATE t SET x=1;");
/// assert_eq!(
///     statements,
///     vec!["INSERT INTO t VALUES ('a;b')", "UPDATE t SET x=1"]
/// );
/// ```
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut open_quote: Option<char> = None;
    let mut previous: Option<char> = None;

    for ch in sql.chars() {
        if matches!(ch, '\'' | '"') && previous != Some('\\') {
            match open_quote {
                None => open_quote = Some(ch),
                Some(quote) if quote == ch => open_quote = None,
                Some(_) => {}
            }
        }
        previous = Some(ch);

        if ch == ';' && open_quote.is_none() {
            push_statement(&mut statements, &current);
            current.clear();
            continue;
        }
        current.push(ch);
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_owned());
    }
}

/// Shorten a statement for logging, appending `...` when truncated.
pub fn statement_preview(statement: &str) -> String {
    match statement.char_indices().nth(STATEMENT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &statement[..cut]),
        None => statement.to_owned(),
    }
}
