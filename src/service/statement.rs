/// Scanner position while looking for statement terminators
#[derive(Clone, Copy, PartialEq)]
enum ScanState {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split SQL text into statements on `;`.
///
/// Terminators inside quoted literals, identifiers and comments are ignored.
/// Fragments holding nothing but whitespace or comments are dropped, and a
/// trailing statement without a terminator is kept.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_content = false;
    let mut state = ScanState::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Code => match c {
                ';' => {
                    flush(&mut statements, &mut current, &mut has_content);
                    continue;
                }
                '\'' | '"' | '`' => {
                    state = ScanState::Quoted(c);
                    has_content = true;
                }
                '-' if chars.peek() == Some(&'-') => state = ScanState::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    current.push(c);
                    current.extend(chars.next());
                    state = ScanState::BlockComment;
                    continue;
                }
                c if !c.is_whitespace() => has_content = true,
                _ => {}
            },
            ScanState::Quoted(quote) => {
                if c == quote {
                    // Doubled quote is an escaped quote, not the end
                    if chars.peek() == Some(&quote) {
                        current.push(c);
                        current.extend(chars.next());
                        continue;
                    }
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    current.push(c);
                    current.extend(chars.next());
                    state = ScanState::Code;
                    continue;
                }
            }
        }
        current.push(c);
    }

    flush(&mut statements, &mut current, &mut has_content);
    statements
}

fn flush(statements: &mut Vec<String>, current: &mut String, has_content: &mut bool) {
    if *has_content {
        statements.push(current.trim().to_string());
    }
    current.clear();
    *has_content = false;
}

/// Single-line preview of a statement for log and error output
pub fn preview(statement: &str, max_chars: usize) -> String {
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let mut cut: String = flat.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

/// Whether `statement` opens or closes a top-level transaction
/// (`BEGIN`, `COMMIT` or `END`, with any modifiers).
///
/// Leading comments are skipped. `ROLLBACK`, `SAVEPOINT` and `RELEASE` are
/// not matched.
pub fn is_transaction_control(statement: &str) -> bool {
    let keyword = leading_keyword(statement).to_ascii_uppercase();
    matches!(keyword.as_str(), "BEGIN" | "COMMIT" | "END")
}

fn leading_keyword(statement: &str) -> &str {
    let mut rest = statement.trim_start();
    loop {
        if let Some(comment) = rest.strip_prefix("--") {
            rest = comment.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = comment.split_once("*/").map_or("", |(_, after)| after);
        } else {
            break;
        }
        rest = rest.trim_start();
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}
