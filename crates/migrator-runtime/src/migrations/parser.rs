//! Splitting migration files into executable statements.
//!
//! Two splitters are available:
//!
//! - [`SplitMode::Heuristic`] strips `--` comments line by line and cuts at a
//!   `;` that ends a line (trailing spaces allowed) or the input. It knows
//!   nothing about string literals or procedural bodies: a line ending in `;`
//!   inside a `$$ ... $$` body ends the statement early, and `--` inside a
//!   literal is removed as a comment. Two statements sharing a line stay one
//!   statement, which PostgreSQL still runs in order under the simple query
//!   protocol. A failure in either part fails the whole line: in
//!   `CREATE TABLE x (c INT); CREATE INDEX IF NOT EXISTS idx ON x(c);` an
//!   existing `x` skips the line and the index is never attempted. Put one
//!   statement per line, or use the tokenizer, to get per-statement skips.
//! - [`SplitMode::Tokenizer`] scans quotes, dollar quotes and comments and cuts
//!   at every top-level `;`.

pub use migrator_core::config::SplitMode;

/// One executable unit of SQL extracted from a migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based position within its file.
    pub ordinal: usize,
    /// Trimmed statement text without the terminating semicolon.
    pub sql: String,
}

/// Split `sql` into statements using `mode`.
pub fn split_statements(sql: &str, mode: SplitMode) -> Vec<Statement> {
    let pieces = match mode {
        SplitMode::Heuristic => split_heuristic(&strip_line_comments(sql)),
        SplitMode::Tokenizer => split_tokenized(sql),
    };

    pieces
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, sql)| Statement {
            ordinal: i + 1,
            sql,
        })
        .collect()
}

/// Remove everything from the first `--` on each line to the end of that line.
fn strip_line_comments(sql: &str) -> String {
    sql.lines()
        .map(|line| match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_heuristic(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;

    for (idx, c) in sql.char_indices() {
        if c != ';' {
            continue;
        }

        let rest = &sql[idx + 1..];
        let after_blanks = rest.trim_start_matches([' ', '\t', '\r']);
        if after_blanks.is_empty() || after_blanks.starts_with('\n') {
            statements.push(sql[start..idx].to_string());
            start = idx + 1;
        }
    }

    if start < sql.len() {
        statements.push(sql[start..].to_string());
    }

    statements
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Read a dollar-quote tag (`$$` or `$name$`) starting at `chars[at]`.
fn dollar_tag(chars: &[char], at: usize) -> Option<String> {
    if at > 0 && is_ident_char(chars[at - 1]) {
        return None;
    }

    let mut end = at + 1;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    if end >= chars.len() || chars[end] != '$' {
        return None;
    }
    // `$1` is a positional parameter, not a tag
    if end > at + 1 && chars[at + 1].is_ascii_digit() {
        return None;
    }

    Some(chars[at..=end].iter().collect())
}

fn starts_with_at(chars: &[char], at: usize, needle: &[char]) -> bool {
    chars.len() >= at + needle.len() && chars[at..at + needle.len()] == *needle
}

fn split_tokenized(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '-' if next == Some('-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if next == Some('*') => {
                // Block comments nest in PostgreSQL
                let mut depth = 1;
                i += 2;
                while i < chars.len() && depth > 0 {
                    if starts_with_at(&chars, i, &['/', '*']) {
                        depth += 1;
                        i += 2;
                    } else if starts_with_at(&chars, i, &['*', '/']) {
                        depth -= 1;
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                current.push(' ');
            }
            '\'' | '"' => {
                let escapes = c == '\''
                    && i > 0
                    && matches!(chars[i - 1], 'E' | 'e')
                    && (i < 2 || !is_ident_char(chars[i - 2]));
                current.push(c);
                i += 1;
                while i < chars.len() {
                    let q = chars[i];
                    current.push(q);
                    i += 1;
                    if escapes && q == '\\' {
                        if let Some(&escaped) = chars.get(i) {
                            current.push(escaped);
                            i += 1;
                        }
                    } else if q == c {
                        if chars.get(i) == Some(&c) {
                            current.push(c);
                            i += 1;
                        } else {
                            break;
                        }
                    }
                }
            }
            '$' => match dollar_tag(&chars, i) {
                Some(tag) => {
                    let tag_chars: Vec<char> = tag.chars().collect();
                    current.push_str(&tag);
                    i += tag_chars.len();
                    while i < chars.len() && !starts_with_at(&chars, i, &tag_chars) {
                        current.push(chars[i]);
                        i += 1;
                    }
                    if i < chars.len() {
                        current.push_str(&tag);
                        i += tag_chars.len();
                    }
                }
                None => {
                    current.push(c);
                    i += 1;
                }
            },
            ';' => {
                statements.push(std::mem::take(&mut current));
                i += 1;
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }

    statements.push(current);
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqls(sql: &str, mode: SplitMode) -> Vec<String> {
        split_statements(sql, mode)
            .into_iter()
            .map(|s| s.sql)
            .collect()
    }

    #[test]
    fn test_comment_stripping() {
        let stmts = split_statements("-- comment\nSELECT 1;", SplitMode::Heuristic);
        assert_eq!(
            stmts,
            vec![Statement {
                ordinal: 1,
                sql: "SELECT 1".into()
            }]
        );
    }

    #[test]
    fn test_heuristic_preserves_order() {
        let sql = "CREATE TABLE x (c INT);\nCREATE INDEX IF NOT EXISTS idx ON x(c);\n";
        let stmts = split_statements(sql, SplitMode::Heuristic);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].ordinal, 1);
        assert_eq!(stmts[0].sql, "CREATE TABLE x (c INT)");
        assert_eq!(stmts[1].ordinal, 2);
        assert_eq!(stmts[1].sql, "CREATE INDEX IF NOT EXISTS idx ON x(c)");
    }

    #[test]
    fn test_heuristic_trailing_comment_after_semicolon() {
        let sql = "ALTER TABLE offers ADD COLUMN payout NUMERIC; -- cents\nSELECT 2;";
        assert_eq!(
            sqls(sql, SplitMode::Heuristic),
            vec!["ALTER TABLE offers ADD COLUMN payout NUMERIC", "SELECT 2"]
        );
    }

    #[test]
    fn test_heuristic_crlf_line_endings() {
        let sql = "SELECT 1;\r\nSELECT 2;\r\n";
        assert_eq!(sqls(sql, SplitMode::Heuristic), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_heuristic_same_line_stays_together() {
        let sql = "SELECT 1; SELECT 2;";
        assert_eq!(sqls(sql, SplitMode::Heuristic), vec!["SELECT 1; SELECT 2"]);
    }

    #[test]
    fn test_heuristic_ddl_pair_on_one_line_is_one_statement() {
        let sql = "CREATE TABLE x (c INT); CREATE INDEX IF NOT EXISTS idx ON x(c);";
        let statements = split_statements(sql, SplitMode::Heuristic);
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "CREATE TABLE x (c INT); CREATE INDEX IF NOT EXISTS idx ON x(c)"
        );

        let sql = "CREATE TABLE x (c INT);\nCREATE INDEX IF NOT EXISTS idx ON x(c);";
        assert_eq!(split_statements(sql, SplitMode::Heuristic).len(), 2);
    }

    #[test]
    fn test_heuristic_multiline_statement() {
        let sql = "CREATE TABLE offers (\n  id SERIAL PRIMARY KEY,\n  title TEXT NOT NULL\n);\n";
        let stmts = sqls(sql, SplitMode::Heuristic);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].starts_with("CREATE TABLE offers ("));
        assert!(stmts[0].ends_with(')'));
    }

    #[test]
    fn test_heuristic_last_statement_without_semicolon() {
        assert_eq!(
            sqls("SELECT 1;\nSELECT 2", SplitMode::Heuristic),
            vec!["SELECT 1", "SELECT 2"]
        );
    }

    #[test]
    fn test_heuristic_drops_empty_statements() {
        let sql = "\n;\n  ;\n-- nothing here\nSELECT 1;\n\n";
        let stmts = split_statements(sql, SplitMode::Heuristic);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].ordinal, 1);
    }

    #[test]
    fn test_heuristic_breaks_dollar_quoted_bodies() {
        let sql = "CREATE FUNCTION f() RETURNS void AS $$\nBEGIN\n  PERFORM 1;\nEND;\n$$ LANGUAGE plpgsql;\n";
        // Known limitation: the body is cut at each line-ending semicolon.
        assert_eq!(split_statements(sql, SplitMode::Heuristic).len(), 3);
    }

    #[test]
    fn test_heuristic_strips_comment_marker_inside_literal() {
        let sql = "INSERT INTO notes VALUES ('a--b');\n";
        assert_eq!(
            sqls(sql, SplitMode::Heuristic),
            vec!["INSERT INTO notes VALUES ('a"]
        );
    }

    #[test]
    fn test_tokenizer_splits_on_same_line() {
        let sql = "CREATE TABLE x (c INT); CREATE INDEX IF NOT EXISTS idx ON x(c);";
        assert_eq!(
            sqls(sql, SplitMode::Tokenizer),
            vec![
                "CREATE TABLE x (c INT)",
                "CREATE INDEX IF NOT EXISTS idx ON x(c)"
            ]
        );
    }

    #[test]
    fn test_tokenizer_with_dollar_quoted_function() {
        let sql = r#"
CREATE FUNCTION touch() RETURNS trigger AS $$
BEGIN
    NEW.updated_at := NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

SELECT 3;
"#;
        let stmts = sqls(sql, SplitMode::Tokenizer);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("NEW.updated_at := NOW();"));
        assert!(stmts[0].ends_with("$$ LANGUAGE plpgsql"));
        assert_eq!(stmts[1], "SELECT 3");
    }

    #[test]
    fn test_tokenizer_named_dollar_tag() {
        let sql = "DO $body$ BEGIN RAISE NOTICE 'a;b'; END $body$;\nSELECT 1;";
        let stmts = sqls(sql, SplitMode::Tokenizer);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "DO $body$ BEGIN RAISE NOTICE 'a;b'; END $body$");
    }

    #[test]
    fn test_tokenizer_string_literals() {
        let sql = "INSERT INTO t VALUES ('semi;colon', 'it''s; fine', 'x--y');\nSELECT 2;";
        let stmts = sqls(sql, SplitMode::Tokenizer);
        assert_eq!(
            stmts,
            vec![
                "INSERT INTO t VALUES ('semi;colon', 'it''s; fine', 'x--y')",
                "SELECT 2"
            ]
        );
    }

    #[test]
    fn test_tokenizer_escape_string() {
        let sql = r"SELECT E'back\'slash;';SELECT 2;";
        let stmts = sqls(sql, SplitMode::Tokenizer);
        assert_eq!(stmts, vec![r"SELECT E'back\'slash;'", "SELECT 2"]);
    }

    #[test]
    fn test_tokenizer_quoted_identifier() {
        let sql = r#"CREATE TABLE "odd;name" (id INT); SELECT 1"#;
        let stmts = sqls(sql, SplitMode::Tokenizer);
        assert_eq!(stmts[0], r#"CREATE TABLE "odd;name" (id INT)"#);
        assert_eq!(stmts[1], "SELECT 1");
    }

    #[test]
    fn test_tokenizer_comments() {
        let sql = "/* header; /* nested; */ still comment */\nSELECT 1; -- trailing; note\nSELECT 2;";
        assert_eq!(sqls(sql, SplitMode::Tokenizer), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_tokenizer_positional_parameter_is_not_a_tag() {
        let sql = "PREPARE q AS SELECT $1; SELECT 2;";
        assert_eq!(
            sqls(sql, SplitMode::Tokenizer),
            vec!["PREPARE q AS SELECT $1", "SELECT 2"]
        );
    }
}
