//! In-memory executors for exercising the runner without PostgreSQL.

use std::collections::HashSet;

use crate::db::{ExecutionError, StatementExecutor};

/// Executor that fails statements matching scripted patterns.
///
/// Every statement is recorded, whether it succeeds or not.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    rules: Vec<(String, ExecutionError)>,
    executed: Vec<String>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any statement containing `pattern` with `error`.
    ///
    /// Rules are checked in the order they were added.
    pub fn fail_when(mut self, pattern: impl Into<String>, error: ExecutionError) -> Self {
        self.rules.push((pattern.into(), error));
        self
    }

    /// Statements seen so far, in execution order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }
}

impl StatementExecutor for ScriptedExecutor {
    async fn execute(&mut self, sql: &str) -> Result<(), ExecutionError> {
        self.executed.push(sql.to_string());

        match self.rules.iter().find(|(pattern, _)| sql.contains(pattern.as_str())) {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Executor that tracks created relations the way PostgreSQL reports them.
///
/// Understands `CREATE TABLE|INDEX|SCHEMA [IF NOT EXISTS] name`,
/// `DROP TABLE|INDEX|SCHEMA [IF EXISTS] name` and `ALTER TABLE name`.
/// Everything else succeeds without effect.
#[derive(Debug, Clone, Default)]
pub struct CatalogExecutor {
    objects: HashSet<String>,
    executed: Vec<String>,
}

impl CatalogExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains(&name.to_ascii_lowercase())
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn apply(&mut self, sql: &str) -> Result<(), ExecutionError> {
        let words: Vec<String> = sql
            .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_ascii_lowercase())
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        match words.as_slice() {
            ["create", "unique", "index", rest @ ..] | ["create", "index", rest @ ..] => {
                self.create_object(rest)
            }
            ["create", "table" | "schema", rest @ ..] => self.create_object(rest),
            ["drop", "table" | "index" | "schema", rest @ ..] => self.drop_object(rest),
            ["alter", "table", rest @ ..] => {
                let (guarded, rest) = strip_guard(rest, &["if", "exists"]);
                match rest.first() {
                    Some(name) if !self.objects.contains(*name) && !guarded => {
                        Err(undefined(name))
                    }
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    fn create_object(&mut self, rest: &[&str]) -> Result<(), ExecutionError> {
        let (guarded, rest) = strip_guard(rest, &["if", "not", "exists"]);
        let Some(name) = rest.first() else {
            return Err(ExecutionError::with_code("42601", "syntax error at end of input"));
        };

        if !self.objects.insert(name.to_string()) && !guarded {
            return Err(ExecutionError::with_code(
                "42P07",
                format!("relation \"{}\" already exists", name),
            ));
        }
        Ok(())
    }

    fn drop_object(&mut self, rest: &[&str]) -> Result<(), ExecutionError> {
        let (guarded, rest) = strip_guard(rest, &["if", "exists"]);
        let Some(name) = rest.first() else {
            return Err(ExecutionError::with_code("42601", "syntax error at end of input"));
        };

        if !self.objects.remove(*name) && !guarded {
            return Err(undefined(name));
        }
        Ok(())
    }
}

fn strip_guard<'a, 'b>(words: &'a [&'b str], guard: &[&str]) -> (bool, &'a [&'b str]) {
    if words.len() >= guard.len() && words[..guard.len()] == *guard {
        (true, &words[guard.len()..])
    } else {
        (false, words)
    }
}

fn undefined(name: &str) -> ExecutionError {
    ExecutionError::with_code("42P01", format!("relation \"{}\" does not exist", name))
}

impl StatementExecutor for CatalogExecutor {
    async fn execute(&mut self, sql: &str) -> Result<(), ExecutionError> {
        self.executed.push(sql.to_string());
        self.apply(sql)
    }
}
