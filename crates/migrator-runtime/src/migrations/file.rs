use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use migrator_core::error::{MigratorError, Result};

/// A migration script read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// File name including extension (e.g. "001_init.sql").
    pub name: String,
    /// Full path the content was read from.
    pub path: PathBuf,
    /// 0-based position in execution order.
    pub position: usize,
    /// Raw file content.
    pub content: String,
}

impl MigrationFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            position: 0,
            content: content.into(),
        }
    }
}

/// Load migration files from a directory.
///
/// Files are sorted by name as plain strings, so `10_b.sql` runs before
/// `2_a.sql`. Name migrations with zero-padded prefixes of equal width.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<MigrationFile>> {
    if !dir.exists() {
        warn!("Migrations directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(MigratorError::Discovery(format!(
            "Migrations path is not a directory: {}",
            dir.display()
        )));
    }

    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut found = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let name = entry.file_name().into_string().map_err(|raw| {
            MigratorError::Discovery(format!("Non UTF-8 migration filename: {:?}", raw))
        })?;

        if name.ends_with(&suffix) {
            found.push((name, path));
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    warn_on_uneven_prefixes(found.iter().map(|(name, _)| name.as_str()));

    let mut migrations = Vec::with_capacity(found.len());
    for (position, (name, path)) in found.into_iter().enumerate() {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MigratorError::Discovery(format!("Failed to read {}: {}", path.display(), e))
        })?;

        migrations.push(MigrationFile {
            name,
            path,
            position,
            content,
        });
    }

    debug!("Discovered {} migrations in {:?}", migrations.len(), dir);
    Ok(migrations)
}

/// Leading ASCII digits of a file name, if any.
fn numeric_prefix(name: &str) -> Option<&str> {
    let end = name
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    (end > 0).then(|| &name[..end])
}

fn warn_on_uneven_prefixes<'a>(names: impl Iterator<Item = &'a str>) {
    let mut width = None;
    for name in names {
        let Some(prefix) = numeric_prefix(name) else {
            continue;
        };
        match width {
            None => width = Some(prefix.len()),
            Some(w) if w != prefix.len() => {
                warn!(
                    "Migration prefixes have mixed widths ({} vs {} digits in {}); \
                     files run in name order, not numeric order",
                    w,
                    prefix.len(),
                    name
                );
                return;
            }
            Some(_) => {}
        }
    }
}
