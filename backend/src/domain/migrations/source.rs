//! Discovery of migration files on disk.

use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use super::{Migration, MigrationError};

const SQL_EXTENSION: &str = "sql";

/// Recursively read every `*.sql` file under `root`, sorted by version.
///
/// # Errors
///
/// Returns [`MigrationError::Read`] when a directory or file cannot be read,
/// [`MigrationError::InvalidFileName`] for a file name without an
/// underscore, and [`MigrationError::DuplicateVersion`] when two files share
/// a version.
pub fn load_migrations(root: &Path) -> Result<Vec<Migration>, MigrationError> {
    let dir = Dir::open_ambient_dir(root, ambient_authority())
        .map_err(|error| MigrationError::read(root, error))?;
    let mut migrations = Vec::new();
    collect(&dir, root, &mut migrations)?;

    migrations.sort_by(|left, right| left.version().cmp(right.version()));
    if let Some(pair) = migrations
        .windows(2)
        .find(|pair| pair[0].version() == pair[1].version())
    {
        return Err(MigrationError::DuplicateVersion {
            version: pair[0].version().to_owned(),
        });
    }
    Ok(migrations)
}

fn collect(dir: &Dir, path: &Path, out: &mut Vec<Migration>) -> Result<(), MigrationError> {
    let entries = dir
        .entries()
        .map_err(|error| MigrationError::read(path, error))?;
    for entry in entries {
        let entry = entry.map_err(|error| MigrationError::read(path, error))?;
        let name = entry.file_name();
        let entry_path: PathBuf = path.join(&name);
        let file_type = entry
            .file_type()
            .map_err(|error| MigrationError::read(&entry_path, error))?;

        if file_type.is_dir() {
            let child = dir
                .open_dir(&name)
                .map_err(|error| MigrationError::read(&entry_path, error))?;
            collect(&child, &entry_path, out)?;
            continue;
        }
        if Path::new(&name).extension().and_then(|ext| ext.to_str()) != Some(SQL_EXTENSION) {
            continue;
        }

        let file_name = name.to_string_lossy();
        let body = dir
            .read_to_string(&name)
            .map_err(|error| MigrationError::read(&entry_path, error))?;
        let migration = Migration::from_file(&file_name, body)?;
        debug!(
            version = migration.version(),
            path = %entry_path.display(),
            "found migration"
        );
        out.push(migration);
    }
    Ok(())
}
