//! Printing and persisting rendered manifests

use crate::error::{AppError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Both documents, fully rendered in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedManifests {
    pub groups_yaml: String,
    pub users_yaml: String,
    pub group_count: usize,
    pub user_count: usize,
}

/// Print both documents, each preceded by a comment naming its destination
pub fn print_manifests(
    manifests: &RenderedManifests,
    groups_path: &Path,
    users_path: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    let io_err = |e: std::io::Error| AppError::Output(format!("Failed to print manifests: {}", e));

    writeln!(out, "# {}", groups_path.display()).map_err(io_err)?;
    out.write_all(manifests.groups_yaml.as_bytes())
        .map_err(io_err)?;
    writeln!(out, "\n# {}", users_path.display()).map_err(io_err)?;
    out.write_all(manifests.users_yaml.as_bytes())
        .map_err(io_err)?;
    out.flush().map_err(io_err)
}

/// Write both documents.
///
/// Each document goes to a temporary sibling first; the files are only
/// renamed into place once both temporaries exist.
pub fn write_manifests(
    manifests: &RenderedManifests,
    groups_path: &Path,
    users_path: &Path,
) -> Result<()> {
    let groups_tmp = write_temp(groups_path, &manifests.groups_yaml)?;
    let users_tmp = match write_temp(users_path, &manifests.users_yaml) {
        Ok(tmp) => tmp,
        Err(e) => {
            let _ = fs::remove_file(&groups_tmp);
            return Err(e);
        }
    };

    persist(&groups_tmp, groups_path)?;
    persist(&users_tmp, users_path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_temp(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Output(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, content)
        .map_err(|e| AppError::Output(format!("Failed to write {}: {}", tmp.display(), e)))?;
    Ok(tmp)
}

fn persist(tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        AppError::Output(format!("Failed to write {}: {}", path.display(), e))
    })
}
