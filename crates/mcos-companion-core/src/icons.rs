//! Icon directory access.
//!
//! The directory is listed fresh on every call. Icon names are bare filenames:
//! anything that could address a path outside the directory is treated as missing.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::catalog::Catalog;

pub const ICON_EXTENSION: &str = "svg";
pub const ICON_CONTENT_TYPE: &str = "image/svg+xml";

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("icon not found")]
    NotFound,
    #[error("icon directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A desktop entry whose icon is present, as returned by `/desktop-icons`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesktopIcon {
    pub id: String,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone)]
pub struct IconDirectory {
    root: PathBuf,
}

impl IconDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the `.svg` regular files (or links to them) currently in the directory.
    pub async fn list_icons(&self) -> Result<HashSet<String>, IconError> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|source| self.io_error(source))?;
        let mut names = HashSet::new();
        while let Some(entry) = dir.next_entry().await.map_err(|source| self.io_error(source))? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !has_icon_extension(&name) {
                continue;
            }
            // Follows symlinks; dangling links and links to directories are skipped.
            match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => {
                    names.insert(name);
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(self.io_error(source)),
            }
        }
        Ok(names)
    }

    /// Catalog entries whose icon file is present, in catalog order.
    /// `icon_base` is prefixed to `/icons/{file}` to build the icon URL.
    pub async fn desktop_icons(
        &self,
        catalog: &Catalog,
        icon_base: &str,
    ) -> Result<Vec<DesktopIcon>, IconError> {
        let available = self.list_icons().await?;
        let base = icon_base.trim_end_matches('/');
        Ok(catalog
            .entries()
            .iter()
            .filter(|e| available.contains(&e.icon_file))
            .map(|e| DesktopIcon {
                id: e.id.clone(),
                name: e.display_name.clone(),
                icon: format!("{}/icons/{}", base, e.icon_file),
            })
            .collect())
    }

    /// Resolve a client-supplied name to a path directly inside the directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if is_bare_name(name) {
            Some(self.root.join(name))
        } else {
            None
        }
    }

    /// Read an icon's bytes. Non-bare names, missing files and non-files are `NotFound`.
    pub async fn read_icon(&self, name: &str) -> Result<Vec<u8>, IconError> {
        let path = self.resolve(name).ok_or(IconError::NotFound)?;
        let meta = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(IconError::NotFound),
            Err(source) => return Err(IconError::Io { path, source }),
        };
        if !meta.is_file() {
            return Err(IconError::NotFound);
        }
        tokio::fs::read(&path).await.map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => IconError::NotFound,
            _ => IconError::Io { path, source },
        })
    }

    fn io_error(&self, source: io::Error) -> IconError {
        IconError::Io {
            path: self.root.clone(),
            source,
        }
    }
}

fn has_icon_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ICON_EXTENSION))
}

/// True for a single path component that stays inside its parent directory.
pub fn is_bare_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
