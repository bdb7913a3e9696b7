use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use crate::domain::AssetCategory;
use crate::error::CatalogError;

/// Managed copy of user-selected files under `<root>/{images,audio,maps}`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: Utf8PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn category_dir(&self, category: AssetCategory) -> Utf8PathBuf {
        self.root.join(category.dir_name())
    }

    /// Copies `source` into the category directory and returns the stored path.
    ///
    /// A name that is already taken gets `_1`, `_2`, ... appended before the
    /// extension. Existing files are never replaced.
    pub fn store(
        &self,
        source: &Utf8Path,
        category: AssetCategory,
    ) -> Result<Utf8PathBuf, CatalogError> {
        let meta = fs::metadata(source.as_std_path()).map_err(|err| CatalogError::AssetSource {
            path: source.to_string(),
            message: err.to_string(),
        })?;
        if !meta.is_file() {
            return Err(CatalogError::AssetSource {
                path: source.to_string(),
                message: "not a regular file".to_string(),
            });
        }
        let file_name = source.file_name().ok_or_else(|| CatalogError::AssetSource {
            path: source.to_string(),
            message: "missing file name".to_string(),
        })?;

        let dest_dir = self.category_dir(category);
        fs::create_dir_all(dest_dir.as_std_path())
            .map_err(|err| CatalogError::Filesystem(format!("create {dest_dir}: {err}")))?;

        let mut temp = Builder::new()
            .prefix(".frogcat-asset")
            .tempfile_in(dest_dir.as_std_path())
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        copy_into(source, &mut temp)?;

        let mut counter = 0u32;
        loop {
            let candidate = dest_dir.join(numbered_name(file_name, counter));
            match temp.persist_noclobber(candidate.as_std_path()) {
                Ok(_) => {
                    if counter > 0 {
                        debug!(%source, %candidate, "asset name taken, stored under suffix");
                    }
                    info!(%category, path = %candidate, "asset stored");
                    return Ok(candidate);
                }
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    temp = err.file;
                    counter += 1;
                }
                Err(err) => {
                    return Err(CatalogError::Filesystem(format!(
                        "persist {candidate}: {}",
                        err.error
                    )));
                }
            }
        }
    }
}

fn copy_into(source: &Utf8Path, temp: &mut NamedTempFile) -> Result<(), CatalogError> {
    let mut input = fs::File::open(source.as_std_path()).map_err(|err| CatalogError::AssetSource {
        path: source.to_string(),
        message: err.to_string(),
    })?;
    io::copy(&mut input, temp.as_file_mut())
        .map_err(|err| CatalogError::Filesystem(format!("copy {source}: {err}")))?;
    Ok(())
}

/// `call.mp3` -> `call.mp3`, `call_1.mp3`, `call_2.mp3`, ...
fn numbered_name(file_name: &str, counter: u32) -> String {
    if counter == 0 {
        return file_name.to_string();
    }
    let path = Utf8Path::new(file_name);
    let stem = path.file_stem().unwrap_or(file_name);
    match path.extension() {
        Some(ext) => format!("{stem}_{counter}.{ext}"),
        None => format!("{stem}_{counter}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_names() {
        assert_eq!(numbered_name("call.mp3", 0), "call.mp3");
        assert_eq!(numbered_name("call.mp3", 1), "call_1.mp3");
        assert_eq!(numbered_name("range.tar.gz", 2), "range.tar_2.gz");
        assert_eq!(numbered_name("README", 3), "README_3");
        assert_eq!(numbered_name(".hidden", 1), ".hidden_1");
    }

    #[test]
    fn category_layout() {
        let store = AssetStore::new("data");
        assert!(store.category_dir(AssetCategory::Images).ends_with("images"));
        assert!(store.category_dir(AssetCategory::Audio).ends_with("audio"));
        assert!(store.category_dir(AssetCategory::Maps).ends_with("maps"));
    }
}
