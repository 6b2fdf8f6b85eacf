use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    error::{ClientError, Result},
    types::{FileEntry, SelectionBatch, SelectionMode},
};

/// Build a batch descriptor from the current selection
///
/// Pure over its inputs. An empty selection yields an empty batch, which the
/// uploader refuses.
pub fn normalize(entries: Vec<FileEntry>, mode: SelectionMode) -> SelectionBatch {
    let total_size_bytes = entries.iter().map(|e| e.size).sum();

    let mut extension_counts = BTreeMap::new();
    for entry in &entries {
        *extension_counts.entry(entry.extension()).or_insert(0) += 1;
    }

    let root_directory_name = match mode {
        SelectionMode::Directory => entries
            .iter()
            .find_map(|e| e.relative_path.as_deref())
            .and_then(|path| path.split('/').next())
            .filter(|segment| !segment.is_empty())
            .map(String::from),
        SelectionMode::Files => None,
    };

    SelectionBatch {
        entries,
        mode,
        total_size_bytes,
        extension_counts,
        root_directory_name,
    }
}

/// Read individual files from disk
///
/// Entries keep the order of `paths` and carry no relative path.
pub async fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        let name = file_name(path)?;
        let content = fs::read(path).await?;
        debug!(path = %path.display(), size = content.len(), "Loaded file");
        entries.push(FileEntry::new(name, Bytes::from(content)));
    }

    Ok(entries)
}

/// Read every file below `root`
///
/// Relative paths start with the name of `root` itself and use `/` as separator.
pub async fn load_directory(root: &Path) -> Result<Vec<FileEntry>> {
    let root_name = file_name(root)?;
    let files = collect_files(root)?;

    let mut entries = Vec::with_capacity(files.len());
    for (path, relative) in files {
        let content = fs::read(&path).await?;
        let name = file_name(&path)?;
        entries.push(
            FileEntry::new(name, Bytes::from(content))
                .with_relative_path(format!("{}/{}", root_name, relative)),
        );
    }

    debug!(root = %root.display(), files = entries.len(), "Loaded directory");
    Ok(entries)
}

fn collect_files(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    if !root.is_dir() {
        return Err(ClientError::validation(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ClientError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ClientError::validation(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((entry.path().to_path_buf(), relative));
    }

    Ok(files)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ClientError::validation(format!("{} has no file name", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, size: usize) -> FileEntry {
        FileEntry::new(name, vec![b'x'; size])
    }

    #[test]
    fn test_totals_and_histogram() {
        let batch = normalize(
            vec![entry("a.py", 10), entry("b.PY", 20), entry("README", 5)],
            SelectionMode::Files,
        );

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.total_size_bytes, 35);
        assert_eq!(batch.extension_counts.get("py"), Some(&2));
        assert_eq!(batch.extension_counts.get(""), Some(&1));
        assert_eq!(batch.extension_counts.values().sum::<usize>(), 3);
    }

    #[test]
    fn test_root_directory_from_first_relative_path() {
        let batch = normalize(
            vec![
                entry("a.txt", 1).with_relative_path("root/a.txt"),
                entry("b.txt", 1).with_relative_path("root/sub/b.txt"),
            ],
            SelectionMode::Directory,
        );

        assert_eq!(batch.root_directory_name.as_deref(), Some("root"));
    }

    #[test]
    fn test_files_mode_has_no_root() {
        let batch = normalize(
            vec![entry("root/a.txt", 1).with_relative_path("root/a.txt")],
            SelectionMode::Files,
        );

        assert!(batch.root_directory_name.is_none());
    }

    #[test]
    fn test_directory_mode_without_relative_paths() {
        let batch = normalize(vec![entry("a.txt", 1)], SelectionMode::Directory);
        assert!(batch.root_directory_name.is_none());
    }

    #[test]
    fn test_empty_selection() {
        let batch = normalize(Vec::new(), SelectionMode::Files);

        assert!(batch.is_empty());
        assert_eq!(batch.total_size_bytes, 0);
        assert!(batch.extension_counts.is_empty());
    }

    #[tokio::test]
    async fn test_load_directory_prefixes_root_name() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().join("project");
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("Cargo.toml"), b"[package]").unwrap();
        std::fs::write(root.join("src/main.rs"), b"fn main() {}").unwrap();

        let entries = load_directory(&root).await.unwrap();
        let paths: Vec<_> = entries
            .iter()
            .map(|e| e.relative_path.clone().unwrap())
            .collect();

        assert_eq!(paths, vec!["project/Cargo.toml", "project/src/main.rs"]);
        assert_eq!(entries[1].name, "main.rs");
        assert_eq!(entries[1].size, 12);

        let batch = normalize(entries, SelectionMode::Directory);
        assert_eq!(batch.root_directory_name.as_deref(), Some("project"));
    }

    #[tokio::test]
    async fn test_load_files_keeps_order() {
        let temp = tempfile::TempDir::new().unwrap();
        let b = temp.path().join("b.go");
        let a = temp.path().join("a.GO");
        std::fs::write(&b, b"package b").unwrap();
        std::fs::write(&a, b"package a").unwrap();

        let entries = load_files(&[b, a]).await.unwrap();
        assert_eq!(entries[0].name, "b.go");
        assert!(entries.iter().all(|e| e.relative_path.is_none()));

        let batch = normalize(entries, SelectionMode::Files);
        assert_eq!(batch.extension_counts.get("go"), Some(&2));
        assert_eq!(batch.total_size_bytes, 18);
    }

    #[tokio::test]
    async fn test_load_directory_rejects_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("single.txt");
        std::fs::write(&file, b"hi").unwrap();

        assert!(matches!(
            load_directory(&file).await,
            Err(ClientError::Validation { .. })
        ));
    }
}
