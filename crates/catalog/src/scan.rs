//! Recursive library scanning and path resolution

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A configured library root with its display category
#[derive(Debug, Clone)]
pub struct MediaRoot {
    /// Directory to scan
    pub path: PathBuf,
    /// Label attached to every file found under this root, e.g. "Movie"
    pub category: String,
}

impl MediaRoot {
    pub fn new(path: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category: category.into(),
        }
    }
}

/// One servable file found under a media root
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Bare filename
    pub name: String,
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the root it was found under
    pub relative_path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
    /// Size in megabytes, rounded to two decimals
    pub size_mb: f64,
    /// Category of the root this file belongs to
    pub category: String,
}

/// Walk every root and collect servable files
///
/// Roots that do not exist are skipped with a warning rather than failing
/// the whole scan. `allowed_extensions` filters case-insensitively; an empty
/// list allows everything. Entries are ordered by (category, relative path).
pub fn list_files(roots: &[MediaRoot], allowed_extensions: &[String]) -> Vec<FileEntry> {
    let mut files = Vec::new();

    for root in roots {
        if !root.path.exists() {
            tracing::warn!("media root does not exist: {}", root.path.display());
            continue;
        }

        for entry in WalkDir::new(&root.path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if !extension_allowed(entry.path(), allowed_extensions) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };

            let relative_path = entry
                .path()
                .strip_prefix(&root.path)
                .unwrap_or(entry.path())
                .to_path_buf();
            let size_bytes = metadata.len();

            files.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path().to_path_buf(),
                relative_path,
                size_bytes,
                size_mb: (size_bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0,
                category: root.category.clone(),
            });
        }
    }

    files.sort_by(|a, b| {
        (a.category.as_str(), &a.relative_path).cmp(&(b.category.as_str(), &b.relative_path))
    });
    files
}

/// Resolve a requested path to a real file under one of the roots
///
/// Both sides are canonicalized, so `..` segments and symlinks cannot escape
/// the library. `None` for anything that does not resolve to an existing
/// file inside a root.
pub fn resolve_in_roots(roots: &[MediaRoot], requested: &Path) -> Option<PathBuf> {
    let resolved = requested.canonicalize().ok()?;
    if !resolved.is_file() {
        return None;
    }
    for root in roots {
        let Ok(root_resolved) = root.path.canonicalize() else {
            continue;
        };
        if resolved.starts_with(&root_resolved) {
            return Some(resolved);
        }
    }
    None
}

fn extension_allowed(path: &Path, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, len: usize) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, vec![0u8; len]).unwrap();
        path
    }

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lists_files_recursively() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.mkv", 10);
        write_file(dir.path(), "season1/e01.mkv", 20);

        let roots = vec![MediaRoot::new(dir.path(), "TV Show")];
        let files = list_files(&roots, &[]);

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].relative_path, PathBuf::from("a.mkv"));
        assert_eq!(files[1].relative_path, PathBuf::from("season1/e01.mkv"));
        assert_eq!(files[1].size_bytes, 20);
        assert_eq!(files[1].category, "TV Show");
    }

    #[test]
    fn test_extension_filter_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "film.MKV", 10);
        write_file(dir.path(), "notes.txt", 10);
        write_file(dir.path(), "noext", 10);

        let roots = vec![MediaRoot::new(dir.path(), "Movie")];
        let files = list_files(&roots, &exts(&["mkv", "mp4"]));

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "film.MKV");
    }

    #[test]
    fn test_empty_filter_allows_everything() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "anything.xyz", 1);
        write_file(dir.path(), "noext", 1);

        let roots = vec![MediaRoot::new(dir.path(), "Movie")];
        assert_eq!(list_files(&roots, &[]).len(), 2);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.mkv", 1);

        let roots = vec![
            MediaRoot::new("/nonexistent/library", "Movie"),
            MediaRoot::new(dir.path(), "TV Show"),
        ];
        let files = list_files(&roots, &[]);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_ordered_by_category_then_path() {
        let movies = TempDir::new().unwrap();
        let shows = TempDir::new().unwrap();
        write_file(movies.path(), "zzz.mkv", 1);
        write_file(shows.path(), "aaa.mkv", 1);

        // Roots given shows-first, but "Movie" sorts before "TV Show"
        let roots = vec![
            MediaRoot::new(shows.path(), "TV Show"),
            MediaRoot::new(movies.path(), "Movie"),
        ];
        let files = list_files(&roots, &[]);
        assert_eq!(files[0].category, "Movie");
        assert_eq!(files[1].category, "TV Show");
    }

    #[test]
    fn test_size_mb_rounding() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.mkv", 1024 * 1024 + 512 * 1024);

        let files = list_files(&[MediaRoot::new(dir.path(), "Movie")], &[]);
        assert_eq!(files[0].size_mb, 1.5);
    }

    #[test]
    fn test_entry_serializes_for_api() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.mkv", 10);

        let files = list_files(&[MediaRoot::new(dir.path(), "Movie")], &[]);
        let json = serde_json::to_value(&files[0]).unwrap();
        assert_eq!(json["name"], "a.mkv");
        assert_eq!(json["size_bytes"], 10);
        assert_eq!(json["category"], "Movie");
    }

    #[test]
    fn test_resolve_inside_root() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "a.mkv", 10);

        let roots = vec![MediaRoot::new(dir.path(), "Movie")];
        let resolved = resolve_in_roots(&roots, &path).unwrap();
        assert!(resolved.ends_with("a.mkv"));
    }

    #[test]
    fn test_resolve_rejects_paths_outside_roots() {
        let library = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let outside = write_file(elsewhere.path(), "secret.txt", 10);

        let roots = vec![MediaRoot::new(library.path(), "Movie")];
        assert!(resolve_in_roots(&roots, &outside).is_none());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let library = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        write_file(elsewhere.path(), "secret.txt", 10);

        let sneaky = library
            .path()
            .join("..")
            .join(elsewhere.path().file_name().unwrap())
            .join("secret.txt");
        let roots = vec![MediaRoot::new(library.path(), "Movie")];
        assert!(resolve_in_roots(&roots, &sneaky).is_none());
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = TempDir::new().unwrap();
        let roots = vec![MediaRoot::new(dir.path(), "Movie")];
        assert!(resolve_in_roots(&roots, &dir.path().join("gone.mkv")).is_none());
    }

    #[test]
    fn test_resolve_rejects_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("season1")).unwrap();

        let roots = vec![MediaRoot::new(dir.path(), "Movie")];
        assert!(resolve_in_roots(&roots, &dir.path().join("season1")).is_none());
    }
}
