//! Payload class discovery.
//!
//! An untouched build keeps the payload class at `<package>/Payload.class`.
//! Backdoored builds rename it, but the injected class still sits one
//! directory below the package with both the directory and the class name
//! exactly five characters long, e.g. `<package>/abcde/vwxyz.class`.

use crate::config::{CLASS_EXTENSION, OBFUSCATED_NAME_LEN, PAYLOAD_CLASS_NAME};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Result of looking for the payload class under a package directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorResult {
    /// The well-known class file exists
    KnownPayload(PathBuf),
    /// Obfuscated candidates in filesystem enumeration order
    SearchCandidates(Vec<PathBuf>),
    NotFound,
}

/// Find the payload class for `package_path` inside the unpacked class tree.
///
/// The well-known location always wins over the wildcard search.
pub fn locate(class_root: &Path, package_path: &Path) -> LocatorResult {
    let package_dir = class_root.join(package_path);

    let known = package_dir.join(format!("{PAYLOAD_CLASS_NAME}.{CLASS_EXTENSION}"));
    if known.is_file() {
        debug!("Found well-known payload class: {}", known.display());
        return LocatorResult::KnownPayload(known);
    }

    let candidates = search_candidates(&package_dir);
    if candidates.is_empty() {
        debug!("No payload class candidates under {}", package_dir.display());
        LocatorResult::NotFound
    } else {
        debug!(
            "Found {} obfuscated payload candidates under {}",
            candidates.len(),
            package_dir.display()
        );
        LocatorResult::SearchCandidates(candidates)
    }
}

/// Collect `<package_dir>/?????/?????.class` without reordering.
fn search_candidates(package_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(package_dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let path = entry.path();
            let dir_matches = path
                .parent()
                .and_then(Path::file_name)
                .and_then(OsStr::to_str)
                .is_some_and(is_obfuscated_name);
            let file_matches = path.extension() == Some(OsStr::new(CLASS_EXTENSION))
                && path
                    .file_stem()
                    .and_then(OsStr::to_str)
                    .is_some_and(is_obfuscated_name);
            trace!("Candidate {}: dir={} file={}", path.display(), dir_matches, file_matches);
            dir_matches && file_matches
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Exactly five characters, hidden names excluded
fn is_obfuscated_name(name: &str) -> bool {
    !name.starts_with('.') && name.chars().count() == OBFUSCATED_NAME_LEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"\xca\xfe\xba\xbe").unwrap();
        path
    }

    fn pkg() -> PathBuf {
        Path::new("com").join("example").join("app")
    }

    #[test]
    fn test_known_payload() {
        let dir = TempDir::new().unwrap();
        let known = touch(dir.path(), "com/example/app/Payload.class");

        assert_eq!(locate(dir.path(), &pkg()), LocatorResult::KnownPayload(known));
    }

    #[test]
    fn test_known_payload_wins_over_search() {
        let dir = TempDir::new().unwrap();
        let known = touch(dir.path(), "com/example/app/Payload.class");
        touch(dir.path(), "com/example/app/abcde/vwxyz.class");

        assert_eq!(locate(dir.path(), &pkg()), LocatorResult::KnownPayload(known));
    }

    #[test]
    fn test_search_candidates() {
        let dir = TempDir::new().unwrap();
        let candidate = touch(dir.path(), "com/example/app/abcde/vwxyz.class");
        touch(dir.path(), "com/example/app/MainActivity.class");

        assert_eq!(
            locate(dir.path(), &pkg()),
            LocatorResult::SearchCandidates(vec![candidate])
        );
    }

    #[test]
    fn test_wildcard_shape() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "com/example/app/abcd/vwxyz.class");
        touch(dir.path(), "com/example/app/abcdef/vwxyz.class");
        touch(dir.path(), "com/example/app/abcde/vwxy.class");
        touch(dir.path(), "com/example/app/abcde/vwxyza.class");
        touch(dir.path(), "com/example/app/abcde/vwxyz.java");
        touch(dir.path(), "com/example/app/abcde/fghij/vwxyz.class");
        touch(dir.path(), "com/example/app/.abcd/vwxyz.class");
        touch(dir.path(), "com/example/app/vwxyz.class");

        assert_eq!(locate(dir.path(), &pkg()), LocatorResult::NotFound);
    }

    #[test]
    fn test_multiple_candidates() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "com/example/app/abcde/aaaaa.class");
        touch(dir.path(), "com/example/app/abcde/bbbbb.class");
        touch(dir.path(), "com/example/app/fghij/ccccc.class");

        match locate(dir.path(), &pkg()) {
            LocatorResult::SearchCandidates(paths) => {
                assert_eq!(paths.len(), 3);
                // Enumeration order is stable for an unchanged tree
                assert_eq!(
                    locate(dir.path(), &pkg()),
                    LocatorResult::SearchCandidates(paths)
                );
            }
            other => panic!("Expected search candidates, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_package_dir() {
        let dir = TempDir::new().unwrap();
        let result = locate(dir.path(), &pkg());
        assert_eq!(result, LocatorResult::NotFound);
    }

    #[test]
    fn test_payload_directory_is_not_a_class() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("com/example/app/Payload.class")).unwrap();
        assert_eq!(locate(dir.path(), &pkg()), LocatorResult::NotFound);
    }

    #[test]
    fn test_is_obfuscated_name() {
        assert!(is_obfuscated_name("abcde"));
        assert!(is_obfuscated_name("a$b_c"));
        assert!(!is_obfuscated_name("abcd"));
        assert!(!is_obfuscated_name("abcdef"));
        assert!(!is_obfuscated_name(".abcd"));
    }
}
