//! Lexical path handling.
//!
//! Output directories are computed before anything exists on disk, so these
//! helpers never touch the filesystem.

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically: drop `.` components and fold `..` into the
/// preceding normal component.
///
/// Leading `..` components of a relative path are kept, and `..` directly
/// under the filesystem root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }

    out.iter().collect()
}

/// Resolve `path` against `base` when it is relative, then normalize.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Whether `inner` equals `outer` or lies beneath it. Both paths are
/// normalized first.
pub fn is_within(outer: &Path, inner: &Path) -> bool {
    normalize(inner).starts_with(normalize(outer))
}

/// Whether a project name is usable as a single output directory segment.
pub fn is_valid_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_parent_components() {
        assert_eq!(
            normalize(Path::new("/work/android/build/../../build")),
            PathBuf::from("/work/build")
        );
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
    }

    #[test]
    fn test_normalize_keeps_leading_parents_of_relative_path() {
        assert_eq!(normalize(Path::new("../../build")), PathBuf::from("../../build"));
        assert_eq!(normalize(Path::new("a/../..")), PathBuf::from(".."));
    }

    #[test]
    fn test_normalize_stops_at_filesystem_root() {
        assert_eq!(normalize(Path::new("/../build")), PathBuf::from("/build"));
        assert_eq!(normalize(Path::new("./.")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = Path::new("/work/android");
        assert_eq!(resolve(base, Path::new("../build")), PathBuf::from("/work/build"));
        assert_eq!(resolve(base, Path::new("/tmp/out")), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_is_within() {
        assert!(is_within(Path::new("/build"), Path::new("/build")));
        assert!(is_within(Path::new("/build"), Path::new("/build/app")));
        assert!(is_within(Path::new("/build"), Path::new("/build/app/../lib")));
        assert!(!is_within(Path::new("/build"), Path::new("/build/../src")));
        assert!(!is_within(Path::new("/build"), Path::new("/buildx")));
    }

    #[test]
    fn test_is_valid_segment() {
        assert!(is_valid_segment("app"));
        assert!(is_valid_segment("lib-core"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment(".."));
        assert!(!is_valid_segment("lib/core"));
    }
}
