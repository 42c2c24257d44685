use std::path::{Component, Path, PathBuf};

use crate::error::{GraphHookError, Result};

/// Resolve `file` against `cwd`, rejecting anything that lands outside it.
///
/// Checked lexically first, then again on canonical paths when both exist so
/// symlinks can't be used to step out. A relative `cwd` is anchored to the
/// process directory first so leading `..` components can't cancel out.
pub fn resolve_within(cwd: &Path, file: &str) -> Result<PathBuf> {
    let escape = || GraphHookError::PathEscape {
        path: file.to_string(),
    };

    let cwd = std::path::absolute(cwd)?;
    let cwd = cwd.as_path();
    let candidate = Path::new(file);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        cwd.join(candidate)
    };

    let base = normalize(cwd);
    let resolved = normalize(&joined);
    if !resolved.starts_with(&base) {
        return Err(escape());
    }

    if let (Ok(real_base), Ok(real_file)) = (cwd.canonicalize(), joined.canonicalize()) {
        if !real_file.starts_with(&real_base) {
            return Err(escape());
        }
    }

    Ok(resolved)
}

/// Lexical normalization: drops `.`, folds `..` into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_inside_are_accepted() {
        let cwd = Path::new("/work/repo");
        assert_eq!(
            resolve_within(cwd, "src/lib.rs").unwrap(),
            PathBuf::from("/work/repo/src/lib.rs")
        );
        assert_eq!(
            resolve_within(cwd, "./src/../README.md").unwrap(),
            PathBuf::from("/work/repo/README.md")
        );
    }

    #[test]
    fn traversal_is_rejected() {
        let cwd = Path::new("/work/repo");
        assert!(matches!(
            resolve_within(cwd, "../other/secret.rs"),
            Err(GraphHookError::PathEscape { .. })
        ));
        assert!(resolve_within(cwd, "src/../../x").is_err());
    }

    #[test]
    fn absolute_paths_must_be_under_cwd() {
        let cwd = Path::new("/work/repo");
        assert!(resolve_within(cwd, "/work/repo/src/main.rs").is_ok());
        assert!(resolve_within(cwd, "/etc/passwd").is_err());
        // Sibling directory sharing a prefix.
        assert!(resolve_within(cwd, "/work/repo-evil/a.rs").is_err());
    }

    #[test]
    fn relative_cwd_cannot_be_escaped() {
        let cwd = Path::new(".");
        assert!(matches!(
            resolve_within(cwd, "../../definitely-missing-dir/secret.rs"),
            Err(GraphHookError::PathEscape { .. })
        ));
        assert!(resolve_within(Path::new("sub"), "../x.rs").is_err());

        let inside = resolve_within(cwd, "src/lib.rs").unwrap();
        assert!(inside.is_absolute());
        assert!(inside.ends_with("src/lib.rs"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_tree_is_rejected() {
        let outside = tempfile::TempDir::new().unwrap();
        let repo = tempfile::TempDir::new().unwrap();
        std::fs::write(outside.path().join("target.rs"), "fn x() {}").unwrap();
        std::os::unix::fs::symlink(outside.path(), repo.path().join("link")).unwrap();

        assert!(resolve_within(repo.path(), "link/target.rs").is_err());
    }
}
