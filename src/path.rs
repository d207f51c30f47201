use std::path::{Component, Path, PathBuf};

use crate::error::Error;

/// Resolve a user-supplied path to its repository-relative form.
///
/// Relative inputs are anchored at `cwd`, the result is normalized lexically
/// (no filesystem access) and then relativized against `repo_root`. A path
/// whose relative form starts with `..` escapes the repository and is
/// rejected. Resolving an already-resolved path is a no-op.
pub fn resolve_repo_path(user_path: &Path, repo_root: &Path, cwd: &Path) -> Result<PathBuf, Error> {
    let absolute = if user_path.is_absolute() {
        normalize(user_path)
    } else {
        normalize(&cwd.join(user_path))
    };

    let relative = relative_to(&absolute, &normalize(repo_root));

    if relative.components().next() == Some(Component::ParentDir) {
        return Err(Error::OutOfRepository {
            path: user_path.to_path_buf(),
            root: repo_root.to_path_buf(),
        });
    }

    if relative.as_os_str().is_empty() {
        Ok(PathBuf::from("."))
    } else {
        Ok(relative)
    }
}

/// Lexical cleanup: drop `.` components and fold `..` into the preceding
/// component where one exists. A `..` above the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Compute `path` relative to `base`, introducing `..` segments when `path`
/// sits outside `base`. Both inputs must already be normalized.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let mut path_iter = path.components().peekable();
    let mut base_iter = base.components().peekable();

    while let (Some(p), Some(b)) = (path_iter.peek(), base_iter.peek()) {
        if p != b {
            break;
        }
        path_iter.next();
        base_iter.next();
    }

    let mut relative = PathBuf::new();
    for _ in base_iter {
        relative.push("..");
    }
    for component in path_iter {
        relative.push(component);
    }
    relative
}
