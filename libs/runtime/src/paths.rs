use std::path::{Path, PathBuf};

/// Errors while resolving the service home directory.
#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("cannot determine the user home directory (HOME/USERPROFILE unset)")]
    NoUserHome,
    #[error("failed to create home directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn user_home() -> Result<PathBuf, HomeDirError> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(HomeDirError::NoUserHome)
}

/// Resolve the service home directory into an absolute path.
///
/// - `None` → `$HOME/<default_subdir>`
/// - `~/...` → expanded against `$HOME`
/// - relative paths → joined onto the current directory
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match configured {
        None => user_home()?.join(default_subdir),
        Some(raw) if raw == "~" => user_home()?,
        Some(raw) => match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
            Some(rest) => user_home()?.join(rest),
            None => absolutize(Path::new(&raw)),
        },
    };

    if create {
        std::fs::create_dir_all(&resolved).map_err(|source| HomeDirError::Create {
            path: resolved.clone(),
            source,
        })?;
    }
    Ok(resolved)
}

fn absolutize(p: &Path) -> PathBuf {
    if p.is_absolute() {
        return p.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(p))
        .unwrap_or_else(|_| p.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_paths_are_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("svc/home");
        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().into_owned()), ".x", true).unwrap();
        assert_eq!(resolved, target);
        assert!(target.exists());
    }

    #[test]
    fn relative_paths_become_absolute() {
        let resolved = resolve_home_dir(Some("rel/dir".into()), ".x", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("rel/dir"));
    }
}
