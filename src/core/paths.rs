//! Cache directory resolution

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the cache location.
pub const CACHE_DIR_ENV: &str = "RELIC_CACHE_DIR";

/// Resolve the completion cache root.
///
/// Precedence: explicit override (CLI flag) > `$RELIC_CACHE_DIR` >
/// `$HOME/.cache/relic/completion_cache` > `.relic/completion_cache`.
pub fn completion_cache_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = env::var_os(CACHE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    match env::var_os("HOME") {
        Some(home) => Path::new(&home)
            .join(".cache")
            .join("relic")
            .join("completion_cache"),
        None => Path::new(".relic").join("completion_cache"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_override_wins() {
        let dir = Path::new("/tmp/custom-cache");
        assert_eq!(completion_cache_dir(Some(dir)), PathBuf::from(dir));
    }

    #[test]
    fn test_default_under_home() {
        if env::var_os(CACHE_DIR_ENV).is_some() || env::var_os("HOME").is_none() {
            return;
        }
        let dir = completion_cache_dir(None);
        assert!(dir.ends_with("relic/completion_cache"));
    }
}
