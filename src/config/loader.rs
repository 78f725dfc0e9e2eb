use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::LintConfig;
use crate::errors::Result;

pub const CONFIG_FILE_NAME: &str = ".promiselint.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<LintConfig> {
    let config = toml::from_str::<LintConfig>(contents)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config_from_path(path: &Path) -> Result<LintConfig> {
    let contents = fs::read_to_string(path)?;
    let config = parse_and_validate_config(&contents)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// `start` and its parents, nearest first, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load the nearest config above `start`, or the defaults when there is none.
/// A config file that exists but does not parse is an error.
pub fn load_config(start: &Path) -> Result<LintConfig> {
    match find_config_file(start) {
        Some(path) => load_config_from_path(&path),
        None => {
            debug!(
                "No {} found within {} directories of {}. Using default config.",
                CONFIG_FILE_NAME,
                MAX_TRAVERSAL_DEPTH,
                start.display()
            );
            Ok(LintConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LintError;
    use tempfile::TempDir;

    #[test]
    fn test_directory_ancestors_respects_depth() {
        let dirs: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c/d"), 3).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c/d"),
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b")
            ]
        );
    }

    #[test]
    fn test_load_config_finds_parent_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[rules]\ndisabled = [\"return-in-finalizer\"]\n",
        )
        .unwrap();
        let nested = temp.path().join("src").join("lib");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.rules.disabled, vec!["return-in-finalizer"]);
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();
        assert_eq!(config, LintConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "[rules\n").unwrap();
        assert!(matches!(load_config(temp.path()), Err(LintError::Toml(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse_and_validate_config("[rules]\nenabled = []\n").is_err());
    }
}
