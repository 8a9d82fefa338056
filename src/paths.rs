use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the state directory.
pub const ZDEV_HOME_ENV: &str = "ZDEV_HOME";

const CONFIG_FILE: &str = "config.json";
const WORKTREES_DIR: &str = "worktrees";
const SEEDS_DIR: &str = "seeds";
const LOGS_DIR: &str = "logs";

/// Location of zdev's state: store file, worktrees, seeds, dev server logs.
///
/// Resolved once in `main` and passed down; nothing reads it from globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZdevHome {
    root: PathBuf,
}

impl ZdevHome {
    /// `$ZDEV_HOME` if set and non-empty, otherwise `~/.zdev`.
    pub fn resolve() -> io::Result<Self> {
        if let Some(root) = env::var_os(ZDEV_HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(root));
        }

        let home = home::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not determine home directory")
        })?;
        Ok(Self::at(home.join(".zdev")))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.root.join(WORKTREES_DIR)
    }

    pub fn seeds_dir(&self) -> PathBuf {
        self.root.join(SEEDS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn worktree_path(&self, name: &str) -> PathBuf {
        self.worktrees_dir().join(name)
    }

    pub fn seed_path(&self, project: &str) -> PathBuf {
        self.seeds_dir().join(format!("{project}.zip"))
    }

    /// Log file for one dev server of one worktree.
    pub fn log_path(&self, worktree: &str, server: &str) -> PathBuf {
        self.logs_dir().join(format!("{worktree}-{server}.log"))
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.root.clone(),
            self.worktrees_dir(),
            self.seeds_dir(),
            self.logs_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let home = ZdevHome::at("/tmp/zd");
        assert_eq!(home.config_path(), PathBuf::from("/tmp/zd/config.json"));
        assert_eq!(
            home.worktree_path("shop-login"),
            PathBuf::from("/tmp/zd/worktrees/shop-login")
        );
        assert_eq!(home.seed_path("shop"), PathBuf::from("/tmp/zd/seeds/shop.zip"));
        assert_eq!(
            home.log_path("shop-login", "frontend"),
            PathBuf::from("/tmp/zd/logs/shop-login-frontend.log")
        );
    }

    #[test]
    fn test_ensure_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let home = ZdevHome::at(temp.path().join("state"));
        home.ensure_dirs().unwrap();
        assert!(home.worktrees_dir().is_dir());
        assert!(home.seeds_dir().is_dir());
        assert!(home.logs_dir().is_dir());
    }
}
