use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DigestPaths {
    pub digest_home: PathBuf,
    pub storage_file: PathBuf,
    pub export_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl DigestPaths {
    /// Default layout rooted at `home`, ignoring environment overrides.
    pub fn under(home: &Path) -> Self {
        Self {
            digest_home: home.to_path_buf(),
            storage_file: home.join("sync_storage.json"),
            export_dir: home.join("exports"),
            logs_dir: home.join("logs"),
        }
    }
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn default_digest_home() -> Result<PathBuf> {
    let home = required_home_dir()?;
    Ok(env_or_default_path(
        "DIGEST_HOME",
        home.join(".page_digest"),
    ))
}

pub fn resolve_paths() -> Result<DigestPaths> {
    let digest_home = default_digest_home()?;
    let defaults = DigestPaths::under(&digest_home);

    Ok(DigestPaths {
        storage_file: env_or_default_path("DIGEST_STORAGE_FILE", defaults.storage_file),
        export_dir: env_or_default_path("DIGEST_EXPORT_DIR", defaults.export_dir),
        logs_dir: env_or_default_path("DIGEST_LOGS_DIR", defaults.logs_dir),
        digest_home,
    })
}

#[cfg(test)]
mod tests {
    use super::DigestPaths;
    use std::path::Path;

    #[test]
    fn under_lays_out_files_beneath_home() {
        let paths = DigestPaths::under(Path::new("/srv/digest"));
        assert_eq!(paths.storage_file, Path::new("/srv/digest/sync_storage.json"));
        assert_eq!(paths.export_dir, Path::new("/srv/digest/exports"));
        assert_eq!(paths.logs_dir, Path::new("/srv/digest/logs"));
    }
}
