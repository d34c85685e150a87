use directories::{BaseDirs, ProjectDirs};
use std::io;
use std::path::{Path, PathBuf};

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

/// Get the configuration directory path.
/// If profile is Dev, uses "validade-dev" instead of "validade".
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "validade-dev",
        Profile::Prod => "validade",
    };
    ProjectDirs::from("com", "validade", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path (database and photos live below it).
/// If profile is Dev, uses "validade-dev" instead of "validade".
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "validade-dev",
        Profile::Prod => "validade",
    };
    ProjectDirs::from("com", "validade", app_name).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Current timestamp in the persisted `YYYY-MM-DD HH:MM:SS` form
pub fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Today as a local calendar date
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Current local wall-clock time, without timezone
pub fn now_local() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Move a captured photo into the application-owned photo directory and
/// return its final path. A file already below `photo_dir` stays where it
/// is. Only the returned reference gets persisted; image bytes are never
/// read here.
pub fn promote_photo(source: &Path, photo_dir: &Path) -> io::Result<PathBuf> {
    if source.starts_with(photo_dir) {
        return Ok(source.to_path_buf());
    }

    let file_name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file: {}", source.display()),
        )
    })?;

    std::fs::create_dir_all(photo_dir)?;
    let dest = photo_dir.join(file_name);

    // rename fails across filesystems (e.g. camera cache on another mount),
    // fall back to copy + remove
    if std::fs::rename(source, &dest).is_err() {
        std::fs::copy(source, &dest)?;
        std::fs::remove_file(source)?;
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_path_leaves_absolute_paths_alone() {
        assert_eq!(expand_path("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn promote_photo_moves_file_into_photo_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let photo_dir = tmp.path().join("photos");
        let source = tmp.path().join("capture.jpg");
        std::fs::write(&source, b"jpeg").unwrap();

        let dest = promote_photo(&source, &photo_dir).unwrap();

        assert_eq!(dest, photo_dir.join("capture.jpg"));
        assert!(dest.exists());
        assert!(!source.exists());
    }

    #[test]
    fn promote_photo_keeps_files_already_in_place() {
        let tmp = tempfile::TempDir::new().unwrap();
        let photo_dir = tmp.path().join("photos");
        std::fs::create_dir_all(&photo_dir).unwrap();
        let source = photo_dir.join("capture.jpg");
        std::fs::write(&source, b"jpeg").unwrap();

        let dest = promote_photo(&source, &photo_dir).unwrap();

        assert_eq!(dest, source);
        assert!(source.exists());
    }
}
