use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Create the directory at `path`, and any missing parents.
pub fn create_dir_if_not_exists<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let path: &Path = path.as_ref();

    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut file_name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    file_name.push(".tmp");
    path.with_file_name(file_name)
}

/// Replace the contents of the file at `path`. The contents are written to a temporary sibling
/// file first and renamed over `path`, so readers never observe a partially written file.
pub async fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let temporary = temporary_path(path);
    let result = match tokio::fs::write(&temporary, contents).await {
        Ok(()) => tokio::fs::rename(&temporary, path).await,
        Err(error) => Err(error),
    };

    if result.is_err() && temporary.exists() {
        if let Err(error) = tokio::fs::remove_file(&temporary).await {
            tracing::warn!("Unable to remove temporary file {:?}: {}", temporary, error);
        }
    }

    result
}
