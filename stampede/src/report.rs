use crate::error::ReportError;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Write `value` to `path` as pretty-printed JSON, creating the parent directory if needed.
pub(crate) async fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), ReportError> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, bytes).await.map_err(io_err)?;

    info!("Wrote {}", path.display());
    Ok(())
}
