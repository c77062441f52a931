//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

/// Ensure the data directory exists; failure here is fatal since the
/// registry cannot persist anything without it.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create data directory {data_dir}: {e}"))?;
    Ok(())
}
