//! Publishing generated playlist/guide artifacts to a remote host over scp.

use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::config::RemoteConfig;

/// Copy a local file to the configured `user@host:path` destination.
/// A non-zero scp exit status is surfaced as an error with its stderr.
pub async fn upload(local: &Path, remote: &RemoteConfig) -> anyhow::Result<()> {
    let destination = remote.destination();
    info!(file = %local.display(), destination = %destination, "uploading artifact");

    let output = Command::new("scp")
        .arg(local)
        .arg(&destination)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "scp to {destination} failed ({}): {}",
            output.status,
            stderr.trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_of_missing_file_reports_scp_failure() {
        let remote = RemoteConfig {
            host: "127.0.0.1".to_string(),
            user: "nobody".to_string(),
            path: "/tmp".to_string(),
        };
        let result = upload(Path::new("/definitely/not/a/file.m3u"), &remote).await;
        assert!(result.is_err());
    }
}
