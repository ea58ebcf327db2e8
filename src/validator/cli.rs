//! CLI-based metadata probe using the external yt-dlp binary

use super::traits::{MetadataProbe, ProbeOutput};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Metadata probe that runs yt-dlp in title-only mode
///
/// The child is spawned with `kill_on_drop`, so dropping the probe future (for
/// example when the validator's timeout fires) terminates the process.
pub struct CliMetadataProbe {
    binary_path: PathBuf,
    extra_args: Vec<String>,
}

impl CliMetadataProbe {
    /// Create a probe with an explicit binary path and leading arguments
    pub fn new(binary_path: PathBuf, extra_args: Vec<String>) -> Self {
        Self {
            binary_path,
            extra_args,
        }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// # Returns
    ///
    /// `Some(CliMetadataProbe)` if the binary is found, `None` otherwise.
    pub fn from_path() -> Option<Self> {
        which::which(crate::config::DEFAULT_TOOL_NAME)
            .ok()
            .map(|path| Self::new(path, Vec::new()))
    }

    fn command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.extra_args)
            .arg("--no-download")
            .arg("--no-playlist")
            .arg("--skip-download")
            .arg("--get-title")
            .arg(url)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MetadataProbe for CliMetadataProbe {
    async fn probe(&self, url: &str) -> crate::Result<ProbeOutput> {
        let output = self
            .command(url)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        Ok(ProbeOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }
}
