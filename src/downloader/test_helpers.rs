//! Shared test helpers: fetch tool stand-ins and MediaDownloader construction.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Stand-in that prints three progress lines and exits successfully
pub(crate) const PROGRESS_SCRIPT: &str = "\
echo '[youtube] abc: Downloading webpage'
echo '[download]  12.3%'
echo '[download]  57.0%'
echo '[download] 100.0%'
exit 0
";

/// Stand-in that fails without reporting any progress
pub(crate) const FAILING_SCRIPT: &str = "\
echo 'ERROR: Unsupported URL' >&2
exit 1
";

/// Stand-in that records its PID, reports once, then blocks for a long time
///
/// `exec` keeps the PID stable so the test can observe the exact process.
pub(crate) const LONG_RUNNING_SCRIPT: &str = "\
echo $$ > \"$PID_FILE\"
echo '[download]   1.0%'
exec sleep 30
";

/// A shell script standing in for the fetch tool
///
/// Run as `/bin/sh <script> <generated args...>`, so the script sees the
/// generated arguments as `$1..$n`. The variable `PID_FILE` points at a file
/// inside the stand-in's own temporary directory.
pub(crate) struct StandIn {
    dir: TempDir,
    script: PathBuf,
}

impl StandIn {
    pub(crate) fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("stand-in.sh");
        let pid_file = dir.path().join("pid");
        let contents = format!("PID_FILE='{}'\n{}", pid_file.display(), body);
        std::fs::write(&script, contents).unwrap();
        Self { dir, script }
    }

    /// Leading arguments that make `/bin/sh` run this script
    pub(crate) fn args(&self) -> Vec<String> {
        vec![self.script.to_string_lossy().into_owned()]
    }

    pub(crate) fn pid_file(&self) -> PathBuf {
        self.dir.path().join("pid")
    }

    /// Wait for the script to record its PID
    pub(crate) async fn read_pid(&self) -> u32 {
        let path = self.pid_file();
        for _ in 0..100 {
            if let Ok(raw) = tokio::fs::read_to_string(&path).await
                && let Ok(pid) = raw.trim().parse()
            {
                return pid;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("stand-in never wrote {}", path.display());
    }
}

/// Whether `pid` names a live (non-zombie) process
#[cfg(target_os = "linux")]
pub(crate) fn process_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Format is "pid (comm) state ..."; comm may itself contain parentheses
    match stat.rfind(')').and_then(|i| stat[i + 1..].trim_start().chars().next()) {
        Some('Z') | Some('X') | None => false,
        Some(_) => true,
    }
}

/// Poll until `pid` is gone or `bound` elapses; returns whether it died
#[cfg(target_os = "linux")]
pub(crate) async fn wait_until_dead(pid: u32, bound: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + bound;
    while tokio::time::Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !process_alive(pid)
}

/// Config whose storage root lives in `temp_dir` and whose tool is `stand_in`
pub(crate) fn test_config(temp_dir: &Path, stand_in: &StandIn) -> Config {
    let mut config = Config::default();
    config.storage.storage_dir = temp_dir.join("downloads");
    config.tools.ytdlp_path = Some(PathBuf::from("/bin/sh"));
    config.tools.search_path = false;
    config.tools.extra_args = stand_in.args();
    config.tools.validation_timeout = Duration::from_secs(5);
    config
}

/// Helper to create a test MediaDownloader driven by a stand-in script.
/// Returns the downloader, the stand-in and the tempdir (both must be kept alive).
pub(crate) async fn create_test_downloader(body: &str) -> (MediaDownloader, StandIn, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let stand_in = StandIn::new(body);
    let config = test_config(temp_dir.path(), &stand_in);

    let downloader = MediaDownloader::new(config).await.unwrap();
    (downloader, stand_in, temp_dir)
}
