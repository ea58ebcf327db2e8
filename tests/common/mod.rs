//! Common test utilities for media-dl integration tests
//!
//! Jobs run a small `/bin/sh` script in place of yt-dlp so the tests need
//! neither network access nor the real tool.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use media_dl::{Config, MediaDownloader};

/// Stand-in that honours `-o`, prints progress and writes `Sample Clip.<ext>`
///
/// The extension follows the requested format: `m4a` for audio, `mp4` otherwise.
pub const WRITING_TOOL: &str = "\
out=''
ext='mp4'
while [ $# -gt 0 ]; do
  case \"$1\" in
    -o) out=\"$2\" ;;
    bestaudio*) ext='m4a' ;;
  esac
  shift
done
echo '[youtube] Extracting URL'
echo '[download]  25.0% of 1.00MiB'
echo '[download]  75.5% of 1.00MiB'
echo '[download] 100.0% of 1.00MiB'
printf 'sample' > \"$(echo \"$out\" | sed \"s/%(title)s/Sample Clip/; s/%(ext)s/$ext/\")\"
exit 0
";

/// Stand-in that acts as a metadata probe, printing a title for any URL
pub const TITLE_TOOL: &str = "echo 'Sample Title'\nexit 0\n";

/// Test environment holding the storage root and the stand-in script
#[allow(dead_code)]
pub struct TestEnv {
    pub downloader: MediaDownloader,
    pub storage_dir: PathBuf,
    _dir: TempDir,
}

/// Write `body` to a script and build a downloader that runs it via `/bin/sh`
pub async fn test_env(body: &str) -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("tool.sh");
    std::fs::write(&script, body).unwrap();

    let mut config = Config::default();
    config.storage.storage_dir = dir.path().join("downloads");
    config.tools.ytdlp_path = Some(PathBuf::from("/bin/sh"));
    config.tools.search_path = false;
    config.tools.extra_args = vec![script_arg(&script)];
    config.tools.validation_timeout = std::time::Duration::from_secs(5);

    let storage_dir = config.storage.storage_dir.clone();
    let downloader = MediaDownloader::new(config).await.unwrap();

    TestEnv {
        downloader,
        storage_dir,
        _dir: dir,
    }
}

fn script_arg(script: &Path) -> String {
    script.to_string_lossy().into_owned()
}
