use std::io;
use std::process::{Command, Stdio};
use tracing::{info, warn};

fn launcher(url: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // The empty argument is the window title `start` expects.
        cmd.args(["/C", "start", "", url]);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

fn spawn(url: &str) -> io::Result<()> {
    launcher(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

/// Ask the host to open `url` in its default browser.
/// Fire and forget: a failed launch is only logged.
pub fn open_in_browser(url: &str) {
    match spawn(url) {
        Ok(()) => info!("🌐 Opened {} in browser", url),
        Err(e) => warn!("Could not open {} in browser: {}", url, e),
    }
}
