//! Audio sidecar: a fire-and-forget ffplay child playing the input's
//! audio track while we draw the video. Launch failure is deliberately
//! silent; playback continues without sound.

use std::path::Path;
use std::process::{Child, Command, Stdio};

pub struct AudioSidecar {
    child: Option<Child>,
}

impl AudioSidecar {
    /// Start ffplay with its display and all stdio suppressed. A spawn
    /// error (ffplay missing, most likely) leaves the sidecar empty.
    pub fn spawn(input: &Path) -> Self {
        let child = Command::new("ffplay")
            .arg("-nodisp")
            .arg("-autoexit")
            .args(["-loglevel", "quiet"])
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .ok();
        Self { child }
    }

    /// Kill the child if it is still around. Safe to call repeatedly.
    pub fn terminate(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for AudioSidecar {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn terminate_is_idempotent() {
        let mut sidecar = AudioSidecar::spawn(&PathBuf::from("/nonexistent/clip.mp4"));
        sidecar.terminate();
        sidecar.terminate();
    }

    #[test]
    fn spawn_failure_is_silent() {
        // Whatever state ffplay is in on this machine, constructing and
        // dropping the sidecar must not panic or report anything.
        let _sidecar = AudioSidecar::spawn(&PathBuf::from("/nonexistent/clip.mp4"));
    }
}
