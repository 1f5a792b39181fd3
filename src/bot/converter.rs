//! Voice conversion through an external sox process.
//!
//! Equivalent to:
//! `cat voice.oga | sox -t opus - -t ogg - <preset args...> > converted.ogg`

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Input from stdin as opus, output to stdout as ogg.
const BASE_ARGS: [&str; 6] = ["-t", "opus", "-", "-t", "ogg", "-"];

/// Used when no preset is selected or the selected one no longer exists.
const FALLBACK_PRESET: [&str; 2] = ["speed", "1.0"];

#[derive(Debug)]
pub enum ConversionError {
    /// The binary could not be started.
    Spawn { binary: PathBuf, source: std::io::Error },
    /// Waiting on the process or reading its output failed.
    Io(std::io::Error),
    /// The process exited unsuccessfully.
    Failed { status: ExitStatus, stdout: String, stderr: String },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { binary, source } => {
                write!(f, "failed to run '{}': {}", binary.display(), source)
            }
            Self::Io(e) => write!(f, "i/o error while converting: {}", e),
            Self::Failed { stdout, stderr, .. } => {
                write!(f, "{} {}", stdout.trim(), stderr.trim())
            }
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            Self::Failed { .. } => None,
        }
    }
}

/// Runs the configured binary once per voice message.
pub struct Converter {
    binary: PathBuf,
    presets: BTreeMap<String, Vec<String>>,
    verbose: bool,
}

impl Converter {
    pub fn new(binary: impl Into<PathBuf>, presets: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            binary: binary.into(),
            presets,
            verbose: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            binary: config.sox_bin.clone(),
            presets: config.presets.clone(),
            verbose: config.verbose,
        }
    }

    /// Full argument list for the given preset name.
    ///
    /// Unknown names (and `None`) fall back to a no-op `speed 1.0`.
    pub fn args_for(&self, preset: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = BASE_ARGS.iter().map(|s| s.to_string()).collect();
        match preset.and_then(|name| self.presets.get(name)) {
            Some(extra) => args.extend(extra.iter().cloned()),
            None => args.extend(FALLBACK_PRESET.iter().map(|s| s.to_string())),
        }
        args
    }

    /// Convert `original` using the named preset.
    ///
    /// There is no timeout: a hung binary hangs only the calling task.
    pub async fn convert(&self, original: &[u8], preset: Option<&str>) -> Result<Vec<u8>, ConversionError> {
        if self.verbose {
            info!("Received: {} ({} bytes)", sniff_container(original), original.len());
        }

        let args = self.args_for(preset);
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConversionError::Spawn { binary: self.binary.clone(), source: e })?;

        // Feed stdin from its own task so a full stdout pipe can't deadlock us
        let writer = child.stdin.take().map(|mut stdin| {
            let input = original.to_vec();
            tokio::spawn(async move {
                let result = stdin.write_all(&input).await;
                drop(stdin);
                result
            })
        });

        let output = child.wait_with_output().await.map_err(ConversionError::Io)?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The process may legitimately exit before reading everything
                Ok(Err(e)) => debug!("stdin write ended early: {e}"),
                Err(e) => warn!("stdin writer task failed: {e}"),
            }
        }

        if !output.status.success() {
            return Err(ConversionError::Failed {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        debug!("Converted {} bytes into {} bytes", original.len(), output.stdout.len());
        Ok(output.stdout)
    }
}

/// Best-effort container detection for verbose logging.
fn sniff_container(data: &[u8]) -> &'static str {
    if data.starts_with(b"OggS") {
        "audio/ogg"
    } else if data.starts_with(b"RIFF") {
        "audio/wave"
    } else if data.starts_with(b"ID3") {
        "audio/mpeg"
    } else {
        "application/octet-stream"
    }
}
