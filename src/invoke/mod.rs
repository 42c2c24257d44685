use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::config::{AugmentConfig, OutputStream};
use crate::error::{GraphHookError, Result};

/// Something that can turn a pattern into graph context.
#[async_trait]
pub trait PatternLookup: Send + Sync {
    /// Context text for `pattern`, or `None` when there is nothing to add.
    async fn lookup(&self, pattern: &str, cwd: &Path) -> Option<String>;

    fn name(&self) -> &str;
}

/// Runs `<command...> augment <pattern>` once per lookup.
#[derive(Debug, Clone)]
pub struct OneShotInvoker {
    command: Vec<String>,
    timeout: Duration,
    max_chars: usize,
    stream: OutputStream,
}

impl OneShotInvoker {
    pub fn new(
        command: Vec<String>,
        timeout: Duration,
        max_chars: usize,
        stream: OutputStream,
    ) -> Self {
        Self {
            command,
            timeout,
            max_chars,
            stream,
        }
    }

    pub fn from_config(command: Vec<String>, config: &AugmentConfig) -> Self {
        Self::new(
            command,
            Duration::from_secs(config.timeout_secs),
            config.max_output_chars,
            config.output_stream,
        )
    }

    /// Trimmed, truncated output, or `None` on spawn error, non-zero exit, timeout or empty output.
    pub async fn invoke(&self, pattern: &str, cwd: &Path) -> Option<String> {
        match self.run(pattern, cwd).await {
            Ok(text) => {
                let text = truncate_chars(text.trim(), self.max_chars);
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                debug!(pattern, error = %e, "augment lookup produced nothing");
                None
            }
        }
    }

    async fn run(&self, pattern: &str, cwd: &Path) -> Result<String> {
        let (program, args) = self.command.split_first().ok_or(GraphHookError::EmptyCommand)?;

        let (stdout, stderr) = match self.stream {
            OutputStream::Stdout => (Stdio::piped(), Stdio::null()),
            OutputStream::Stderr => (Stdio::null(), Stdio::piped()),
        };

        let mut child = Command::new(program)
            .args(args)
            .arg("augment")
            .arg(pattern)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GraphHookError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut output: Box<dyn AsyncRead + Send + Unpin> = match self.stream {
            OutputStream::Stdout => match child.stdout.take() {
                Some(out) => Box::new(out),
                None => return Err(GraphHookError::Io(missing_pipe())),
            },
            OutputStream::Stderr => match child.stderr.take() {
                Some(err) => Box::new(err),
                None => return Err(GraphHookError::Io(missing_pipe())),
            },
        };

        let collected = tokio::time::timeout(self.timeout, async {
            let mut buf = Vec::new();
            output.read_to_end(&mut buf).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((buf, status))
        })
        .await;

        match collected {
            Ok(Ok((buf, status))) if status.success() => {
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            Ok(Ok((_, status))) => Err(GraphHookError::LookupFailed {
                code: status.code(),
            }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                let _ = child.kill().await;
                Err(GraphHookError::LookupTimeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl PatternLookup for OneShotInvoker {
    async fn lookup(&self, pattern: &str, cwd: &Path) -> Option<String> {
        self.invoke(pattern, cwd).await
    }

    fn name(&self) -> &str {
        "one-shot"
    }
}

fn missing_pipe() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "output pipe unavailable")
}

/// First `max` chars of `s`. Never splits a char.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
