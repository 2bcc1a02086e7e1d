//! Shell command adapter.
//!
//! Runs a command through `sh -c` and parses stdout as JSON. This is how
//! the dashboard reaches ssh/ssm/aws/docker tooling without linking any of
//! it: the command is expected to print one JSON document.

use std::process::Stdio;

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::fetch::{FetchError, FetchFuture, ResourceFetcher};

/// Longest stderr excerpt carried in a [`FetchError::CommandFailed`].
const STDERR_EXCERPT_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct CommandFetcher {
    command: String,
}

impl CommandFetcher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl ResourceFetcher for CommandFetcher {
    fn fetch(&self, key: &str) -> FetchFuture<Value> {
        let command = self.command.clone();
        let key = key.to_string();
        Box::pin(async move {
            debug!(
                event = "core.fetch.command_started",
                key = key.as_str(),
                command = command.as_str()
            );

            // Dropping the future (timeout, teardown) kills the child.
            let output = Command::new("sh")
                .arg("-c")
                .arg(&command)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| FetchError::SpawnFailed {
                    message: e.to_string(),
                })?;

            if !output.status.success() {
                return Err(FetchError::CommandFailed {
                    status: output.status.to_string(),
                    stderr: stderr_excerpt(&output.stderr),
                });
            }

            parse_output(&output.stdout)
        })
    }
}

/// Parse adapter stdout. Empty output is treated as `null`, which panels
/// show as "no data reported".
pub fn parse_output(stdout: &[u8]) -> Result<Value, FetchError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(stdout).map_err(|e| FetchError::MalformedOutput {
        message: e.to_string(),
    })
}

fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let last_line = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim();
    last_line.chars().take(STDERR_EXCERPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_output_json() {
        let value = parse_output(br#"[{"name":"web","status":"healthy"}]"#).unwrap();
        assert_eq!(value, json!([{ "name": "web", "status": "healthy" }]));
    }

    #[test]
    fn test_parse_output_empty_is_null() {
        assert_eq!(parse_output(b"  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_output_malformed() {
        let err = parse_output(b"CONTAINER ID   NAME").unwrap_err();
        assert!(matches!(err, FetchError::MalformedOutput { .. }));
    }

    #[test]
    fn test_stderr_excerpt_takes_last_line() {
        let excerpt = stderr_excerpt(b"warning: foo\nfatal: bar\n\n");
        assert_eq!(excerpt, "fatal: bar");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_fetcher_success() {
        let fetcher = CommandFetcher::new(r#"echo '{"active":"blue"}'"#);
        let value = fetcher.fetch("deploy:prod").await.unwrap();
        assert_eq!(value["active"], "blue");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_fetcher_failure() {
        let fetcher = CommandFetcher::new("echo 'no route to host' >&2; exit 3");
        let err = fetcher.fetch("docker:prod").await.unwrap_err();
        match err {
            FetchError::CommandFailed { stderr, .. } => assert_eq!(stderr, "no route to host"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
