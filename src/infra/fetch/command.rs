use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::{config::OutputFormat, ports::FetchPort};

/// Fetches by running a shell command and reading its stdout.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    command: String,
    format: OutputFormat,
}

impl CommandFetcher {
    pub fn new(command: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            command: command.into(),
            format,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell(&self) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", &self.command]);
            cmd
        }

        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", &self.command]);
            cmd
        }
    }

    async fn run_command(&self) -> Result<String> {
        let output = self
            .shell()
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to execute fetch command: {}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "fetch command failed (status={}): {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8(output.stdout)
            .context("fetch command produced non UTF-8 output")?
            .trim()
            .to_string())
    }
}

pub(crate) fn decode_output(stdout: &str, format: OutputFormat) -> Result<Value> {
    match format {
        OutputFormat::Json => {
            serde_json::from_str(stdout).context("fetch command output is not valid JSON")
        }
        OutputFormat::Text => Ok(Value::String(stdout.to_string())),
    }
}

#[async_trait]
impl FetchPort<Value> for CommandFetcher {
    async fn fetch(&self) -> Result<Value> {
        let stdout = self.run_command().await?;
        decode_output(&stdout, self.format)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_output, CommandFetcher};
    use crate::{config::OutputFormat, ports::FetchPort};

    #[test]
    fn decode_json_and_text() {
        assert_eq!(
            decode_output(r#"{"ok":true}"#, OutputFormat::Json).unwrap(),
            json!({"ok": true})
        );
        assert_eq!(
            decode_output("plain", OutputFormat::Text).unwrap(),
            json!("plain")
        );
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = decode_output("not json", OutputFormat::Json).expect_err("should fail");
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fetch_runs_shell_command() {
        let fetcher = CommandFetcher::new(r#"printf '{"n": 3}'"#, OutputFormat::Json);
        assert_eq!(fetcher.fetch().await.unwrap(), json!({"n": 3}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fetch_reports_non_zero_exit_with_stderr() {
        let fetcher = CommandFetcher::new("echo boom >&2; exit 3", OutputFormat::Text);
        let err = fetcher.fetch().await.expect_err("should fail");
        let message = format!("{err:#}");
        assert!(message.contains("fetch command failed"));
        assert!(message.contains("boom"));
    }
}
