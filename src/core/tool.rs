use std::process::{Command, ExitStatus, Output};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to invoke {tool}; is it installed?")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}

/// Runs `command` to completion, turning a non-zero exit into
/// [`ToolError::Failed`] with the captured stderr.
pub fn run_tool(tool: &'static str, command: &mut Command) -> Result<Output, ToolError> {
    tracing::debug!(tool, ?command, "running external tool");
    let output = command
        .output()
        .map_err(|source| ToolError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}
