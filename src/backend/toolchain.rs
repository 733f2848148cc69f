//! Build and run a [`Translation`] with the host toolchain.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

use thiserror::Error;
use tracing::{debug, info};

use super::Translation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Run => write!(f, "run"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{stage} failed to start: {source}")]
    Spawn { stage: Stage, source: io::Error },
    #[error("{stage} exited with {status}\n{stderr}")]
    Failed {
        stage: Stage,
        status: i32,
        stdout: String,
        stderr: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Write the source to a scratch directory, build it with the expanded
/// command template and run the produced binary.
pub fn run(translation: &Translation) -> Result<RunOutput, ToolError> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join(format!("program.{}", translation.extension));
    let output = dir.path().join("program");
    fs::write(&input, &translation.source)?;

    let command = expand(&translation.build_command, &input, &output);
    debug!(command = command.as_str(), "building");
    capture(Stage::Build, Command::new("sh").args(["-c", &command]))?;

    info!(binary = %output.display(), "running translated program");
    capture(Stage::Run, &mut Command::new(&output))
}

pub fn expand(template: &str, input: &Path, output: &Path) -> String {
    template
        .replace("{input}", &quote(input))
        .replace("{output}", &quote(output))
}

fn quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}

fn capture(stage: Stage, command: &mut Command) -> Result<RunOutput, ToolError> {
    let Output {
        status,
        stdout,
        stderr,
    } = command
        .output()
        .map_err(|source| ToolError::Spawn { stage, source })?;
    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    let stderr = String::from_utf8_lossy(&stderr).into_owned();
    if !status.success() {
        return Err(ToolError::Failed {
            stage,
            status: status.code().unwrap_or(-1),
            stdout,
            stderr,
        });
    }
    Ok(RunOutput { stdout, stderr })
}
