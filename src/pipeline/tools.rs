use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

use crate::error::TrainingError;

/// A single external program call, run to completion in `cwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: &str, args: Vec<String>, cwd: PathBuf) -> Self {
        Self {
            program: program.to_string(),
            args,
            cwd,
        }
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external training tools. Implementations must block until the tool exits.
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

/// Spawns real processes and fails on a non-zero exit status.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl ToolRunner for CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        debug!("running {} in {}", invocation.command_line(), invocation.cwd.display());
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .output()
            .map_err(|err| TrainingError::ToolFailed {
                tool: invocation.program.clone(),
                status: "not started".to_string(),
                stderr: format!("{} (is it installed?)", err),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stdout.is_empty() {
            info!("{}", stdout);
        }
        if !stderr.is_empty() {
            info!("{}", stderr);
        }

        if !output.status.success() {
            return Err(TrainingError::ToolFailed {
                tool: invocation.program.clone(),
                status: output.status.to_string(),
                stderr,
            }
            .into());
        }
        Ok(ToolOutput { stdout, stderr })
    }
}
