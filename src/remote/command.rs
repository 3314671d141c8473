// ABOUTME: Structured command representation and shell rendering.
// ABOUTME: Arguments stay a list until the transport needs a single quoted command line.

use std::fmt;

use crate::deploy::DeployError;
use crate::types::RemotePath;

const REDACTED: &str = "********";

/// What to do when a command exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tolerance {
    /// Fail the workflow.
    #[default]
    Abort,
    /// Log the failure and hand the output back.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Plain(String),
    Secret(String),
}

impl Arg {
    fn value(&self) -> &str {
        match self {
            Arg::Plain(v) | Arg::Secret(v) => v,
        }
    }
}

/// A program, its arguments, and where to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<Arg>,
    cwd: Option<RemotePath>,
    env: Vec<(String, String)>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|a| Arg::Plain(a.into())));
        self
    }

    /// Argument whose value is masked in logs and error messages.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Secret(arg.into()));
        self
    }

    pub fn current_dir(mut self, dir: &RemotePath) -> Self {
        self.cwd = Some(dir.clone());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument values, secrets included.
    pub fn arg_values(&self) -> Vec<&str> {
        self.args.iter().map(Arg::value).collect()
    }

    pub fn cwd(&self) -> Option<&RemotePath> {
        self.cwd.as_ref()
    }

    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env
    }

    /// Render as a single command line for a POSIX shell.
    pub fn to_shell(&self, privileged: bool) -> String {
        self.render(privileged, false)
    }

    /// Command line safe to log.
    pub fn redacted(&self) -> String {
        self.render(false, true)
    }

    /// With a working directory, a privileged command runs `cd` under sudo too,
    /// so directories only root can enter still work.
    fn render(&self, privileged: bool, redact: bool) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.env.is_empty() {
            parts.push("env".to_string());
            for (key, value) in &self.env {
                parts.push(shell_quote(&format!("{key}={value}")));
            }
        }
        parts.push(shell_quote(&self.program));
        for arg in &self.args {
            match arg {
                Arg::Secret(_) if redact => parts.push(REDACTED.to_string()),
                other => parts.push(shell_quote(other.value())),
            }
        }

        let line = parts.join(" ");
        match (&self.cwd, privileged) {
            (Some(dir), false) => format!("cd {} && {}", shell_quote(dir.as_str()), line),
            (Some(dir), true) => format!(
                "sudo -n -- sh -c {}",
                shell_quote(&format!("cd {} && {}", shell_quote(dir.as_str()), line))
            ),
            (None, true) => format!("sudo -n -- {line}"),
            (None, false) => line,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: u32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout with the trailing newline removed.
    pub fn trimmed(&self) -> &str {
        self.stdout.trim_end_matches(['\n', '\r'])
    }
}

/// Apply `tolerance` to a finished command.
pub fn check_output(
    command: &Command,
    output: CommandOutput,
    tolerance: Tolerance,
) -> Result<CommandOutput, DeployError> {
    if output.success() {
        return Ok(output);
    }

    match tolerance {
        Tolerance::Warn => {
            tracing::warn!(
                "command exited with {} (continuing): {}",
                output.exit_code,
                command
            );
            Ok(output)
        }
        Tolerance::Abort => Err(DeployError::RemoteCommandFailed {
            command: command.redacted(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        }),
    }
}

/// Quote a word for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}
