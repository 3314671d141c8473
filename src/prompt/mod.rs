// ABOUTME: Operator-facing questions routed through one replaceable interface.
// ABOUTME: Terminal implementation for humans, scripted implementation for automation and tests.

mod scripted;
mod terminal;

pub use scripted::{AskedQuestion, ScriptedPrompt};
pub use terminal::TerminalPrompt;

use crate::deploy::DeployError;

/// Accepted answers for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// Any non-empty answer.
    NonEmpty,
    /// Exactly one of these values.
    OneOf(Vec<String>),
}

impl Validator {
    pub fn yes_no() -> Self {
        Validator::OneOf(vec!["yes".to_string(), "no".to_string()])
    }

    pub fn check(&self, answer: &str) -> Result<(), String> {
        match self {
            Validator::NonEmpty if answer.trim().is_empty() => {
                Err("an answer is required".to_string())
            }
            Validator::NonEmpty => Ok(()),
            Validator::OneOf(allowed) if allowed.iter().any(|a| a == answer) => Ok(()),
            Validator::OneOf(allowed) => Err(format!(
                "'{}' is not one of: {}",
                answer,
                allowed.join(", ")
            )),
        }
    }
}

/// Asks the operator questions.
pub trait InteractivePrompt: Send + Sync {
    /// Ask until an answer passes `validator`; `default` is used for an empty answer.
    fn ask(
        &self,
        message: &str,
        default: Option<&str>,
        validator: &Validator,
    ) -> Result<String, DeployError>;

    /// Ask for a secret without echoing it.
    fn ask_secret(&self, message: &str) -> Result<String, DeployError>;
}

/// Ask a yes/no question defaulting to "no"; anything but "yes" aborts with `abort_message`.
pub fn confirm_or_abort(
    prompt: &dyn InteractivePrompt,
    message: &str,
    abort_message: &str,
) -> Result<(), DeployError> {
    let answer = prompt.ask(message, Some("no"), &Validator::yes_no())?;
    if answer.eq_ignore_ascii_case("yes") {
        Ok(())
    } else {
        Err(DeployError::UserAbort(abort_message.to_string()))
    }
}
