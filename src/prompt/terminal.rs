// ABOUTME: Terminal prompt built on dialoguer.
// ABOUTME: Re-asks until the answer validates; passwords are read without echo.

use dialoguer::{Input, Password};
use tokio::runtime::{Handle, RuntimeFlavor};

use super::{InteractivePrompt, Validator};
use crate::deploy::DeployError;

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

/// Run a blocking terminal read, moving other tasks off this worker first.
///
/// `block_in_place` panics outside a multi-threaded runtime, where the read
/// simply blocks the calling thread.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

impl InteractivePrompt for TerminalPrompt {
    fn ask(
        &self,
        message: &str,
        default: Option<&str>,
        validator: &Validator,
    ) -> Result<String, DeployError> {
        let mut input = Input::<String>::new()
            .with_prompt(message)
            .validate_with(|answer: &String| validator.check(answer));
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        blocking(|| input.interact_text()).map_err(|e| DeployError::Prompt(e.to_string()))
    }

    fn ask_secret(&self, message: &str) -> Result<String, DeployError> {
        blocking(|| Password::new().with_prompt(message).interact())
            .map_err(|e| DeployError::Prompt(e.to_string()))
    }
}
