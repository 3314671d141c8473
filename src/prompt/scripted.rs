// ABOUTME: Non-interactive prompt answering from a prepared script.
// ABOUTME: Records every question so callers can assert on what was asked.

use parking_lot::Mutex;
use std::collections::VecDeque;

use super::{InteractivePrompt, Validator};
use crate::deploy::DeployError;

/// One question as it was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskedQuestion {
    pub message: String,
    pub default: Option<String>,
    pub validator: Option<Validator>,
}

/// Answers questions from a queue.
///
/// An empty scripted answer selects the question's default. Answers that fail
/// validation are an error rather than a re-ask, so a bad script fails loudly.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<AskedQuestion>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<AskedQuestion> {
        self.asked.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }

    fn next_answer(&self, message: &str) -> Result<String, DeployError> {
        self.answers.lock().pop_front().ok_or_else(|| {
            DeployError::Prompt(format!("no scripted answer for question: {message}"))
        })
    }
}

impl InteractivePrompt for ScriptedPrompt {
    fn ask(
        &self,
        message: &str,
        default: Option<&str>,
        validator: &Validator,
    ) -> Result<String, DeployError> {
        self.asked.lock().push(AskedQuestion {
            message: message.to_string(),
            default: default.map(String::from),
            validator: Some(validator.clone()),
        });

        let answer = self.next_answer(message)?;
        let answer = match (answer.is_empty(), default) {
            (true, Some(default)) => default.to_string(),
            _ => answer,
        };
        validator
            .check(&answer)
            .map_err(|reason| DeployError::Prompt(format!("scripted answer rejected: {reason}")))?;
        Ok(answer)
    }

    fn ask_secret(&self, message: &str) -> Result<String, DeployError> {
        self.asked.lock().push(AskedQuestion {
            message: message.to_string(),
            default: None,
            validator: None,
        });
        self.next_answer(message)
    }
}
