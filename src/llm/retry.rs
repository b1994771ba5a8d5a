//! Remediation policy between completion attempts.
//!
//! Each failure category is remediated at most once per `generate` call, so
//! the attempt loop is bounded at three requests.

use std::fmt;

use super::request::RequestShape;

/// Why an attempt may succeed if the request shape changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// The server rejected a request parameter while `disable_reasoning`
    /// was sent. Carries the server's error text.
    ParameterRejected(String),
    /// The stream produced reasoning but no answer.
    ReasoningExhausted,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::ParameterRejected(detail) => write!(f, "parameter rejected: {}", detail),
            RetryReason::ReasoningExhausted => f.write_str("reasoning exhausted the token budget"),
        }
    }
}

/// Outcome of one attempt, or of the whole `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success(String),
    RetryableFailure(RetryReason),
    FatalFailure(String),
}

/// Next step chosen by [`RetryPolicy::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    /// Persist `can_disable_reasoning = false` and retry without it.
    StopDisablingReasoning,
    /// Ask the user for a larger `max_tokens` than `current`.
    RaiseBudget { current: u32 },
    /// Nothing left to try.
    GiveUp(String),
}

#[derive(Debug, Default)]
pub struct RetryPolicy {
    reasoning_flag_cleared: bool,
    budget_raised: bool,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the remediation for `reason`, given the shape of the request
    /// that just failed.
    pub fn decide(&mut self, reason: &RetryReason, shape: RequestShape) -> Remediation {
        if shape.disable_reasoning {
            if self.reasoning_flag_cleared {
                return Remediation::GiveUp(give_up_message(reason, shape));
            }
            self.reasoning_flag_cleared = true;
            return Remediation::StopDisablingReasoning;
        }

        match reason {
            RetryReason::ParameterRejected(detail) => Remediation::GiveUp(detail.clone()),
            RetryReason::ReasoningExhausted if !self.budget_raised => {
                self.budget_raised = true;
                Remediation::RaiseBudget {
                    current: shape.max_tokens,
                }
            }
            RetryReason::ReasoningExhausted => Remediation::GiveUp(give_up_message(reason, shape)),
        }
    }
}

fn give_up_message(reason: &RetryReason, shape: RequestShape) -> String {
    match reason {
        RetryReason::ParameterRejected(detail) => detail.clone(),
        RetryReason::ReasoningExhausted => format!(
            "The model used its whole budget ({} tokens) on reasoning and returned no commit message. \
Increase max_tokens for this provider.",
            shape.max_tokens
        ),
    }
}
