//! Email format check plus AI analysis of the domain.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::completion::prompts::{self, DomainVerdict};
use crate::completion::{CompletionService, complete};

use super::{Checked, ToolError, ToolOutput};

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter an email address.";
pub const FAILURE_MESSAGE: &str = "Failed to get AI analysis for the email address.";
pub const INVALID_FORMAT_ANALYSIS: &str = "Invalid email format.";

/// One address character: not `@` and not whitespace. The whitespace set
/// counts U+FEFF and leaves out U+0085, unlike Unicode `White_Space`.
const NOT_SPACE_OR_AT: &str = r"[^\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}@]";

static EMAIL_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    let part = NOT_SPACE_OR_AT;
    Regex::new(&format!(r"^{part}+@{part}+\.{part}+$")).expect("email pattern compiles")
});

/// Outcome of an email check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerdict {
    pub is_valid_format: bool,
    pub is_disposable: bool,
    pub analysis: String,
}

impl EmailVerdict {
    #[must_use]
    pub fn invalid_format() -> Self {
        Self {
            is_valid_format: false,
            is_disposable: false,
            analysis: INVALID_FORMAT_ANALYSIS.to_string(),
        }
    }
}

/// Domain part of a well-formed address, or `None` when the format check
/// fails. The pattern admits exactly one `@`.
#[must_use]
pub fn domain_of(email: &str) -> Option<&str> {
    if !EMAIL_FORMAT.is_match(email) {
        return None;
    }
    email.split_once('@').map(|(_, domain)| domain)
}

/// Pure format check: a malformed address resolves immediately without any
/// remote call.
#[must_use]
pub fn check_format(email: &str) -> Result<&str, EmailVerdict> {
    domain_of(email).ok_or_else(EmailVerdict::invalid_format)
}

/// Empty input is a validation error; a malformed address short-circuits to
/// a successful `isValidFormat: false` verdict; otherwise the domain is
/// dispatched.
pub fn check(input: &str) -> Result<Checked, ToolError> {
    if input.is_empty() {
        return Err(ToolError::Validation(EMPTY_INPUT_MESSAGE.to_string()));
    }
    Ok(match check_format(input) {
        Ok(domain) => Checked::Dispatch(domain.to_string()),
        Err(verdict) => Checked::Resolved(ToolOutput::Email(verdict)),
    })
}

pub async fn run(completion: &dyn CompletionService, domain: &str) -> Result<EmailVerdict, ToolError> {
    let task = prompts::disposable_domain(domain);
    let result = complete::<DomainVerdict>(completion, &task.prompt, &task.schema)
        .await
        .map_err(|e| ToolError::from_completion(&e, FAILURE_MESSAGE))?;

    Ok(EmailVerdict {
        is_valid_format: true,
        is_disposable: result.value.is_disposable,
        analysis: result.value.analysis,
    })
}
