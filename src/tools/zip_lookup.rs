//! ZIP code to example locations.

use crate::completion::prompts::{self, LocationExamples};
use crate::completion::{CompletionService, complete};

use super::{Checked, ToolError};

pub const INVALID_ZIP_MESSAGE: &str = "Please enter a valid 5-digit US ZIP code.";
pub const FAILURE_MESSAGE: &str = "Failed to get AI-powered location examples.";

/// Upper bound on locations kept from a response.
pub const MAX_LOCATIONS: usize = 5;

/// Exactly five ASCII digits, no trimming.
#[must_use]
pub fn is_valid_zip(input: &str) -> bool {
    input.len() == 5 && input.bytes().all(|b| b.is_ascii_digit())
}

pub fn check(input: &str) -> Result<Checked, ToolError> {
    if is_valid_zip(input) {
        Ok(Checked::Dispatch(input.to_string()))
    } else {
        Err(ToolError::Validation(INVALID_ZIP_MESSAGE.to_string()))
    }
}

pub async fn run(completion: &dyn CompletionService, zip: &str) -> Result<LocationExamples, ToolError> {
    let task = prompts::zip_locations(zip);
    let mut result = complete::<LocationExamples>(completion, &task.prompt, &task.schema)
        .await
        .map_err(|e| ToolError::from_completion(&e, FAILURE_MESSAGE))?;

    result.value.locations.truncate(MAX_LOCATIONS);
    Ok(result.value)
}
