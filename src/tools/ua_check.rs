//! User-agent parsing.

use crate::completion::prompts::{self, UaBreakdown};
use crate::completion::{CompletionService, complete};

use super::{Checked, ToolError};

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter a User Agent string.";
pub const FAILURE_MESSAGE: &str = "Failed to get AI analysis for the User Agent.";

pub fn check(input: &str) -> Result<Checked, ToolError> {
    let ua = input.trim();
    if ua.is_empty() {
        return Err(ToolError::Validation(EMPTY_INPUT_MESSAGE.to_string()));
    }
    Ok(Checked::Dispatch(ua.to_string()))
}

pub async fn run(completion: &dyn CompletionService, ua: &str) -> Result<UaBreakdown, ToolError> {
    let task = prompts::parse_user_agent(ua);
    let result = complete::<UaBreakdown>(completion, &task.prompt, &task.schema)
        .await
        .map_err(|e| ToolError::from_completion(&e, FAILURE_MESSAGE))?;
    Ok(result.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        assert!(check("\n\t ").is_err());
        assert_eq!(
            check(" Mozilla/5.0 ").unwrap(),
            Checked::Dispatch("Mozilla/5.0".to_string())
        );
    }
}
