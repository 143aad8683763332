//! IP risk score: geolocation lookup followed by an AI assessment of the
//! resolved record.

use serde::Serialize;

use crate::completion::prompts::{self, RiskAssessment};
use crate::completion::{CompletionService, complete};
use crate::geo::GeoLookup;

use super::{Checked, ToolError, ip_lookup};

pub const FAILURE_MESSAGE: &str = "Failed to get AI analysis for the IP address.";

/// Presentation band for a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// `> 75` high, `> 40` medium, otherwise low.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 75.0 {
            Self::High
        } else if score > 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Same rule as the plain lookup.
pub fn check(input: &str) -> Result<Checked, ToolError> {
    ip_lookup::check(input)
}

/// Geolocation errors surface as-is; completion errors get
/// [`FAILURE_MESSAGE`].
pub async fn run(
    geo: &dyn GeoLookup,
    completion: &dyn CompletionService,
    ip: &str,
) -> Result<RiskAssessment, ToolError> {
    let record = geo.resolve_ip(ip).await?;
    let task = prompts::score_ip(&record);

    let result = complete::<RiskAssessment>(completion, &task.prompt, &task.schema)
        .await
        .map_err(|e| ToolError::from_completion(&e, FAILURE_MESSAGE))?;

    Ok(result.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(RiskBand::from_score(0.0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(40.0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(40.5), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(41.0), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(75.0), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(76.0), RiskBand::High);
        assert_eq!(RiskBand::from_score(100.0), RiskBand::High);
    }
}
