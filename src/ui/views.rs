//! askama templates. Files live under `templates/`.

use askama::Template;

use crate::completion::prompts::{ExampleLocation, RiskAssessment};
use crate::tools::ToolKind;
use crate::tools::email_check::EmailVerdict;
use crate::tools::ip_score::RiskBand;
use crate::tools::ua_generator::UaFamily;

#[derive(Debug)]
pub struct NavLink {
    pub href: String,
    pub name: &'static str,
    pub active: bool,
}

#[derive(Debug)]
pub struct NavGroup {
    pub title: &'static str,
    pub links: Vec<NavLink>,
}

#[derive(Template, Debug)]
#[template(path = "layout.html")]
pub struct Layout<'a> {
    pub title: &'static str,
    pub dashboard: NavLink,
    pub sections: Vec<NavGroup>,
    pub content: &'a str,
}

#[derive(Template, Debug)]
#[template(path = "dashboard.html")]
pub struct DashboardContent;

/// Per-tool form chrome.
#[derive(Debug, Clone, Copy)]
pub struct FormSpec {
    pub placeholder: &'static str,
    pub button: &'static str,
    pub multiline: bool,
    pub input_type: &'static str,
    /// `0` for no limit.
    pub maxlength: usize,
    pub note: &'static str,
}

impl FormSpec {
    #[must_use]
    pub fn for_kind(kind: ToolKind) -> Self {
        let base = Self {
            placeholder: "",
            button: "Submit",
            multiline: false,
            input_type: "text",
            maxlength: 0,
            note: "",
        };
        match kind {
            ToolKind::IpLookup => Self {
                placeholder: "Enter IP address (e.g., 8.8.8.8)",
                button: "Lookup",
                ..base
            },
            ToolKind::IpScore => Self {
                placeholder: "Enter IP address to analyze",
                button: "Analyze IP",
                ..base
            },
            ToolKind::ZipLookup => Self {
                placeholder: "Enter 5-digit US ZIP code",
                button: "Find Examples",
                maxlength: 5,
                note: "This tool provides AI-generated examples of public places within a ZIP code. It is not a precise residential address lookup service.",
                ..base
            },
            ToolKind::UaCheck => Self {
                placeholder: "Paste User Agent string here...",
                button: "Check User Agent",
                multiline: true,
                ..base
            },
            ToolKind::EmailCheck => Self {
                placeholder: "Enter email address to check",
                button: "Check Email",
                input_type: "email",
                note: "This tool checks email format and uses AI to analyze the domain for signs of being temporary or high-risk. It does not verify if the mailbox actually exists.",
                ..base
            },
        }
    }
}

#[derive(Template, Debug)]
#[template(path = "tool_form.html")]
pub struct ToolForm<'a> {
    pub action: String,
    pub result_id: String,
    pub input_value: &'a str,
    pub loading: bool,
    pub auto_submit: bool,
    pub spec: FormSpec,
    pub result_html: String,
}

/// Label/value pair; empty values render as `N/A`.
#[derive(Debug)]
pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
}

impl InfoRow {
    #[must_use]
    pub fn new(label: &'static str, value: String) -> Self {
        let value = if value.trim().is_empty() {
            "N/A".to_string()
        } else {
            value
        };
        Self { label, value }
    }
}

#[derive(Template, Debug)]
#[template(path = "fragments/error.html")]
pub struct ErrorFragment<'a> {
    pub message: &'a str,
}

#[derive(Template, Debug)]
#[template(path = "fragments/placeholder.html")]
pub struct PlaceholderFragment {
    pub text: &'static str,
}

#[derive(Template, Debug)]
#[template(path = "fragments/ip_record.html")]
pub struct IpRecordFragment<'a> {
    pub query: &'a str,
    pub rows: Vec<InfoRow>,
}

#[derive(Template, Debug)]
#[template(path = "fragments/ip_score.html")]
pub struct IpScoreFragment<'a> {
    pub score: String,
    pub band: &'static str,
    pub analysis: &'a str,
}

impl<'a> IpScoreFragment<'a> {
    #[must_use]
    pub fn new(assessment: &'a RiskAssessment) -> Self {
        Self {
            score: format_score(assessment.score),
            band: RiskBand::from_score(assessment.score).as_str(),
            analysis: &assessment.analysis,
        }
    }
}

/// Whole scores print without a decimal point.
fn format_score(score: f64) -> String {
    if score.fract().abs() < f64::EPSILON {
        format!("{score:.0}")
    } else {
        format!("{score}")
    }
}

#[derive(Template, Debug)]
#[template(path = "fragments/zip_locations.html")]
pub struct ZipLocationsFragment<'a> {
    pub zip: &'a str,
    pub locations: &'a [ExampleLocation],
}

#[derive(Template, Debug)]
#[template(path = "fragments/ua_breakdown.html")]
pub struct UaBreakdownFragment {
    pub rows: Vec<InfoRow>,
}

#[derive(Template, Debug)]
#[template(path = "fragments/email_verdict.html")]
pub struct EmailVerdictFragment<'a> {
    pub class: &'static str,
    pub symbol: &'static str,
    pub analysis: &'a str,
}

impl<'a> EmailVerdictFragment<'a> {
    #[must_use]
    pub fn new(verdict: &'a EmailVerdict) -> Self {
        let (class, symbol) = if !verdict.is_valid_format {
            ("verdict-invalid", "\u{2715}")
        } else if verdict.is_disposable {
            ("verdict-disposable", "\u{26a0}")
        } else {
            ("verdict-ok", "\u{2713}")
        };
        Self {
            class,
            symbol,
            analysis: &verdict.analysis,
        }
    }
}

#[derive(Template, Debug)]
#[template(path = "ua_generator.html")]
pub struct UaGeneratorContent<'a> {
    pub families: Vec<UaFamily>,
    pub sample: &'a str,
}

#[derive(Template, Debug)]
#[template(path = "fragments/ua_sample.html")]
pub struct UaSampleFragment<'a> {
    pub sample: &'a str,
}
