//! Server-rendered presentation shell.
//!
//! Pages are askama templates (auto-escaped) wrapped in a common layout with
//! the sidebar. Tool forms post with HTMX and swap only the result region;
//! without JavaScript the same form posts normally and receives the full
//! page.
//!
//! - [`nav`]: tool identifiers and sidebar sections
//! - [`views`]: templates and the view-models fed into them

pub mod nav;
pub mod views;

use askama::Template;

use crate::tools::ua_generator::UaFamily;
use crate::tools::{ToolKind, ToolOutput, ToolState};
use nav::{SECTIONS, ToolId};
use views::{
    DashboardContent, EmailVerdictFragment, ErrorFragment, FormSpec, InfoRow, IpRecordFragment,
    IpScoreFragment, Layout, NavGroup, NavLink, PlaceholderFragment, ToolForm, UaBreakdownFragment,
    UaGeneratorContent, UaSampleFragment, ZipLocationsFragment,
};

/// Shown before the first UA generation.
pub const UA_PLACEHOLDER: &str = "Click a button to generate a User Agent string.";

/// What a tool page needs beyond its instance state.
#[derive(Debug, Clone)]
pub struct ToolView<'a> {
    pub kind: ToolKind,
    pub instance_id: String,
    pub state: &'a ToolState,
    /// Submit the form once as soon as it loads.
    pub auto_submit: bool,
}

/// Wrap page content in the layout for `active`.
pub fn page(active: ToolId, content: &str) -> Result<String, askama::Error> {
    let link = |id: ToolId| NavLink {
        href: id.href(),
        name: id.title(),
        active: id == active,
    };

    Layout {
        title: active.title(),
        dashboard: link(ToolId::Dashboard),
        sections: SECTIONS
            .iter()
            .map(|section| NavGroup {
                title: section.title,
                links: section.tools.iter().copied().map(link).collect(),
            })
            .collect(),
        content,
    }
    .render()
}

pub fn dashboard_page() -> Result<String, askama::Error> {
    page(ToolId::Dashboard, &DashboardContent.render()?)
}

/// Full page for a request-bearing tool.
pub fn tool_page(view: &ToolView<'_>) -> Result<String, askama::Error> {
    let id = ToolId::from_kind(view.kind);
    let spec = FormSpec::for_kind(view.kind);
    let form = ToolForm {
        action: format!("/tools/{}/{}", id.slug(), view.instance_id),
        result_id: format!("result-{}", view.instance_id),
        input_value: &view.state.input,
        loading: view.state.is_loading(),
        auto_submit: view.auto_submit,
        spec,
        result_html: result_fragment(view.kind, view.state)?,
    };
    page(id, &form.render()?)
}

/// The result region of a tool: error, rendered result, or the idle hint.
pub fn result_fragment(kind: ToolKind, state: &ToolState) -> Result<String, askama::Error> {
    if let Some(message) = &state.error {
        return ErrorFragment { message }.render();
    }

    match &state.result {
        Some(ToolOutput::IpRecord(record)) => IpRecordFragment {
            query: &record.query,
            rows: vec![
                InfoRow::new("Country", record.country_label()),
                InfoRow::new("Region", record.region_label()),
                InfoRow::new("City", record.city.clone()),
                InfoRow::new("ZIP Code", record.zip.clone()),
                InfoRow::new("Coordinates", record.coordinates()),
                InfoRow::new("Timezone", record.timezone.clone()),
                InfoRow::new("ISP", record.isp.clone()),
                InfoRow::new("Organization", record.org.clone()),
                InfoRow::new("ASN", record.asn.clone()),
            ],
        }
        .render(),
        Some(ToolOutput::RiskScore(assessment)) => IpScoreFragment::new(assessment).render(),
        Some(ToolOutput::Locations(examples)) if !examples.locations.is_empty() => {
            ZipLocationsFragment {
                zip: &state.input,
                locations: &examples.locations,
            }
            .render()
        }
        Some(ToolOutput::UserAgent(ua)) => UaBreakdownFragment {
            rows: vec![
                InfoRow::new("Device Type", ua.device_type.clone()),
                InfoRow::new("Device", ua.device.clone()),
                InfoRow::new("Operating System", ua.os.clone()),
                InfoRow::new("Browser", ua.browser.clone()),
            ],
        }
        .render(),
        Some(ToolOutput::Email(verdict)) => EmailVerdictFragment::new(verdict).render(),
        Some(ToolOutput::Locations(_)) | None => idle_hint(kind),
    }
}

fn idle_hint(kind: ToolKind) -> Result<String, askama::Error> {
    match kind {
        ToolKind::ZipLookup => PlaceholderFragment {
            text: "Enter a ZIP code to see example locations.",
        }
        .render(),
        _ => Ok(String::new()),
    }
}

pub fn ua_generator_page(sample: Option<&str>) -> Result<String, askama::Error> {
    let content = UaGeneratorContent {
        families: UaFamily::ALL.to_vec(),
        sample: sample.unwrap_or(UA_PLACEHOLDER),
    };
    page(ToolId::UaGenerator, &content.render()?)
}

pub fn ua_sample_fragment(sample: &str) -> Result<String, askama::Error> {
    UaSampleFragment { sample }.render()
}
