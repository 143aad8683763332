//! Tool identifiers and sidebar sections.

use crate::tools::ToolKind;

/// Every view the shell can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    Dashboard,
    IpToLocation,
    IpScoreChecker,
    ZipToAddress,
    UaGenerator,
    UaChecker,
    GmailChecker,
}

impl ToolId {
    pub const ALL: [Self; 7] = [
        Self::Dashboard,
        Self::IpToLocation,
        Self::IpScoreChecker,
        Self::ZipToAddress,
        Self::UaGenerator,
        Self::UaChecker,
        Self::GmailChecker,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::IpToLocation => "ip-to-location",
            Self::IpScoreChecker => "ip-score-checker",
            Self::ZipToAddress => "zip-to-address",
            Self::UaGenerator => "ua-generator",
            Self::UaChecker => "ua-checker",
            Self::GmailChecker => "gmail-checker",
        }
    }

    /// Page heading and sidebar label.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::IpToLocation => "IP to Location",
            Self::IpScoreChecker => "IP Score Checker",
            Self::ZipToAddress => "ZIP to Address",
            Self::UaGenerator => "UA Generator",
            Self::UaChecker => "UA Checker",
            Self::GmailChecker => "Gmail Checker",
        }
    }

    /// Resolve a path segment. `ip-identity-finder` is an alias of the IP
    /// lookup view.
    #[must_use]
    pub fn parse(slug: &str) -> Option<Self> {
        if slug == "ip-identity-finder" {
            return Some(Self::IpToLocation);
        }
        Self::ALL.into_iter().find(|id| id.slug() == slug)
    }

    /// Same as [`ToolId::parse`] but unknown ids land on the dashboard.
    #[must_use]
    pub fn parse_or_dashboard(slug: &str) -> Self {
        Self::parse(slug).unwrap_or(Self::Dashboard)
    }

    /// The controller behind this view, if it submits requests.
    #[must_use]
    pub fn kind(self) -> Option<ToolKind> {
        match self {
            Self::IpToLocation => Some(ToolKind::IpLookup),
            Self::IpScoreChecker => Some(ToolKind::IpScore),
            Self::ZipToAddress => Some(ToolKind::ZipLookup),
            Self::UaChecker => Some(ToolKind::UaCheck),
            Self::GmailChecker => Some(ToolKind::EmailCheck),
            Self::Dashboard | Self::UaGenerator => None,
        }
    }

    #[must_use]
    pub fn from_kind(kind: ToolKind) -> Self {
        match kind {
            ToolKind::IpLookup => Self::IpToLocation,
            ToolKind::IpScore => Self::IpScoreChecker,
            ToolKind::ZipLookup => Self::ZipToAddress,
            ToolKind::UaCheck => Self::UaChecker,
            ToolKind::EmailCheck => Self::GmailChecker,
        }
    }

    #[must_use]
    pub fn href(self) -> String {
        match self {
            Self::Dashboard => "/".to_string(),
            other => format!("/tools/{}", other.slug()),
        }
    }
}

/// One titled group of sidebar links.
#[derive(Debug, Clone, Copy)]
pub struct NavSection {
    pub title: &'static str,
    pub tools: &'static [ToolId],
}

pub const SECTIONS: [NavSection; 3] = [
    NavSection {
        title: "IP & LOCATION TOOLS",
        tools: &[
            ToolId::IpToLocation,
            ToolId::IpScoreChecker,
            ToolId::ZipToAddress,
        ],
    },
    NavSection {
        title: "USER AGENT TOOLS",
        tools: &[ToolId::UaGenerator, ToolId::UaChecker],
    },
    NavSection {
        title: "EMAIL & COMMUNICATION",
        tools: &[ToolId::GmailChecker],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slugs() {
        for id in ToolId::ALL {
            assert_eq!(ToolId::parse(id.slug()), Some(id));
        }
        assert_eq!(ToolId::parse("ip-identity-finder"), Some(ToolId::IpToLocation));
        assert_eq!(ToolId::parse("nope"), None);
        assert_eq!(ToolId::parse_or_dashboard("nope"), ToolId::Dashboard);
    }

    #[test]
    fn test_kind_mapping_round_trips() {
        for id in ToolId::ALL {
            if let Some(kind) = id.kind() {
                assert_eq!(ToolId::from_kind(kind), id);
            }
        }
        assert!(ToolId::UaGenerator.kind().is_none());
    }

    #[test]
    fn test_sections_cover_every_tool() {
        let listed: Vec<ToolId> = SECTIONS.iter().flat_map(|s| s.tools.iter().copied()).collect();
        for id in ToolId::ALL.into_iter().filter(|id| *id != ToolId::Dashboard) {
            assert!(listed.contains(&id), "{id:?} missing from sidebar");
        }
    }
}
