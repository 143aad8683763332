//! Random user-agent strings for a handful of device families.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

const IPHONE: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/114.0.5735.124 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_7 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) FxiOS/115.0 Mobile/15E148 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
];

const SAMSUNG: &[&str] = &[
    "Mozilla/5.0 (Linux; Android 13; SM-S908B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 14; SM-G991U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 12; SM-A525F) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/17.0 Chrome/96.0.4664.104 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-N986U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Mobile Safari/537.36",
];

/// Device family to draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UaFamily {
    Iphone,
    Samsung,
}

impl UaFamily {
    pub const ALL: [Self; 2] = [Self::Iphone, Self::Samsung];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Iphone => "iphone",
            Self::Samsung => "samsung",
        }
    }

    /// Family for a query-string slug; unknown values are `None`.
    #[must_use]
    pub fn parse(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.slug() == slug)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Iphone => "Generate iPhone UA",
            Self::Samsung => "Generate Samsung UA",
        }
    }

    #[must_use]
    pub fn samples(self) -> &'static [&'static str] {
        match self {
            Self::Iphone => IPHONE,
            Self::Samsung => SAMSUNG,
        }
    }
}

/// Pick one string from the family's table.
#[must_use]
pub fn generate(family: UaFamily) -> &'static str {
    family
        .samples()
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or_default()
}
