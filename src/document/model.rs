//! FormDocument data model — the single record both views read and write.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Declares a single-choice field whose wire spelling is fixed.
///
/// Generates serde renames, `as_str`, `from_wire` and `Display` so the
/// JSON snapshot, the form view and the extraction rules all agree on one
/// spelling per variant.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire spelling of this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }

            /// Parse a variant from its wire spelling.
            pub fn from_wire(value: &str) -> Option<Self> {
                match value {
                    $( $wire => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Document discriminator. Scopes persistence and default content.
    pub enum Mode {
        /// A buyer's request for proposals.
        Rfp => "rfp",
        /// A vendor's product listing.
        Listing => "listing",
    }
}

wire_enum! {
    /// Kind of AI application being described.
    #[derive(Default)]
    pub enum AppType {
        #[default]
        Unset => "",
        Chatbot => "chatbot",
        Vision => "vision",
        Automation => "automation",
        Prediction => "prediction",
        Content => "content",
    }
}

wire_enum! {
    /// Billing period of the price range.
    #[derive(Default)]
    pub enum PricePeriod {
        #[default]
        Month => "month",
        Year => "year",
        Project => "project",
    }
}

wire_enum! {
    pub enum AiModel {
        Open => "open",
        Proprietary => "proprietary",
        Hybrid => "hybrid",
    }
}

wire_enum! {
    /// Share of the workflow that still needs a human, in percent.
    pub enum HumanIntervention {
        Zero => "0",
        Half => "50",
        Full => "100",
    }
}

wire_enum! {
    pub enum IntegrationTime {
        UnderAWeek => "<1w",
        OneToThreeMonths => "1-3m",
        OverThreeMonths => ">3m",
    }
}

wire_enum! {
    /// Where the processed data is allowed to live.
    pub enum DataSovereignty {
        Eu => "eu",
        Usa => "usa",
        Onprem => "onprem",
        Global => "global",
    }
}

/// The shared structured document.
///
/// Set fields are ordered sets, so the no-duplicates invariant holds by
/// construction no matter which view wrote them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormDocument {
    // Solution
    pub title: String,
    pub description: String,
    pub app_type: AppType,
    pub sectors: BTreeSet<String>,
    pub client_sizes: BTreeSet<String>,
    pub offer_format: String,

    // Business model
    pub tech_modalities: BTreeSet<String>,
    pub price_min: String,
    pub price_max: String,
    pub price_period: PricePeriod,
    pub languages: BTreeSet<String>,

    // Engine
    pub ai_model: Option<AiModel>,
    pub human_intervention: Option<HumanIntervention>,
    /// Comma-separated free text.
    pub tech_stack: String,
    pub integrations: String,
    pub integration_time: Option<IntegrationTime>,

    // Trust
    pub data_sovereignty: Option<DataSovereignty>,
    pub data_security: BTreeSet<String>,
    pub compliance: BTreeSet<String>,
    pub certifications: BTreeSet<String>,
}

impl FormDocument {
    /// A document with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every field still holds its default value.
    pub fn is_pristine(&self) -> bool {
        *self == Self::default()
    }

    /// The entries of the comma-separated `tech_stack` text, trimmed.
    pub fn tech_stack_entries(&self) -> Vec<&str> {
        split_list(&self.tech_stack)
    }
}

/// Split a comma-separated list, dropping blank entries.
pub(crate) fn split_list(text: &str) -> Vec<&str> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
