//! Field addressing for the form view — typed keys and direct setters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

use super::model::{
    AiModel, AppType, DataSovereignty, FormDocument, HumanIntervention, IntegrationTime,
    PricePeriod,
};

/// A single-valued (string or enum) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Title,
    Description,
    AppType,
    OfferFormat,
    PriceMin,
    PriceMax,
    PricePeriod,
    AiModel,
    HumanIntervention,
    TechStack,
    Integrations,
    IntegrationTime,
    DataSovereignty,
}

/// A set-valued field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetField {
    Sectors,
    ClientSizes,
    TechModalities,
    Languages,
    DataSecurity,
    Compliance,
    Certifications,
}

/// Any document field, as addressed by its camelCase wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Scalar(ScalarField),
    Set(SetField),
}

impl ScalarField {
    pub const ALL: &'static [ScalarField] = &[
        Self::Title,
        Self::Description,
        Self::AppType,
        Self::OfferFormat,
        Self::PriceMin,
        Self::PriceMax,
        Self::PricePeriod,
        Self::AiModel,
        Self::HumanIntervention,
        Self::TechStack,
        Self::Integrations,
        Self::IntegrationTime,
        Self::DataSovereignty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::AppType => "appType",
            Self::OfferFormat => "offerFormat",
            Self::PriceMin => "priceMin",
            Self::PriceMax => "priceMax",
            Self::PricePeriod => "pricePeriod",
            Self::AiModel => "aiModel",
            Self::HumanIntervention => "humanIntervention",
            Self::TechStack => "techStack",
            Self::Integrations => "integrations",
            Self::IntegrationTime => "integrationTime",
            Self::DataSovereignty => "dataSovereignty",
        }
    }

    /// Wizard section (1-based) the field is edited in.
    pub fn section(&self) -> u8 {
        match self {
            Self::Title | Self::Description | Self::AppType | Self::OfferFormat => 1,
            Self::PriceMin | Self::PriceMax | Self::PricePeriod => 2,
            Self::AiModel
            | Self::HumanIntervention
            | Self::TechStack
            | Self::Integrations
            | Self::IntegrationTime => 3,
            Self::DataSovereignty => 4,
        }
    }
}

impl SetField {
    pub const ALL: &'static [SetField] = &[
        Self::Sectors,
        Self::ClientSizes,
        Self::TechModalities,
        Self::Languages,
        Self::DataSecurity,
        Self::Compliance,
        Self::Certifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sectors => "sectors",
            Self::ClientSizes => "clientSizes",
            Self::TechModalities => "techModalities",
            Self::Languages => "languages",
            Self::DataSecurity => "dataSecurity",
            Self::Compliance => "compliance",
            Self::Certifications => "certifications",
        }
    }

    /// Wizard section (1-based) the field is edited in.
    pub fn section(&self) -> u8 {
        match self {
            Self::Sectors | Self::ClientSizes => 1,
            Self::TechModalities | Self::Languages => 2,
            Self::DataSecurity | Self::Compliance | Self::Certifications => 4,
        }
    }
}

impl FieldKey {
    /// Parse a field from its wire name (`"priceMin"`, `"sectors"`…).
    pub fn parse(name: &str) -> Result<Self, DocumentError> {
        if let Some(field) = ScalarField::ALL.iter().find(|f| f.as_str() == name) {
            return Ok(Self::Scalar(*field));
        }
        if let Some(field) = SetField::ALL.iter().find(|f| f.as_str() == name) {
            return Ok(Self::Set(*field));
        }
        Err(DocumentError::UnknownField(name.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar(f) => f.as_str(),
            Self::Set(f) => f.as_str(),
        }
    }

    pub fn section(&self) -> u8 {
        match self {
            Self::Scalar(f) => f.section(),
            Self::Set(f) => f.section(),
        }
    }

    /// Every field, scalars first.
    pub fn all() -> impl Iterator<Item = FieldKey> {
        ScalarField::ALL
            .iter()
            .copied()
            .map(FieldKey::Scalar)
            .chain(SetField::ALL.iter().copied().map(FieldKey::Set))
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that must be filled before the document can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    Title,
    Description,
    Sectors,
    TechModalities,
}

impl RequiredField {
    /// Submit-check order.
    pub const ALL: &'static [RequiredField] = &[
        Self::Title,
        Self::Description,
        Self::Sectors,
        Self::TechModalities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Sectors => "sectors",
            Self::TechModalities => "techModalities",
        }
    }

    /// Whether `doc` satisfies this requirement.
    pub fn is_filled(&self, doc: &FormDocument) -> bool {
        match self {
            Self::Title => !doc.title.trim().is_empty(),
            Self::Description => !doc.description.trim().is_empty(),
            Self::Sectors => !doc.sectors.is_empty(),
            Self::TechModalities => !doc.tech_modalities.is_empty(),
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FormDocument {
    /// Required fields that are still empty, in submit-check order.
    pub fn missing_required(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .iter()
            .copied()
            .filter(|f| !f.is_filled(self))
            .collect()
    }

    /// Set a scalar field from its wire representation.
    ///
    /// Enum fields accept their wire spelling; an empty value clears an
    /// optional enum. On error the document is left untouched.
    pub fn set_field(&mut self, field: ScalarField, value: &str) -> Result<(), DocumentError> {
        let invalid = || DocumentError::InvalidValue {
            field: field.as_str().to_string(),
            value: value.to_string(),
        };

        match field {
            ScalarField::Title => self.title = value.to_string(),
            ScalarField::Description => self.description = value.to_string(),
            ScalarField::OfferFormat => self.offer_format = value.to_string(),
            ScalarField::TechStack => self.tech_stack = value.to_string(),
            ScalarField::Integrations => self.integrations = value.to_string(),
            ScalarField::PriceMin | ScalarField::PriceMax => {
                let trimmed = value.trim();
                if !trimmed.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if field == ScalarField::PriceMin {
                    self.price_min = trimmed.to_string();
                } else {
                    self.price_max = trimmed.to_string();
                }
            }
            ScalarField::AppType => {
                self.app_type = AppType::from_wire(value).ok_or_else(invalid)?;
            }
            ScalarField::PricePeriod => {
                self.price_period = PricePeriod::from_wire(value).ok_or_else(invalid)?;
            }
            ScalarField::AiModel => {
                self.ai_model = parse_optional(value, AiModel::from_wire).ok_or_else(invalid)?;
            }
            ScalarField::HumanIntervention => {
                self.human_intervention =
                    parse_optional(value, HumanIntervention::from_wire).ok_or_else(invalid)?;
            }
            ScalarField::IntegrationTime => {
                self.integration_time =
                    parse_optional(value, IntegrationTime::from_wire).ok_or_else(invalid)?;
            }
            ScalarField::DataSovereignty => {
                self.data_sovereignty =
                    parse_optional(value, DataSovereignty::from_wire).ok_or_else(invalid)?;
            }
        }
        Ok(())
    }

    /// Flip membership of `item` in a set field.
    ///
    /// Returns whether `item` is a member afterwards. Blank items are
    /// ignored and reported as non-members.
    pub fn toggle_set_member(&mut self, field: SetField, item: &str) -> bool {
        let item = item.trim();
        if item.is_empty() {
            return false;
        }
        let set = self.set_mut(field);
        if set.remove(item) {
            false
        } else {
            set.insert(item.to_string());
            true
        }
    }

    pub fn set(&self, field: SetField) -> &BTreeSet<String> {
        match field {
            SetField::Sectors => &self.sectors,
            SetField::ClientSizes => &self.client_sizes,
            SetField::TechModalities => &self.tech_modalities,
            SetField::Languages => &self.languages,
            SetField::DataSecurity => &self.data_security,
            SetField::Compliance => &self.compliance,
            SetField::Certifications => &self.certifications,
        }
    }

    pub fn set_mut(&mut self, field: SetField) -> &mut BTreeSet<String> {
        match field {
            SetField::Sectors => &mut self.sectors,
            SetField::ClientSizes => &mut self.client_sizes,
            SetField::TechModalities => &mut self.tech_modalities,
            SetField::Languages => &mut self.languages,
            SetField::DataSecurity => &mut self.data_security,
            SetField::Compliance => &mut self.compliance,
            SetField::Certifications => &mut self.certifications,
        }
    }

    /// Wire representation of a scalar field (`""` when unset).
    pub fn scalar(&self, field: ScalarField) -> String {
        match field {
            ScalarField::Title => self.title.clone(),
            ScalarField::Description => self.description.clone(),
            ScalarField::AppType => self.app_type.as_str().to_string(),
            ScalarField::OfferFormat => self.offer_format.clone(),
            ScalarField::PriceMin => self.price_min.clone(),
            ScalarField::PriceMax => self.price_max.clone(),
            ScalarField::PricePeriod => self.price_period.as_str().to_string(),
            ScalarField::AiModel => wire_or_empty(self.ai_model.map(|v| v.as_str())),
            ScalarField::HumanIntervention => {
                wire_or_empty(self.human_intervention.map(|v| v.as_str()))
            }
            ScalarField::TechStack => self.tech_stack.clone(),
            ScalarField::Integrations => self.integrations.clone(),
            ScalarField::IntegrationTime => {
                wire_or_empty(self.integration_time.map(|v| v.as_str()))
            }
            ScalarField::DataSovereignty => {
                wire_or_empty(self.data_sovereignty.map(|v| v.as_str()))
            }
        }
    }

    /// Whether a field holds something other than its default.
    ///
    /// `pricePeriod` always has a value and counts as filled.
    pub fn is_filled(&self, key: FieldKey) -> bool {
        match key {
            FieldKey::Set(f) => !self.set(f).is_empty(),
            FieldKey::Scalar(ScalarField::PricePeriod) => true,
            FieldKey::Scalar(f) => !self.scalar(f).trim().is_empty(),
        }
    }

    /// `(filled, total)` field counts for one wizard section.
    pub fn section_completion(&self, section: u8) -> (usize, usize) {
        FieldKey::all()
            .filter(|k| k.section() == section)
            .fold((0, 0), |(filled, total), key| {
                (filled + usize::from(self.is_filled(key)), total + 1)
            })
    }
}

/// Empty input clears the field (`Some(None)`); unknown spelling is `None`.
fn parse_optional<T>(value: &str, parse: fn(&str) -> Option<T>) -> Option<Option<T>> {
    if value.is_empty() {
        Some(None)
    } else {
        parse(value).map(Some)
    }
}

fn wire_or_empty(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_names() {
        assert_eq!(
            FieldKey::parse("priceMin").unwrap(),
            FieldKey::Scalar(ScalarField::PriceMin)
        );
        assert_eq!(
            FieldKey::parse("techModalities").unwrap(),
            FieldKey::Set(SetField::TechModalities)
        );
        assert!(matches!(
            FieldKey::parse("price_min"),
            Err(DocumentError::UnknownField(_))
        ));
    }

    #[test]
    fn every_field_name_round_trips() {
        for key in FieldKey::all() {
            assert_eq!(FieldKey::parse(key.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn set_enum_field_by_wire_name() {
        let mut doc = FormDocument::default();
        doc.set_field(ScalarField::IntegrationTime, "1-3m").unwrap();
        assert_eq!(doc.integration_time, Some(IntegrationTime::OneToThreeMonths));

        doc.set_field(ScalarField::IntegrationTime, "").unwrap();
        assert!(doc.integration_time.is_none());
    }

    #[test]
    fn invalid_enum_value_leaves_document_untouched() {
        let mut doc = FormDocument::default();
        doc.set_field(ScalarField::AppType, "vision").unwrap();
        let before = doc.clone();

        let err = doc.set_field(ScalarField::AppType, "robot").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidValue { .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn price_accepts_only_digits() {
        let mut doc = FormDocument::default();
        doc.set_field(ScalarField::PriceMax, " 20000 ").unwrap();
        assert_eq!(doc.price_max, "20000");
        assert!(doc.set_field(ScalarField::PriceMin, "12k").is_err());
        assert!(doc.price_min.is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut doc = FormDocument::default();
        assert!(doc.toggle_set_member(SetField::Sectors, "Banca"));
        assert!(doc.sectors.contains("Banca"));
        assert!(!doc.toggle_set_member(SetField::Sectors, "Banca"));
        assert!(doc.sectors.is_empty());
    }

    #[test]
    fn toggle_ignores_blank_items() {
        let mut doc = FormDocument::default();
        assert!(!doc.toggle_set_member(SetField::Compliance, "   "));
        assert!(doc.compliance.is_empty());
    }

    #[test]
    fn missing_required_lists_in_order() {
        let mut doc = FormDocument::default();
        assert_eq!(doc.missing_required(), RequiredField::ALL.to_vec());

        doc.title = "Asistente".into();
        doc.tech_modalities.insert("SaaS".into());
        assert_eq!(
            doc.missing_required(),
            vec![RequiredField::Description, RequiredField::Sectors]
        );
    }

    #[test]
    fn whitespace_title_counts_as_missing() {
        let doc = FormDocument {
            title: "   ".into(),
            ..Default::default()
        };
        assert!(doc.missing_required().contains(&RequiredField::Title));
    }

    #[test]
    fn section_completion_counts_filled_fields() {
        let mut doc = FormDocument::default();
        assert_eq!(doc.section_completion(1), (0, 6));

        doc.title = "Bot".into();
        doc.sectors.insert("Retail".into());
        assert_eq!(doc.section_completion(1), (2, 6));

        // pricePeriod always carries a value
        assert_eq!(doc.section_completion(2), (1, 5));
    }
}
