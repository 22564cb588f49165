//! Merge policy — how a partial update lands on the shared document.
//!
//! - scalar and enum fields: replace
//! - `priceMin` / `priceMax`: replace, last writer wins
//! - set fields: union, so repeated detections are idempotent

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::fields::{FieldKey, ScalarField, SetField};
use super::model::{
    AiModel, AppType, DataSovereignty, FormDocument, HumanIntervention, IntegrationTime,
    PricePeriod,
};

/// A partial document update. Absent (`None` / empty) entries are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_type: Option<AppType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_period: Option<PricePeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<AiModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_intervention: Option<HumanIntervention>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_time: Option<IntegrationTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_sovereignty: Option<DataSovereignty>,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub sectors: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub client_sizes: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tech_modalities: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub languages: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub data_security: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub compliance: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub certifications: BTreeSet<String>,
}

impl FormPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose adding `item` to a set field.
    pub fn add(mut self, field: SetField, item: impl Into<String>) -> Self {
        self.additions_mut(field).insert(item.into());
        self
    }

    pub fn additions(&self, field: SetField) -> &BTreeSet<String> {
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

    fn additions_mut(&mut self, field: SetField) -> &mut BTreeSet<String> {
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

    /// Fields this patch proposes a value for.
    pub fn touched(&self) -> Vec<FieldKey> {
        let scalars = [
            (ScalarField::Title, self.title.is_some()),
            (ScalarField::Description, self.description.is_some()),
            (ScalarField::AppType, self.app_type.is_some()),
            (ScalarField::OfferFormat, self.offer_format.is_some()),
            (ScalarField::PriceMin, self.price_min.is_some()),
            (ScalarField::PriceMax, self.price_max.is_some()),
            (ScalarField::PricePeriod, self.price_period.is_some()),
            (ScalarField::AiModel, self.ai_model.is_some()),
            (ScalarField::HumanIntervention, self.human_intervention.is_some()),
            (ScalarField::TechStack, self.tech_stack.is_some()),
            (ScalarField::Integrations, self.integrations.is_some()),
            (ScalarField::IntegrationTime, self.integration_time.is_some()),
            (ScalarField::DataSovereignty, self.data_sovereignty.is_some()),
        ];
        scalars
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(f, _)| FieldKey::Scalar(f))
            .chain(
                SetField::ALL
                    .iter()
                    .filter(|f| !self.additions(**f).is_empty())
                    .map(|f| FieldKey::Set(*f)),
            )
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.touched().is_empty()
    }

    /// Fold `other` into `self` using the same policy the document uses:
    /// later scalars win, sets union.
    pub fn merge(&mut self, mut other: FormPatch) {
        macro_rules! take {
            ($($field:ident),+) => {
                $( if let Some(v) = other.$field.take() { self.$field = Some(v); } )+
            };
        }
        take!(
            title,
            description,
            app_type,
            offer_format,
            price_min,
            price_max,
            price_period,
            ai_model,
            human_intervention,
            tech_stack,
            integrations,
            integration_time,
            data_sovereignty
        );
        for field in SetField::ALL {
            let items = std::mem::take(other.additions_mut(*field));
            self.additions_mut(*field).extend(items);
        }
    }
}

/// Apply `patch` to `doc`, returning the merged document.
///
/// Pure and total: `doc` is not modified and any patch yields a valid
/// document.
pub fn apply_update(doc: &FormDocument, patch: &FormPatch) -> FormDocument {
    let mut merged = doc.clone();
    merged.apply(patch);
    merged
}

impl FormDocument {
    /// In-place form of [`apply_update`].
    pub fn apply(&mut self, patch: &FormPatch) {
        fn replace<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        fn replace_some<T: Copy>(slot: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *slot = Some(*v);
            }
        }

        replace(&mut self.title, &patch.title);
        replace(&mut self.description, &patch.description);
        replace(&mut self.app_type, &patch.app_type);
        replace(&mut self.offer_format, &patch.offer_format);
        replace(&mut self.price_min, &patch.price_min);
        replace(&mut self.price_max, &patch.price_max);
        replace(&mut self.price_period, &patch.price_period);
        replace_some(&mut self.ai_model, &patch.ai_model);
        replace_some(&mut self.human_intervention, &patch.human_intervention);
        replace(&mut self.tech_stack, &patch.tech_stack);
        replace(&mut self.integrations, &patch.integrations);
        replace_some(&mut self.integration_time, &patch.integration_time);
        replace_some(&mut self.data_sovereignty, &patch.data_sovereignty);

        for field in SetField::ALL {
            let additions = patch.additions(*field);
            if !additions.is_empty() {
                self.set_mut(*field).extend(additions.iter().cloned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_doc() -> FormDocument {
        let mut doc = FormDocument::default();
        doc.title = "Asistente bancario".into();
        doc.app_type = AppType::Vision;
        doc.sectors.insert("Banca".into());
        doc.price_min = "100".into();
        doc
    }

    #[test]
    fn scalars_replace() {
        let doc = filled_doc();
        let patch = FormPatch {
            app_type: Some(AppType::Chatbot),
            title: Some("Nuevo".into()),
            ..Default::default()
        };
        let merged = apply_update(&doc, &patch);
        assert_eq!(merged.app_type, AppType::Chatbot);
        assert_eq!(merged.title, "Nuevo");
    }

    #[test]
    fn absent_keys_are_untouched() {
        let doc = filled_doc();
        let merged = apply_update(&doc, &FormPatch::default());
        assert_eq!(merged, doc);
    }

    #[test]
    fn prices_are_last_writer_wins() {
        let doc = filled_doc();
        let first = FormPatch {
            price_min: Some("5000".into()),
            price_max: Some("20000".into()),
            ..Default::default()
        };
        let second = FormPatch {
            price_min: Some("7000".into()),
            ..Default::default()
        };
        let merged = apply_update(&apply_update(&doc, &first), &second);
        assert_eq!(merged.price_min, "7000");
        assert_eq!(merged.price_max, "20000");
    }

    #[test]
    fn sets_union_without_duplicates() {
        let doc = filled_doc();
        let patch = FormPatch::new()
            .add(SetField::Sectors, "Banca")
            .add(SetField::Sectors, "Retail");
        let merged = apply_update(&doc, &patch);
        assert_eq!(merged.sectors.len(), 2);
        assert!(merged.sectors.contains("Banca"));
        assert!(merged.sectors.contains("Retail"));
    }

    #[test]
    fn set_merge_is_idempotent() {
        let docs = [FormDocument::default(), filled_doc()];
        for doc in docs {
            for field in SetField::ALL {
                let patch = FormPatch::new().add(*field, "Banca");
                let once = apply_update(&doc, &patch);
                let twice = apply_update(&once, &patch);
                assert_eq!(once, twice, "{field:?} merge should be idempotent");
            }
        }
    }

    #[test]
    fn apply_update_does_not_modify_input() {
        let doc = filled_doc();
        let snapshot = doc.clone();
        let _ = apply_update(&doc, &FormPatch::new().add(SetField::Compliance, "GDPR"));
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn touched_reports_present_keys() {
        let patch = FormPatch {
            price_min: Some("1".into()),
            ..Default::default()
        }
        .add(SetField::Languages, "Español");
        assert_eq!(
            patch.touched(),
            vec![
                FieldKey::Scalar(ScalarField::PriceMin),
                FieldKey::Set(SetField::Languages)
            ]
        );
        assert!(!patch.is_empty());
        assert!(FormPatch::default().is_empty());
    }

    #[test]
    fn patch_merge_follows_document_policy() {
        let mut a = FormPatch {
            app_type: Some(AppType::Vision),
            ..Default::default()
        }
        .add(SetField::Sectors, "Salud");
        let b = FormPatch {
            app_type: Some(AppType::Chatbot),
            ..Default::default()
        }
        .add(SetField::Sectors, "Salud")
        .add(SetField::Sectors, "Banca");

        a.merge(b);
        assert_eq!(a.app_type, Some(AppType::Chatbot));
        assert_eq!(a.sectors.len(), 2);
    }

    #[test]
    fn patch_serializes_only_present_keys() {
        let patch = FormPatch {
            app_type: Some(AppType::Chatbot),
            ..Default::default()
        }
        .add(SetField::Sectors, "Banca");
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"appType": "chatbot", "sectors": ["Banca"]})
        );
    }
}
