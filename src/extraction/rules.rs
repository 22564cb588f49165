//! Keyword rules engine — free text to partial document updates.
//!
//! Each rule is independent: it fires when any of its keywords is a
//! substring of the lower-cased utterance and its effect proposes a patch.
//! Rules run in table order, which fixes the order reply fragments are
//! concatenated in. The merged patch follows the document merge policy, so
//! firing the same rule twice is harmless.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::document::model::split_list;
use crate::document::{
    AiModel, AppType, DataSovereignty, FormDocument, FormPatch, PricePeriod, SetField,
};

/// Reply when no rule fires.
pub const FALLBACK_REPLY: &str = "No he encontrado datos concretos en tu mensaje. ¿Podrías \
    contarme más sobre el tipo de solución, el sector al que va dirigida o el presupuesto?";

/// Appended after the fragments of the rules that fired.
pub const CLOSING_PROMPT: &str = "¿Hay algo más que quieras añadir?";

/// Integers, allowing `.`/`,` thousands separators ("5.000", "20,000").
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:[.,]\d{3})+|\d+").expect("valid number regex"));

/// What a rule's effect gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// The utterance as typed.
    pub raw: &'a str,
    /// Lower-cased utterance used for keyword matching.
    pub normalized: &'a str,
    /// Document state at extraction time.
    pub doc: &'a FormDocument,
}

/// Produces the patch a rule proposes, or `None` to stay silent.
pub type Effect = Box<dyn Fn(&RuleInput<'_>) -> Option<FormPatch> + Send + Sync>;

/// The text a fired rule contributes to the assistant reply.
pub enum Fragment {
    Text(String),
    /// Built from the rule's own patch (e.g. to echo detected prices).
    Render(fn(&FormPatch) -> String),
}

impl Fragment {
    fn render(&self, patch: &FormPatch) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Render(f) => f(patch),
        }
    }
}

/// A single trigger rule.
pub struct ExtractionRule {
    /// Short identifier, used in logs.
    pub name: String,
    /// Lower-case substrings that trigger the rule.
    pub keywords: Vec<String>,
    pub effect: Effect,
    pub fragment: Fragment,
}

impl ExtractionRule {
    pub fn new(
        name: &str,
        keywords: &[&str],
        effect: impl Fn(&RuleInput<'_>) -> Option<FormPatch> + Send + Sync + 'static,
        fragment: Fragment,
    ) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            effect: Box::new(effect),
            fragment,
        }
    }

    /// A rule that adds `value` to a set field.
    pub fn add_to_set(
        name: &str,
        keywords: &[&str],
        field: SetField,
        value: &str,
        reply: &str,
    ) -> Self {
        let value = value.to_string();
        Self::new(
            name,
            keywords,
            move |_| Some(FormPatch::new().add(field, value.clone())),
            Fragment::Text(reply.to_string()),
        )
    }

    /// Whether any keyword occurs in the normalized utterance.
    pub fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

impl std::fmt::Debug for ExtractionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionRule")
            .field("name", &self.name)
            .field("keywords", &self.keywords)
            .finish_non_exhaustive()
    }
}

/// Outcome of running the rule table over one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Merged patch of every rule that fired.
    pub update: FormPatch,
    /// Assistant reply text.
    pub reply: String,
    /// Names of the rules that fired, in table order.
    pub fired: Vec<String>,
}

impl Extraction {
    pub fn is_match(&self) -> bool {
        !self.fired.is_empty()
    }
}

/// Ordered table of extraction rules.
#[derive(Debug)]
pub struct RulesEngine {
    rules: Vec<ExtractionRule>,
}

impl RulesEngine {
    /// Create a rules engine with the built-in rule table.
    pub fn default_rules() -> Self {
        let rules = vec![
            // ── Application type ──────────────────────────────────────
            app_type_rule(
                "app_type_chatbot",
                &["chatbot", "asistente virtual", "bot conversacional", "atención al cliente"],
                AppType::Chatbot,
                "Chatbot conversacional con IA",
                "Entendido: se trata de un chatbot o asistente conversacional.",
            ),
            app_type_rule(
                "app_type_vision",
                &["visión artificial", "vision artificial", "computer vision", "reconocimiento de imágenes", "cámaras"],
                AppType::Vision,
                "Solución de visión artificial",
                "He identificado una solución de visión artificial.",
            ),
            app_type_rule(
                "app_type_automation",
                &["automatiza", "automation", "rpa", "flujos de trabajo"],
                AppType::Automation,
                "Automatización de procesos con IA",
                "Veo que buscas automatizar procesos.",
            ),
            app_type_rule(
                "app_type_prediction",
                &["predic", "forecast", "previsión de"],
                AppType::Prediction,
                "Modelo predictivo",
                "Parece un caso de analítica predictiva.",
            ),
            app_type_rule(
                "app_type_content",
                &["generación de contenido", "generar contenido", "copywriting", "redacción automática"],
                AppType::Content,
                "Generación de contenido con IA",
                "Anotado: generación de contenido.",
            ),
            // ── Sectors ───────────────────────────────────────────────
            ExtractionRule::add_to_set(
                "sector_banking",
                &["banca", "banco", "bancari", "financier", "fintech", "bank"],
                SetField::Sectors,
                "Banca",
                "He añadido el sector Banca.",
            ),
            ExtractionRule::add_to_set(
                "sector_retail",
                &["retail", "comercio", "tienda", "ecommerce", "e-commerce"],
                SetField::Sectors,
                "Retail",
                "He añadido el sector Retail.",
            ),
            ExtractionRule::add_to_set(
                "sector_health",
                &["salud", "hospital", "clínic", "clinic", "sanitari", "health"],
                SetField::Sectors,
                "Salud",
                "He añadido el sector Salud.",
            ),
            ExtractionRule::add_to_set(
                "sector_industry",
                &["industria", "fábrica", "fabrica", "manufactur"],
                SetField::Sectors,
                "Industria",
                "He añadido el sector Industria.",
            ),
            // ── Technology stack ──────────────────────────────────────
            ExtractionRule::new(
                "tech_stack",
                &TECH_STACK.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
                tech_stack_effect,
                Fragment::Render(|patch| {
                    format!(
                        "He actualizado el stack tecnológico: {}.",
                        patch.tech_stack.as_deref().unwrap_or_default()
                    )
                }),
            ),
            // ── Delivery modality ─────────────────────────────────────
            ExtractionRule::add_to_set(
                "modality_saas",
                &["saas", "en la nube", "cloud"],
                SetField::TechModalities,
                "SaaS",
                "Modalidad de entrega: SaaS.",
            ),
            ExtractionRule::add_to_set(
                "modality_api",
                &["api rest", "una api", "vía api", "via api", "por api", "apis"],
                SetField::TechModalities,
                "API",
                "Modalidad de entrega: API.",
            ),
            ExtractionRule::add_to_set(
                "modality_onprem",
                &["on-premise", "on premise", "onpremise", "instalación local"],
                SetField::TechModalities,
                "On-premise",
                "Modalidad de entrega: on-premise.",
            ),
            // ── Compliance ────────────────────────────────────────────
            ExtractionRule::add_to_set(
                "compliance_gdpr",
                &["gdpr", "rgpd", "protección de datos"],
                SetField::Compliance,
                "GDPR",
                "Tendré en cuenta el cumplimiento del RGPD.",
            ),
            ExtractionRule::add_to_set(
                "compliance_ai_act",
                &["ai act", "ley de ia", "reglamento de ia"],
                SetField::Compliance,
                "AI Act",
                "Anotado el cumplimiento del AI Act.",
            ),
            ExtractionRule::add_to_set(
                "certification_iso",
                &["iso 27001", "iso27001", "iso/iec 27001"],
                SetField::Certifications,
                "ISO 27001",
                "He añadido la certificación ISO 27001.",
            ),
            // ── Data sovereignty & model ──────────────────────────────
            ExtractionRule::new(
                "data_sovereignty",
                &["europa", "europe", "unión europea", "servidores propios", "on-premise", "on premise"],
                |input| {
                    let n = input.normalized;
                    let value = if n.contains("servidores propios") || n.contains("premise") {
                        DataSovereignty::Onprem
                    } else {
                        DataSovereignty::Eu
                    };
                    Some(FormPatch {
                        data_sovereignty: Some(value),
                        ..Default::default()
                    })
                },
                Fragment::Render(|patch| match patch.data_sovereignty {
                    Some(DataSovereignty::Onprem) => "Los datos se quedarán en tus instalaciones.".to_string(),
                    _ => "Los datos se alojarán en la Unión Europea.".to_string(),
                }),
            ),
            ExtractionRule::new(
                "ai_model",
                &[
                    "open source", "código abierto", "codigo abierto", "meta llama", "llama 2",
                    "llama 3", "llama-2", "llama-3", "llama2", "llama3", "mistral",
                    "gpt", "openai", "modelo propietario", "modelo propio",
                ],
                ai_model_effect,
                Fragment::Render(|patch| match patch.ai_model {
                    Some(AiModel::Open) => "Usaréis modelos de código abierto.".to_string(),
                    Some(AiModel::Proprietary) => "Usaréis modelos propietarios.".to_string(),
                    _ => "Combináis modelos abiertos y propietarios.".to_string(),
                }),
            ),
            // ── Price ─────────────────────────────────────────────────
            ExtractionRule::new(
                "price_range",
                &["presupuesto", "precio", "€", "euros", "budget", "price", "coste", "tarifa"],
                price_effect,
                Fragment::Render(|patch| match (&patch.price_min, &patch.price_max) {
                    (Some(min), Some(max)) => {
                        format!("He registrado un rango de precio de {min} a {max} €.")
                    }
                    (Some(min), None) => format!("He registrado un precio de {min} €."),
                    _ => String::new(),
                }),
            ),
            ExtractionRule::new(
                "price_period",
                &["al mes", "mensual", "al año", "anual", "por proyecto", "per month", "per year"],
                |input| {
                    let n = input.normalized;
                    let period = if n.contains("por proyecto") {
                        PricePeriod::Project
                    } else if n.contains("al año") || n.contains("anual") || n.contains("per year") {
                        PricePeriod::Year
                    } else {
                        PricePeriod::Month
                    };
                    Some(FormPatch {
                        price_period: Some(period),
                        ..Default::default()
                    })
                },
                Fragment::Render(|patch| {
                    let period = match patch.price_period {
                        Some(PricePeriod::Year) => "anual",
                        Some(PricePeriod::Project) => "por proyecto",
                        _ => "mensual",
                    };
                    format!("Periodo de facturación: {period}.")
                }),
            ),
            // ── Client size ───────────────────────────────────────────
            ExtractionRule::add_to_set(
                "client_startup",
                &["startup", "start-up", "emprendedor"],
                SetField::ClientSizes,
                "Startups",
                "Público objetivo: startups.",
            ),
            ExtractionRule::add_to_set(
                "client_sme",
                &["pyme", "pequeña empresa", "mediana empresa", "sme"],
                SetField::ClientSizes,
                "Pymes",
                "Público objetivo: pymes.",
            ),
            ExtractionRule::add_to_set(
                "client_enterprise",
                &["enterprise", "gran empresa", "grandes empresas", "corporaci", "multinacional"],
                SetField::ClientSizes,
                "Gran empresa",
                "Público objetivo: grandes empresas.",
            ),
            // ── Languages ─────────────────────────────────────────────
            ExtractionRule::new(
                "languages",
                &LANGUAGES.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
                |input| {
                    let patch = LANGUAGES
                        .iter()
                        .filter(|(keyword, _)| input.normalized.contains(*keyword))
                        .fold(FormPatch::new(), |patch, (_, language)| {
                            patch.add(SetField::Languages, *language)
                        });
                    Some(patch)
                },
                Fragment::Render(|patch| {
                    let languages: Vec<&str> = patch.languages.iter().map(String::as_str).collect();
                    format!("Idiomas: {}.", languages.join(", "))
                }),
            ),
            // ── Need statement ────────────────────────────────────────
            ExtractionRule::new(
                "description_from_need",
                &[
                    "necesito", "necesitamos", "busco", "buscamos", "queremos", "quiero",
                    "ofrecemos", "ofrezco", "we need", "looking for", "we offer",
                ],
                |input| {
                    if !input.doc.description.trim().is_empty() {
                        return None;
                    }
                    Some(FormPatch {
                        description: Some(input.raw.trim().to_string()),
                        ..Default::default()
                    })
                },
                Fragment::Text("He usado tu mensaje como descripción inicial.".to_string()),
            ),
        ];

        Self { rules }
    }

    /// Create an empty rules engine (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at the end of the table.
    pub fn add_rule(&mut self, rule: ExtractionRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Run every rule over `utterance` against the current `doc`.
    ///
    /// Pure: the same `(utterance, doc)` always yields the same extraction.
    pub fn extract(&self, utterance: &str, doc: &FormDocument) -> Extraction {
        let normalized = utterance.to_lowercase();
        let input = RuleInput {
            raw: utterance,
            normalized: &normalized,
            doc,
        };

        let mut update = FormPatch::new();
        let mut fragments = Vec::new();
        let mut fired = Vec::new();

        for rule in &self.rules {
            if !rule.matches(&normalized) {
                continue;
            }
            let Some(patch) = (rule.effect)(&input) else {
                continue;
            };
            if patch.is_empty() {
                continue;
            }

            debug!(rule = %rule.name, fields = ?patch.touched(), "Extraction rule fired");

            let fragment = rule.fragment.render(&patch);
            if !fragment.is_empty() {
                fragments.push(fragment);
            }
            fired.push(rule.name.clone());
            update.merge(patch);
        }

        if fired.is_empty() {
            return Extraction {
                update,
                reply: FALLBACK_REPLY.to_string(),
                fired,
            };
        }

        fragments.push(CLOSING_PROMPT.to_string());
        Extraction {
            update,
            reply: fragments.join(" "),
            fired,
        }
    }
}

/// Sets the app type; also proposes a title while the title is empty.
fn app_type_rule(
    name: &str,
    keywords: &[&str],
    app_type: AppType,
    default_title: &'static str,
    reply: &str,
) -> ExtractionRule {
    ExtractionRule::new(
        name,
        keywords,
        move |input| {
            let title = input
                .doc
                .title
                .trim()
                .is_empty()
                .then(|| default_title.to_string());
            Some(FormPatch {
                app_type: Some(app_type),
                title,
                ..Default::default()
            })
        },
        Fragment::Text(reply.to_string()),
    )
}

/// Keyword → canonical stack entry.
const TECH_STACK: &[(&str, &str)] = &[
    ("python", "Python"),
    ("azure", "Azure"),
    ("aws", "AWS"),
    ("sap", "SAP"),
    ("google cloud", "Google Cloud"),
    ("kubernetes", "Kubernetes"),
    ("salesforce", "Salesforce"),
];

/// Whole-word patterns for [`TECH_STACK`], so "sap" does not match
/// "desaparecer".
static TECH_STACK_RE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    TECH_STACK
        .iter()
        .map(|(keyword, name)| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(keyword)))
                .expect("valid tech stack pattern");
            (re, *name)
        })
        .collect()
});

/// Appends detected technologies to the comma-separated stack, skipping
/// entries already listed (case-insensitively).
fn tech_stack_effect(input: &RuleInput<'_>) -> Option<FormPatch> {
    let mut entries: Vec<String> = split_list(&input.doc.tech_stack)
        .into_iter()
        .map(String::from)
        .collect();
    let before = entries.len();

    for (re, name) in TECH_STACK_RE.iter() {
        if !re.is_match(input.normalized) {
            continue;
        }
        if !entries.iter().any(|e| e.eq_ignore_ascii_case(name)) {
            entries.push((*name).to_string());
        }
    }

    if entries.len() == before {
        return None;
    }
    Some(FormPatch {
        tech_stack: Some(entries.join(", ")),
        ..Default::default()
    })
}

fn ai_model_effect(input: &RuleInput<'_>) -> Option<FormPatch> {
    // "llama" alone is also the verb ("se llama", "llamadas")
    const OPEN: &[&str] = &[
        "open source", "código abierto", "codigo abierto", "meta llama", "llama 2", "llama 3",
        "llama-2", "llama-3", "llama2", "llama3", "mistral",
    ];
    const PROPRIETARY: &[&str] = &["gpt", "openai", "modelo propietario", "modelo propio"];

    let open = OPEN.iter().any(|k| input.normalized.contains(*k));
    let proprietary = PROPRIETARY.iter().any(|k| input.normalized.contains(*k));
    let model = match (open, proprietary) {
        (true, true) => AiModel::Hybrid,
        (true, false) => AiModel::Open,
        (false, true) => AiModel::Proprietary,
        (false, false) => return None,
    };
    Some(FormPatch {
        ai_model: Some(model),
        ..Default::default()
    })
}

/// First integer → `priceMin`, second → `priceMax`.
fn price_effect(input: &RuleInput<'_>) -> Option<FormPatch> {
    let mut numbers = NUMBER_RE
        .find_iter(input.normalized)
        .map(|m| m.as_str().replace(['.', ','], ""));

    let min = numbers.next()?;
    let max = numbers.next();
    Some(FormPatch {
        price_min: Some(min),
        price_max: max,
        ..Default::default()
    })
}

/// Keyword → language name.
const LANGUAGES: &[(&str, &str)] = &[
    ("español", "Español"),
    ("castellano", "Español"),
    ("spanish", "Español"),
    ("inglés", "Inglés"),
    ("english", "Inglés"),
    ("catalán", "Catalán"),
    ("francés", "Francés"),
    ("alemán", "Alemán"),
];

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: &str = "Necesito un chatbot para banca con presupuesto de 5000 a 20000 euros";

    #[test]
    fn scenario_chatbot_banking_budget() {
        let engine = RulesEngine::default_rules();
        let doc = FormDocument::default();
        let result = engine.extract(SCENARIO_A, &doc);

        let merged = crate::document::apply_update(&doc, &result.update);
        assert_eq!(merged.app_type, AppType::Chatbot);
        assert!(merged.sectors.contains("Banca"));
        assert_eq!(merged.price_min, "5000");
        assert_eq!(merged.price_max, "20000");
        assert!(result.reply.ends_with(CLOSING_PROMPT));
    }

    #[test]
    fn no_match_returns_fallback_and_empty_update() {
        let engine = RulesEngine::default_rules();
        let result = engine.extract("hola, ¿qué tal?", &FormDocument::default());
        assert_eq!(result.reply, FALLBACK_REPLY);
        assert!(result.update.is_empty());
        assert!(!result.is_match());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let engine = RulesEngine::default_rules();
        let result = engine.extract("Trabajamos con PYTHON y AZURE", &FormDocument::default());
        assert_eq!(result.update.tech_stack.as_deref(), Some("Python, Azure"));
    }

    #[test]
    fn fragments_follow_table_order() {
        let engine = RulesEngine::default_rules();
        // sector rule precedes client-size rule in the table
        let result = engine.extract("startup del sector retail", &FormDocument::default());
        assert_eq!(result.fired, vec!["sector_retail", "client_startup"]);
        let retail = result.reply.find("Retail").unwrap();
        let startup = result.reply.find("startups").unwrap();
        assert!(retail < startup);
    }

    #[test]
    fn default_title_only_when_empty() {
        let engine = RulesEngine::default_rules();

        let empty = FormDocument::default();
        let result = engine.extract("queremos un chatbot", &empty);
        assert_eq!(result.update.title.as_deref(), Some("Chatbot conversacional con IA"));

        let titled = FormDocument {
            title: "Mi propio título".into(),
            ..Default::default()
        };
        let result = engine.extract("queremos un chatbot", &titled);
        assert!(result.update.title.is_none());
        assert_eq!(result.update.app_type, Some(AppType::Chatbot));
    }

    #[test]
    fn app_type_always_overwrites() {
        let engine = RulesEngine::default_rules();
        let doc = FormDocument {
            app_type: AppType::Vision,
            ..Default::default()
        };
        let result = engine.extract("mejor un chatbot", &doc);
        assert_eq!(result.update.app_type, Some(AppType::Chatbot));
    }

    #[test]
    fn description_from_need_keeps_user_text() {
        let engine = RulesEngine::default_rules();
        let doc = FormDocument {
            description: "Escrita en el formulario".into(),
            ..Default::default()
        };
        let result = engine.extract("Necesito algo para banca", &doc);
        assert!(result.update.description.is_none());
        assert!(!result.fired.contains(&"description_from_need".to_string()));

        let result = engine.extract("  Necesito algo para banca ", &FormDocument::default());
        assert_eq!(result.update.description.as_deref(), Some("Necesito algo para banca"));
    }

    #[test]
    fn price_with_thousands_separators() {
        let engine = RulesEngine::default_rules();
        let result = engine.extract("presupuesto entre 5.000 y 20.000", &FormDocument::default());
        assert_eq!(result.update.price_min.as_deref(), Some("5000"));
        assert_eq!(result.update.price_max.as_deref(), Some("20000"));
    }

    #[test]
    fn single_price_sets_min_only() {
        let engine = RulesEngine::default_rules();
        let result = engine.extract("el precio es 300", &FormDocument::default());
        assert_eq!(result.update.price_min.as_deref(), Some("300"));
        assert!(result.update.price_max.is_none());
    }

    #[test]
    fn price_keyword_without_digits_does_not_fire() {
        let engine = RulesEngine::default_rules();
        let result = engine.extract("aún no sé el presupuesto", &FormDocument::default());
        assert!(!result.fired.contains(&"price_range".to_string()));
    }

    #[test]
    fn repeated_detection_is_idempotent() {
        let engine = RulesEngine::default_rules();
        let first = engine.extract("cumplimos gdpr en banca", &FormDocument::default());
        let doc = crate::document::apply_update(&FormDocument::default(), &first.update);
        let second = engine.extract("cumplimos gdpr en banca", &doc);
        let doc2 = crate::document::apply_update(&doc, &second.update);
        assert_eq!(doc2.sectors.len(), 1);
        assert_eq!(doc2.compliance.len(), 1);
        assert_eq!(doc, doc2);
    }

    #[test]
    fn tech_stack_skips_known_entries() {
        let engine = RulesEngine::default_rules();
        let doc = FormDocument {
            tech_stack: "python, Docker".into(),
            ..Default::default()
        };
        let result = engine.extract("usamos python y aws", &doc);
        assert_eq!(result.update.tech_stack.as_deref(), Some("python, Docker, AWS"));

        let doc = FormDocument {
            tech_stack: "Python".into(),
            ..Default::default()
        };
        assert!(engine.extract("usamos python", &doc).update.is_empty());
    }

    #[test]
    fn mixed_models_are_hybrid() {
        let engine = RulesEngine::default_rules();
        let result = engine.extract("combinamos llama 3 con gpt", &FormDocument::default());
        assert_eq!(result.update.ai_model, Some(AiModel::Hybrid));
    }

    #[test]
    fn llama_as_a_verb_is_not_a_model() {
        let engine = RulesEngine::default_rules();
        let doc = FormDocument::default();

        let calls = engine.extract("Queremos automatizar las llamadas del centro de atención", &doc);
        assert_eq!(calls.update.ai_model, None);
        assert!(!calls.fired.contains(&"ai_model".to_string()));
        assert!(calls.fired.contains(&"app_type_automation".to_string()));

        let named = engine.extract("El producto se llama Alfa", &doc);
        assert_eq!(named.update.ai_model, None);

        let model = engine.extract("Lo montamos sobre Meta Llama", &doc);
        assert_eq!(model.update.ai_model, Some(AiModel::Open));
    }

    #[test]
    fn tech_stack_matches_whole_words() {
        let engine = RulesEngine::default_rules();
        let doc = FormDocument::default();

        let result = engine.extract("Los datos no deben desaparecer", &doc);
        assert_eq!(result.update.tech_stack, None);
        assert!(!result.fired.contains(&"tech_stack".to_string()));

        let result = engine.extract("Integramos con SAP.", &doc);
        assert_eq!(result.update.tech_stack.as_deref(), Some("SAP"));
    }

    #[test]
    fn on_premise_sets_modality_and_sovereignty() {
        let engine = RulesEngine::default_rules();
        let result = engine.extract("lo instalamos on-premise", &FormDocument::default());
        assert!(result.update.tech_modalities.contains("On-premise"));
        assert_eq!(result.update.data_sovereignty, Some(DataSovereignty::Onprem));
    }

    #[test]
    fn extraction_is_deterministic() {
        let engine = RulesEngine::default_rules();
        let doc = FormDocument {
            sectors: ["Salud".to_string()].into(),
            ..Default::default()
        };
        let a = engine.extract(SCENARIO_A, &doc);
        let b = engine.extract(SCENARIO_A, &doc);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_rule() {
        let mut engine = RulesEngine::empty();
        engine.add_rule(ExtractionRule::add_to_set(
            "cert_ens",
            &["ENS"],
            SetField::Certifications,
            "ENS",
            "Certificación ENS anotada.",
        ));

        let result = engine.extract("tenemos el ens", &FormDocument::default());
        assert!(result.update.certifications.contains("ENS"));
        assert_eq!(result.reply, format!("Certificación ENS anotada. {CLOSING_PROMPT}"));
    }

    #[test]
    fn empty_rules_always_fall_back() {
        let engine = RulesEngine::empty();
        let result = engine.extract(SCENARIO_A, &FormDocument::default());
        assert_eq!(result.reply, FALLBACK_REPLY);
    }
}
