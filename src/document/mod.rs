//! The shared form document, its field addressing and merge policy.
//!
//! Both the form view and the chat view write through this module: the form
//! view via [`FormDocument::set_field`] / [`FormDocument::toggle_set_member`],
//! the chat view via [`FormPatch`] merged with [`apply_update`].

pub mod fields;
pub mod merge;
pub mod model;

pub use fields::{FieldKey, RequiredField, ScalarField, SetField};
pub use merge::{FormPatch, apply_update};
pub use model::{
    AiModel, AppType, DataSovereignty, FormDocument, HumanIntervention, IntegrationTime, Mode,
    PricePeriod,
};
