use std::collections::BTreeSet;

use crate::error::{CoreError, CoreResult};
use crate::model::{
    Capability, CategorySpec, LicenseConstraint, Modality, ModelTypePreference,
    QuestionnaireResponse, UseCase, VisualAiType,
};

pub fn map_to_category(response: &QuestionnaireResponse) -> CoreResult<CategorySpec> {
    let (modality, capability) = match response.use_case {
        UseCase::ConversationalKnowledge
        | UseCase::ProductivityInformation
        | UseCase::CreativeContent
        | UseCase::AdvancedAutomation => (Modality::Text, None),
        UseCase::TechnicalDeveloper => (Modality::WebDev, None),
        UseCase::VisualAi => match response.visual_ai_type {
            Some(VisualAiType::ImageUnderstanding) => (Modality::Vision, Some(Capability::Vision)),
            Some(VisualAiType::ImageGeneration) => {
                (Modality::Image, Some(Capability::ImageGeneration))
            }
            Some(VisualAiType::ImageEditing) => {
                (Modality::ImageEdit, Some(Capability::ImageEditing))
            }
            None => {
                return Err(CoreError::IncompleteResponse {
                    field: "visual_ai_type",
                });
            }
        },
    };

    Ok(CategorySpec {
        modalities: BTreeSet::from([modality]),
        required_capabilities: capability.into_iter().collect(),
        license: license_constraint(response.model_type),
    })
}

fn license_constraint(preference: ModelTypePreference) -> LicenseConstraint {
    match preference {
        ModelTypePreference::OpenOnly => LicenseConstraint::OpenOnly,
        ModelTypePreference::ProprietaryOnlyEnterprise => LicenseConstraint::ProprietaryOnly,
        ModelTypePreference::NoPreference => LicenseConstraint::Any,
    }
}
