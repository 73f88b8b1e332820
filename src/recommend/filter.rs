use crate::model::{CategorySpec, ModelRecord};

/// Keeps records that are scored on every target modality, carry every required
/// capability and satisfy the license constraint. Input order is preserved.
pub fn filter<'a>(records: &'a [ModelRecord], category: &CategorySpec) -> Vec<&'a ModelRecord> {
    records
        .iter()
        .filter(|record| passes(record, category))
        .collect()
}

fn passes(record: &ModelRecord, category: &CategorySpec) -> bool {
    category
        .modalities
        .iter()
        .all(|modality| record.score(*modality).is_some())
        && category
            .required_capabilities
            .iter()
            .all(|capability| record.capabilities.has(*capability))
        && category.license.allows(record.license)
}
