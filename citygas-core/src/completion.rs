//! Decides whether a slot's draft values are complete enough to save.

use crate::catalog::{is_direct_measure, MethodologyCatalog};
use citygas_schemas::draft::{ActivityDraft, DirectMeasureDraft, SlotDraft, CUSTOM_EMISSION_FACTOR_TYPE};

fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

pub struct CompletionEvaluator<'a> {
    catalog: &'a MethodologyCatalog,
}

impl<'a> CompletionEvaluator<'a> {
    pub fn new(catalog: &'a MethodologyCatalog) -> Self {
        Self { catalog }
    }

    /// `true` when the draft for slot `reference` can be saved as is.
    pub fn is_complete(&self, reference: &str, draft: &SlotDraft) -> bool {
        let methodology_id = draft.methodology.trim();
        if methodology_id.is_empty() {
            return false;
        }
        if is_direct_measure(methodology_id) {
            return draft.direct.as_ref().map_or(false, direct_measure_complete);
        }
        let Some(activity) = draft.activity.as_ref() else {
            return false;
        };
        activity_complete(activity) && self.required_inputs_present(reference, methodology_id, activity)
    }

    fn required_inputs_present(&self, reference: &str, methodology_id: &str, activity: &ActivityDraft) -> bool {
        let Some(methodology) = self.catalog.find_methodology(methodology_id, Some(reference)) else {
            return true;
        };
        methodology.input_required.iter().all(|field| {
            activity
                .extra_fields
                .get(field)
                .map_or(false, |value| is_filled(value))
        })
    }
}

fn activity_complete(activity: &ActivityDraft) -> bool {
    let custom_factors_missing = activity.emission_factor_type == CUSTOM_EMISSION_FACTOR_TYPE
        && activity.co2_emission_factor == 0.0
        && activity.n2o_emission_factor == 0.0
        && activity.ch4_emission_factor == 0.0;

    activity.activity_data_amount.map_or(false, f64::is_finite)
        && activity.activity_data_unit.as_deref().map_or(false, is_filled)
        && is_filled(&activity.emission_factor_type)
        && !custom_factors_missing
        && is_filled(&activity.data_quality)
        && is_filled(&activity.source_reference)
}

fn direct_measure_complete(direct: &DirectMeasureDraft) -> bool {
    (direct.co2_emissions > 0.0 || direct.ch4_emissions > 0.0 || direct.n2o_emissions > 0.0)
        && is_filled(&direct.data_quality)
        && is_filled(&direct.source_reference)
}
