//! State transitions of an inventory value between "unavailable" and
//! "has data". A slot is never both: marking it unavailable drops its
//! activity values and methodology, marking it as having data clears the
//! notation key fields.

use crate::catalog::input_methodology;
use crate::error::CityGasError;
use crate::store::InventorySnapshot;
use citygas_schemas::{
    inventory::{ActivityValue, InventoryValue, NotationKey},
    reference::GpcReference,
};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SlotState<'a> {
    Unavailable {
        notation_key: Option<NotationKey>,
        explanation: Option<&'a str>,
    },
    HasData {
        methodology: Option<&'a str>,
    },
}

pub fn slot_state(value: &InventoryValue) -> SlotState<'_> {
    if value.is_unavailable() {
        let reason = value.unavailable_reason.as_deref().unwrap_or_default();
        let notation_key = NotationKey::from_unavailable_reason(reason);
        if notation_key.is_none() {
            warn!(
                "inventory value {} has unrecognised unavailable reason '{}'",
                value.id, reason
            );
        }
        SlotState::Unavailable {
            notation_key,
            explanation: value.unavailable_explanation.as_deref(),
        }
    } else {
        SlotState::HasData {
            methodology: value.input_methodology.as_deref(),
        }
    }
}

fn slot_index(snapshot: &mut InventorySnapshot, reference: &str) -> Result<usize, CityGasError> {
    match reference.parse::<GpcReference>() {
        Ok(parsed) if parsed.is_slot() => {}
        _ => return Err(CityGasError::InvalidReference(reference.to_string())),
    }
    if let Some(index) = snapshot
        .inventory_values
        .iter()
        .position(|value| value.gpc_reference_number == reference)
    {
        return Ok(index);
    }
    let inventory_id = snapshot.inventory.inventory_id.clone();
    snapshot.inventory_values.push(InventoryValue {
        id: format!("{}:{}", inventory_id, reference),
        inventory_id,
        gpc_reference_number: reference.to_string(),
        ..InventoryValue::default()
    });
    Ok(snapshot.inventory_values.len() - 1)
}

/// Marks a slot unavailable, creating it if needed. Returns the activity
/// values that were removed from the slot.
pub fn mark_unavailable(
    snapshot: &mut InventorySnapshot,
    reference: &str,
    notation_key: NotationKey,
    explanation: Option<String>,
) -> Result<Vec<ActivityValue>, CityGasError> {
    let index = slot_index(snapshot, reference)?;
    let value = &mut snapshot.inventory_values[index];
    value.unavailable_reason = Some(notation_key.as_unavailable_reason());
    value.unavailable_explanation = explanation;
    value.input_methodology = None;
    value.co2eq = None;
    let value_id = value.id.clone();

    let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut snapshot.activity_values)
        .into_iter()
        .partition(|activity| activity.inventory_value_id == value_id);
    snapshot.activity_values = kept;
    info!(
        "slot {} marked {} ({} activity values removed)",
        reference,
        notation_key,
        removed.len()
    );
    Ok(removed)
}

/// Records the methodology chosen for a slot, clearing any notation key.
pub fn mark_has_data(snapshot: &mut InventorySnapshot, reference: &str, methodology_id: &str) -> Result<(), CityGasError> {
    let index = slot_index(snapshot, reference)?;
    let value = &mut snapshot.inventory_values[index];
    value.unavailable_reason = None;
    value.unavailable_explanation = None;
    value.input_methodology = Some(input_methodology(methodology_id).to_string());
    info!("slot {} uses methodology {}", reference, methodology_id);
    Ok(())
}
