use crate::domain::model::{is_known_material, SpoolSnapshot, SpoolState, StateChange};
use crate::utils::error::{Result, TrackerError};

/// Audit record of one consumption step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Consumption {
    pub prior_g: f64,
    pub used_g: f64,
    pub new_g: f64,
}

impl SpoolState {
    /// 換上新線材：全部欄位覆蓋，剩餘量重設為容量
    pub fn load_new_spool(
        &mut self,
        capacity_g: f64,
        filament_type: &str,
        color: &str,
        manufacturer: &str,
    ) -> Result<()> {
        if !capacity_g.is_finite() || capacity_g <= 0.0 {
            return Err(TrackerError::InvalidCapacity { value: capacity_g });
        }
        if !is_known_material(filament_type) {
            tracing::debug!("Filament type '{}' is not a known material", filament_type);
        }

        self.capacity_g = capacity_g;
        self.remaining_g = capacity_g;
        self.filament_type = filament_type.to_string();
        self.color = color.to_string();
        self.manufacturer = manufacturer.to_string();
        Ok(())
    }

    /// Deducts `used_g`, flooring at zero. Returns `None` when `used_g <= 0`.
    ///
    /// Only the lower bound is clamped; `remaining_g` is never capped at capacity.
    pub fn apply_consumption(&mut self, used_g: f64) -> Option<Consumption> {
        if used_g.is_nan() || used_g <= 0.0 {
            return None;
        }

        let prior_g = self.remaining_g;
        let new_g = (prior_g - used_g).max(0.0);
        self.remaining_g = new_g;

        Some(Consumption {
            prior_g,
            used_g,
            new_g,
        })
    }

    pub fn snapshot(&self) -> SpoolSnapshot {
        SpoolSnapshot {
            remaining_g: self.remaining_g,
            spool_capacity_g: self.capacity_g,
            filament_type: self.filament_type.clone(),
            color: self.color.clone(),
            manufacturer: self.manufacturer.clone(),
        }
    }

    pub fn loaded_change(&self) -> StateChange {
        StateChange::SpoolLoaded {
            remaining_g: self.remaining_g,
            spool_capacity_g: self.capacity_g,
            filament_type: self.filament_type.clone(),
            color: self.color.clone(),
            manufacturer: self.manufacturer.clone(),
        }
    }

    pub fn consumed_change(&self) -> StateChange {
        StateChange::Consumed {
            remaining_g: self.remaining_g,
            color: self.color.clone(),
            manufacturer: self.manufacturer.clone(),
        }
    }
}
