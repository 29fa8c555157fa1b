//! Carbon-impact and gamification point math.
//!
//! Points are derived from the raw carbon figure at recording time and
//! credited alongside it; both totals live on the user row and are only
//! ever mutated by a single atomic SQL increment (see `UserRepo`).

use crate::error::CoreError;

/// Points credited per kilogram of carbon saved.
pub const POINTS_PER_KG: f64 = 10.0;

/// Upper bound on a single recorded carbon saving, in kilograms.
///
/// A generous ceiling (1000 tonnes) that no single repair can plausibly
/// reach; it also guarantees the scaled value stays well inside `i64`
/// range for the points cast.
pub const MAX_CARBON_SAVED_KG: f64 = 1_000_000.0;

/// Compute the points awarded for a recorded carbon saving.
///
/// `points = floor(carbon_saved_kg * 10)`, never negative.
pub fn points_for_carbon(carbon_saved_kg: f64) -> i64 {
    (carbon_saved_kg * POINTS_PER_KG).floor() as i64
}

/// Validate a carbon-saved figure before recording it.
///
/// Rejects non-finite, negative, and implausibly large values; the cap
/// keeps [`points_for_carbon`] free of cast-overflow edge cases.
pub fn validate_carbon_saved(carbon_saved_kg: f64) -> Result<(), CoreError> {
    if !carbon_saved_kg.is_finite() || carbon_saved_kg < 0.0 {
        return Err(CoreError::Validation(format!(
            "carbon_saved_kg must be a non-negative amount, got {carbon_saved_kg}"
        )));
    }
    if carbon_saved_kg > MAX_CARBON_SAVED_KG {
        return Err(CoreError::Validation(format!(
            "carbon_saved_kg must be at most {MAX_CARBON_SAVED_KG}, got {carbon_saved_kg}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_floor_the_scaled_carbon() {
        assert_eq!(points_for_carbon(0.0), 0);
        assert_eq!(points_for_carbon(1.0), 10);
        assert_eq!(points_for_carbon(2.49), 24);
        assert_eq!(points_for_carbon(2.5), 25);
        assert_eq!(points_for_carbon(0.09), 0);
    }

    #[test]
    fn carbon_validation_rejects_negative_and_non_finite() {
        assert!(validate_carbon_saved(0.0).is_ok());
        assert!(validate_carbon_saved(12.5).is_ok());
        assert!(validate_carbon_saved(-0.1).is_err());
        assert!(validate_carbon_saved(f64::NAN).is_err());
        assert!(validate_carbon_saved(f64::INFINITY).is_err());
    }

    #[test]
    fn carbon_validation_caps_implausible_values() {
        assert!(validate_carbon_saved(MAX_CARBON_SAVED_KG).is_ok());
        assert!(validate_carbon_saved(MAX_CARBON_SAVED_KG + 1.0).is_err());
        // Finite but absurd figures must not reach the points cast.
        assert!(validate_carbon_saved(1e30).is_err());
    }

    #[test]
    fn points_stay_in_range_at_the_cap() {
        let points = points_for_carbon(MAX_CARBON_SAVED_KG);
        assert_eq!(points, 10_000_000);
    }
}
