//! Influence scorer
//!
//! `|final − initial| / |initial − partner|` on raw angles. No minor-arc
//! wrapping is applied, so trials near the 0/2π seam can score above 1.
//! A zero denominator scores 0.

/// Fraction of the initial gap to the partner that the participant closed
pub fn influence_ratio(initial: f64, final_angle: f64, partner_angle: f64) -> f64 {
    let displacement = (final_angle - initial).abs();
    let initial_distance = (initial - partner_angle).abs();

    if initial_distance != 0.0 {
        displacement / initial_distance
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_displacement_is_zero() {
        for partner in [-3.0, 0.0, 0.5, 2.0, 6.2] {
            assert_eq!(influence_ratio(1.0, 1.0, partner), 0.0);
        }
    }

    #[test]
    fn test_zero_distance_is_zero() {
        assert_eq!(influence_ratio(1.0, 2.0, 1.0), 0.0);
    }

    #[test]
    fn test_halfway_move() {
        assert!((influence_ratio(0.0, 0.5, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_moving_away_still_positive() {
        assert!((influence_ratio(1.0, 0.5, 2.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_raw_angles_near_seam_exceed_one() {
        // 350° -> 5° with the partner at 10°: raw gaps are 345° and 340°
        let initial = 350f64.to_radians();
        let revised = 5f64.to_radians();
        let partner = 10f64.to_radians();
        assert!(influence_ratio(initial, revised, partner) > 1.0);
    }
}
