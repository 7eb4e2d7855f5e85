//! Priority scoring for tour requests.
//!
//! School tours are ranked by a weighted combination of the school's track
//! record and distance from campus. The score is computed once when a tour is
//! registered and cached on the tour record; later changes to the school never
//! reorder existing tours.

use crate::api::School;

/// Weight of the school's persistence score.
pub const PERSISTENCE_WEIGHT: f64 = 1.5;
/// Weight of the school's academic quality score.
pub const QUALITY_WEIGHT: f64 = 2.0;
/// Weight of the distance from campus.
pub const DISTANCE_WEIGHT: f64 = 1.2;

/// Compute the admission priority for a set of school attributes.
///
/// The weighted sum is truncated toward zero, so fractional scores never round
/// a tour past a competitor.
pub fn priority_score(persistence_score: i32, quality_score: i32, city_distance_km: i32) -> i32 {
    (PERSISTENCE_WEIGHT * persistence_score as f64
        + QUALITY_WEIGHT * quality_score as f64
        + DISTANCE_WEIGHT * city_distance_km as f64) as i32
}

/// Priority for a tour originating from `school`.
pub fn school_priority(school: &School) -> i32 {
    priority_score(
        school.persistence_score,
        school.quality_score,
        school.city_distance_km,
    )
}
