//! Tour registration code generation.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::TourCode;

/// Strategy for minting tour registration codes.
///
/// Implementations must be cheap and collision-resistant enough for a single
/// office; the service layer retries against the store on the rare collision.
pub trait CodeIssuer: Send + Sync {
    /// Produce a candidate code for a tour visiting from `city`.
    fn issue(&self, city: &str) -> TourCode;
}

/// Issues codes as `<City><counter>`, e.g. `Ankara0042`.
///
/// Each issuer counts monotonically from 1, so codes from one issuer never
/// collide with each other. Restarts reset the counter, which is why stores
/// are still consulted before a code is accepted.
#[derive(Debug)]
pub struct SequenceCodeIssuer {
    counter: AtomicU64,
}

impl SequenceCodeIssuer {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Keep only alphanumeric characters so the prefix is URL- and
    /// filename-safe whatever the city is called.
    fn sanitize(city: &str) -> String {
        let cleaned: String = city.chars().filter(|c| c.is_alphanumeric()).collect();
        if cleaned.is_empty() {
            "Tour".to_string()
        } else {
            cleaned
        }
    }
}

impl Default for SequenceCodeIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeIssuer for SequenceCodeIssuer {
    fn issue(&self, city: &str) -> TourCode {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        TourCode::new(format!("{}{:04}", Self::sanitize(city), n))
    }
}
