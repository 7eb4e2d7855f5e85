//! Checksum calculation for tour registration deduplication.

use sha2::{Digest, Sha256};

use crate::api::TourRegistration;
use crate::db::repository::{RepositoryError, RepositoryResult};

/// Calculate SHA-256 checksum of registration JSON content.
///
/// # Arguments
/// * `content` - JSON string content of the registration
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Checksum of a registration payload in its canonical JSON form.
///
/// The same payload always hashes to the same value, which is what makes
/// replayed registrations detectable in the store.
pub fn registration_checksum(registration: &TourRegistration) -> RepositoryResult<String> {
    let content = serde_json::to_string(registration).map_err(|e| {
        RepositoryError::internal(format!("Failed to serialize registration: {}", e))
    })?;
    Ok(calculate_checksum(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SchoolId, TourKind};

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"test": "data"}"#;
        let checksum1 = calculate_checksum(content);
        let checksum2 = calculate_checksum(content);
        assert_eq!(checksum1, checksum2);
    }

    #[test]
    fn test_different_content_different_checksum() {
        let content1 = r#"{"test": "data1"}"#;
        let content2 = r#"{"test": "data2"}"#;
        let checksum1 = calculate_checksum(content1);
        let checksum2 = calculate_checksum(content2);
        assert_ne!(checksum1, checksum2);
    }

    #[test]
    fn test_registration_checksum_is_stable() {
        let registration = TourRegistration {
            kind: TourKind::School,
            school_id: Some(SchoolId::new(3)),
            city: None,
        };
        let a = registration_checksum(&registration).unwrap();
        let b = registration_checksum(&registration).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_registration_checksum_differs_by_school() {
        let a = TourRegistration {
            kind: TourKind::School,
            school_id: Some(SchoolId::new(3)),
            city: None,
        };
        let b = TourRegistration {
            kind: TourKind::School,
            school_id: Some(SchoolId::new(4)),
            city: None,
        };
        assert_ne!(
            registration_checksum(&a).unwrap(),
            registration_checksum(&b).unwrap()
        );
    }
}
