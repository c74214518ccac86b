use sha2::{Digest, Sha256};

/// Separator between fields of a composite identifier
///
/// Part of the identifier contract: changing it changes every derived id.
const FIELD_SEPARATOR: &str = "|";

/// Derives a deterministic identifier from an ordered list of fields
///
/// The fields are joined with `"|"` in the order given and hashed with
/// SHA-256; the result is the lower-hex digest. Same inputs always yield
/// the same identifier, and any single field change yields a different one.
pub fn composite_id(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fields.join(FIELD_SEPARATOR).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Derives the device identifier from its serial number and manufacturer
///
/// Field order is `serial | manufacturer`.
pub fn device_id(serial: &str, manufacturer: &str) -> String {
    composite_id(&[serial, manufacturer])
}

/// Derives the subject (patient) reference identifier
///
/// Hashes the first `prefix_len` characters of the patient identifier
/// together with the configured patient namespace. Field order is
/// `patient-id-prefix | namespace`. Shorter patient identifiers are used
/// in full.
pub fn subject_id(patient_id: &str, prefix_len: usize, namespace: &str) -> String {
    let prefix: String = patient_id.chars().take(prefix_len).collect();
    composite_id(&[&prefix, namespace])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_id_deterministic() {
        let a = composite_id(&["GE MEDICAL", "12345"]);
        let b = composite_id(&["GE MEDICAL", "12345"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_composite_id_field_sensitivity() {
        let base = composite_id(&["SN-001", "Siemens"]);
        assert_ne!(base, composite_id(&["SN-002", "Siemens"]));
        assert_ne!(base, composite_id(&["SN-001", "Philips"]));
        // field order is part of the contract
        assert_ne!(base, composite_id(&["Siemens", "SN-001"]));
    }

    #[test]
    fn test_composite_id_separator_ambiguity() {
        // joining with a separator keeps ("ab","c") distinct from ("a","bc")
        assert_ne!(composite_id(&["ab", "c"]), composite_id(&["a", "bc"]));
    }

    #[test]
    fn test_subject_id_prefix() {
        let ns = "https://fhir.example.org/identifiers/patient-id";
        // identical 9-char prefixes hash identically
        assert_eq!(
            subject_id("123456789AB", 9, ns),
            subject_id("123456789ZZ", 9, ns)
        );
        // differing within the prefix does not
        assert_ne!(
            subject_id("123456789", 9, ns),
            subject_id("123456780", 9, ns)
        );
        // short ids are used in full, no panic
        assert_eq!(subject_id("42", 9, ns), subject_id("42", 9, ns));
    }

    #[test]
    fn test_device_id_matches_composite() {
        assert_eq!(
            device_id("SN-001", "Siemens"),
            composite_id(&["SN-001", "Siemens"])
        );
    }
}
