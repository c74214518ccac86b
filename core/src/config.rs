use chrono::FixedOffset;

pub const IMAGINGSTUDY_META_PROFILE: &str =
    "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-pr-bildgebung-bildgebungsstudie";
pub const DEVICE_META_PROFILE: &str =
    "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-pr-bildgebung-geraet";

/// Converter settings
///
/// Identifier namespaces, meta profiles and the timezone offset attached to
/// reconciled DICOM timestamps. Defaults match the reference deployment;
/// the CLI may override individual fields.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Identifier system for ImagingStudy resources
    pub imagingstudy_identifier_system: String,

    /// Identifier system (namespace) hashed into the subject reference
    pub patient_identifier_system: String,

    /// Identifier system for Device resources
    pub device_identifier_system: String,

    /// Number of leading PatientID characters hashed into the subject reference
    pub patient_id_positions: usize,

    /// Timezone offset attached to reconciled date/time values
    pub timezone_offset: FixedOffset,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            imagingstudy_identifier_system:
                "https://fhir.diz.uk-erlangen.de/identifiers/imagingstudy-id".to_string(),
            patient_identifier_system: "https://fhir.diz.uk-erlangen.de/identifiers/patient-id"
                .to_string(),
            device_identifier_system:
                "https://fhir.diz.uk-erlangen.de/identifiers/radiology-device-id".to_string(),
            patient_id_positions: 9,
            // CET; DICOM DA/TM carry no offset of their own
            timezone_offset: FixedOffset::east_opt(3600).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert_eq!(config.patient_id_positions, 9);
        assert_eq!(config.timezone_offset.local_minus_utc(), 3600);
    }
}
