use thiserror::Error;

/// Result type for dicom2fhir operations
pub type Result<T> = std::result::Result<T, Dicom2FhirError>;

/// Error types for dicom2fhir operations
#[derive(Error, Debug)]
pub enum Dicom2FhirError {
    /// DICOM reading error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// Mandatory tag missing from a DICOM file (file is skippable)
    #[error("Missing mandatory tag: {0}")]
    MissingTag(&'static str),

    /// Invalid tag value
    #[error("Invalid tag value: {0}")]
    InvalidValue(String),

    /// A file carries a study instance UID different from the one being built (fatal)
    #[error("Multiple distinct study UIDs in one input batch: expected {expected}, got {found}")]
    StudyUidMismatch { expected: String, found: String },

    /// Neither accession number nor study UID is available to name the output (fatal)
    #[error("No suitable identifier in DICOM input to name the output artifact")]
    NoStudyIdentifier,

    /// The aggregator received no usable input at all
    #[error("No valid DICOM instances were aggregated")]
    EmptyStudy,

    /// Terminology table failed to load (fatal at startup)
    #[error("Terminology table '{table}' failed to load: {reason}")]
    TerminologyLoad { table: &'static str, reason: String },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for Dicom2FhirError {
    fn from(e: dicom_object::ReadError) -> Self {
        Dicom2FhirError::DicomError(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for Dicom2FhirError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        Dicom2FhirError::InvalidValue(format!("{}", e))
    }
}

impl Dicom2FhirError {
    /// Whether this error aborts the whole aggregation rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Dicom2FhirError::StudyUidMismatch { .. }
                | Dicom2FhirError::NoStudyIdentifier
                | Dicom2FhirError::TerminologyLoad { .. }
        )
    }
}
