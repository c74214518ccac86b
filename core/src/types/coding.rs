use serde::Serialize;

// Code system URIs used across the converter
pub const TERMINOLOGY_CODING_SYS: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
pub const TERMINOLOGY_CODING_SYS_CODE_ACCESSION: &str = "ACSN";
pub const TERMINOLOGY_CODING_SYS_CODE_MRN: &str = "MR";
pub const TERMINOLOGY_CODING_SYS_CODE_SERIAL: &str = "SNO";

pub const ACQUISITION_MODALITY_SYS: &str = "http://dicom.nema.org/resources/ontology/DCM";
pub const SOP_CLASS_SYS: &str = "urn:ietf:rfc:3986";
pub const SNOMED_SYS: &str = "http://snomed.info/sct";
pub const UCUM_SYS: &str = "http://unitsofmeasure.org";
pub const DICOM_UID_SYS: &str = "urn:dicom:uid";

pub const SCANNING_SEQUENCE_SYS: &str =
    "https://dicom.nema.org/medical/dicom/current/output/chtml/part03/sect_C.8.3.html";
pub const TRANSDUCER_TYPE_SYS: &str =
    "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/CodeSystem/mii-cs-bildgebung-transducer-type";
pub const SERIES_TYPE_SYS: &str =
    "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/CodeSystem/mii-cs-bildgebung-series-type";

/// A single code from a code system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(rename = "userSelected", skip_serializing_if = "Option::is_none")]
    pub user_selected: Option<bool>,
}

impl Coding {
    pub fn new(code: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: code.into(),
            display: None,
            user_selected: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// A coding with no system, carrying raw source text as the code
    ///
    /// Used when terminology resolution found no mapping but the source
    /// value is worth keeping.
    pub fn text_only(code: impl Into<String>) -> Self {
        Self {
            system: None,
            code: code.into(),
            display: None,
            user_selected: Some(true),
        }
    }

    /// Identity used for de-duplication in ordered code lists
    pub fn key(&self) -> (Option<&str>, &str) {
        (self.system.as_deref(), &self.code)
    }
}

/// A concept expressed through one or more codings plus optional free text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    pub fn from_codes<I, S>(codes: I, system: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            coding: codes.into_iter().map(|c| Coding::new(c, system)).collect(),
            text: None,
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A measured amount with an optional UCUM unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Quantity {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value,
            unit: Some(unit.to_string()),
            system: Some(UCUM_SYS.to_string()),
        }
    }
}

/// A structured attribute value derived by an attribute builder
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionValue {
    Quantity(Quantity),
    Concept(CodeableConcept),
    Str(String),
    Boolean(bool),
    Reference { display: String },
    DateTime(String),
}

/// A named extension attribute
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionAttribute {
    pub name: &'static str,
    pub value: ExtensionValue,
}

/// A builder's output: one extension container with its derived attributes
///
/// Builders that derive zero attributes return no group at all, so an
/// empty `attributes` vector never occurs on an attached group.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionGroup {
    pub url: &'static str,
    pub attributes: Vec<ExtensionAttribute>,
}
