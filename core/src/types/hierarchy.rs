use crate::datetime::StartedDateTime;
use crate::types::coding::{CodeableConcept, Coding, ExtensionGroup};

/// One discrete image/object within a series
///
/// Created exactly once per unique SOP instance UID and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceNode {
    pub uid: String,
    pub sop_class: Coding,
    pub number: Option<i32>,
    /// Backslash-joined ImageType, or the concept name code meaning for SR
    pub title: Option<String>,
    pub extensions: Vec<ExtensionGroup>,
}

/// One acquisition run within a study
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesNode {
    pub uid: String,
    pub description: Option<String>,
    pub number: Option<i32>,
    /// Immutable once set from the first file observed for this series
    pub modality: Coding,
    pub started: Option<StartedDateTime>,
    pub body_site: Option<Coding>,
    pub laterality: Option<Coding>,
    pub extensions: Vec<ExtensionGroup>,
    instances: Vec<InstanceNode>,
}

impl SeriesNode {
    pub fn new(uid: String, modality: Coding) -> Self {
        Self {
            uid,
            description: None,
            number: None,
            modality,
            started: None,
            body_site: None,
            laterality: None,
            extensions: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Derived instance count; always equals the number of distinct
    /// instance UIDs attached under this series
    pub fn number_of_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn instances(&self) -> &[InstanceNode] {
        &self.instances
    }

    pub fn contains_instance(&self, uid: &str) -> bool {
        self.instances.iter().any(|i| i.uid == uid)
    }

    /// Appends a fully-populated instance in arrival order
    ///
    /// Uniqueness must have been checked by the caller; the aggregator
    /// rejects duplicates before building the node.
    pub fn push_instance(&mut self, instance: InstanceNode) {
        self.instances.push(instance);
    }
}

/// Patient demographics carried into the contained Patient resource
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatientInfo {
    pub patient_id: String,
    pub issuer: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<String>,
}

/// One imaging examination: the root of the aggregated hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct StudyNode {
    /// Process-local resource id, derived deterministically from the study UID
    pub id: String,
    pub study_uid: String,
    pub accession_number: Option<String>,
    pub description: Option<String>,
    pub started: Option<StartedDateTime>,
    /// Hashed subject reference (patient-id prefix + namespace)
    pub subject_id: String,
    pub patient: PatientInfo,
    /// Source directory, surfaced as a `file://` endpoint
    pub endpoint: Option<String>,
    /// Distinct modality codes across all series, in first-seen order
    modalities: Vec<Coding>,
    pub procedures: Vec<CodeableConcept>,
    pub reasons: Vec<CodeableConcept>,
    pub extensions: Vec<ExtensionGroup>,
    series: Vec<SeriesNode>,
}

impl StudyNode {
    pub fn new(id: String, study_uid: String, subject_id: String) -> Self {
        Self {
            id,
            study_uid,
            accession_number: None,
            description: None,
            started: None,
            subject_id,
            patient: PatientInfo::default(),
            endpoint: None,
            modalities: Vec::new(),
            procedures: Vec::new(),
            reasons: Vec::new(),
            extensions: Vec::new(),
            series: Vec::new(),
        }
    }

    /// Derived series count; always equals the number of distinct series UIDs
    pub fn number_of_series(&self) -> usize {
        self.series.len()
    }

    /// Derived instance count across all series
    pub fn number_of_instances(&self) -> usize {
        self.series.iter().map(SeriesNode::number_of_instances).sum()
    }

    pub fn series(&self) -> &[SeriesNode] {
        &self.series
    }

    pub fn series_mut(&mut self, uid: &str) -> Option<&mut SeriesNode> {
        self.series.iter_mut().find(|s| s.uid == uid)
    }

    /// Appends a fully-populated series in arrival order
    pub fn push_series(&mut self, series: SeriesNode) {
        self.series.push(series);
    }

    /// Distinct modality codes in first-seen order
    pub fn modalities(&self) -> &[Coding] {
        &self.modalities
    }

    /// Records a modality, keeping the list distinct and insertion-ordered
    pub fn add_modality(&mut self, modality: Coding) {
        if !self.modalities.iter().any(|m| m.key() == modality.key()) {
            self.modalities.push(modality);
        }
    }
}
