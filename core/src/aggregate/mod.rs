//! Hierarchy aggregation
//!
//! Folds per-file records into one study → series → instance tree plus a
//! side-list of distinct acquisition devices. Arrival order determines
//! append order only; the aggregated content is order-independent.

use log::warn;

use crate::config::ConverterConfig;
use crate::datetime::started_datetime;
use crate::error::{Dicom2FhirError, Result};
use crate::extensions::{series_extensions, Context};
use crate::extraction::{CodedEntry, InstanceRecord};
use crate::identity;
use crate::terminology::Terminology;
use crate::types::{
    CodeableConcept, Coding, DeviceRecord, InstanceNode, SeriesNode, StudyNode,
    ACQUISITION_MODALITY_SYS, SNOMED_SYS, SOP_CLASS_SYS,
};

/// The finished result of one aggregation
#[derive(Debug)]
pub struct AggregationOutput {
    pub study: StudyNode,
    pub devices: Vec<DeviceRecord>,
}

enum State {
    Empty,
    Building(StudyNode),
}

/// Builds one study hierarchy from per-file records
///
/// `Empty → Building` on the first valid record, `Building → Finalized`
/// when [`StudyAggregator::finish`] consumes the aggregator. A record
/// carrying a second study UID is fatal; per-file extraction failures never
/// reach this type (the caller's loop skips them).
pub struct StudyAggregator<'a> {
    terminology: &'a Terminology,
    config: &'a ConverterConfig,
    state: State,
    devices: Vec<DeviceRecord>,
}

impl<'a> StudyAggregator<'a> {
    pub fn new(terminology: &'a Terminology, config: &'a ConverterConfig) -> Self {
        Self {
            terminology,
            config,
            state: State::Empty,
            devices: Vec::new(),
        }
    }

    /// Folds one record into the hierarchy
    ///
    /// # Errors
    ///
    /// Returns [`Dicom2FhirError::StudyUidMismatch`] when the record belongs
    /// to a different study than the one being built.
    pub fn add_record(&mut self, record: &InstanceRecord) -> Result<()> {
        if let State::Building(study) = &self.state {
            if study.study_uid != record.study_uid {
                return Err(Dicom2FhirError::StudyUidMismatch {
                    expected: study.study_uid.clone(),
                    found: record.study_uid.clone(),
                });
            }
        } else {
            let study = self.create_study(record);
            self.state = State::Building(study);
        }

        let ctx = Context {
            terminology: self.terminology,
            config: self.config,
        };
        let State::Building(study) = &mut self.state else {
            unreachable!("state is Building after the first record");
        };

        fill_study_fields(study, record, self.config);

        match study.series_mut(&record.series_uid) {
            Some(series) => {
                if series.modality.code != record.modality {
                    warn!(
                        "series {} modality mismatch: kept '{}', file says '{}'",
                        series.uid, series.modality.code, record.modality
                    );
                }
                if series.contains_instance(&record.sop_uid) {
                    warn!(
                        "duplicate instance {} in series {}, skipping",
                        record.sop_uid, series.uid
                    );
                } else {
                    series.push_instance(build_instance(record));
                }
            }
            None => {
                let mut series = build_series(record, self.terminology, &ctx);
                series.push_instance(build_instance(record));
                study.push_series(series);
            }
        }

        study.add_modality(Coding::new(
            record.modality.as_str(),
            ACQUISITION_MODALITY_SYS,
        ));

        if let Some(device) = build_device(record) {
            if !self.devices.iter().any(|d| d.key() == device.key()) {
                self.devices.push(device);
            }
        }

        Ok(())
    }

    /// Consumes the aggregator and returns the finished hierarchy
    ///
    /// # Errors
    ///
    /// Returns [`Dicom2FhirError::EmptyStudy`] when no record was ever
    /// accepted.
    pub fn finish(self) -> Result<AggregationOutput> {
        match self.state {
            State::Empty => Err(Dicom2FhirError::EmptyStudy),
            State::Building(study) => Ok(AggregationOutput {
                study,
                devices: self.devices,
            }),
        }
    }

    fn create_study(&self, record: &InstanceRecord) -> StudyNode {
        let subject_id = identity::subject_id(
            &record.patient_id,
            self.config.patient_id_positions,
            &self.config.patient_identifier_system,
        );
        // resource id is derived, not random, so reruns are idempotent
        let id = identity::composite_id(&[&record.study_uid]);
        StudyNode::new(id, record.study_uid.clone(), subject_id)
    }
}

/// First-seen study-level fields win; later records only fill gaps
fn fill_study_fields(study: &mut StudyNode, record: &InstanceRecord, config: &ConverterConfig) {
    if study.accession_number.is_none() {
        study.accession_number = record.accession_number.clone();
    }
    if study.description.is_none() {
        study.description = record.study_description.clone();
    }
    if study.started.is_none() {
        if let Some(date) = record.study_date.as_deref() {
            study.started = started_datetime(
                date,
                record.study_time.as_deref(),
                config.timezone_offset,
            );
        }
    }

    let patient = &mut study.patient;
    if patient.patient_id.is_empty() {
        patient.patient_id = record.patient_id.clone();
    }
    if patient.issuer.is_none() {
        patient.issuer = record.issuer_of_patient_id.clone();
    }
    if patient.family_name.is_none() {
        patient.family_name = record.patient_family_name.clone();
    }
    if patient.given_name.is_none() {
        patient.given_name = record.patient_given_name.clone();
    }
    if patient.sex.is_none() {
        patient.sex = record.patient_sex.clone();
    }
    if patient.birth_date.is_none() {
        patient.birth_date = record.patient_birth_date.clone();
    }

    for concept in record.procedure_codes.iter().map(coded_concept) {
        if !study.procedures.contains(&concept) {
            study.procedures.push(concept);
        }
    }
    for concept in build_reasons(&record.reason_codes, record.reason_text.as_deref()) {
        if !study.reasons.contains(&concept) {
            study.reasons.push(concept);
        }
    }
}

/// Reason concepts: coded entries when present, otherwise the free text
fn build_reasons(codes: &[CodedEntry], text: Option<&str>) -> Vec<CodeableConcept> {
    if codes.is_empty() {
        return text
            .map(|t| vec![CodeableConcept::text_only(t)])
            .unwrap_or_default();
    }
    codes.iter().map(coded_concept).collect()
}

fn coded_concept(entry: &CodedEntry) -> CodeableConcept {
    let coding = Coding {
        system: entry.scheme.clone(),
        code: entry.code.clone().unwrap_or_default(),
        display: entry.meaning.clone(),
        user_selected: None,
    };
    CodeableConcept::from_coding(coding)
}

fn build_series(
    record: &InstanceRecord,
    terminology: &Terminology,
    ctx: &Context,
) -> SeriesNode {
    let modality = Coding::new(record.modality.as_str(), ACQUISITION_MODALITY_SYS);
    let mut series = SeriesNode::new(record.series_uid.clone(), modality);
    series.description = record.series_description.clone();
    series.number = record.series_number;
    if let Some(date) = record.series_date.as_deref() {
        series.started = started_datetime(
            date,
            record.series_time.as_deref(),
            ctx.config.timezone_offset,
        );
    }
    series.body_site = record
        .body_part_examined
        .as_deref()
        .map(|raw| resolve_or_text(terminology.body_site.resolve(raw), raw));
    series.laterality = record
        .laterality
        .as_deref()
        .map(|raw| resolve_or_text(terminology.laterality.resolve(raw), raw));
    series.extensions = series_extensions(record, ctx);
    series
}

/// Unmapped source codes are retained as user-selected text-only codings
fn resolve_or_text(concept: Option<&crate::terminology::Concept>, raw: &str) -> Coding {
    match concept {
        Some(c) => Coding::new(c.code.as_str(), SNOMED_SYS).with_display(c.display.as_str()),
        None => Coding::text_only(raw),
    }
}

fn build_instance(record: &InstanceRecord) -> InstanceNode {
    InstanceNode {
        uid: record.sop_uid.clone(),
        sop_class: Coding::new(format!("urn:oid:{}", record.sop_class_uid), SOP_CLASS_SYS),
        number: record.instance_number,
        title: record
            .concept_name_meaning
            .clone()
            .or_else(|| record.image_type_title()),
        extensions: Vec::new(),
    }
}

fn build_device(record: &InstanceRecord) -> Option<DeviceRecord> {
    let manufacturer = record.manufacturer.clone()?;
    let serial = record.device_serial.clone()?;
    Some(DeviceRecord::new(
        manufacturer,
        record.manufacturer_model.clone(),
        serial,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::test_support::{minimal_object, put_str};
    use crate::extraction::tags::*;
    use crate::extraction::InstanceRecord;
    use dicom_core::value::DataSetSequence;
    use dicom_core::{DataElement, PrimitiveValue, VR};
    use dicom_object::InMemDicomObject;

    fn fixtures() -> (Terminology, ConverterConfig) {
        (Terminology::load().unwrap(), ConverterConfig::default())
    }

    fn record(study: &str, series: &str, sop: &str, modality: &str) -> InstanceRecord {
        let mut dcm = minimal_object(modality);
        put_str(&mut dcm, STUDY_INSTANCE_UID, VR::UI, study);
        put_str(&mut dcm, SERIES_INSTANCE_UID, VR::UI, series);
        put_str(&mut dcm, SOP_INSTANCE_UID, VR::UI, sop);
        InstanceRecord::from_object(&dcm).unwrap()
    }

    #[test]
    fn test_end_to_end_counts_and_modalities() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        agg.add_record(&record("1.2.3", "1.2.3.1", "1.2.3.1.1", "CT")).unwrap();
        agg.add_record(&record("1.2.3", "1.2.3.1", "1.2.3.1.2", "CT")).unwrap();
        agg.add_record(&record("1.2.3", "1.2.3.2", "1.2.3.2.1", "MR")).unwrap();

        let output = agg.finish().unwrap();
        assert_eq!(output.study.number_of_series(), 2);
        assert_eq!(output.study.number_of_instances(), 3);
        let modalities: Vec<&str> = output
            .study
            .modalities()
            .iter()
            .map(|m| m.code.as_str())
            .collect();
        assert_eq!(modalities, vec!["CT", "MR"]);
    }

    #[test]
    fn test_content_is_order_independent() {
        let (terminology, config) = fixtures();
        let records = [
            record("1.2.3", "1.2.3.1", "1.2.3.1.1", "CT"),
            record("1.2.3", "1.2.3.2", "1.2.3.2.1", "MR"),
            record("1.2.3", "1.2.3.1", "1.2.3.1.2", "CT"),
        ];

        let permutations: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        let mut summaries = Vec::new();
        for perm in permutations {
            let mut agg = StudyAggregator::new(&terminology, &config);
            for &i in &perm {
                agg.add_record(&records[i]).unwrap();
            }
            let output = agg.finish().unwrap();

            let mut series: Vec<(String, usize)> = output
                .study
                .series()
                .iter()
                .map(|s| (s.uid.clone(), s.number_of_instances()))
                .collect();
            series.sort();
            let mut modalities: Vec<String> = output
                .study
                .modalities()
                .iter()
                .map(|m| m.code.clone())
                .collect();
            modalities.sort();
            summaries.push((
                output.study.id.clone(),
                output.study.number_of_instances(),
                series,
                modalities,
            ));
        }

        for summary in &summaries[1..] {
            assert_eq!(summary, &summaries[0]);
        }
    }

    #[test]
    fn test_duplicate_instance_skipped_once() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        let r = record("1.2.3", "1.2.3.1", "1.2.3.1.1", "CT");
        agg.add_record(&r).unwrap();
        agg.add_record(&r).unwrap();

        let output = agg.finish().unwrap();
        assert_eq!(output.study.number_of_instances(), 1);
        assert_eq!(output.study.series()[0].number_of_instances(), 1);
    }

    #[test]
    fn test_study_uid_mismatch_is_fatal() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        agg.add_record(&record("1.2.3", "1.2.3.1", "1.2.3.1.1", "CT")).unwrap();
        let err = agg
            .add_record(&record("9.9.9", "9.9.9.1", "9.9.9.1.1", "CT"))
            .unwrap_err();
        assert!(matches!(err, Dicom2FhirError::StudyUidMismatch { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_modality_mismatch_keeps_first() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        agg.add_record(&record("1.2.3", "1.2.3.1", "1.2.3.1.1", "CT")).unwrap();
        // same series UID, different modality: logged, never overwritten
        agg.add_record(&record("1.2.3", "1.2.3.1", "1.2.3.1.2", "MR")).unwrap();

        let output = agg.finish().unwrap();
        assert_eq!(output.study.series()[0].modality.code, "CT");
        assert_eq!(output.study.series()[0].number_of_instances(), 2);
    }

    #[test]
    fn test_empty_aggregation_fails() {
        let (terminology, config) = fixtures();
        let agg = StudyAggregator::new(&terminology, &config);
        assert!(matches!(
            agg.finish().unwrap_err(),
            Dicom2FhirError::EmptyStudy
        ));
    }

    #[test]
    fn test_device_side_list_dedup() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        for sop in ["1.2.3.1.1", "1.2.3.1.2"] {
            let mut dcm = minimal_object("CT");
            put_str(&mut dcm, SOP_INSTANCE_UID, VR::UI, sop);
            put_str(&mut dcm, MANUFACTURER, VR::LO, "Siemens");
            put_str(&mut dcm, MANUFACTURER_MODEL_NAME, VR::LO, "SOMATOM");
            put_str(&mut dcm, DEVICE_SERIAL_NUMBER, VR::LO, "SN-1");
            agg.add_record(&InstanceRecord::from_object(&dcm).unwrap()).unwrap();
        }

        let mut dcm = minimal_object("CT");
        put_str(&mut dcm, SOP_INSTANCE_UID, VR::UI, "1.2.3.1.3");
        put_str(&mut dcm, MANUFACTURER, VR::LO, "Siemens");
        put_str(&mut dcm, MANUFACTURER_MODEL_NAME, VR::LO, "SOMATOM");
        put_str(&mut dcm, DEVICE_SERIAL_NUMBER, VR::LO, "SN-2");
        agg.add_record(&InstanceRecord::from_object(&dcm).unwrap()).unwrap();

        let output = agg.finish().unwrap();
        assert_eq!(output.devices.len(), 2);
        assert_ne!(output.devices[0].id, output.devices[1].id);
    }

    #[test]
    fn test_series_body_site_and_laterality() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        let mut dcm = minimal_object("CT");
        put_str(&mut dcm, BODY_PART_EXAMINED, VR::CS, "CHEST");
        put_str(&mut dcm, LATERALITY, VR::CS, "L");
        agg.add_record(&InstanceRecord::from_object(&dcm).unwrap()).unwrap();

        let output = agg.finish().unwrap();
        let series = &output.study.series()[0];
        assert_eq!(series.body_site.as_ref().unwrap().code, "51185008");
        assert_eq!(series.laterality.as_ref().unwrap().code, "7771000");
    }

    #[test]
    fn test_unmapped_laterality_kept_as_text_only() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        let mut dcm = minimal_object("CT");
        put_str(&mut dcm, LATERALITY, VR::CS, "X");
        agg.add_record(&InstanceRecord::from_object(&dcm).unwrap()).unwrap();

        let output = agg.finish().unwrap();
        let laterality = output.study.series()[0].laterality.as_ref().unwrap();
        assert_eq!(laterality.code, "X");
        assert!(laterality.system.is_none());
        assert_eq!(laterality.user_selected, Some(true));
    }

    #[test]
    fn test_reason_free_text_fallback() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        let mut dcm = minimal_object("CT");
        put_str(
            &mut dcm,
            REASON_FOR_THE_REQUESTED_PROCEDURE,
            VR::LO,
            "suspected pulmonary embolism",
        );
        agg.add_record(&InstanceRecord::from_object(&dcm).unwrap()).unwrap();

        let output = agg.finish().unwrap();
        assert_eq!(output.study.reasons.len(), 1);
        assert_eq!(
            output.study.reasons[0].text.as_deref(),
            Some("suspected pulmonary embolism")
        );
        assert!(output.study.reasons[0].coding.is_empty());
    }

    #[test]
    fn test_reason_codes_preferred_over_text() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        let mut dcm = minimal_object("CT");
        let item = InMemDicomObject::from_element_iter(vec![
            DataElement::new(CODE_VALUE, VR::SH, PrimitiveValue::from("I26.9")),
            DataElement::new(CODING_SCHEME_DESIGNATOR, VR::SH, PrimitiveValue::from("I10")),
            DataElement::new(
                CODE_MEANING,
                VR::LO,
                PrimitiveValue::from("Pulmonary embolism"),
            ),
        ]);
        dcm.put(DataElement::new(
            REASON_FOR_REQUESTED_PROCEDURE_CODE_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![item]),
        ));
        put_str(&mut dcm, REASON_FOR_THE_REQUESTED_PROCEDURE, VR::LO, "free text");
        agg.add_record(&InstanceRecord::from_object(&dcm).unwrap()).unwrap();

        let output = agg.finish().unwrap();
        assert_eq!(output.study.reasons.len(), 1);
        assert_eq!(output.study.reasons[0].coding[0].code, "I26.9");
    }

    #[test]
    fn test_sr_instance_title_prefers_concept_name() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);

        let mut dcm = minimal_object("SR");
        let concept_name = InMemDicomObject::from_element_iter(vec![DataElement::new(
            CODE_MEANING,
            VR::LO,
            PrimitiveValue::from("Radiology Report"),
        )]);
        dcm.put(DataElement::new(
            CONCEPT_NAME_CODE_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![concept_name]),
        ));
        dcm.put(DataElement::new(
            IMAGE_TYPE,
            VR::CS,
            PrimitiveValue::Strs(vec!["ORIGINAL".to_string(), "PRIMARY".to_string()].into()),
        ));
        agg.add_record(&InstanceRecord::from_object(&dcm).unwrap()).unwrap();

        let output = agg.finish().unwrap();
        let instance = &output.study.series()[0].instances()[0];
        assert_eq!(instance.title.as_deref(), Some("Radiology Report"));
    }

    #[test]
    fn test_subject_id_uses_patient_prefix() {
        let (terminology, config) = fixtures();
        let mut agg = StudyAggregator::new(&terminology, &config);
        agg.add_record(&record("1.2.3", "1.2.3.1", "1.2.3.1.1", "CT")).unwrap();
        let output = agg.finish().unwrap();
        assert_eq!(
            output.study.subject_id,
            identity::subject_id("PAT-0001", 9, &config.patient_identifier_system)
        );
    }
}
