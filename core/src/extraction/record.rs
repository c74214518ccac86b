use dicom_object::InMemDicomObject;

use crate::error::{Dicom2FhirError, Result};
use crate::extraction::tags::*;

/// One coded entry from a DICOM code sequence item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodedEntry {
    pub code: Option<String>,
    pub scheme: Option<String>,
    pub meaning: Option<String>,
}

impl CodedEntry {
    fn from_item(item: &InMemDicomObject) -> Self {
        Self {
            code: get_string_value(item, CODE_VALUE),
            scheme: get_string_value(item, CODING_SCHEME_DESIGNATOR),
            meaning: get_string_value(item, CODE_MEANING),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.scheme.is_none() && self.meaning.is_none()
    }
}

/// Contents of the first Radiopharmaceutical Information Sequence item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RadiopharmaceuticalInfo {
    pub radiopharmaceutical: Option<String>,
    pub start_time: Option<String>,
    /// Total dose in Becquerels, as recorded in the source
    pub total_dose: Option<f64>,
    pub half_life: Option<f64>,
    pub radionuclide: Option<CodedEntry>,
    pub radiopharmaceutical_code: Option<CodedEntry>,
}

/// Flat, typed view of one DICOM file's metadata
///
/// Extraction is a pure function of the data set: the six mandatory fields
/// fail with [`Dicom2FhirError::MissingTag`] when absent, everything else
/// degrades to `None`. No aggregation state is consulted here.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    // Mandatory identification
    pub study_uid: String,
    pub series_uid: String,
    pub sop_uid: String,
    pub sop_class_uid: String,
    pub modality: String,
    pub patient_id: String,

    // Study-level
    pub accession_number: Option<String>,
    pub study_description: Option<String>,
    pub study_date: Option<String>,
    pub study_time: Option<String>,
    pub procedure_codes: Vec<CodedEntry>,
    pub reason_codes: Vec<CodedEntry>,
    pub reason_text: Option<String>,

    // Patient demographics
    pub issuer_of_patient_id: Option<String>,
    pub patient_family_name: Option<String>,
    pub patient_given_name: Option<String>,
    pub patient_sex: Option<String>,
    pub patient_birth_date: Option<String>,

    // Series-level
    pub series_description: Option<String>,
    pub series_number: Option<i32>,
    pub series_date: Option<String>,
    pub series_time: Option<String>,
    pub body_part_examined: Option<String>,
    pub laterality: Option<String>,

    // Instance-level
    pub instance_number: Option<i32>,
    pub image_type: Option<Vec<String>>,
    /// Code meaning of the first Concept Name Code Sequence item (SR)
    pub concept_name_meaning: Option<String>,

    // Device
    pub manufacturer: Option<String>,
    pub manufacturer_model: Option<String>,
    pub device_serial: Option<String>,

    // Shared acquisition parameters
    pub contrast_agent: Option<String>,
    pub slice_thickness: Option<f64>,
    pub kvp: Option<f64>,
    pub exposure_time: Option<f64>,
    pub x_ray_tube_current: Option<f64>,
    pub exposure: Option<f64>,

    // CT
    pub ctdi_vol: Option<f64>,
    pub convolution_kernel: Option<String>,

    // MR
    pub scanning_sequence: Option<Vec<String>>,
    pub sequence_variant: Option<Vec<String>>,
    pub echo_time: Option<f64>,
    pub magnetic_field_strength: Option<f64>,

    // MG / CR / DX
    pub view_position: Option<String>,

    // US
    pub transducer_type: Option<String>,
    pub transducer_frequency: Option<f64>,
    pub pulse_repetition_frequency: Option<f64>,
    pub ultrasound_color_data_present: Option<i32>,

    // PT / NM
    pub acquisition_time: Option<String>,
    pub units: Option<String>,
    pub series_type: Option<Vec<String>>,
    pub radiopharmaceutical_info: Option<RadiopharmaceuticalInfo>,
}

fn require(dcm: &InMemDicomObject, tag: dicom_core::Tag, name: &'static str) -> Result<String> {
    get_string_value(dcm, tag).ok_or(Dicom2FhirError::MissingTag(name))
}

fn coded_entries(dcm: &InMemDicomObject, tag: dicom_core::Tag) -> Vec<CodedEntry> {
    get_items(dcm, tag)
        .map(|items| {
            items
                .iter()
                .map(CodedEntry::from_item)
                .filter(|entry| !entry.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Splits a DICOM person name into (family, given)
fn split_person_name(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.split('^');
    let family = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let given = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    (family, given)
}

fn radiopharmaceutical_info(dcm: &InMemDicomObject) -> Option<RadiopharmaceuticalInfo> {
    let item = get_first_item(dcm, RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE)?;
    Some(RadiopharmaceuticalInfo {
        radiopharmaceutical: get_string_value(item, RADIOPHARMACEUTICAL),
        start_time: get_string_value(item, RADIOPHARMACEUTICAL_START_TIME),
        total_dose: get_f64_value(item, RADIONUCLIDE_TOTAL_DOSE),
        half_life: get_f64_value(item, RADIONUCLIDE_HALF_LIFE),
        radionuclide: get_first_item(item, RADIONUCLIDE_CODE_SEQUENCE)
            .map(CodedEntry::from_item)
            .filter(|entry| !entry.is_empty()),
        radiopharmaceutical_code: get_first_item(item, RADIOPHARMACEUTICAL_CODE_SEQUENCE)
            .map(CodedEntry::from_item)
            .filter(|entry| !entry.is_empty()),
    })
}

impl InstanceRecord {
    /// Extracts a record from an in-memory data set
    ///
    /// # Errors
    ///
    /// Returns [`Dicom2FhirError::MissingTag`] when any of StudyInstanceUID,
    /// SeriesInstanceUID, SOPInstanceUID, SOPClassUID, Modality or PatientID
    /// is absent or empty.
    pub fn from_object(dcm: &InMemDicomObject) -> Result<Self> {
        let (patient_family_name, patient_given_name) = get_string_value(dcm, PATIENT_NAME)
            .map(|name| split_person_name(&name))
            .unwrap_or((None, None));

        // US frequency parameters live inside the region sequence when
        // present, with the top-level tags as fallback
        let region = get_first_item(dcm, SEQUENCE_OF_ULTRASOUND_REGIONS);
        let transducer_frequency = region
            .and_then(|item| get_f64_value(item, TRANSDUCER_FREQUENCY))
            .or_else(|| get_f64_value(dcm, TRANSDUCER_FREQUENCY));
        let pulse_repetition_frequency = region
            .and_then(|item| get_f64_value(item, PULSE_REPETITION_FREQUENCY))
            .or_else(|| get_f64_value(dcm, PULSE_REPETITION_FREQUENCY));

        Ok(Self {
            study_uid: require(dcm, STUDY_INSTANCE_UID, "StudyInstanceUID")?,
            series_uid: require(dcm, SERIES_INSTANCE_UID, "SeriesInstanceUID")?,
            sop_uid: require(dcm, SOP_INSTANCE_UID, "SOPInstanceUID")?,
            sop_class_uid: require(dcm, SOP_CLASS_UID, "SOPClassUID")?,
            modality: require(dcm, MODALITY, "Modality")?,
            patient_id: require(dcm, PATIENT_ID, "PatientID")?,

            accession_number: get_string_value(dcm, ACCESSION_NUMBER),
            study_description: get_string_value(dcm, STUDY_DESCRIPTION),
            study_date: get_string_value(dcm, STUDY_DATE),
            study_time: get_string_value(dcm, STUDY_TIME),
            procedure_codes: coded_entries(dcm, PROCEDURE_CODE_SEQUENCE),
            reason_codes: coded_entries(dcm, REASON_FOR_REQUESTED_PROCEDURE_CODE_SEQUENCE),
            reason_text: get_string_value(dcm, REASON_FOR_THE_REQUESTED_PROCEDURE),

            issuer_of_patient_id: get_string_value(dcm, ISSUER_OF_PATIENT_ID),
            patient_family_name,
            patient_given_name,
            patient_sex: get_string_value(dcm, PATIENT_SEX),
            patient_birth_date: get_string_value(dcm, PATIENT_BIRTH_DATE),

            series_description: get_string_value(dcm, SERIES_DESCRIPTION),
            series_number: get_int_value(dcm, SERIES_NUMBER),
            series_date: get_string_value(dcm, SERIES_DATE),
            series_time: get_string_value(dcm, SERIES_TIME),
            body_part_examined: get_string_value(dcm, BODY_PART_EXAMINED),
            laterality: get_string_value(dcm, LATERALITY),

            instance_number: get_int_value(dcm, INSTANCE_NUMBER),
            image_type: get_multi_string_value(dcm, IMAGE_TYPE),
            concept_name_meaning: get_first_item(dcm, CONCEPT_NAME_CODE_SEQUENCE)
                .and_then(|item| get_string_value(item, CODE_MEANING)),

            manufacturer: get_string_value(dcm, MANUFACTURER),
            manufacturer_model: get_string_value(dcm, MANUFACTURER_MODEL_NAME),
            device_serial: get_string_value(dcm, DEVICE_SERIAL_NUMBER),

            contrast_agent: get_string_value(dcm, CONTRAST_BOLUS_AGENT),
            slice_thickness: get_f64_value(dcm, SLICE_THICKNESS),
            kvp: get_f64_value(dcm, KVP),
            exposure_time: get_f64_value(dcm, EXPOSURE_TIME),
            x_ray_tube_current: get_f64_value(dcm, X_RAY_TUBE_CURRENT),
            exposure: get_f64_value(dcm, EXPOSURE),

            ctdi_vol: get_f64_value(dcm, CTDI_VOL),
            convolution_kernel: get_string_value(dcm, CONVOLUTION_KERNEL),

            scanning_sequence: get_multi_string_value(dcm, SCANNING_SEQUENCE),
            sequence_variant: get_multi_string_value(dcm, SEQUENCE_VARIANT),
            echo_time: get_f64_value(dcm, ECHO_TIME),
            magnetic_field_strength: get_f64_value(dcm, MAGNETIC_FIELD_STRENGTH),

            view_position: get_string_value(dcm, VIEW_POSITION),

            transducer_type: get_string_value(dcm, TRANSDUCER_TYPE),
            transducer_frequency,
            pulse_repetition_frequency,
            ultrasound_color_data_present: get_int_value(dcm, ULTRASOUND_COLOR_DATA_PRESENT),

            acquisition_time: get_string_value(dcm, ACQUISITION_TIME),
            units: get_string_value(dcm, UNITS),
            series_type: get_multi_string_value(dcm, SERIES_TYPE),
            radiopharmaceutical_info: radiopharmaceutical_info(dcm),
        })
    }

    /// Backslash-joined ImageType, used as the instance title fallback
    pub fn image_type_title(&self) -> Option<String> {
        self.image_type
            .as_ref()
            .filter(|parts| !parts.is_empty())
            .map(|parts| parts.join("\\"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::value::DataSetSequence;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    fn minimal_object() -> InMemDicomObject {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            STUDY_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from("1.2.3"),
        ));
        dcm.put(DataElement::new(
            SERIES_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from("1.2.3.1"),
        ));
        dcm.put(DataElement::new(
            SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from("1.2.3.1.1"),
        ));
        dcm.put(DataElement::new(
            SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from("1.2.840.10008.5.1.4.1.1.2"),
        ));
        dcm.put(DataElement::new(
            MODALITY,
            VR::CS,
            PrimitiveValue::from("CT"),
        ));
        dcm.put(DataElement::new(
            PATIENT_ID,
            VR::LO,
            PrimitiveValue::from("PAT-0001"),
        ));
        dcm
    }

    #[test]
    fn test_from_object_minimal() {
        let record = InstanceRecord::from_object(&minimal_object()).unwrap();
        assert_eq!(record.study_uid, "1.2.3");
        assert_eq!(record.series_uid, "1.2.3.1");
        assert_eq!(record.sop_uid, "1.2.3.1.1");
        assert_eq!(record.modality, "CT");
        assert_eq!(record.patient_id, "PAT-0001");
        assert!(record.accession_number.is_none());
        assert!(record.radiopharmaceutical_info.is_none());
    }

    #[test]
    fn test_from_object_missing_mandatory_tag() {
        let mut dcm = minimal_object();
        dcm.remove_element(SERIES_INSTANCE_UID);
        let err = InstanceRecord::from_object(&dcm).unwrap_err();
        assert!(matches!(
            err,
            Dicom2FhirError::MissingTag("SeriesInstanceUID")
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_empty_mandatory_tag_is_missing() {
        let mut dcm = minimal_object();
        dcm.put(DataElement::new(
            MODALITY,
            VR::CS,
            PrimitiveValue::from("  "),
        ));
        let err = InstanceRecord::from_object(&dcm).unwrap_err();
        assert!(matches!(err, Dicom2FhirError::MissingTag("Modality")));
    }

    #[test]
    fn test_person_name_split() {
        let mut dcm = minimal_object();
        dcm.put(DataElement::new(
            PATIENT_NAME,
            VR::PN,
            PrimitiveValue::from("Mustermann^Max"),
        ));
        let record = InstanceRecord::from_object(&dcm).unwrap();
        assert_eq!(record.patient_family_name.as_deref(), Some("Mustermann"));
        assert_eq!(record.patient_given_name.as_deref(), Some("Max"));
    }

    #[test]
    fn test_person_name_family_only() {
        let (family, given) = split_person_name("Mustermann");
        assert_eq!(family.as_deref(), Some("Mustermann"));
        assert!(given.is_none());
    }

    #[test]
    fn test_procedure_code_sequence() {
        let mut dcm = minimal_object();
        let item = InMemDicomObject::from_element_iter(vec![
            DataElement::new(CODE_VALUE, VR::SH, PrimitiveValue::from("CTTHORAX")),
            DataElement::new(
                CODING_SCHEME_DESIGNATOR,
                VR::SH,
                PrimitiveValue::from("99LOCAL"),
            ),
            DataElement::new(CODE_MEANING, VR::LO, PrimitiveValue::from("CT of thorax")),
        ]);
        dcm.put(DataElement::new(
            PROCEDURE_CODE_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![item]),
        ));
        let record = InstanceRecord::from_object(&dcm).unwrap();
        assert_eq!(record.procedure_codes.len(), 1);
        assert_eq!(record.procedure_codes[0].code.as_deref(), Some("CTTHORAX"));
        assert_eq!(
            record.procedure_codes[0].meaning.as_deref(),
            Some("CT of thorax")
        );
    }

    #[test]
    fn test_radiopharmaceutical_info_nested_sequences() {
        let mut dcm = minimal_object();
        dcm.put(DataElement::new(
            MODALITY,
            VR::CS,
            PrimitiveValue::from("PT"),
        ));

        let radionuclide_item = InMemDicomObject::from_element_iter(vec![
            DataElement::new(CODE_VALUE, VR::SH, PrimitiveValue::from("C-111A1")),
            DataElement::new(
                CODE_MEANING,
                VR::LO,
                PrimitiveValue::from("^18^Fluorine"),
            ),
        ]);
        let info_item = InMemDicomObject::from_element_iter(vec![
            DataElement::new(
                RADIOPHARMACEUTICAL,
                VR::LO,
                PrimitiveValue::from("Fludeoxyglucose"),
            ),
            DataElement::new(
                RADIOPHARMACEUTICAL_START_TIME,
                VR::TM,
                PrimitiveValue::from("101500"),
            ),
            DataElement::new(
                RADIONUCLIDE_TOTAL_DOSE,
                VR::DS,
                PrimitiveValue::from("185000000"),
            ),
            DataElement::new(
                RADIONUCLIDE_CODE_SEQUENCE,
                VR::SQ,
                DataSetSequence::from(vec![radionuclide_item]),
            ),
        ]);
        dcm.put(DataElement::new(
            RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![info_item]),
        ));

        let record = InstanceRecord::from_object(&dcm).unwrap();
        let info = record.radiopharmaceutical_info.unwrap();
        assert_eq!(info.radiopharmaceutical.as_deref(), Some("Fludeoxyglucose"));
        assert_eq!(info.total_dose, Some(185_000_000.0));
        assert_eq!(
            info.radionuclide.unwrap().meaning.as_deref(),
            Some("^18^Fluorine")
        );
    }

    #[test]
    fn test_us_frequencies_from_region_sequence() {
        let mut dcm = minimal_object();
        dcm.put(DataElement::new(
            MODALITY,
            VR::CS,
            PrimitiveValue::from("US"),
        ));
        let region = InMemDicomObject::from_element_iter(vec![
            DataElement::new(TRANSDUCER_FREQUENCY, VR::UL, PrimitiveValue::from(7500000_u32)),
            DataElement::new(
                PULSE_REPETITION_FREQUENCY,
                VR::UL,
                PrimitiveValue::from(1000_u32),
            ),
        ]);
        dcm.put(DataElement::new(
            SEQUENCE_OF_ULTRASOUND_REGIONS,
            VR::SQ,
            DataSetSequence::from(vec![region]),
        ));
        let record = InstanceRecord::from_object(&dcm).unwrap();
        assert_eq!(record.transducer_frequency, Some(7_500_000.0));
        assert_eq!(record.pulse_repetition_frequency, Some(1000.0));
    }

    #[test]
    fn test_image_type_title() {
        let mut dcm = minimal_object();
        dcm.put(DataElement::new(
            IMAGE_TYPE,
            VR::CS,
            PrimitiveValue::Strs(vec!["ORIGINAL".to_string(), "PRIMARY".to_string()].into()),
        ));
        let record = InstanceRecord::from_object(&dcm).unwrap();
        assert_eq!(record.image_type_title().as_deref(), Some("ORIGINAL\\PRIMARY"));
    }
}
