use dicom_core::Tag;
use dicom_object::InMemDicomObject;

// Identification Tags
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);

// Description / Timing Tags
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
pub const ACQUISITION_TIME: Tag = Tag(0x0008, 0x0032);
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);

// Anatomy Tags
pub const BODY_PART_EXAMINED: Tag = Tag(0x0018, 0x0015);
pub const LATERALITY: Tag = Tag(0x0020, 0x0060);
pub const VIEW_POSITION: Tag = Tag(0x0018, 0x5101);

// Coded Concept Tags
pub const CODE_VALUE: Tag = Tag(0x0008, 0x0100);
pub const CODING_SCHEME_DESIGNATOR: Tag = Tag(0x0008, 0x0102);
pub const CODE_MEANING: Tag = Tag(0x0008, 0x0104);
pub const CONCEPT_NAME_CODE_SEQUENCE: Tag = Tag(0x0040, 0xA043);
pub const PROCEDURE_CODE_SEQUENCE: Tag = Tag(0x0008, 0x1032);
pub const REASON_FOR_REQUESTED_PROCEDURE_CODE_SEQUENCE: Tag = Tag(0x0040, 0x100A);
pub const REASON_FOR_THE_REQUESTED_PROCEDURE: Tag = Tag(0x0040, 0x1002);

// Patient Tags
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const ISSUER_OF_PATIENT_ID: Tag = Tag(0x0010, 0x0021);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);

// Device/Manufacturer Tags
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);
pub const DEVICE_SERIAL_NUMBER: Tag = Tag(0x0018, 0x1000);

// Acquisition Parameter Tags (CT / MG / CR / DX)
pub const KVP: Tag = Tag(0x0018, 0x0060);
pub const EXPOSURE_TIME: Tag = Tag(0x0018, 0x1150);
pub const X_RAY_TUBE_CURRENT: Tag = Tag(0x0018, 0x1151);
pub const EXPOSURE: Tag = Tag(0x0018, 0x1152);
pub const CTDI_VOL: Tag = Tag(0x0018, 0x9345);
pub const CONVOLUTION_KERNEL: Tag = Tag(0x0018, 0x1210);
pub const SLICE_THICKNESS: Tag = Tag(0x0018, 0x0050);
pub const CONTRAST_BOLUS_AGENT: Tag = Tag(0x0018, 0x0010);

// Acquisition Parameter Tags (MR)
pub const SCANNING_SEQUENCE: Tag = Tag(0x0018, 0x0020);
pub const SEQUENCE_VARIANT: Tag = Tag(0x0018, 0x0021);
pub const ECHO_TIME: Tag = Tag(0x0018, 0x0081);
pub const MAGNETIC_FIELD_STRENGTH: Tag = Tag(0x0018, 0x0087);

// Acquisition Parameter Tags (US)
pub const TRANSDUCER_TYPE: Tag = Tag(0x0018, 0x6031);
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Tag = Tag(0x0018, 0x6011);
pub const TRANSDUCER_FREQUENCY: Tag = Tag(0x0018, 0x6030);
pub const PULSE_REPETITION_FREQUENCY: Tag = Tag(0x0018, 0x6032);
pub const ULTRASOUND_COLOR_DATA_PRESENT: Tag = Tag(0x0028, 0x0014);

// Acquisition Parameter Tags (PT / NM)
pub const RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE: Tag = Tag(0x0054, 0x0016);
pub const RADIOPHARMACEUTICAL: Tag = Tag(0x0018, 0x0031);
pub const RADIOPHARMACEUTICAL_START_TIME: Tag = Tag(0x0018, 0x1072);
pub const RADIONUCLIDE_TOTAL_DOSE: Tag = Tag(0x0018, 0x1074);
pub const RADIONUCLIDE_HALF_LIFE: Tag = Tag(0x0018, 0x1075);
pub const RADIONUCLIDE_CODE_SEQUENCE: Tag = Tag(0x0054, 0x0300);
pub const RADIOPHARMACEUTICAL_CODE_SEQUENCE: Tag = Tag(0x0054, 0x0304);
pub const UNITS: Tag = Tag(0x0054, 0x1001);
pub const SERIES_TYPE: Tag = Tag(0x0054, 0x1000);

// Bulk data boundary
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present, empty, or cannot be converted
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Helper to get integer value from DICOM tag
pub fn get_int_value(dcm: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<i32>().ok())
}

/// Helper to get floating-point value from DICOM tag
pub fn get_f64_value(dcm: &InMemDicomObject, tag: Tag) -> Option<f64> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_float64().ok())
}

/// Helper to get multi-string value from DICOM tag
///
/// Falls back to splitting a single string on backslash when the element
/// cannot be read as a multi-string.
pub fn get_multi_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<String>> {
    dcm.element(tag).ok().and_then(|elem| {
        if let Ok(strs) = elem.to_multi_str() {
            Some(strs.iter().map(|s| s.trim().to_string()).collect())
        } else {
            elem.to_str()
                .ok()
                .map(|s| s.split('\\').map(|part| part.trim().to_string()).collect())
        }
    })
}

/// Helper to get the first item of a sequence tag
pub fn get_first_item(dcm: &InMemDicomObject, tag: Tag) -> Option<&InMemDicomObject> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.items())
        .and_then(|items| items.first())
}

/// Helper to iterate all items of a sequence tag
pub fn get_items(dcm: &InMemDicomObject, tag: Tag) -> Option<&[InMemDicomObject]> {
    dcm.element(tag).ok().and_then(|elem| elem.items())
}
