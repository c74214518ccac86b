//! FHIR R4B JSON output
//!
//! Mechanical mapping of the finished hierarchy onto ImagingStudy, Device
//! and transaction Bundle resources. All shaping decisions were made during
//! aggregation; this module only serializes.

use serde_json::{json, Map, Value};

use crate::config::{ConverterConfig, DEVICE_META_PROFILE, IMAGINGSTUDY_META_PROFILE};
use crate::error::{Dicom2FhirError, Result};
use crate::types::{
    Coding, DeviceRecord, ExtensionGroup, ExtensionValue, InstanceNode, PatientInfo, SeriesNode,
    StudyNode, ACQUISITION_MODALITY_SYS, DICOM_UID_SYS, TERMINOLOGY_CODING_SYS,
    TERMINOLOGY_CODING_SYS_CODE_ACCESSION, TERMINOLOGY_CODING_SYS_CODE_MRN,
    TERMINOLOGY_CODING_SYS_CODE_SERIAL,
};

const CONTAINED_PATIENT_ID: &str = "patient.contained.inline";

fn set_optional(obj: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        obj.insert(key.to_string(), value);
    }
}

fn coding_json(coding: &Coding) -> Value {
    serde_json::to_value(coding).unwrap_or(Value::Null)
}

fn extension_json(group: &ExtensionGroup) -> Value {
    let attributes: Vec<Value> = group
        .attributes
        .iter()
        .map(|attr| {
            let mut obj = Map::new();
            obj.insert("url".to_string(), json!(attr.name));
            let (key, value) = match &attr.value {
                ExtensionValue::Quantity(q) => {
                    ("valueQuantity", serde_json::to_value(q).unwrap_or(Value::Null))
                }
                ExtensionValue::Concept(c) => (
                    "valueCodeableConcept",
                    serde_json::to_value(c).unwrap_or(Value::Null),
                ),
                ExtensionValue::Str(s) => ("valueString", json!(s)),
                ExtensionValue::Boolean(b) => ("valueBoolean", json!(b)),
                ExtensionValue::Reference { display } => {
                    ("valueReference", json!({ "display": display }))
                }
                ExtensionValue::DateTime(dt) => ("valueDateTime", json!(dt)),
            };
            obj.insert(key.to_string(), value);
            Value::Object(obj)
        })
        .collect();

    json!({
        "url": group.url,
        "extension": attributes,
    })
}

fn extensions_json(groups: &[ExtensionGroup]) -> Option<Value> {
    if groups.is_empty() {
        None
    } else {
        Some(Value::Array(groups.iter().map(extension_json).collect()))
    }
}

fn gender(sex: Option<&str>) -> &'static str {
    match sex.map(str::to_ascii_lowercase).as_deref() {
        Some("f") => "female",
        Some("m") => "male",
        Some("o") => "other",
        _ => "unknown",
    }
}

/// DICOM DA date to FHIR date, `None` when lexically invalid
fn fhir_date(da: &str) -> Option<String> {
    let da = da.trim();
    if da.len() != 8 || !da.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &da[0..4], &da[4..6], &da[6..8]))
}

fn contained_patient(patient: &PatientInfo) -> Value {
    let mut identifier = Map::new();
    identifier.insert("use".to_string(), json!("usual"));
    identifier.insert(
        "type".to_string(),
        json!({
            "coding": [{
                "system": TERMINOLOGY_CODING_SYS,
                "code": TERMINOLOGY_CODING_SYS_CODE_MRN,
            }]
        }),
    );
    identifier.insert("value".to_string(), json!(patient.patient_id));
    if let Some(issuer) = &patient.issuer {
        identifier.insert("assigner".to_string(), json!({ "display": issuer }));
    }

    let mut name = Map::new();
    set_optional(
        &mut name,
        "family",
        patient.family_name.as_ref().map(|f| json!(f)),
    );
    set_optional(
        &mut name,
        "given",
        patient.given_name.as_ref().map(|g| json!([g])),
    );

    let mut resource = Map::new();
    resource.insert("resourceType".to_string(), json!("Patient"));
    resource.insert("id".to_string(), json!(CONTAINED_PATIENT_ID));
    resource.insert("identifier".to_string(), json!([Value::Object(identifier)]));
    if !name.is_empty() {
        resource.insert("name".to_string(), json!([Value::Object(name)]));
    }
    resource.insert("gender".to_string(), json!(gender(patient.sex.as_deref())));
    set_optional(
        &mut resource,
        "birthDate",
        patient
            .birth_date
            .as_deref()
            .and_then(fhir_date)
            .map(|d| json!(d)),
    );
    resource.insert("active".to_string(), json!(true));
    Value::Object(resource)
}

fn instance_json(instance: &InstanceNode) -> Value {
    let mut obj = Map::new();
    obj.insert("uid".to_string(), json!(instance.uid));
    obj.insert("sopClass".to_string(), coding_json(&instance.sop_class));
    set_optional(&mut obj, "number", instance.number.map(|n| json!(n)));
    set_optional(
        &mut obj,
        "title",
        instance.title.as_ref().map(|t| json!(t)),
    );
    Value::Object(obj)
}

fn series_json(series: &SeriesNode, include_instances: bool) -> Value {
    let mut obj = Map::new();
    obj.insert("uid".to_string(), json!(series.uid));
    set_optional(&mut obj, "number", series.number.map(|n| json!(n)));
    obj.insert(
        "modality".to_string(),
        json!({ "coding": [coding_json(&series.modality)] }),
    );
    set_optional(
        &mut obj,
        "description",
        series.description.as_ref().map(|d| json!(d)),
    );
    obj.insert(
        "numberOfInstances".to_string(),
        json!(series.number_of_instances()),
    );
    set_optional(
        &mut obj,
        "started",
        series.started.as_ref().map(|s| json!(s.to_string())),
    );
    set_optional(
        &mut obj,
        "bodySite",
        series.body_site.as_ref().map(coding_json),
    );
    set_optional(
        &mut obj,
        "laterality",
        series.laterality.as_ref().map(coding_json),
    );
    set_optional(&mut obj, "extension", extensions_json(&series.extensions));
    if include_instances {
        obj.insert(
            "instance".to_string(),
            Value::Array(series.instances().iter().map(instance_json).collect()),
        );
    }
    Value::Object(obj)
}

/// Stem used to name the output files for this study
///
/// Prefers the accession number, falls back to the study instance UID.
pub fn artifact_name(study: &StudyNode) -> Result<String> {
    if let Some(accession) = study.accession_number.as_deref().filter(|a| !a.is_empty()) {
        return Ok(accession.to_string());
    }
    if !study.study_uid.is_empty() {
        return Ok(study.study_uid.clone());
    }
    Err(Dicom2FhirError::NoStudyIdentifier)
}

/// Serializes the finished study as an ImagingStudy resource
pub fn imaging_study_resource(
    study: &StudyNode,
    config: &ConverterConfig,
    include_instances: bool,
) -> Value {
    let mut identifiers = Vec::new();
    if let Some(accession) = &study.accession_number {
        identifiers.push(json!({
            "use": "usual",
            "type": {
                "coding": [{
                    "system": TERMINOLOGY_CODING_SYS,
                    "code": TERMINOLOGY_CODING_SYS_CODE_ACCESSION,
                }]
            },
            "system": config.imagingstudy_identifier_system,
            "value": accession,
        }));
    }
    identifiers.push(json!({
        "system": DICOM_UID_SYS,
        "value": format!("urn:oid:{}", study.study_uid),
    }));

    let mut obj = Map::new();
    obj.insert("resourceType".to_string(), json!("ImagingStudy"));
    obj.insert("id".to_string(), json!(study.id));
    obj.insert(
        "meta".to_string(),
        json!({ "profile": [IMAGINGSTUDY_META_PROFILE] }),
    );
    obj.insert("status".to_string(), json!("available"));
    obj.insert("identifier".to_string(), Value::Array(identifiers));
    obj.insert(
        "contained".to_string(),
        json!([contained_patient(&study.patient)]),
    );
    obj.insert(
        "subject".to_string(),
        json!({ "reference": format!("#{}", CONTAINED_PATIENT_ID) }),
    );
    set_optional(
        &mut obj,
        "endpoint",
        study
            .endpoint
            .as_ref()
            .map(|e| json!([{ "reference": e }])),
    );
    set_optional(
        &mut obj,
        "description",
        study.description.as_ref().map(|d| json!(d)),
    );
    set_optional(
        &mut obj,
        "started",
        study.started.as_ref().map(|s| json!(s.to_string())),
    );

    let modality: Vec<Value> = study.modalities().iter().map(coding_json).collect();
    if !modality.is_empty() {
        obj.insert("modality".to_string(), Value::Array(modality));
    }
    if !study.procedures.is_empty() {
        obj.insert(
            "procedureCode".to_string(),
            serde_json::to_value(&study.procedures).unwrap_or(Value::Null),
        );
    }
    if !study.reasons.is_empty() {
        obj.insert(
            "reasonCode".to_string(),
            serde_json::to_value(&study.reasons).unwrap_or(Value::Null),
        );
    }
    set_optional(&mut obj, "extension", extensions_json(&study.extensions));

    obj.insert("numberOfSeries".to_string(), json!(study.number_of_series()));
    obj.insert(
        "numberOfInstances".to_string(),
        json!(study.number_of_instances()),
    );
    obj.insert(
        "series".to_string(),
        Value::Array(
            study
                .series()
                .iter()
                .map(|s| series_json(s, include_instances))
                .collect(),
        ),
    );
    Value::Object(obj)
}

/// Serializes one observed device as a Device resource
pub fn device_resource(device: &DeviceRecord, config: &ConverterConfig) -> Value {
    let mut obj = Map::new();
    obj.insert("resourceType".to_string(), json!("Device"));
    obj.insert("id".to_string(), json!(device.id));
    obj.insert(
        "meta".to_string(),
        json!({ "profile": [DEVICE_META_PROFILE] }),
    );
    obj.insert("status".to_string(), json!("active"));
    obj.insert(
        "identifier".to_string(),
        json!([{
            "system": config.device_identifier_system,
            "type": {
                "coding": [{
                    "system": ACQUISITION_MODALITY_SYS,
                    "code": TERMINOLOGY_CODING_SYS_CODE_SERIAL,
                }]
            },
            "value": device.serial,
        }]),
    );
    obj.insert("manufacturer".to_string(), json!(device.manufacturer));
    set_optional(
        &mut obj,
        "deviceName",
        device
            .model
            .as_ref()
            .map(|m| json!([{ "name": m, "type": "model-name" }])),
    );
    Value::Object(obj)
}

/// Wraps resources into a transaction Bundle with PUT entries
///
/// Each resource must already carry `resourceType` and `id`.
pub fn transaction_bundle(bundle_id: &str, resources: Vec<Value>) -> Value {
    let entries: Vec<Value> = resources
        .into_iter()
        .map(|resource| {
            let url = format!(
                "{}/{}",
                resource["resourceType"].as_str().unwrap_or_default(),
                resource["id"].as_str().unwrap_or_default()
            );
            json!({
                "fullUrl": url,
                "resource": resource,
                "request": { "method": "PUT", "url": url },
            })
        })
        .collect();

    json!({
        "resourceType": "Bundle",
        "id": bundle_id,
        "type": "transaction",
        "entry": entries,
    })
}
