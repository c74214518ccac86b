//! PT / NM acquisition parameters
//!
//! PT and NM share most rule functions but keep independent dose scaling:
//! PT doses arrive in Becquerels and are converted to MBq, NM doses are
//! already recorded as MBq-scale values and pass through unscaled. The two
//! constants are intentionally separate.

use crate::datetime::tm_to_seconds;
use crate::extensions::{AttributeRule, Context, ExtensionBuilder};
use crate::extraction::InstanceRecord;
use crate::terminology::Concept;
use crate::types::{
    CodeableConcept, Coding, ExtensionValue, Quantity, SERIES_TYPE_SYS, SNOMED_SYS, UCUM_SYS,
};

pub const PT_DOSE_DIVISOR: f64 = 1_000_000.0;
pub const NM_DOSE_DIVISOR: f64 = 1.0;

pub static PT_BUILDER: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-modalitaet-pt",
    rules: &[
        AttributeRule {
            name: "units",
            derive: units,
        },
        AttributeRule {
            name: "tracerExposureTime",
            derive: tracer_exposure_time,
        },
        AttributeRule {
            name: "radiopharmaceutical",
            derive: radiopharmaceutical_pt,
        },
        AttributeRule {
            name: "radionuclide",
            derive: radionuclide_pt,
        },
        AttributeRule {
            name: "radionuclideTotalDose",
            derive: radionuclide_total_dose_pt,
        },
        AttributeRule {
            name: "radionuclideHalfLife",
            derive: radionuclide_half_life,
        },
        AttributeRule {
            name: "seriesType",
            derive: series_type,
        },
    ],
};

pub static NM_BUILDER: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-modalitaet-nm",
    rules: &[
        AttributeRule {
            name: "units",
            derive: units,
        },
        AttributeRule {
            name: "tracerExposureTime",
            derive: tracer_exposure_time,
        },
        AttributeRule {
            name: "radiopharmaceutical",
            derive: radiopharmaceutical_nm,
        },
        AttributeRule {
            name: "radionuclide",
            derive: radionuclide_nm,
        },
        AttributeRule {
            name: "radionuclideTotalDose",
            derive: radionuclide_total_dose_nm,
        },
        AttributeRule {
            name: "radionuclideHalfLife",
            derive: radionuclide_half_life,
        },
    ],
};

fn snomed_concept(concept: &Concept, raw: &str) -> ExtensionValue {
    ExtensionValue::Concept(
        CodeableConcept::from_coding(
            Coding::new(concept.code.as_str(), SNOMED_SYS).with_display(concept.display.as_str()),
        )
        .with_text(raw),
    )
}

fn units(record: &InstanceRecord, ctx: &Context) -> Option<ExtensionValue> {
    let raw = record.units.as_deref()?;
    let concept = ctx.terminology.units.resolve(raw)?;
    Some(ExtensionValue::Concept(CodeableConcept::from_coding(
        Coding::new(concept.code.as_str(), UCUM_SYS).with_display(concept.display.as_str()),
    )))
}

/// Absolute difference between acquisition time and radiopharmaceutical
/// start time, in seconds
fn tracer_exposure_time(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    let info = record.radiopharmaceutical_info.as_ref()?;
    let acquisition = tm_to_seconds(record.acquisition_time.as_deref()?)?;
    let start = tm_to_seconds(info.start_time.as_deref()?)?;
    Some(ExtensionValue::Quantity(Quantity::new(
        (acquisition - start).abs(),
        "seconds",
    )))
}

/// PT identifies the radiopharmaceutical by its code-sequence code value
fn radiopharmaceutical_pt(record: &InstanceRecord, ctx: &Context) -> Option<ExtensionValue> {
    let info = record.radiopharmaceutical_info.as_ref()?;
    let entry = info.radiopharmaceutical_code.as_ref()?;
    let raw = entry.code.as_deref()?;
    let concept = ctx.terminology.radiopharmaceutical_pt.resolve(raw)?;
    Some(snomed_concept(
        concept,
        entry.meaning.as_deref().unwrap_or(raw),
    ))
}

/// NM identifies the radiopharmaceutical by the free-text agent name
fn radiopharmaceutical_nm(record: &InstanceRecord, ctx: &Context) -> Option<ExtensionValue> {
    let info = record.radiopharmaceutical_info.as_ref()?;
    let raw = info.radiopharmaceutical.as_deref()?;
    let concept = ctx.terminology.radiopharmaceutical_nm.resolve(raw)?;
    Some(snomed_concept(concept, raw))
}

fn radionuclide_pt(record: &InstanceRecord, ctx: &Context) -> Option<ExtensionValue> {
    let info = record.radiopharmaceutical_info.as_ref()?;
    let entry = info.radionuclide.as_ref()?;
    let raw = entry.code.as_deref()?;
    let concept = ctx.terminology.radionuclide_pt.resolve(raw)?;
    Some(snomed_concept(
        concept,
        entry.meaning.as_deref().unwrap_or(raw),
    ))
}

/// NM resolves the radionuclide by code meaning, retrying the SNOMED-RT
/// caret form before giving up
fn radionuclide_nm(record: &InstanceRecord, ctx: &Context) -> Option<ExtensionValue> {
    let info = record.radiopharmaceutical_info.as_ref()?;
    let entry = info.radionuclide.as_ref()?;
    let raw = entry.meaning.as_deref()?;
    let concept = ctx.terminology.resolve_radionuclide_nm(raw)?;
    Some(snomed_concept(concept, raw))
}

fn radionuclide_total_dose(record: &InstanceRecord, divisor: f64) -> Option<ExtensionValue> {
    let dose = record.radiopharmaceutical_info.as_ref()?.total_dose?;
    Some(ExtensionValue::Quantity(Quantity::new(
        dose / divisor,
        "Megabecquerel",
    )))
}

fn radionuclide_total_dose_pt(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    radionuclide_total_dose(record, PT_DOSE_DIVISOR)
}

fn radionuclide_total_dose_nm(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    radionuclide_total_dose(record, NM_DOSE_DIVISOR)
}

fn radionuclide_half_life(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    let half_life = record.radiopharmaceutical_info.as_ref()?.half_life?;
    Some(ExtensionValue::Quantity(Quantity::new(
        half_life, "Seconds",
    )))
}

fn series_type(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    let values = record.series_type.as_ref()?;
    if values.is_empty() {
        return None;
    }
    Some(ExtensionValue::Concept(CodeableConcept::from_codes(
        values.iter().map(String::as_str),
        SERIES_TYPE_SYS,
    )))
}
