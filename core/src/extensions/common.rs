//! Cross-cutting builders that run for every modality

use crate::extensions::{AttributeRule, Context, ExtensionBuilder};
use crate::extraction::InstanceRecord;
use crate::types::{ExtensionValue, Quantity};

pub static DEVICE: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-geraet-hersteller",
    rules: &[
        AttributeRule {
            name: "manufacturer",
            derive: manufacturer,
        },
        AttributeRule {
            name: "manufacturerModelName",
            derive: manufacturer_model_name,
        },
    ],
};

pub static CONTRAST: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-kontrastmittel",
    rules: &[
        AttributeRule {
            name: "contrastBolus",
            derive: contrast_bolus,
        },
        AttributeRule {
            name: "contrastBolusDetails",
            derive: contrast_bolus_details,
        },
    ],
};

pub static SLICE_THICKNESS: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-serie-schichtdicke",
    rules: &[AttributeRule {
        name: "sliceThickness",
        derive: slice_thickness,
    }],
};

fn manufacturer(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record.manufacturer.clone().map(ExtensionValue::Str)
}

fn manufacturer_model_name(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record.manufacturer_model.clone().map(ExtensionValue::Str)
}

fn contrast_bolus(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    Some(ExtensionValue::Boolean(record.contrast_agent.is_some()))
}

fn contrast_bolus_details(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .contrast_agent
        .clone()
        .map(|display| ExtensionValue::Reference { display })
}

fn slice_thickness(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .slice_thickness
        .map(|mm| ExtensionValue::Quantity(Quantity::new(mm, "millimeter")))
}
