//! MG / CR / DX acquisition parameters (shared builder)

use crate::extensions::{AttributeRule, Context, ExtensionBuilder};
use crate::extraction::InstanceRecord;
use crate::types::{CodeableConcept, Coding, ExtensionValue, Quantity, SNOMED_SYS};

pub static BUILDER: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-modalitaet-mg-cr-dx",
    rules: &[
        AttributeRule {
            name: "KVP",
            derive: kvp,
        },
        AttributeRule {
            name: "exposureTime",
            derive: exposure_time,
        },
        AttributeRule {
            name: "exposure",
            derive: exposure,
        },
        AttributeRule {
            name: "xRayTubeCurrent",
            derive: x_ray_tube_current,
        },
        AttributeRule {
            name: "viewPosition",
            derive: view_position,
        },
    ],
};

fn kvp(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .kvp
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "kilovolt")))
}

fn exposure_time(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .exposure_time
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "milliseconds")))
}

fn exposure(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .exposure
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "milliampere second")))
}

fn x_ray_tube_current(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .x_ray_tube_current
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "milliampere")))
}

/// View position resolves against the MG table for MG and the DX table
/// (with the ACR abbreviation fallback) for DX; CR carries no mapping
fn view_position(record: &InstanceRecord, ctx: &Context) -> Option<ExtensionValue> {
    let raw = record.view_position.as_deref()?;
    let concept = match record.modality.as_str() {
        "MG" => ctx.terminology.view_position_mg.resolve(raw),
        "DX" => ctx.terminology.resolve_view_position_dx(raw),
        _ => None,
    }?;
    Some(ExtensionValue::Concept(
        CodeableConcept::from_coding(
            Coding::new(concept.code.as_str(), SNOMED_SYS).with_display(concept.display.as_str()),
        )
        .with_text(raw),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::extensions::test_support::*;
    use crate::extraction::tags::{KVP as KVP_TAG, VIEW_POSITION};
    use crate::terminology::Terminology;
    use dicom_core::VR;
    use rstest::rstest;

    fn build(modality: &str, view: &str) -> Option<ExtensionValue> {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };
        let mut dcm = minimal_object(modality);
        put_str(&mut dcm, VIEW_POSITION, VR::CS, view);
        BUILDER
            .build(&record_from(&dcm), &ctx)
            .and_then(|group| {
                group
                    .attributes
                    .into_iter()
                    .find(|a| a.name == "viewPosition")
                    .map(|a| a.value)
            })
    }

    #[rstest]
    #[case("MG", "MLO", "399368009")]
    #[case("MG", "CC", "399162004")]
    #[case("DX", "AP", "399348003")] // abbreviation fallback
    fn test_view_position_resolution(
        #[case] modality: &str,
        #[case] view: &str,
        #[case] expected_code: &str,
    ) {
        match build(modality, view).unwrap() {
            ExtensionValue::Concept(concept) => {
                assert_eq!(concept.coding[0].code, expected_code);
                assert_eq!(concept.text.as_deref(), Some(view));
            }
            other => panic!("expected concept, got {:?}", other),
        }
    }

    #[test]
    fn test_cr_view_position_not_mapped() {
        assert!(build("CR", "MLO").is_none());
    }

    #[test]
    fn test_kvp_quantity() {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };
        let mut dcm = minimal_object("MG");
        put_str(&mut dcm, KVP_TAG, VR::DS, "28");
        let group = BUILDER.build(&record_from(&dcm), &ctx).unwrap();
        assert_eq!(
            group.attributes[0].value,
            ExtensionValue::Quantity(Quantity::new(28.0, "kilovolt"))
        );
    }
}
