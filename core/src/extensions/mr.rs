//! MR acquisition parameters

use crate::extensions::{AttributeRule, Context, ExtensionBuilder};
use crate::extraction::InstanceRecord;
use crate::types::{CodeableConcept, Coding, ExtensionValue, Quantity, SCANNING_SEQUENCE_SYS};

pub static BUILDER: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-modalitaet-mr",
    rules: &[
        AttributeRule {
            name: "scanningSequence",
            derive: scanning_sequence,
        },
        AttributeRule {
            name: "scanningSequenceVariant",
            derive: scanning_sequence_variant,
        },
        AttributeRule {
            name: "magneticFieldStrength",
            derive: magnetic_field_strength,
        },
        AttributeRule {
            name: "echoTime",
            derive: echo_time,
        },
    ],
};

fn scanning_sequence(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    let codes = record.scanning_sequence.as_ref()?;
    if codes.is_empty() {
        return None;
    }
    Some(ExtensionValue::Concept(CodeableConcept::from_codes(
        codes.iter().map(String::as_str),
        SCANNING_SEQUENCE_SYS,
    )))
}

fn scanning_sequence_variant(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    let variants = record.sequence_variant.as_ref()?;
    if variants.is_empty() {
        return None;
    }
    // sequence variants have no published code system; keep the raw codes
    Some(ExtensionValue::Concept(CodeableConcept {
        coding: variants.iter().map(|v| Coding::text_only(v.as_str())).collect(),
        text: None,
    }))
}

fn magnetic_field_strength(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .magnetic_field_strength
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "tesla")))
}

fn echo_time(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .echo_time
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "milliseconds")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::extensions::test_support::*;
    use crate::extraction::tags::{
        ECHO_TIME, MAGNETIC_FIELD_STRENGTH, SCANNING_SEQUENCE, SEQUENCE_VARIANT,
    };
    use crate::terminology::Terminology;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    #[test]
    fn test_mr_builder() {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };

        let mut dcm = minimal_object("MR");
        dcm.put(DataElement::new(
            SCANNING_SEQUENCE,
            VR::CS,
            PrimitiveValue::Strs(vec!["SE".to_string(), "IR".to_string()].into()),
        ));
        put_str(&mut dcm, SEQUENCE_VARIANT, VR::CS, "SK");
        put_str(&mut dcm, MAGNETIC_FIELD_STRENGTH, VR::DS, "3");
        put_str(&mut dcm, ECHO_TIME, VR::DS, "12.5");
        let group = BUILDER.build(&record_from(&dcm), &ctx).unwrap();

        assert_eq!(group.attributes.len(), 4);
        match &group.attributes[0].value {
            ExtensionValue::Concept(concept) => {
                let codes: Vec<&str> = concept.coding.iter().map(|c| c.code.as_str()).collect();
                assert_eq!(codes, vec!["SE", "IR"]);
                assert_eq!(concept.coding[0].system.as_deref(), Some(SCANNING_SEQUENCE_SYS));
            }
            other => panic!("expected concept, got {:?}", other),
        }
        assert!(group
            .attributes
            .iter()
            .any(|a| a.name == "magneticFieldStrength"
                && a.value == ExtensionValue::Quantity(Quantity::new(3.0, "tesla"))));
    }

    #[test]
    fn test_variant_codings_are_user_selected_raw_codes() {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };

        let mut dcm = minimal_object("MR");
        put_str(&mut dcm, SEQUENCE_VARIANT, VR::CS, "SP");
        let group = BUILDER.build(&record_from(&dcm), &ctx).unwrap();
        match &group.attributes[0].value {
            ExtensionValue::Concept(concept) => {
                assert!(concept.coding[0].system.is_none());
                assert_eq!(concept.coding[0].code, "SP");
            }
            other => panic!("expected concept, got {:?}", other),
        }
    }
}
