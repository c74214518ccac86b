//! US acquisition parameters

use crate::extensions::{AttributeRule, Context, ExtensionBuilder};
use crate::extraction::InstanceRecord;
use crate::types::{CodeableConcept, Coding, ExtensionValue, Quantity, TRANSDUCER_TYPE_SYS};

pub static BUILDER: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-modalitaet-us",
    rules: &[
        AttributeRule {
            name: "transducerType",
            derive: transducer_type,
        },
        AttributeRule {
            name: "transducerFrequency",
            derive: transducer_frequency,
        },
        AttributeRule {
            name: "pulseRepetitionFrequency",
            derive: pulse_repetition_frequency,
        },
        AttributeRule {
            name: "ultrasoundColor",
            derive: ultrasound_color,
        },
    ],
};

fn transducer_type(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    let raw = record.transducer_type.as_deref()?;
    // the code system uses underscores where the source value has spaces
    let code = raw.split_whitespace().collect::<Vec<_>>().join("_");
    if code.is_empty() {
        return None;
    }
    Some(ExtensionValue::Concept(CodeableConcept::from_coding(
        Coding::new(code, TRANSDUCER_TYPE_SYS),
    )))
}

fn transducer_frequency(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .transducer_frequency
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "kilohertz")))
}

fn pulse_repetition_frequency(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .pulse_repetition_frequency
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "hertz")))
}

fn ultrasound_color(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .ultrasound_color_data_present
        .map(|flag| ExtensionValue::Boolean(flag == 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::extensions::test_support::*;
    use crate::extraction::tags::{TRANSDUCER_TYPE, ULTRASOUND_COLOR_DATA_PRESENT};
    use crate::terminology::Terminology;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    #[test]
    fn test_transducer_type_whitespace_normalization() {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };

        let mut dcm = minimal_object("US");
        put_str(&mut dcm, TRANSDUCER_TYPE, VR::CS, "CURVED LINEAR");
        let group = BUILDER.build(&record_from(&dcm), &ctx).unwrap();
        match &group.attributes[0].value {
            ExtensionValue::Concept(concept) => {
                assert_eq!(concept.coding[0].code, "CURVED_LINEAR");
                assert_eq!(concept.coding[0].system.as_deref(), Some(TRANSDUCER_TYPE_SYS));
            }
            other => panic!("expected concept, got {:?}", other),
        }
    }

    #[test]
    fn test_ultrasound_color_flag() {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };

        // "01" and "1" and 1 all normalize to integer 1 in extraction
        let mut dcm = minimal_object("US");
        dcm.put(DataElement::new(
            ULTRASOUND_COLOR_DATA_PRESENT,
            VR::US,
            PrimitiveValue::from(1_u16),
        ));
        let group = BUILDER.build(&record_from(&dcm), &ctx).unwrap();
        assert_eq!(group.attributes[0].value, ExtensionValue::Boolean(true));

        let mut dcm = minimal_object("US");
        dcm.put(DataElement::new(
            ULTRASOUND_COLOR_DATA_PRESENT,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));
        let group = BUILDER.build(&record_from(&dcm), &ctx).unwrap();
        assert_eq!(group.attributes[0].value, ExtensionValue::Boolean(false));
    }
}
