//! CT acquisition parameters

use crate::extensions::{AttributeRule, Context, ExtensionBuilder};
use crate::extraction::InstanceRecord;
use crate::types::{ExtensionValue, Quantity};

pub static BUILDER: ExtensionBuilder = ExtensionBuilder {
    url: "https://www.medizininformatik-initiative.de/fhir/ext/modul-bildgebung/StructureDefinition/mii-ex-bildgebung-modalitaet-ct",
    rules: &[
        AttributeRule {
            name: "CTDIvol",
            derive: ctdi_vol,
        },
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
            name: "convolutionalKernel",
            derive: convolution_kernel,
        },
    ],
};

fn ctdi_vol(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record
        .ctdi_vol
        .map(|v| ExtensionValue::Quantity(Quantity::new(v, "milligray")))
}

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

fn convolution_kernel(record: &InstanceRecord, _ctx: &Context) -> Option<ExtensionValue> {
    record.convolution_kernel.clone().map(ExtensionValue::Str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::extensions::test_support::*;
    use crate::extraction::tags::{CONVOLUTION_KERNEL, CTDI_VOL, EXPOSURE, KVP as KVP_TAG};
    use crate::terminology::Terminology;
    use dicom_core::VR;

    #[test]
    fn test_ct_builder_collects_present_parameters() {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };

        let mut dcm = minimal_object("CT");
        put_str(&mut dcm, CTDI_VOL, VR::DS, "4.2");
        put_str(&mut dcm, KVP_TAG, VR::DS, "120");
        put_str(&mut dcm, EXPOSURE, VR::IS, "200");
        put_str(&mut dcm, CONVOLUTION_KERNEL, VR::SH, "B30f");
        let group = BUILDER.build(&record_from(&dcm), &ctx).unwrap();

        assert_eq!(group.attributes.len(), 4);
        assert_eq!(
            group.attributes[0].value,
            ExtensionValue::Quantity(Quantity::new(4.2, "milligray"))
        );
        assert!(group
            .attributes
            .iter()
            .any(|a| a.name == "convolutionalKernel"
                && a.value == ExtensionValue::Str("B30f".to_string())));
    }

    #[test]
    fn test_ct_builder_empty_record_is_none() {
        let terminology = Terminology::load().unwrap();
        let config = ConverterConfig::default();
        let ctx = Context {
            terminology: &terminology,
            config: &config,
        };
        assert!(BUILDER
            .build(&record_from(&minimal_object("CT")), &ctx)
            .is_none());
    }
}
