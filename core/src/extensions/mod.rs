//! Modality-specific attribute builders
//!
//! Each builder is a static table of named rules over the extracted record.
//! A rule that cannot derive its value is an attribute-level omission, not
//! an error; a builder whose rules all miss contributes no group at all.

mod common;
mod ct;
mod mg_cr_dx;
mod mr;
mod pt_nm;
mod us;

use log::debug;

use crate::config::ConverterConfig;
use crate::extraction::InstanceRecord;
use crate::terminology::Terminology;
use crate::types::{ExtensionAttribute, ExtensionGroup, ExtensionValue};

pub use pt_nm::{NM_DOSE_DIVISOR, PT_DOSE_DIVISOR};

/// Shared read-only state available to every rule
pub struct Context<'a> {
    pub terminology: &'a Terminology,
    pub config: &'a ConverterConfig,
}

/// One derivable attribute: a wire name plus its derivation function
pub struct AttributeRule {
    pub name: &'static str,
    pub derive: fn(&InstanceRecord, &Context) -> Option<ExtensionValue>,
}

/// A group of rules sharing one extension container URL
pub struct ExtensionBuilder {
    pub url: &'static str,
    pub rules: &'static [AttributeRule],
}

impl ExtensionBuilder {
    /// Runs every rule and collects the derived attributes
    ///
    /// Returns `None` when no rule produced a value, so empty containers
    /// are never attached.
    pub fn build(&self, record: &InstanceRecord, ctx: &Context) -> Option<ExtensionGroup> {
        let attributes: Vec<ExtensionAttribute> = self
            .rules
            .iter()
            .filter_map(|rule| match (rule.derive)(record, ctx) {
                Some(value) => Some(ExtensionAttribute {
                    name: rule.name,
                    value,
                }),
                None => {
                    debug!(
                        "attribute '{}' not derivable for instance {}",
                        rule.name, record.sop_uid
                    );
                    None
                }
            })
            .collect();

        if attributes.is_empty() {
            None
        } else {
            Some(ExtensionGroup {
                url: self.url,
                attributes,
            })
        }
    }
}

fn modality_builder(modality: &str) -> Option<&'static ExtensionBuilder> {
    match modality {
        "MR" => Some(&mr::BUILDER),
        "CT" => Some(&ct::BUILDER),
        "US" => Some(&us::BUILDER),
        "MG" | "CR" | "DX" => Some(&mg_cr_dx::BUILDER),
        "PT" => Some(&pt_nm::PT_BUILDER),
        "NM" => Some(&pt_nm::NM_BUILDER),
        _ => None,
    }
}

/// Derives all series-level extension groups for one record
///
/// The modality-specific builder runs first when the modality is covered;
/// the device, contrast and slice-thickness builders run for every record.
pub fn series_extensions(record: &InstanceRecord, ctx: &Context) -> Vec<ExtensionGroup> {
    let mut groups = Vec::new();
    if let Some(builder) = modality_builder(&record.modality) {
        groups.extend(builder.build(record, ctx));
    }
    groups.extend(common::DEVICE.build(record, ctx));
    groups.extend(common::CONTRAST.build(record, ctx));
    groups.extend(common::SLICE_THICKNESS.build(record, ctx));
    groups
}
