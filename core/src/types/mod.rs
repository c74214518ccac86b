//! Core type definitions for the imaging-study hierarchy
//!
//! This module provides the fundamental types used throughout the converter:
//! - [`Coding`], [`CodeableConcept`], [`Quantity`]: terminology value types
//! - [`ExtensionValue`], [`ExtensionGroup`]: structured attribute containers
//! - [`StudyNode`], [`SeriesNode`], [`InstanceNode`]: the aggregated hierarchy
//! - [`DeviceRecord`]: distinct acquisition devices observed during aggregation

mod coding;
mod device;
mod hierarchy;

pub use coding::{
    CodeableConcept, Coding, ExtensionAttribute, ExtensionGroup, ExtensionValue, Quantity,
    ACQUISITION_MODALITY_SYS, DICOM_UID_SYS, SCANNING_SEQUENCE_SYS, SERIES_TYPE_SYS, SNOMED_SYS,
    SOP_CLASS_SYS, TERMINOLOGY_CODING_SYS, TERMINOLOGY_CODING_SYS_CODE_ACCESSION,
    TERMINOLOGY_CODING_SYS_CODE_MRN, TERMINOLOGY_CODING_SYS_CODE_SERIAL, TRANSDUCER_TYPE_SYS,
    UCUM_SYS,
};
pub use device::DeviceRecord;
pub use hierarchy::{InstanceNode, PatientInfo, SeriesNode, StudyNode};
