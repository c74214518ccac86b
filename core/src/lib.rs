//! DICOM to FHIR ImagingStudy conversion
//!
//! Aggregates a directory of DICOM files belonging to one study into a
//! study/series/instance hierarchy and serializes it as FHIR R4B resources
//! (ImagingStudy, Device, transaction Bundle).
//!
//! The pipeline has three stages:
//! 1. [`extraction`]: read each file and flatten it into an [`InstanceRecord`]
//! 2. [`aggregate`]: fold records into a [`StudyNode`] hierarchy, attaching
//!    modality-specific extension groups and collecting distinct devices
//! 3. [`fhir`]: serialize the finished hierarchy to JSON resources

pub mod aggregate;
pub mod config;
pub mod datetime;
pub mod error;
pub mod extensions;
pub mod extraction;
pub mod fhir;
pub mod identity;
pub mod terminology;
pub mod types;

pub use aggregate::{AggregationOutput, StudyAggregator};
pub use config::ConverterConfig;
pub use error::{Dicom2FhirError, Result};
pub use extraction::{collect_dicom_files, read_instance, InstanceRecord};
pub use terminology::Terminology;
pub use types::{DeviceRecord, InstanceNode, SeriesNode, StudyNode};
