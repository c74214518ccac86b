//! Per-file metadata extraction
//!
//! Turns one DICOM data set into a flat [`InstanceRecord`]; all hierarchy
//! building happens downstream in the aggregator.

pub mod reader;
pub mod record;
pub mod tags;

pub use reader::{collect_dicom_files, read_instance};
pub use record::{CodedEntry, InstanceRecord, RadiopharmaceuticalInfo};
