//! Static code-mapping tables and the resolution chain
//!
//! Tables are embedded at compile time from `resources/terminologies/` and
//! indexed once at load. They are read-only afterwards and may be shared
//! across concurrent aggregations of different studies.

mod table;

pub use table::{AbbreviationTable, Concept, MappingTable, TableRow};

use crate::error::{Dicom2FhirError, Result};
use serde::Deserialize;

const BODYSITE_JSON: &str = include_str!("../../resources/terminologies/bodysite_SNOMED.json");
const LATERALITY_JSON: &str = include_str!("../../resources/terminologies/laterality.json");
const VIEWPOSITION_MG_JSON: &str =
    include_str!("../../resources/terminologies/viewposition_MG.json");
const VIEWPOSITION_DX_JSON: &str =
    include_str!("../../resources/terminologies/viewposition_DX.json");
const VIEWPOSITION_DX_ABBREVIATIONS_CSV: &str =
    include_str!("../../resources/terminologies/viewposition_DX_abbreviations.csv");
const RADIONUCLIDE_PT_JSON: &str =
    include_str!("../../resources/terminologies/radionuclide_PT.json");
const RADIONUCLIDE_NM_JSON: &str =
    include_str!("../../resources/terminologies/radionuclide_NM.json");
const RADIOPHARMACEUTICAL_PT_JSON: &str =
    include_str!("../../resources/terminologies/radiopharmaceutical_PT.json");
const RADIOPHARMACEUTICAL_NM_JSON: &str =
    include_str!("../../resources/terminologies/radiopharmaceutical_NM.json");
const UNITS_CSV: &str = include_str!("../../resources/terminologies/units.csv");

/// One JSON row as stored in the resource files
///
/// The column names mirror the upstream reference tables; each table uses
/// the subset of columns that exists for its domain.
#[derive(Debug, Deserialize)]
struct RawJsonRow {
    #[serde(rename = "Code Value")]
    code_value: String,
    #[serde(rename = "Code Meaning")]
    code_meaning: String,
    #[serde(rename = "SNOMED-RT ID", default)]
    snomed_rt_id: Option<String>,
    #[serde(rename = "Body Part Examined", default)]
    body_part_examined: Option<String>,
    #[serde(rename = "ACR MQCM 1999 Equivalent", default)]
    acr_equivalent: Option<String>,
    #[serde(rename = "DICOM Value", default)]
    dicom_value: Option<String>,
}

impl From<RawJsonRow> for TableRow {
    fn from(raw: RawJsonRow) -> Self {
        TableRow {
            short: raw
                .body_part_examined
                .or(raw.acr_equivalent)
                .or(raw.dicom_value),
            long: raw.snomed_rt_id,
            display: raw.code_meaning,
            code: raw.code_value,
        }
    }
}

fn load_json_table(name: &'static str, source: &str) -> Result<MappingTable> {
    let rows: Vec<RawJsonRow> =
        serde_json::from_str(source).map_err(|e| Dicom2FhirError::TerminologyLoad {
            table: name,
            reason: e.to_string(),
        })?;
    if rows.is_empty() {
        return Err(Dicom2FhirError::TerminologyLoad {
            table: name,
            reason: "table has no rows".to_string(),
        });
    }
    Ok(MappingTable::from_rows(
        name,
        rows.into_iter().map(TableRow::from).collect(),
    ))
}

fn load_units_table(name: &'static str, source: &str) -> Result<MappingTable> {
    let mut reader = csv::Reader::from_reader(source.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Dicom2FhirError::TerminologyLoad {
            table: name,
            reason: e.to_string(),
        })?;
        match (record.get(0), record.get(1), record.get(2)) {
            (Some(dicom_value), Some(code), Some(display)) => rows.push(TableRow {
                short: Some(dicom_value.to_string()),
                long: None,
                display: display.to_string(),
                code: code.to_string(),
            }),
            _ => {
                return Err(Dicom2FhirError::TerminologyLoad {
                    table: name,
                    reason: format!("malformed row: {:?}", record),
                })
            }
        }
    }
    if rows.is_empty() {
        return Err(Dicom2FhirError::TerminologyLoad {
            table: name,
            reason: "table has no rows".to_string(),
        });
    }
    Ok(MappingTable::from_rows(name, rows))
}

fn load_abbreviation_table(name: &'static str, source: &str) -> Result<AbbreviationTable> {
    let mut reader = csv::Reader::from_reader(source.as_bytes());
    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Dicom2FhirError::TerminologyLoad {
            table: name,
            reason: e.to_string(),
        })?;
        match (record.get(0), record.get(1)) {
            (Some(abbrev), Some(meaning)) => {
                pairs.push((abbrev.trim().to_string(), meaning.trim().to_string()))
            }
            _ => {
                return Err(Dicom2FhirError::TerminologyLoad {
                    table: name,
                    reason: format!("malformed row: {:?}", record),
                })
            }
        }
    }
    Ok(AbbreviationTable::from_pairs(pairs))
}

/// All code-mapping tables used by the attribute builders
#[derive(Debug)]
pub struct Terminology {
    pub body_site: MappingTable,
    pub laterality: MappingTable,
    pub view_position_mg: MappingTable,
    pub view_position_dx: MappingTable,
    view_position_dx_abbreviations: AbbreviationTable,
    pub radionuclide_pt: MappingTable,
    pub radionuclide_nm: MappingTable,
    pub radiopharmaceutical_pt: MappingTable,
    pub radiopharmaceutical_nm: MappingTable,
    pub units: MappingTable,
}

impl Terminology {
    /// Loads and indexes every embedded table
    ///
    /// Fails fast: every resolution depends on the tables being present,
    /// so a malformed resource aborts at startup rather than surfacing as
    /// spurious "no mapping" results later.
    pub fn load() -> Result<Self> {
        Ok(Self {
            body_site: load_json_table("bodysite_SNOMED", BODYSITE_JSON)?,
            laterality: load_json_table("laterality", LATERALITY_JSON)?,
            view_position_mg: load_json_table("viewposition_MG", VIEWPOSITION_MG_JSON)?,
            view_position_dx: load_json_table("viewposition_DX", VIEWPOSITION_DX_JSON)?,
            view_position_dx_abbreviations: load_abbreviation_table(
                "viewposition_DX_abbreviations",
                VIEWPOSITION_DX_ABBREVIATIONS_CSV,
            )?,
            radionuclide_pt: load_json_table("radionuclide_PT", RADIONUCLIDE_PT_JSON)?,
            radionuclide_nm: load_json_table("radionuclide_NM", RADIONUCLIDE_NM_JSON)?,
            radiopharmaceutical_pt: load_json_table(
                "radiopharmaceutical_PT",
                RADIOPHARMACEUTICAL_PT_JSON,
            )?,
            radiopharmaceutical_nm: load_json_table(
                "radiopharmaceutical_NM",
                RADIOPHARMACEUTICAL_NM_JSON,
            )?,
            units: load_units_table("units", UNITS_CSV)?,
        })
    }

    /// Resolves a DX view position, falling back to the ACR abbreviation
    /// table when the primary chain misses
    pub fn resolve_view_position_dx(&self, candidate: &str) -> Option<&Concept> {
        self.view_position_dx.resolve(candidate).or_else(|| {
            self.view_position_dx_abbreviations
                .expand(candidate)
                .and_then(|meaning| self.view_position_dx.resolve(meaning))
        })
    }

    /// Resolves an NM radionuclide, retrying with the SNOMED-RT caret form
    /// (`"Tc 99m"` → `"^Tc^99m"`) when the literal value misses
    pub fn resolve_radionuclide_nm(&self, candidate: &str) -> Option<&Concept> {
        self.radionuclide_nm.resolve(candidate).or_else(|| {
            let caret_form = format!("^{}", candidate.trim().replace(' ', "^"));
            self.radionuclide_nm.resolve(&caret_form)
        })
    }
}
