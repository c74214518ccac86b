use std::collections::HashMap;

/// A resolved standard code with its human-readable display text
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub code: String,
    pub display: String,
}

/// One source row of a mapping table before indexing
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    /// Local/short-form identifier (e.g. "Body Part Examined", ACR
    /// equivalent, "DICOM Value")
    pub short: Option<String>,
    /// Canonical long-form identifier (e.g. "SNOMED-RT ID")
    pub long: Option<String>,
    /// Human-readable display text ("Code Meaning")
    pub display: String,
    /// Standard code ("Code Value")
    pub code: String,
}

/// An immutable code-mapping table with a fixed-priority match chain
///
/// Lookup indexes are built once from the source rows; keys are normalized
/// (trim + uppercase) at build and at lookup, so resolution is a handful of
/// hash probes rather than repeated column scans.
#[derive(Debug)]
pub struct MappingTable {
    name: &'static str,
    concepts: Vec<Concept>,
    by_short: HashMap<String, usize>,
    by_long: HashMap<String, usize>,
    by_display: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase()
}

impl MappingTable {
    pub fn from_rows(name: &'static str, rows: Vec<TableRow>) -> Self {
        let mut table = Self {
            name,
            concepts: Vec::with_capacity(rows.len()),
            by_short: HashMap::new(),
            by_long: HashMap::new(),
            by_display: HashMap::new(),
            by_code: HashMap::new(),
        };
        for row in rows {
            let idx = table.concepts.len();
            if let Some(short) = &row.short {
                table.by_short.entry(normalize(short)).or_insert(idx);
            }
            if let Some(long) = &row.long {
                table.by_long.entry(normalize(long)).or_insert(idx);
            }
            table.by_display.entry(normalize(&row.display)).or_insert(idx);
            table.by_code.entry(normalize(&row.code)).or_insert(idx);
            table.concepts.push(Concept {
                code: row.code,
                display: row.display,
            });
        }
        table
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Resolves a raw source code against the match chain
    ///
    /// Priority order, first hit wins:
    /// 1. local/short-form identifier column
    /// 2. canonical long-form identifier column
    /// 3. display-text column
    /// 4. standard-code column (idempotent pass-through)
    ///
    /// Returns `None` when no column matches; never an error.
    pub fn resolve(&self, candidate: &str) -> Option<&Concept> {
        let key = normalize(candidate);
        if key.is_empty() {
            return None;
        }
        self.by_short
            .get(&key)
            .or_else(|| self.by_long.get(&key))
            .or_else(|| self.by_display.get(&key))
            .or_else(|| self.by_code.get(&key))
            .map(|&idx| &self.concepts[idx])
    }
}

/// A secondary abbreviation table: short form → display text
///
/// Consulted only when a primary table's match chain fails; the expansion
/// is then re-resolved against the primary table.
#[derive(Debug)]
pub struct AbbreviationTable {
    expansions: HashMap<String, String>,
}

impl AbbreviationTable {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            expansions: pairs
                .into_iter()
                .map(|(abbrev, meaning)| (normalize(&abbrev), meaning))
                .collect(),
        }
    }

    pub fn expand(&self, abbrev: &str) -> Option<&str> {
        self.expansions.get(&normalize(abbrev)).map(String::as_str)
    }
}
