use std::path::{Path, PathBuf};

use dicom_object::OpenFileOptions;
use log::debug;

use crate::error::Result;
use crate::extraction::record::InstanceRecord;
use crate::extraction::tags::PIXEL_DATA;

/// Reads one DICOM file into an [`InstanceRecord`]
///
/// Parsing stops at the pixel data element: only metadata is needed, so
/// bulk image bytes are never loaded.
pub fn read_instance(path: &Path) -> Result<InstanceRecord> {
    debug!("Reading DICOM metadata from {}", path.display());
    let dcm = OpenFileOptions::new()
        .read_until(PIXEL_DATA)
        .open_file(path)?;
    InstanceRecord::from_object(&dcm)
}

/// Recursively collects DICOM file paths under a directory
///
/// Accepts `.dcm`/`.dicom` extensions (case-insensitive); extensionless
/// files are probed for the DICM magic. Results are sorted so processing
/// order does not depend on directory iteration order.
pub fn collect_dicom_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_into(directory, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_into(directory: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_into(&path, files)?;
        } else if path.is_file() {
            if let Some(ext) = path.extension() {
                if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                    files.push(path);
                }
            } else if is_dicom_file(&path) {
                debug!("Found headerless DICOM file: {}", path.display());
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Checks for the 128-byte preamble followed by the "DICM" magic string
fn is_dicom_file(path: &Path) -> bool {
    use std::fs::File;
    use std::io::Read;

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read(&mut buffer) {
        Ok(n) if n >= 132 => &buffer[128..132] == b"DICM",
        _ => false,
    }
}
