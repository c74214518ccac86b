use crate::identity;

/// A distinct acquisition device observed while aggregating a study
///
/// Produced once per distinct (manufacturer, model, serial) triple. The id
/// is a deterministic hash of serial number and manufacturer, so repeated
/// runs over the same study yield the same device identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    pub manufacturer: String,
    pub model: Option<String>,
    pub serial: String,
    pub id: String,
}

impl DeviceRecord {
    pub fn new(manufacturer: String, model: Option<String>, serial: String) -> Self {
        let id = identity::device_id(&serial, &manufacturer);
        Self {
            manufacturer,
            model,
            serial,
            id,
        }
    }

    /// De-duplication identity within one aggregation
    pub fn key(&self) -> (&str, Option<&str>, &str) {
        (
            self.manufacturer.as_str(),
            self.model.as_deref(),
            self.serial.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_deterministic() {
        let a = DeviceRecord::new("Siemens".into(), Some("Biograph".into()), "SN-1".into());
        let b = DeviceRecord::new("Siemens".into(), Some("Biograph".into()), "SN-1".into());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_device_id_changes_with_serial() {
        let a = DeviceRecord::new("Siemens".into(), None, "SN-1".into());
        let b = DeviceRecord::new("Siemens".into(), None, "SN-2".into());
        assert_ne!(a.id, b.id);
        assert_ne!(a.key(), b.key());
    }
}
