use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::expiry;
use crate::models::{Product, Settings};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Failed to read backup file: {0}")]
    ReadError(String),
    #[error("Failed to write backup file: {0}")]
    WriteError(String),
    #[error("Not a valid backup file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid backup: {0}")]
    Invalid(String),
}

/// The backup document: every record plus the configuration row.
///
/// A payload without a `configuration` field is accepted; import then
/// falls back to the default settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub records: Vec<Product>,
    #[serde(default)]
    pub configuration: Vec<Settings>,
}

impl Backup {
    /// The configuration carried by the payload, or the documented default
    /// when the payload has none
    pub fn settings(&self) -> Settings {
        self.configuration.first().cloned().unwrap_or_default()
    }

    /// Structural validation, run in full before any import writes so a
    /// bad payload can never leave the store partially overwritten.
    pub fn validate(&self) -> Result<(), BackupError> {
        for (index, record) in self.records.iter().enumerate() {
            let position = index + 1;
            if record.name.trim().is_empty() {
                return Err(BackupError::Invalid(format!(
                    "record {position} has no name"
                )));
            }
            if expiry::parse_expiry(&record.expiry_date).is_none() {
                return Err(BackupError::Invalid(format!(
                    "record {position} ('{}') has an unreadable expiry date '{}'",
                    record.name, record.expiry_date
                )));
            }
            if record.quantity < 1 {
                return Err(BackupError::Invalid(format!(
                    "record {position} ('{}') has quantity {}",
                    record.name, record.quantity
                )));
            }
        }
        Ok(())
    }
}

/// Parse and validate a backup file
pub fn read_backup(path: &Path) -> Result<Backup, BackupError> {
    let contents =
        fs::read_to_string(path).map_err(|e| BackupError::ReadError(e.to_string()))?;
    let backup: Backup = serde_json::from_str(&contents)?;
    backup.validate()?;
    Ok(backup)
}

pub fn to_json(backup: &Backup) -> Result<String, BackupError> {
    Ok(serde_json::to_string_pretty(backup)?)
}

pub fn write_backup(path: &Path, backup: &Backup) -> Result<(), BackupError> {
    let json = to_json(backup)?;
    fs::write(path, json).map_err(|e| BackupError::WriteError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, expiry: &str) -> Product {
        Product::new(name.to_string(), expiry.to_string())
    }

    #[test]
    fn payload_uses_the_contract_field_names() {
        let mut product = record("Milk", "10/03/2026");
        product.photo_path = Some("/photos/milk.jpg".to_string());
        product.notification_id = Some("7".to_string());
        let backup = Backup {
            records: vec![product],
            configuration: vec![Settings::default()],
        };

        let json = to_json(&backup).unwrap();
        assert!(json.contains("\"records\""));
        assert!(json.contains("\"configuration\""));
        assert!(json.contains("\"expiryDate\""));
        assert!(json.contains("\"photoRef\""));
        assert!(json.contains("\"notificationRef\""));
        assert!(json.contains("\"leadDays\""));
        assert!(!json.contains("\"photo_path\""));
    }

    #[test]
    fn payload_without_configuration_parses_and_defaults() {
        let json = r#"{
            "records": [
                { "name": "Milk", "expiryDate": "10/03/2026" }
            ]
        }"#;
        let backup: Backup = serde_json::from_str(json).unwrap();
        assert!(backup.configuration.is_empty());
        assert_eq!(backup.settings(), Settings::default());
        assert_eq!(backup.records[0].quantity, 1);
        assert!(backup.validate().is_ok());
    }

    #[test]
    fn roundtrip_preserves_records() {
        let mut product = record("Milk", "10/03/2026");
        product.barcode = Some("789".to_string());
        product.quantity = 3;
        let backup = Backup {
            records: vec![product.clone()],
            configuration: vec![Settings::default()],
        };

        let parsed: Backup = serde_json::from_str(&to_json(&backup).unwrap()).unwrap();
        assert_eq!(parsed.records, vec![product]);
    }

    #[test]
    fn validate_rejects_empty_names() {
        let backup = Backup {
            records: vec![record("   ", "10/03/2026")],
            configuration: vec![],
        };
        assert!(matches!(backup.validate(), Err(BackupError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_unreadable_expiry_dates() {
        let backup = Backup {
            records: vec![record("Milk", "2026-03-10")],
            configuration: vec![],
        };
        assert!(matches!(backup.validate(), Err(BackupError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_nonpositive_quantities() {
        let mut bad = record("Milk", "10/03/2026");
        bad.quantity = 0;
        let backup = Backup {
            records: vec![bad],
            configuration: vec![],
        };
        assert!(matches!(backup.validate(), Err(BackupError::Invalid(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result: Result<Backup, _> = serde_json::from_str("{\"records\": 1}");
        assert!(result.is_err());
    }
}
