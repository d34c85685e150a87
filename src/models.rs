use serde::{Deserialize, Serialize};

/// A tracked product. The expiry date is carried in its persisted
/// `DD/MM/YYYY` form and only parsed into a calendar date for computation.
///
/// Serde names follow the backup file contract (`photoRef`,
/// `notificationRef`, camelCase elsewhere).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub expiry_date: String, // DD/MM/YYYY
    #[serde(default, rename = "photoRef")]
    pub photo_path: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub archived: bool,
    /// Opaque handle of the live scheduled reminder, if any.
    #[serde(default, rename = "notificationRef")]
    pub notification_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_quantity() -> i64 {
    1
}

impl Product {
    pub fn new(name: String, expiry_date: String) -> Self {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            id: None,
            name,
            barcode: None,
            description: None,
            expiry_date,
            photo_path: None,
            quantity: 1,
            archived: false,
            notification_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Reminder settings. Persisted as the single `settings` row; when no row
/// exists yet the defaults below apply (warn 3 days ahead, at 09:00).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_lead_days")]
    pub lead_days: i64,
    #[serde(default = "default_alert_hour")]
    pub alert_hour: u32,
    #[serde(default = "default_alert_minute")]
    pub alert_minute: u32,
}

fn default_lead_days() -> i64 {
    3
}

fn default_alert_hour() -> u32 {
    9
}

fn default_alert_minute() -> u32 {
    0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lead_days: default_lead_days(),
            alert_hour: default_alert_hour(),
            alert_minute: default_alert_minute(),
        }
    }
}

/// A queued reminder. The stringified row id is the opaque handle stored on
/// the product it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    pub fire_at: String, // YYYY-MM-DD HH:MM:SS, local time
    pub delivered: bool,
}
