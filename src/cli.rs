use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::backup::{self, BackupError};
use crate::cloud::CatalogClient;
use crate::database::{Database, DatabaseError, SortOrder};
use crate::expiry::{self, ExpiryStatus};
use crate::models::Product;
use crate::notify::{self, ReminderScheduler};
use crate::utils;

#[derive(Parser)]
#[command(name = "validade")]
#[command(about = "Track perishable product expiry dates from the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a product
    Add {
        /// Product name (prefilled from the barcode history/catalog when omitted)
        name: Option<String>,
        /// Expiry date (DD/MM/YYYY)
        #[arg(long)]
        expiry: Option<String>,
        /// Barcode, for history/catalog prefill and future lookups
        #[arg(long)]
        barcode: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Photo file; moved into the app photo directory on save
        #[arg(long)]
        photo: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
    },
    /// List active products
    List {
        /// Sort by expiry date instead of most recent first
        #[arg(long)]
        by_expiry: bool,
        /// Only show one status: expired, soon or ok
        #[arg(long)]
        status: Option<String>,
    },
    /// List archived products
    Archived,
    /// Edit an existing product
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// New expiry date (DD/MM/YYYY); replaces the scheduled reminder
        #[arg(long)]
        expiry: Option<String>,
        #[arg(long)]
        barcode: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        photo: Option<PathBuf>,
        #[arg(long)]
        quantity: Option<i64>,
    },
    /// Move products off the active list (soft delete)
    Archive {
        ids: Vec<i64>,
    },
    /// Bring an archived product back
    Restore {
        id: i64,
    },
    /// Permanently delete a product
    Delete {
        id: i64,
    },
    /// Print a shareable report of expired products
    Expired {
        /// Archive the listed products afterwards
        #[arg(long)]
        archive: bool,
    },
    /// Look a barcode up in the local history and the shared catalog
    Scan {
        barcode: String,
    },
    /// Write a JSON backup (stdout when no path is given)
    Export {
        path: Option<PathBuf>,
    },
    /// Replace all data with the contents of a JSON backup
    Import {
        path: PathBuf,
    },
    /// Print due reminders and mark them delivered
    Remind,
    /// Show or change reminder settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings
    Show,
    /// Change settings
    Set {
        /// Days before expiry to start warning
        #[arg(long)]
        lead_days: Option<i64>,
        /// Time of day reminders fire (HH:MM)
        #[arg(long)]
        alert: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Backup error: {0}")]
    BackupError(#[from] BackupError),
    #[error("Failed to store photo: {0}")]
    PhotoError(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
}

fn validate_expiry(value: &str) -> Result<(), CliError> {
    if expiry::parse_expiry(value).is_none() {
        return Err(CliError::Validation(format!(
            "'{}' is not a valid DD/MM/YYYY date",
            value
        )));
    }
    Ok(())
}

fn format_line(product: &Product, status: ExpiryStatus) -> String {
    let mut line = format!(
        "{:>4}  [{:<7}]  {}",
        product.id.unwrap_or_default(),
        status.tag(),
        product.name
    );
    if product.quantity > 1 {
        line.push_str(&format!("  x{}", product.quantity));
    }
    line.push_str(&format!("  expires {}", product.expiry_date));
    if let Some(barcode) = &product.barcode {
        line.push_str(&format!("  [{}]", barcode));
    }
    line
}

/// Handle the add command: prefill from the barcode history and the shared
/// catalog, store the photo, schedule the reminder, insert, contribute.
/// Validation failures abort before anything is written.
#[allow(clippy::too_many_arguments)]
pub fn handle_add(
    db: &Database,
    scheduler: &dyn ReminderScheduler,
    catalog: Option<&CatalogClient>,
    photo_dir: &Path,
    name: Option<String>,
    expiry: Option<String>,
    barcode: Option<String>,
    description: Option<String>,
    photo: Option<PathBuf>,
    quantity: i64,
) -> Result<(), CliError> {
    let mut name = name;
    let mut photo = photo;
    let mut history_photo: Option<String> = None;

    // Local history first, the shared catalog only on a miss; both are a
    // convenience and never block the save
    if let Some(code) = barcode.as_deref() {
        if name.is_none() || photo.is_none() {
            if let Some(previous) = db.find_by_barcode(code)? {
                println!("Found '{}' in your history", previous.name);
                if name.is_none() {
                    name = Some(previous.name);
                }
                if photo.is_none() {
                    history_photo = previous.photo_path;
                }
            } else if name.is_none() {
                if let Some(hit) = catalog.and_then(|c| c.lookup(code)) {
                    println!("Identified by the shared catalog: {}", hit.name);
                    name = Some(hit.name);
                }
            }
        }
    }

    let name = match name.map(|n| n.trim().to_string()) {
        Some(n) if !n.is_empty() => n,
        _ => {
            return Err(CliError::Validation(
                "a product name is required (pass NAME, or --barcode with a known code)"
                    .to_string(),
            ));
        }
    };
    let expiry = expiry.ok_or_else(|| {
        CliError::Validation("an expiry date is required (--expiry DD/MM/YYYY)".to_string())
    })?;
    validate_expiry(&expiry)?;
    if quantity < 1 {
        return Err(CliError::Validation("quantity must be at least 1".to_string()));
    }

    let photo_path = match photo.take() {
        Some(source) => Some(
            utils::promote_photo(&source, photo_dir)?
                .to_string_lossy()
                .into_owned(),
        ),
        None => history_photo,
    };

    let settings = db.settings()?;
    let handle =
        notify::schedule_expiry_reminder(scheduler, &name, &expiry, &settings, utils::now_local());

    let mut product = Product::new(name, expiry);
    product.barcode = barcode;
    product.description = description;
    product.photo_path = photo_path;
    product.quantity = quantity;
    product.notification_id = handle;

    let id = db.insert_product(&product)?;
    println!("Product registered (ID: {})", id);

    if let (Some(code), Some(client)) = (product.barcode.as_deref(), catalog) {
        client.contribute(code, &product.name);
    }

    Ok(())
}

/// Handle the edit command. The old reminder is always cancelled before the
/// replacement is scheduled, whatever fields changed.
#[allow(clippy::too_many_arguments)]
pub fn handle_edit(
    db: &Database,
    scheduler: &dyn ReminderScheduler,
    photo_dir: &Path,
    id: i64,
    name: Option<String>,
    expiry: Option<String>,
    barcode: Option<String>,
    description: Option<String>,
    photo: Option<PathBuf>,
    quantity: Option<i64>,
) -> Result<(), CliError> {
    let mut product = db.get_product(id)?;

    if let Some(name) = name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CliError::Validation("a product name is required".to_string()));
        }
        product.name = name;
    }
    if let Some(expiry) = expiry {
        validate_expiry(&expiry)?;
        product.expiry_date = expiry;
    }
    if let Some(quantity) = quantity {
        if quantity < 1 {
            return Err(CliError::Validation("quantity must be at least 1".to_string()));
        }
        product.quantity = quantity;
    }
    if barcode.is_some() {
        product.barcode = barcode;
    }
    if description.is_some() {
        product.description = description;
    }
    if let Some(source) = photo {
        product.photo_path = Some(
            utils::promote_photo(&source, photo_dir)?
                .to_string_lossy()
                .into_owned(),
        );
    }

    let settings = db.settings()?;
    product.notification_id = notify::replace_reminder(
        scheduler,
        product.notification_id.as_deref(),
        &product.name,
        &product.expiry_date,
        &settings,
        utils::now_local(),
    );
    product.updated_at = utils::timestamp();

    db.update_product(&product)?;
    println!("Product {} updated", id);

    Ok(())
}

/// Handle the delete command: cancel the live reminder, then remove the row
pub fn handle_delete(
    db: &Database,
    scheduler: &dyn ReminderScheduler,
    id: i64,
) -> Result<(), CliError> {
    let product = db.get_product(id)?;

    if let Some(handle) = product.notification_id.as_deref() {
        if let Err(e) = scheduler.cancel(handle) {
            tracing::warn!("failed to cancel reminder {handle}: {e}");
        }
    }

    db.delete_product(id)?;
    println!("Product {} deleted", id);

    Ok(())
}

pub fn handle_archive(db: &Database, ids: &[i64]) -> Result<(), CliError> {
    if ids.is_empty() {
        return Err(CliError::Validation("pass at least one product id".to_string()));
    }
    db.archive_products(ids)?;
    println!("Archived {} product(s)", ids.len());
    Ok(())
}

pub fn handle_restore(db: &Database, id: i64) -> Result<(), CliError> {
    db.restore_product(id)?;
    println!("Product {} restored", id);
    Ok(())
}

fn parse_status_filter(value: &str) -> Result<ExpiryStatus, CliError> {
    match value {
        "expired" => Ok(ExpiryStatus::Expired),
        "soon" => Ok(ExpiryStatus::ExpiringSoon),
        "ok" => Ok(ExpiryStatus::Ok),
        other => Err(CliError::Validation(format!(
            "unknown status '{}': use expired, soon or ok",
            other
        ))),
    }
}

/// Handle the list command: dashboard counts, then one line per product
pub fn handle_list(
    db: &Database,
    by_expiry: bool,
    status: Option<String>,
) -> Result<(), CliError> {
    let filter = status.as_deref().map(parse_status_filter).transpose()?;
    let sort = if by_expiry {
        SortOrder::ExpiryAsc
    } else {
        SortOrder::Recent
    };

    let products = db.list_active(sort)?;
    let settings = db.settings()?;
    let today = utils::today();

    let counts = expiry::summarize(&products, settings.lead_days, today);
    let mut header = format!(
        "{} expired, {} expiring soon, {} ok",
        counts.expired, counts.expiring_soon, counts.ok
    );
    if counts.unparseable > 0 {
        header.push_str(&format!(", {} with unreadable dates", counts.unparseable));
    }
    println!("{}", header);

    for product in &products {
        let product_status = expiry::classify_str(&product.expiry_date, settings.lead_days, today);
        if filter.is_some_and(|f| f != product_status) {
            continue;
        }
        println!("{}", format_line(product, product_status));
    }

    Ok(())
}

pub fn handle_archived(db: &Database) -> Result<(), CliError> {
    let products = db.list_archived()?;
    if products.is_empty() {
        println!("No archived products.");
        return Ok(());
    }

    let settings = db.settings()?;
    let today = utils::today();
    for product in &products {
        let status = expiry::classify_str(&product.expiry_date, settings.lead_days, today);
        println!("{}", format_line(product, status));
    }

    Ok(())
}

/// Handle the expired command: a plain-text report fit for sharing, with an
/// optional bulk-archive of the listed products (the "removal list" action).
/// Returns the expired ids.
pub fn handle_expired(db: &Database, archive: bool) -> Result<Vec<i64>, CliError> {
    let products = db.list_active(SortOrder::ExpiryAsc)?;
    let settings = db.settings()?;
    let today = utils::today();

    let expired: Vec<&Product> = products
        .iter()
        .filter(|p| {
            expiry::classify_str(&p.expiry_date, settings.lead_days, today)
                == ExpiryStatus::Expired
        })
        .collect();

    if expired.is_empty() {
        println!("No expired products.");
        return Ok(Vec::new());
    }

    println!("Expired products:");
    for product in &expired {
        if product.quantity > 1 {
            println!(
                "- {} x{} (expired {})",
                product.name, product.quantity, product.expiry_date
            );
        } else {
            println!("- {} (expired {})", product.name, product.expiry_date);
        }
    }

    let ids: Vec<i64> = expired.iter().filter_map(|p| p.id).collect();
    if archive {
        db.archive_products(&ids)?;
        println!("Archived {} product(s)", ids.len());
    }

    Ok(ids)
}

/// Handle the scan command: report what a barcode would prefill
pub fn handle_scan(
    db: &Database,
    catalog: Option<&CatalogClient>,
    barcode: &str,
) -> Result<(), CliError> {
    if let Some(product) = db.find_by_barcode(barcode)? {
        println!("Known from your history: {}", product.name);
        if let Some(photo) = &product.photo_path {
            println!("Photo: {}", photo);
        }
        println!("Last expiry: {}", product.expiry_date);
        return Ok(());
    }

    if let Some(hit) = catalog.and_then(|c| c.lookup(barcode)) {
        println!("Identified by the shared catalog: {}", hit.name);
        return Ok(());
    }

    println!("No match for {}; it will be registered as new.", barcode);
    Ok(())
}

pub fn handle_export(db: &Database, path: Option<&Path>) -> Result<(), CliError> {
    let snapshot = db.export_all()?;
    match path {
        Some(path) => {
            backup::write_backup(path, &snapshot)?;
            println!(
                "Exported {} record(s) to {}",
                snapshot.records.len(),
                path.display()
            );
        }
        None => println!("{}", backup::to_json(&snapshot)?),
    }
    Ok(())
}

pub fn handle_import(db: &Database, path: &Path) -> Result<(), CliError> {
    let payload = backup::read_backup(path)?;
    db.import_all(&payload)?;
    println!("Imported {} record(s)", payload.records.len());
    Ok(())
}

pub fn handle_remind(db: &Database) -> Result<(), CliError> {
    let due = db.due_reminders(utils::now_local())?;
    if due.is_empty() {
        println!("No reminders due.");
        return Ok(());
    }

    for reminder in &due {
        println!("{}: {}", reminder.title, reminder.body);
        if let Some(id) = reminder.id {
            db.mark_delivered(id)?;
        }
    }

    Ok(())
}

pub fn handle_settings_show(db: &Database) -> Result<(), CliError> {
    let settings = db.settings()?;
    println!("lead days: {}", settings.lead_days);
    println!(
        "alert time: {:02}:{:02}",
        settings.alert_hour, settings.alert_minute
    );
    Ok(())
}

fn parse_alert(value: &str) -> Result<(u32, u32), CliError> {
    let invalid = || CliError::Validation(format!("'{}' is not a valid HH:MM time", value));
    let (hour, minute) = value.split_once(':').ok_or_else(|| invalid())?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

pub fn handle_settings_set(
    db: &Database,
    lead_days: Option<i64>,
    alert: Option<String>,
) -> Result<(), CliError> {
    if lead_days.is_none() && alert.is_none() {
        return Err(CliError::Validation(
            "pass --lead-days and/or --alert".to_string(),
        ));
    }

    let mut settings = db.settings()?;
    if let Some(lead_days) = lead_days {
        if lead_days < 0 {
            return Err(CliError::Validation("lead days cannot be negative".to_string()));
        }
        settings.lead_days = lead_days;
    }
    if let Some(alert) = alert.as_deref() {
        let (hour, minute) = parse_alert(alert)?;
        settings.alert_hour = hour;
        settings.alert_minute = minute;
    }

    db.save_settings(&settings)?;
    println!(
        "Settings saved: {} lead day(s), alerts at {:02}:{:02}",
        settings.lead_days, settings.alert_hour, settings.alert_minute
    );

    Ok(())
}
