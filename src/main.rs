use clap::Parser;
use color_eyre::Result;

use validade::cli::{self, Cli, Commands, SettingsCommands};
use validade::cloud::CatalogClient;
use validade::notify::QueueScheduler;
use validade::{Config, Database, Profile};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Only warnings and errors by default; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if args.dev { Profile::Dev } else { Profile::Prod };

    let config = Config::load_with_profile(profile)?;

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;

    let scheduler = QueueScheduler::new(&db, config.notifications.enabled);

    // Retention sweep runs before anything renders, so stale records never
    // reach a listing; their queued reminders go with them
    let removed = db.purge_stale(config.retention_days, validade::utils::today())?;
    if !removed.is_empty() {
        tracing::info!("retention sweep removed {} stale record(s)", removed.len());
    }

    let catalog = CatalogClient::new(&config.catalog.base_url);
    let photo_dir = config.get_photo_dir();

    match args.command.unwrap_or(Commands::List {
        by_expiry: false,
        status: None,
    }) {
        Commands::Add {
            name,
            expiry,
            barcode,
            description,
            photo,
            quantity,
        } => cli::handle_add(
            &db,
            &scheduler,
            catalog.as_ref(),
            &photo_dir,
            name,
            expiry,
            barcode,
            description,
            photo,
            quantity,
        )?,
        Commands::List { by_expiry, status } => cli::handle_list(&db, by_expiry, status)?,
        Commands::Archived => cli::handle_archived(&db)?,
        Commands::Edit {
            id,
            name,
            expiry,
            barcode,
            description,
            photo,
            quantity,
        } => cli::handle_edit(
            &db,
            &scheduler,
            &photo_dir,
            id,
            name,
            expiry,
            barcode,
            description,
            photo,
            quantity,
        )?,
        Commands::Archive { ids } => cli::handle_archive(&db, &ids)?,
        Commands::Restore { id } => cli::handle_restore(&db, id)?,
        Commands::Delete { id } => cli::handle_delete(&db, &scheduler, id)?,
        Commands::Expired { archive } => {
            cli::handle_expired(&db, archive)?;
        }
        Commands::Scan { barcode } => cli::handle_scan(&db, catalog.as_ref(), &barcode)?,
        Commands::Export { path } => cli::handle_export(&db, path.as_deref())?,
        Commands::Import { path } => cli::handle_import(&db, &path)?,
        Commands::Remind => cli::handle_remind(&db)?,
        Commands::Settings { command } => match command {
            SettingsCommands::Show => cli::handle_settings_show(&db)?,
            SettingsCommands::Set { lead_days, alert } => {
                cli::handle_settings_set(&db, lead_days, alert)?
            }
        },
    }

    Ok(())
}
