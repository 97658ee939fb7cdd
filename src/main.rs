use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

use member_registry::{
    default_csv_filename, export_csv_file, import_json_file, Storage,
};

/// Database file next to wherever the tool is run.
const DB_FILE: &str = "members.db";

fn db_path() -> PathBuf {
    env::var("MEMBER_REGISTRY_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DB_FILE))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("export") => run_export(args.get(2).map(String::as_str))?,
        Some("import") => match args.get(2) {
            Some(path) => run_import(Path::new(path))?,
            None => {
                eprintln!("Usage: member-registry import <file.json>");
                std::process::exit(1);
            }
        },
        _ => run_ui_mode()?,
    }

    Ok(())
}

fn run_export(target: Option<&str>) -> Result<()> {
    println!("📤 Exporting member registry to CSV");

    let storage = Storage::open(&db_path())?;
    let store = storage.load_store();

    if store.is_empty() {
        eprintln!("❌ No members to export.");
        return Ok(());
    }

    let filename = match target {
        Some(path) => path.to_string(),
        None => default_csv_filename(chrono::Local::now().date_naive()),
    };

    export_csv_file(Path::new(&filename), store.members())?;
    println!("✓ Exported {} members to {}", store.len(), filename);

    Ok(())
}

fn run_import(path: &Path) -> Result<()> {
    println!("📥 Importing member registry from {}", path.display());

    let envelope = import_json_file(path)?;
    let imported = envelope.students.len();
    let pooled = envelope.deleted_control_numbers.len();

    let storage = Storage::open(&db_path())?;
    let mut store = storage.load_store();
    let replaced = store.len();

    // The whole state is swapped: records and reclaim pool together
    envelope.apply(&mut store);
    storage.save_store(&store)?;

    println!("✓ Imported {} members ({} reusable control numbers)", imported, pooled);
    if replaced > 0 {
        println!("✓ Replaced {} previously stored members", replaced);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    use member_registry::ui;

    println!("🖥️  Loading Member Registry UI...\n");

    // Persistence is best-effort: a broken database means an empty,
    // memory-only session, never a refusal to start
    let (store, storage, theme) = match Storage::open(&db_path()) {
        Ok(storage) => {
            let store = storage.load_store();
            let theme = storage.load_theme();
            (store, Some(storage), theme)
        }
        Err(err) => {
            eprintln!("⚠️  Could not open {}: {}", db_path().display(), err);
            eprintln!("   Continuing without persistence.\n");
            (
                member_registry::MemberStore::new(),
                None,
                member_registry::Theme::Light,
            )
        }
    };

    println!("📊 Loaded {} members\n", store.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(store, storage, theme);
    ui::run_ui(&mut app)?;

    // Final save on the way out
    if let Some(storage) = &app.storage {
        if let Err(err) = storage.save_store(&app.store) {
            eprintln!("⚠️  Final save failed: {}", err);
        }
    }

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: member-registry export / member-registry import <file>");
    std::process::exit(1);
}
