use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

use pet_registry_core::config::DEFAULT_CONFIG_FILE;
use pet_registry_core::db::schema;
use pet_registry_core::{ConnectionProvider, DbConfig, Pet, PetRepository, DEFAULT_LIST_LIMIT};

/// Fragment used by the demo's name search.
const DEMO_SEARCH: &str = "a";

#[derive(Parser)]
#[command(name = "pet-registry", version, about = "Pet and microchip registry browser")]
struct Cli {
    /// Path to the database properties file. Without it, database.properties
    /// is used when present and defaults otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database URL, overriding db.url from the properties file
    #[arg(long)]
    url: Option<String>,

    /// Maximum rows returned by list and search
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    limit: usize,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demonstration sequence (default)
    Demo,
    /// Test the database connection
    Ping {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List active pets ordered by name
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one pet by id
    Show {
        /// Pet id
        id: i64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Search active pets by name fragment
    Search {
        /// Substring to look for in pet names
        fragment: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Count active pets
    Count,
    /// Create the pet and microchip tables
    Init {
        /// Also load a small sample data set
        #[arg(long)]
        sample: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => match DbConfig::read(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => DbConfig::load(Path::new(DEFAULT_CONFIG_FILE)),
    };
    if let Some(url) = cli.url {
        config.url = url;
    }
    let mut provider = ConnectionProvider::new(config);

    let result = match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => {
            cmd_demo(&mut provider, cli.limit);
            Ok(())
        }
        Commands::Ping { json } => cmd_ping(&provider, json),
        Commands::List { json } => cmd_list(&provider, cli.limit, json),
        Commands::Show { id, json } => cmd_show(&provider, id, json),
        Commands::Search { fragment, json } => cmd_search(&provider, cli.limit, &fragment, json),
        Commands::Count => cmd_count(&provider),
        Commands::Init { sample } => cmd_init(&provider, sample),
    };
    provider.release();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn or_unspecified<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "Not specified".to_string())
}

fn pets_table(pets: &[Pet]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Name", "Species", "Breed", "Born", "Owner", "Microchip"]);

    for p in pets {
        let chip = match p.microchip {
            Some(ref c) if c.deleted => format!("{} (deleted)", c.code),
            Some(ref c) => c.code.clone(),
            None => "-".to_string(),
        };
        table.add_row(vec![
            p.id.map(|id| id.to_string()).unwrap_or_default(),
            p.name.clone(),
            p.species.clone(),
            p.breed.clone().unwrap_or_default(),
            p.birth_date.map(|d| d.to_string()).unwrap_or_default(),
            p.owner.clone(),
            chip,
        ]);
    }
    table
}

fn print_pet_details(pet: &Pet) {
    println!("ID:            {}", or_unspecified(pet.id));
    println!("Name:          {}", pet.name);
    println!("Species:       {}", pet.species);
    println!("Breed:         {}", or_unspecified(pet.breed.as_deref()));
    println!("Birth date:    {}", or_unspecified(pet.birth_date));
    println!("Owner:         {}", pet.owner);
    match pet.microchip {
        Some(ref chip) => {
            println!("Microchip:");
            println!("  Code:        {}", chip.code);
            println!("  Implanted:   {}", or_unspecified(chip.implant_date));
            println!("  Clinic:      {}", or_unspecified(chip.clinic.as_deref()));
            if let Some(notes) = chip.notes.as_deref().filter(|n| !n.trim().is_empty()) {
                println!("  Notes:       {}", notes);
            }
            if chip.deleted {
                println!("  Status:      deleted");
            }
        }
        None => println!("Microchip:     none assigned"),
    }
    if !pet.is_valid() {
        log::warn!("Pet {} has missing or oversized required fields", pet.name);
    }
}

fn cmd_ping(provider: &ConnectionProvider, json: bool) -> pet_registry_core::Result<()> {
    let info = provider.test_connection()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    println!("Connection OK");
    println!("  Database: {}", info.product_name);
    println!("  Version:  {}", info.product_version);
    println!("  URL:      {}", info.url);
    Ok(())
}

fn cmd_list(provider: &ConnectionProvider, limit: usize, json: bool) -> pet_registry_core::Result<()> {
    let pets = PetRepository::new(provider).with_limit(limit).fetch_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pets)?);
        return Ok(());
    }
    if pets.is_empty() {
        println!("No pets found. Run 'pet-registry init --sample' to load sample data.");
        return Ok(());
    }
    println!("{}", pets_table(&pets));
    Ok(())
}

fn cmd_show(provider: &ConnectionProvider, id: i64, json: bool) -> pet_registry_core::Result<()> {
    let pet = PetRepository::new(provider).fetch_by_id(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pet)?);
        return Ok(());
    }
    match pet {
        Some(p) => print_pet_details(&p),
        None => println!("No active pet with id {}", id),
    }
    Ok(())
}

fn cmd_search(
    provider: &ConnectionProvider,
    limit: usize,
    fragment: &str,
    json: bool,
) -> pet_registry_core::Result<()> {
    let pets = PetRepository::new(provider)
        .with_limit(limit)
        .search_by_name(fragment)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pets)?);
        return Ok(());
    }
    if pets.is_empty() {
        println!("No pets match '{}'", fragment);
        return Ok(());
    }
    println!("{}", pets_table(&pets));
    Ok(())
}

fn cmd_count(provider: &ConnectionProvider) -> pet_registry_core::Result<()> {
    let total = PetRepository::new(provider).count()?;
    println!("{}", total);
    Ok(())
}

fn cmd_init(provider: &ConnectionProvider, sample: bool) -> pet_registry_core::Result<()> {
    let conn = provider.acquire()?;
    schema::create_tables(conn)?;
    println!("Schema ready at {}", provider.config().url);
    if sample {
        schema::load_sample_data(conn)?;
        println!("Sample data loaded.");
    }
    Ok(())
}

/// Fixed walkthrough: connection test, listing, count, lookup by id, search.
/// Errors are reported here and never escape; the connection is always released.
fn cmd_demo(provider: &mut ConnectionProvider, limit: usize) {
    println!("=== PET REGISTRY ===");
    println!();

    println!("1. Testing database connection");
    if let Err(e) = cmd_ping(provider, false) {
        eprintln!("Connection test failed: {}", e);
        if let Some(cause) = std::error::Error::source(&e) {
            eprintln!("  Cause: {}", cause);
        }
        eprintln!("Check the settings in your database properties file.");
    }
    println!();

    if let Err(e) = run_demo_queries(provider, limit) {
        eprintln!("Error while running queries: {}", e);
        if let Some(cause) = std::error::Error::source(&e) {
            eprintln!("  Cause: {}", cause);
        }
        eprintln!();
        eprintln!("Possible fixes:");
        eprintln!("  1. Check that the database URL and driver are correct");
        eprintln!("  2. Run 'pet-registry init --sample' to create the schema and sample data");
    }

    provider.release();
    println!();
    println!("Connection closed.");
}

fn run_demo_queries(provider: &ConnectionProvider, limit: usize) -> pet_registry_core::Result<()> {
    let repo = PetRepository::new(provider).with_limit(limit);

    println!("2. Listing pets");
    println!("===============");
    let pets = repo.fetch_all()?;
    if pets.is_empty() {
        println!("No pets found in the database.");
        println!("Run 'pet-registry init --sample' to load sample data.");
        return Ok(());
    }
    println!("Found {} pet(s):", pets.len());
    println!();
    for (i, pet) in pets.iter().enumerate() {
        println!("--- PET #{} ---", i + 1);
        print_pet_details(pet);
        println!();
    }

    println!("3. Other queries");
    println!("================");
    println!("Active pets: {}", repo.count()?);

    if let Some(first_id) = pets[0].id {
        println!();
        println!("Looking up pet by id ({}):", first_id);
        match repo.fetch_by_id(first_id)? {
            Some(p) => println!("Found: {} ({})", p.name, p.species),
            None => println!("No pet with id {}", first_id),
        }
    }

    println!();
    println!("Searching for names containing '{}':", DEMO_SEARCH);
    let found = repo.search_by_name(DEMO_SEARCH)?;
    println!("Found {} pet(s):", found.len());
    for p in &found {
        println!("  - {} ({})", p.name, p.species);
    }

    println!();
    println!("All queries completed.");
    Ok(())
}
