//! End-to-end tests against a file-backed database configured through a
//! properties file, the way the `pet-registry` binary runs.

use std::io::Write;

use pet_registry_core::db::schema::{create_tables, load_sample_data};
use pet_registry_core::{ConnectionProvider, DbConfig, PetRepository};

// ---------------------------------------------------------------------------
// Helper: write a properties file pointing at a temp database
// ---------------------------------------------------------------------------
fn provider_for_temp_db() -> (ConnectionProvider, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pets.db");

    let props_path = dir.path().join("database.properties");
    let mut props = std::fs::File::create(&props_path).unwrap();
    writeln!(props, "# test settings").unwrap();
    writeln!(props, "db.url=sqlite://{}", db_path.display()).unwrap();
    writeln!(props, "db.driver=sqlite").unwrap();

    let config = DbConfig::load(&props_path);
    assert!(config.url.ends_with("pets.db"));

    let provider = ConnectionProvider::new(config);
    let conn = provider.acquire().unwrap();
    create_tables(conn).unwrap();
    load_sample_data(conn).unwrap();
    (provider, dir)
}

#[test]
fn sample_listing_is_sorted_and_filtered() {
    let (provider, _dir) = provider_for_temp_db();
    let repo = PetRepository::new(&provider);

    let pets = repo.fetch_all().unwrap();
    let names: Vec<&str> = pets.iter().map(|p| p.name.as_str()).collect();
    // Milo is soft-deleted
    assert_eq!(names, vec!["Ana", "Bruno", "Kiwi", "Luna", "Rex"]);
    assert_eq!(repo.count().unwrap(), 5);
}

#[test]
fn deleted_chip_is_reported_but_inactive() {
    let (provider, _dir) = provider_for_temp_db();
    let repo = PetRepository::new(&provider);

    let bruno = repo.fetch_by_id(6).unwrap().unwrap();
    assert_eq!(bruno.name, "Bruno");
    let chip = bruno.microchip.as_ref().unwrap();
    assert_eq!(chip.code, "MC-0003");
    assert!(chip.deleted);
    assert!(!bruno.has_active_microchip());

    let rex = repo.fetch_by_id(1).unwrap().unwrap();
    assert!(rex.has_active_microchip());
}

#[test]
fn deleted_pet_is_absent_by_id() {
    let (provider, _dir) = provider_for_temp_db();
    let repo = PetRepository::new(&provider);
    assert!(repo.fetch_by_id(4).unwrap().is_none());
}

#[test]
fn search_matches_listing_rules() {
    let (provider, _dir) = provider_for_temp_db();
    let repo = PetRepository::new(&provider);

    let found = repo.search_by_name("u").unwrap();
    let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bruno", "Luna"]);

    let everything = repo.search_by_name("").unwrap();
    assert_eq!(everything, repo.fetch_all().unwrap());
}

#[test]
fn data_survives_release_and_reacquire() {
    let (mut provider, _dir) = provider_for_temp_db();
    let before = PetRepository::new(&provider).fetch_all().unwrap();

    provider.release();
    assert!(!provider.is_active());

    let after = PetRepository::new(&provider).fetch_all().unwrap();
    assert!(provider.is_active());
    assert_eq!(before, after);
}

#[test]
fn sample_pets_are_valid() {
    let (provider, _dir) = provider_for_temp_db();
    let pets = PetRepository::new(&provider).fetch_all().unwrap();
    assert!(pets.iter().all(|p| p.is_valid()));
    assert!(pets
        .iter()
        .filter_map(|p| p.microchip.as_ref())
        .all(|c| c.is_valid()));
}
