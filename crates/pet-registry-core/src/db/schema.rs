use rusqlite::Connection;

use crate::error::Result;

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pet (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deleted INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL CHECK (length(name) <= 60),
            species TEXT NOT NULL CHECK (length(species) <= 30),
            breed TEXT CHECK (length(breed) <= 60),
            birth_date TEXT,
            owner TEXT NOT NULL CHECK (length(owner) <= 120)
        );

        CREATE TABLE IF NOT EXISTS microchip (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pet_id INTEGER UNIQUE,
            deleted INTEGER NOT NULL DEFAULT 0,
            code TEXT NOT NULL UNIQUE CHECK (length(code) <= 25),
            implant_date TEXT,
            clinic TEXT CHECK (length(clinic) <= 120),
            notes TEXT CHECK (length(notes) <= 255),
            FOREIGN KEY (pet_id) REFERENCES pet(id)
        );

        CREATE INDEX IF NOT EXISTS idx_pet_name ON pet(name);
        ",
    )?;
    Ok(())
}

/// Small fixed data set used by `init --sample` and the demo.
/// Includes a soft-deleted pet and a soft-deleted chip so both filters show up.
pub fn load_sample_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        INSERT INTO pet (id, deleted, name, species, breed, birth_date, owner) VALUES
            (1, 0, 'Rex', 'Dog', 'German Shepherd', '2019-04-12', 'Laura Gomez'),
            (2, 0, 'Ana', 'Cat', 'Siamese', '2021-09-30', 'Martin Diaz'),
            (3, 0, 'Luna', 'Dog', NULL, NULL, 'Sofia Perez'),
            (4, 1, 'Milo', 'Cat', 'Persian', '2018-01-05', 'Julian Rossi'),
            (5, 0, 'Kiwi', 'Bird', 'Parakeet', '2022-06-18', 'Carla Ruiz'),
            (6, 0, 'Bruno', 'Dog', 'Boxer', '2017-11-02', 'Diego Fernandez');

        INSERT INTO microchip (id, pet_id, deleted, code, implant_date, clinic, notes) VALUES
            (1, 2, 0, 'MC-0001', '2021-11-15', 'Clinica Norte', NULL),
            (2, 1, 0, 'MC-0002', '2019-06-01', 'Veterinaria Central', 'Left shoulder'),
            (3, 6, 1, 'MC-0003', '2018-02-20', 'Clinica Sur', 'Replaced, chip unreadable'),
            (4, NULL, 0, 'MC-0004', NULL, NULL, 'Unassigned stock');
        ",
    )?;
    Ok(())
}
