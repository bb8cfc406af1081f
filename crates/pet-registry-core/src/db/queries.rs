use rusqlite::{Row, ToSql};

use crate::db::connection::{ConnectionProvider, ConnectionSource};
use crate::error::{PetRegistryError, Result};
use crate::models::*;

/// Row cap applied to listings and searches unless the caller overrides it.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Pet columns (0..=6) followed by the left-joined microchip columns (7..=12).
const PET_SELECT: &str = "SELECT p.id, p.deleted, p.name, p.species, p.breed, p.birth_date, p.owner,
            m.id, m.deleted, m.code, m.implant_date, m.clinic, m.notes
     FROM pet p
     LEFT JOIN microchip m ON p.id = m.pet_id";

/// The three read shapes that share [`PET_SELECT`] and the row mapping.
enum PetQuery<'q> {
    All,
    ById(i64),
    NameContains(&'q str),
}

impl PetQuery<'_> {
    fn operation(&self) -> &'static str {
        match self {
            PetQuery::All => "fetch_all",
            PetQuery::ById(_) => "fetch_by_id",
            PetQuery::NameContains(_) => "search_by_name",
        }
    }

    fn sql(&self) -> String {
        match self {
            PetQuery::All => format!(
                "{PET_SELECT} WHERE p.deleted = 0 ORDER BY p.name, p.id LIMIT ?1"
            ),
            PetQuery::ById(_) => format!("{PET_SELECT} WHERE p.id = ?1 AND p.deleted = 0"),
            PetQuery::NameContains(_) => format!(
                "{PET_SELECT} WHERE p.name LIKE ?1 ESCAPE '\\' AND p.deleted = 0
                 ORDER BY p.name, p.id LIMIT ?2"
            ),
        }
    }
}

/// Read access to pets and their microchips.
///
/// Every operation acquires the connection from its source, runs one query,
/// and consumes the whole result before returning. The deleted filter applies
/// to the pet row only: a soft-deleted microchip is still attached.
pub struct PetRepository<'a, S: ConnectionSource + ?Sized = ConnectionProvider> {
    source: &'a S,
    limit: usize,
}

impl<'a, S: ConnectionSource + ?Sized> PetRepository<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Override the row cap used by [`fetch_all`](Self::fetch_all) and
    /// [`search_by_name`](Self::search_by_name).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Non-deleted pets ordered by name, up to the row cap.
    pub fn fetch_all(&self) -> Result<Vec<Pet>> {
        self.fetch(PetQuery::All)
    }

    /// The non-deleted pet with this id, or `None` if there is none.
    pub fn fetch_by_id(&self, id: i64) -> Result<Option<Pet>> {
        Ok(self.fetch(PetQuery::ById(id))?.into_iter().next())
    }

    /// Non-deleted pets whose name contains `fragment`, ordered by name, up to the row cap.
    /// Matching follows SQLite `LIKE` (ASCII case-insensitive); `%` and `_` match literally.
    pub fn search_by_name(&self, fragment: &str) -> Result<Vec<Pet>> {
        self.fetch(PetQuery::NameContains(fragment))
    }

    /// Number of non-deleted pets. Not subject to the row cap.
    pub fn count(&self) -> Result<i64> {
        let conn = self.source.acquire()?;
        conn.query_row("SELECT COUNT(*) FROM pet WHERE deleted = 0", [], |row| {
            row.get(0)
        })
        .map_err(PetRegistryError::query("count"))
    }

    fn fetch(&self, query: PetQuery<'_>) -> Result<Vec<Pet>> {
        let operation = query.operation();
        let conn = self.source.acquire()?;
        let mut stmt = conn
            .prepare(&query.sql())
            .map_err(PetRegistryError::query(operation))?;

        let limit = i64::try_from(self.limit).unwrap_or(i64::MAX);
        let pattern;
        let args: Vec<&dyn ToSql> = match query {
            PetQuery::All => vec![&limit as &dyn ToSql],
            PetQuery::ById(ref id) => vec![id as &dyn ToSql],
            PetQuery::NameContains(fragment) => {
                pattern = like_pattern(fragment);
                vec![&pattern as &dyn ToSql, &limit]
            }
        };

        let pets = stmt
            .query_map(args.as_slice(), map_pet_row)
            .map_err(PetRegistryError::query(operation))?
            .collect::<rusqlite::Result<Vec<Pet>>>()
            .map_err(PetRegistryError::query(operation))?;

        log::debug!("{} returned {} pet(s)", operation, pets.len());
        Ok(pets)
    }
}

/// Build a Pet from a [`PET_SELECT`] row, attaching the joined microchip when
/// its id is present and non-zero.
fn map_pet_row(row: &Row<'_>) -> rusqlite::Result<Pet> {
    let microchip = match row.get::<_, Option<i64>>(7)? {
        Some(chip_id) if chip_id != 0 => Some(Microchip {
            id: Some(chip_id),
            deleted: row.get(8)?,
            code: row.get(9)?,
            implant_date: row.get(10)?,
            clinic: row.get(11)?,
            notes: row.get(12)?,
        }),
        _ => None,
    };

    Ok(Pet {
        id: Some(row.get(0)?),
        deleted: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        birth_date: row.get(5)?,
        owner: row.get(6)?,
        microchip,
    })
}

/// Wrap `fragment` for a substring `LIKE`, escaping its wildcards.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
