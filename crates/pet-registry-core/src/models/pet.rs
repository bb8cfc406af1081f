use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Microchip;

pub const MAX_NAME_LEN: usize = 60;
pub const MAX_SPECIES_LEN: usize = 30;
pub const MAX_BREED_LEN: usize = 60;
pub const MAX_OWNER_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Option<i64>,
    pub deleted: bool,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub owner: String,
    pub microchip: Option<Microchip>,
}

impl Pet {
    pub fn new(name: String, species: String, owner: String) -> Self {
        Self {
            id: None,
            deleted: false,
            name,
            species,
            breed: None,
            birth_date: None,
            owner,
            microchip: None,
        }
    }

    /// Name, species and owner must be non-blank and fit their columns.
    pub fn is_valid(&self) -> bool {
        super::required_within(&self.name, MAX_NAME_LEN)
            && super::required_within(&self.species, MAX_SPECIES_LEN)
            && super::required_within(&self.owner, MAX_OWNER_LEN)
    }

    /// True when a chip is attached and it has not been soft-deleted.
    pub fn has_active_microchip(&self) -> bool {
        self.microchip.as_ref().is_some_and(|m| !m.deleted)
    }

    pub fn attach_microchip(&mut self, microchip: Microchip) {
        self.microchip = Some(microchip);
    }

    /// Detach the chip, handing it back to the caller.
    pub fn remove_microchip(&mut self) -> Option<Microchip> {
        self.microchip.take()
    }

    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn restore(&mut self) {
        self.deleted = false;
    }

    /// Identity comparison: same id, name and owner.
    pub fn same_record(&self, other: &Pet) -> bool {
        self.id == other.id && self.name == other.name && self.owner == other.owner
    }
}

impl std::fmt::Display for Pet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}", self.name, self.species)?;
        if let Some(ref breed) = self.breed {
            write!(f, ", {}", breed)?;
        }
        write!(f, ") owned by {}", self.owner)?;
        match self.microchip {
            Some(ref chip) => write!(f, ", chip {}", chip.code)?,
            None => write!(f, ", no chip")?,
        }
        if self.deleted {
            write!(f, " [deleted]")?;
        }
        Ok(())
    }
}
