use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MAX_CODE_LEN: usize = 25;
pub const MAX_CLINIC_LEN: usize = 120;
pub const MAX_NOTES_LEN: usize = 255;

/// Identification chip implanted in a pet. Has no reference back to its pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Microchip {
    pub id: Option<i64>,
    pub deleted: bool,
    pub code: String,
    pub implant_date: Option<NaiveDate>,
    pub clinic: Option<String>,
    pub notes: Option<String>,
}

impl Microchip {
    pub fn new(code: String) -> Self {
        Self {
            id: None,
            deleted: false,
            code,
            implant_date: None,
            clinic: None,
            notes: None,
        }
    }

    /// A chip is valid when its code is non-blank and fits the column.
    pub fn is_valid(&self) -> bool {
        super::required_within(&self.code, MAX_CODE_LEN)
    }

    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn restore(&mut self) {
        self.deleted = false;
    }

    /// Identity comparison: same id and same code.
    pub fn same_record(&self, other: &Microchip) -> bool {
        self.id == other.id && self.code == other.code
    }
}

impl std::fmt::Display for Microchip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Microchip {}", self.code)?;
        if let Some(id) = self.id {
            write!(f, " (#{})", id)?;
        }
        if let Some(date) = self.implant_date {
            write!(f, ", implanted {}", date)?;
        }
        if let Some(ref clinic) = self.clinic {
            write!(f, " at {}", clinic)?;
        }
        if self.deleted {
            write!(f, " [deleted]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_microchip_is_active() {
        let chip = Microchip::new("C1".to_string());
        assert!(!chip.deleted);
        assert!(chip.id.is_none());
        assert!(chip.is_valid());
    }

    #[test]
    fn test_code_length_limit() {
        let chip = Microchip::new("X".repeat(MAX_CODE_LEN));
        assert!(chip.is_valid());
        let chip = Microchip::new("X".repeat(MAX_CODE_LEN + 1));
        assert!(!chip.is_valid());
    }

    #[test]
    fn test_blank_code_invalid() {
        assert!(!Microchip::new(String::new()).is_valid());
        assert!(!Microchip::new("   ".to_string()).is_valid());
    }

    #[test]
    fn test_soft_delete_round_trip() {
        let mut chip = Microchip::new("C1".to_string());
        chip.mark_deleted();
        assert!(chip.deleted);
        chip.restore();
        assert!(!chip.deleted);
    }

    #[test]
    fn test_same_record_ignores_details() {
        let mut a = Microchip::new("C1".to_string());
        a.id = Some(4);
        let mut b = a.clone();
        b.clinic = Some("Other clinic".to_string());
        assert!(a.same_record(&b));
        assert_ne!(a, b);
    }
}
