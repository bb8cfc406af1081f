pub mod microchip;
pub mod pet;

pub use microchip::Microchip;
pub use pet::Pet;

/// Non-blank and at most `max` characters long.
fn required_within(value: &str, max: usize) -> bool {
    !value.trim().is_empty() && value.chars().count() <= max
}
