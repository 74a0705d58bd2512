//! Keyboard layouts and the typo candidates they produce

pub mod layout;
mod typo_map;

pub use layout::{KeyboardLayout, LayoutError};
pub use typo_map::TypoMap;
