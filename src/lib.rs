//! batty - make ttys drive people batty
//!
//! Watches the keystrokes typed into a terminal and, every so often, pushes
//! a backspace plus a neighbouring key into the terminal's input so the
//! user appears to have made (and fixed) a typo.

pub mod config;
pub mod keyboard;
pub mod tty;
pub mod typo;

pub use config::Config;
pub use typo::{DecisionHook, InjectionRequest, TypoGenerator};
