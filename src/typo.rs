//! Per-character typo decisions
//!
//! A [`DecisionHook`] turns one captured byte into an [`InjectionRequest`]:
//! either nothing, or a backspace followed by a replacement letter.

use crate::keyboard::TypoMap;
use rand::Rng;

/// Backspace control byte (`^H`)
pub const BACKSPACE: u8 = 0x08;

/// Bytes to push into the terminal's input buffer after a keystroke
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionRequest(Vec<u8>);

impl InjectionRequest {
    /// No typo for this character
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Erase the last character and type `replacement` in its place
    pub fn correction(replacement: u8) -> Self {
        Self(vec![BACKSPACE, replacement])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Decides, per captured character, what (if anything) to inject
pub trait DecisionHook: Send + Sync {
    fn decide(&self, input: u8) -> InjectionRequest;
}

impl<F> DecisionHook for F
where
    F: Fn(u8) -> InjectionRequest + Send + Sync,
{
    fn decide(&self, input: u8) -> InjectionRequest {
        self(input)
    }
}

/// Injects keyboard-adjacent typos into alphabetic characters at a fixed rate
#[derive(Debug, Clone)]
pub struct TypoGenerator {
    map: TypoMap,
    rate: f64,
}

impl TypoGenerator {
    /// `rate` is the probability, per letter, that a typo is produced.
    /// It is clamped to `[0, 1]`; NaN counts as 0.
    pub fn new(map: TypoMap, rate: f64) -> Self {
        let rate = if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, 1.0)
        };
        Self { map, rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn map(&self) -> &TypoMap {
        &self.map
    }

    /// Decide using an explicit random source
    pub fn decide_with<R: Rng>(&self, input: u8, rng: &mut R) -> InjectionRequest {
        let is_capital = input.is_ascii_uppercase();
        let normalized = input.to_ascii_lowercase();

        if !normalized.is_ascii_lowercase() {
            return InjectionRequest::none();
        }

        // A draw of exactly `rate` is a miss, so a rate of 0 never fires.
        if rng.gen::<f64>() >= self.rate {
            return InjectionRequest::none();
        }

        let candidates = match self.map.find_typos(normalized as char) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("failed to get typo: {}", e);
                return InjectionRequest::none();
            }
        };

        let selected = candidates[rng.gen_range(0..candidates.len())];
        let output = if is_capital {
            selected.to_ascii_uppercase()
        } else {
            selected
        };
        log::debug!("selected typo {} for input {}", output, input as char);

        InjectionRequest::correction(output as u8)
    }
}

impl DecisionHook for TypoGenerator {
    fn decide(&self, input: u8) -> InjectionRequest {
        self.decide_with(input, &mut rand::thread_rng())
    }
}
