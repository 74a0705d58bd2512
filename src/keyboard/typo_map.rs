//! Key adjacency tables used to pick plausible typos

use super::layout::{KeyboardLayout, LayoutError, ROW_STAGGER};

/// Letters physically adjacent to each letter of a layout.
///
/// Two keys are adjacent when they sit next to each other on the same row,
/// or on neighbouring rows less than one key width apart once the row
/// stagger is applied.
#[derive(Debug, Clone)]
pub struct TypoMap {
    layout: KeyboardLayout,
    neighbours: [Vec<char>; 26],
}

impl TypoMap {
    /// Build the adjacency table for a layout
    pub fn new(layout: KeyboardLayout) -> Self {
        let rows = layout.rows();
        let keys: Vec<(usize, usize, char)> = rows
            .iter()
            .enumerate()
            .flat_map(|(row, keys)| keys.chars().enumerate().map(move |(col, c)| (row, col, c)))
            .collect();

        let mut neighbours: [Vec<char>; 26] = Default::default();

        for &(row, col, key) in &keys {
            let Some(slot) = letter_index(key) else {
                continue;
            };
            let x = col as f32 + ROW_STAGGER[row];

            for &(other_row, other_col, other) in &keys {
                if !other.is_ascii_lowercase() || (other_row == row && other_col == col) {
                    continue;
                }
                let adjacent = if other_row == row {
                    other_col.abs_diff(col) == 1
                } else if other_row.abs_diff(row) == 1 {
                    let other_x = other_col as f32 + ROW_STAGGER[other_row];
                    (other_x - x).abs() <= 1.0
                } else {
                    false
                };
                if adjacent {
                    neighbours[slot].push(other);
                }
            }
        }

        Self { layout, neighbours }
    }

    /// Layout this table was built from
    pub fn layout(&self) -> KeyboardLayout {
        self.layout
    }

    /// Candidate typos for a lowercase letter.
    ///
    /// The returned slice is never empty.
    pub fn find_typos(&self, c: char) -> Result<&[char], LayoutError> {
        match letter_index(c).map(|i| self.neighbours[i].as_slice()) {
            Some(candidates) if !candidates.is_empty() => Ok(candidates),
            _ => Err(LayoutError::NoMapping(c)),
        }
    }
}

impl Default for TypoMap {
    fn default() -> Self {
        Self::new(KeyboardLayout::default())
    }
}

fn letter_index(c: char) -> Option<usize> {
    c.is_ascii_lowercase().then(|| (c as u8 - b'a') as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn typo_set(map: &TypoMap, c: char) -> HashSet<char> {
        map.find_typos(c).unwrap().iter().copied().collect()
    }

    #[test]
    fn qwerty_c_neighbours() {
        let map = TypoMap::new(KeyboardLayout::Qwerty);
        assert_eq!(typo_set(&map, 'c'), HashSet::from(['x', 'v', 'd', 'f']));
    }

    #[test]
    fn qwerty_a_neighbours() {
        let map = TypoMap::new(KeyboardLayout::Qwerty);
        assert_eq!(typo_set(&map, 'a'), HashSet::from(['q', 'w', 's', 'z']));
    }

    #[test]
    fn qwerty_p_skips_punctuation() {
        let map = TypoMap::new(KeyboardLayout::Qwerty);
        assert_eq!(typo_set(&map, 'p'), HashSet::from(['o', 'l']));
    }

    #[test]
    fn qwertz_swaps_y_and_z() {
        let map = TypoMap::new(KeyboardLayout::Qwertz);
        assert!(typo_set(&map, 't').contains(&'z'));
        assert!(typo_set(&map, 'x').contains(&'y'));
    }

    #[test]
    fn every_letter_has_candidates_in_every_layout() {
        for layout in KeyboardLayout::all() {
            let map = TypoMap::new(*layout);
            for letter in 'a'..='z' {
                let typos = map.find_typos(letter).unwrap();
                assert!(!typos.is_empty(), "{} '{}'", layout, letter);
                assert!(typos.iter().all(|c| c.is_ascii_lowercase() && *c != letter));
            }
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        for layout in KeyboardLayout::all() {
            let map = TypoMap::new(*layout);
            for letter in 'a'..='z' {
                for &typo in map.find_typos(letter).unwrap() {
                    assert!(
                        map.find_typos(typo).unwrap().contains(&letter),
                        "{}: '{}' -> '{}' has no way back",
                        layout,
                        letter,
                        typo
                    );
                }
            }
        }
    }

    #[test]
    fn non_letters_have_no_mapping() {
        let map = TypoMap::default();
        assert_eq!(map.find_typos('1'), Err(LayoutError::NoMapping('1')));
        assert_eq!(map.find_typos('A'), Err(LayoutError::NoMapping('A')));
        assert_eq!(map.find_typos(';'), Err(LayoutError::NoMapping(';')));
    }
}
