//! Synthetic interface name allocation.
//!
//! Generated capability interfaces need names that are short, readable
//! and collision-free within one compilation. Author-supplied names are
//! reused verbatim; everything else is synthesized from a counter by
//! alternating a vowel and a consonant alphabet over the counter's low
//! bits, which yields pronounceable identifiers ("Anuf", "Ukeg", ...).
//! The same sequence of allocation calls always yields the same name
//! sequence, so output is reproducible across builds.

use std::collections::BTreeSet;

use crate::error::ConfigurationError;

/// Vowels chosen to stay unambiguous when read aloud.
const VOWELS: &[u8] = b"aeou";
/// Consonants chosen the same way; p/q/v/x/y are left out.
const CONSONANTS: &[u8] = b"bcdfghjklmnrstwz";

/// The counter starts away from zero so the first names do not come out
/// uniformly short, and advances by a fixed odd stride.
const SEED: u32 = 1000;
const STRIDE: u32 = 119;

#[derive(Debug, Clone)]
pub struct NameAllocator {
    counter: u32,
    taken: BTreeSet<String>,
    last: Option<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        NameAllocator {
            counter: SEED,
            taken: BTreeSet::new(),
            last: None,
        }
    }

    /// Allocate the next interface name. An author-supplied name is used
    /// verbatim; using the same author name twice in one compilation is
    /// an error. Synthetic names skip over anything already taken.
    pub fn allocate(&mut self, author_name: Option<&str>) -> Result<String, ConfigurationError> {
        let name = match author_name {
            Some(given) => {
                if self.taken.contains(given) {
                    return Err(ConfigurationError::DuplicateInterfaceName {
                        name: given.to_string(),
                    });
                }
                given.to_string()
            }
            None => loop {
                let candidate = self.synthesize();
                if !self.taken.contains(&candidate) {
                    break candidate;
                }
            },
        };
        self.taken.insert(name.clone());
        self.last = Some(name.clone());
        Ok(name)
    }

    fn synthesize(&mut self) -> String {
        let mut z = self.counter;
        self.counter += STRIDE;
        let mut letters = Vec::new();
        while z > 0 {
            letters.push(VOWELS[(z & 3) as usize]);
            z >>= 2;
            if z > 0 {
                letters.push(CONSONANTS[(z & 15) as usize]);
                z >>= 4;
            }
        }
        letters[0] = letters[0].to_ascii_uppercase();
        String::from_utf8_lossy(&letters).into_owned()
    }

    /// Every name handed out in this compilation, in sorted order. The
    /// wrapper implements all of them.
    pub fn all_names(&self) -> &BTreeSet<String> {
        &self.taken
    }

    /// The most recently allocated name.
    pub fn last_name(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        NameAllocator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_sequence_is_stable() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate(None).unwrap(), "Anuf");
        assert_eq!(names.allocate(None).unwrap(), "Ukeg");
        assert_eq!(names.allocate(None).unwrap(), "Ohug");
    }

    #[test]
    fn test_two_allocators_agree() {
        let mut a = NameAllocator::new();
        let mut b = NameAllocator::new();
        for _ in 0..64 {
            assert_eq!(a.allocate(None).unwrap(), b.allocate(None).unwrap());
        }
    }

    #[test]
    fn test_no_collisions_in_one_run() {
        let mut names = NameAllocator::new();
        let mut seen = BTreeSet::new();
        for _ in 0..512 {
            let name = names.allocate(None).unwrap();
            assert!(seen.insert(name));
        }
    }

    #[test]
    fn test_author_name_reused_verbatim() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate(Some("OrderStart")).unwrap(), "OrderStart");
        assert!(names.all_names().contains("OrderStart"));
    }

    #[test]
    fn test_duplicate_author_name_rejected() {
        let mut names = NameAllocator::new();
        names.allocate(Some("Same")).unwrap();
        let err = names.allocate(Some("Same")).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::DuplicateInterfaceName { .. }
        ));
    }

    #[test]
    fn test_synthetic_skips_taken_author_name() {
        let mut names = NameAllocator::new();
        names.allocate(Some("Anuf")).unwrap();
        assert_eq!(names.allocate(None).unwrap(), "Ukeg");
    }

    #[test]
    fn test_last_name_tracks_allocation() {
        let mut names = NameAllocator::new();
        assert!(names.last_name().is_none());
        names.allocate(None).unwrap();
        assert_eq!(names.last_name(), Some("Anuf"));
    }
}
