//! The set of playable words.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Accepted words, stored uppercase. Lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    words: HashSet<String>,
}

impl Dictionary {
    /// Builds a dictionary from any list of words. Surrounding whitespace is
    /// trimmed and blank entries are skipped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Self::default();
        for word in words {
            dictionary.insert(word.as_ref());
        }
        dictionary
    }

    /// Reads one word per line.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut dictionary = Self::default();
        for line in reader.lines() {
            dictionary.insert(&line?);
        }
        Ok(dictionary)
    }

    /// Reads a word list file, one word per line.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Adds a word. Returns `false` if it was blank or already present.
    pub fn insert(&mut self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() {
            return false;
        }
        self.words.insert(word.to_uppercase())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Dictionary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_words(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dictionary = Dictionary::from_words(["hello", "World"]);
        assert!(dictionary.contains("HELLO"));
        assert!(dictionary.contains("world"));
        assert!(!dictionary.contains("help"));
    }

    #[test]
    fn test_from_reader_trims_and_skips_blanks() {
        let text = "cat\n  dog  \n\n\tbird\n";
        let dictionary = Dictionary::from_reader(text.as_bytes()).unwrap();
        assert_eq!(dictionary.len(), 3);
        assert!(dictionary.contains("DOG"));
        assert!(dictionary.contains("Bird"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let dictionary: Dictionary = ["hi", "HI", "Hi"].into_iter().collect();
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn test_from_path_missing_file_is_error() {
        assert!(Dictionary::from_path("/definitely/not/here.txt").is_err());
    }
}
