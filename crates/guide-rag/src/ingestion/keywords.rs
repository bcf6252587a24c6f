//! Keyword vocabulary, whole-word matching, and the keyword→image map

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::LinkedImage;

/// Skincare terms used to associate guide images with topics
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "benzoyl peroxide",
    "salicylic acid",
    "cerave",
    "differin",
    "retinoid",
    "pimple",
    "zit",
    "acne",
    "adapalene",
    "cleanser",
    "moisturizer",
    "acne patch",
    "niacinamide",
    "pimple patch",
    "wrinkle",
    "blackheads",
    "black heads",
    "breakouts",
    "wrinkles",
    "acne scars",
    "sensitive skin",
    "dry skin",
    "oily skin",
    "combination skin",
    "sun damage",
    "hair",
];

/// Lower-cased, de-duplicated keyword list in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordVocabulary {
    keywords: Vec<String>,
}

impl KeywordVocabulary {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !unique.contains(&keyword) {
                unique.push(keyword);
            }
        }
        Self { keywords: unique }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl Default for KeywordVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

/// Whole-word matcher compiled once per vocabulary
pub struct KeywordMatcher {
    patterns: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    pub fn new(vocabulary: &KeywordVocabulary) -> Result<Self> {
        let patterns = vocabulary
            .keywords()
            .iter()
            .map(|keyword| {
                let pattern = format!(r"\b{}\b", regex::escape(keyword));
                Regex::new(&pattern)
                    .map(|re| (keyword.clone(), re))
                    .map_err(|e| Error::Config(format!("Bad keyword '{}': {}", keyword, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Keywords found in `lowered_text`, in vocabulary order.
    ///
    /// The caller lower-cases the text; keywords are already lower-case.
    pub fn matches<'a>(&'a self, lowered_text: &str) -> Vec<&'a str> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(lowered_text))
            .map(|(keyword, _)| keyword.as_str())
            .collect()
    }
}

/// Keyword to first co-occurring image; insertion-ordered, first match wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordImageMap {
    entries: Vec<(String, PathBuf)>,
}

impl KeywordImageMap {
    /// Associate `keyword` with `path` unless it is already claimed.
    ///
    /// Returns whether the entry was added.
    pub fn link_if_absent(&mut self, keyword: &str, path: &Path) -> bool {
        let keyword = keyword.to_lowercase();
        if self.entries.iter().any(|(k, _)| *k == keyword) {
            return false;
        }
        self.entries.push((keyword, path.to_path_buf()));
        true
    }

    /// Case-insensitive lookup
    pub fn get(&self, keyword: &str) -> Option<&Path> {
        let keyword = keyword.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == keyword)
            .map(|(_, p)| p.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Images whose keyword is a case-insensitive substring of `answer`.
    ///
    /// Plain substring containment, not whole-word; images missing from disk are skipped.
    pub fn select_for_answer(&self, answer: &str) -> Vec<LinkedImage> {
        let answer = answer.to_lowercase();
        self.entries
            .iter()
            .filter(|(keyword, _)| answer.contains(keyword.as_str()))
            .filter(|(keyword, path)| {
                let present = path.exists();
                if !present {
                    tracing::warn!("Image for '{}' missing at {}", keyword, path.display());
                }
                present
            })
            .map(|(keyword, path)| LinkedImage {
                keyword: keyword.clone(),
                path: path.clone(),
            })
            .collect()
    }
}
