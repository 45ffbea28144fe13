// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slide deck files.
//!
//! A deck is UTF-8 text. Lines consisting of `---` separate slides; the first
//! non-blank line of a slide is its title. An optional first line
//! `password: <secret>` protects the whole deck.

use std::path::{Path, PathBuf};

const SEPARATOR: &str = "---";
const PASSWORD_PREFIX: &str = "password:";

/// Why a deck could not be opened.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DeckError {
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("deck has no slides")]
    Empty,
    #[error("deck is password protected and the password is wrong or missing")]
    BadPassword,
}

/// One slide: a title and body lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Slide {
    pub(crate) title: String,
    pub(crate) body: Vec<String>,
}

impl Slide {
    /// Title and body joined with newlines.
    pub(crate) fn text(&self) -> String {
        let mut out = self.title.clone();
        for line in &self.body {
            out.push('\n');
            out.push_str(line);
        }
        out
    }

    /// Case-insensitive substring match over title and body.
    pub(crate) fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.text().to_lowercase().contains(&needle)
    }

    /// The first `http://` or `https://` link on the slide.
    pub(crate) fn first_url(&self) -> Option<&str> {
        std::iter::once(&self.title)
            .chain(&self.body)
            .flat_map(|line| line.split_whitespace())
            .find(|word| word.starts_with("http://") || word.starts_with("https://"))
    }
}

/// A parsed, unlocked deck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Deck {
    slides: Vec<Slide>,
}

impl Deck {
    /// Reads and parses the deck at `path`.
    pub(crate) fn load(path: &Path, password: Option<&str>) -> Result<Self, DeckError> {
        let text = std::fs::read_to_string(path).map_err(|source| DeckError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text, password)
    }

    pub(crate) fn parse(text: &str, password: Option<&str>) -> Result<Self, DeckError> {
        let mut lines = text.lines().peekable();
        if let Some(secret) = lines
            .peek()
            .copied()
            .and_then(|first| first.strip_prefix(PASSWORD_PREFIX))
        {
            if password != Some(secret.trim()) {
                return Err(DeckError::BadPassword);
            }
            lines.next();
        }

        let mut slides = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in lines {
            if line.trim_end() == SEPARATOR {
                slides.extend(Self::slide(&current));
                current.clear();
            } else {
                current.push(line);
            }
        }
        slides.extend(Self::slide(&current));

        if slides.is_empty() {
            return Err(DeckError::Empty);
        }
        Ok(Self { slides })
    }

    /// Builds a slide from its raw lines, or `None` if they are all blank.
    fn slide(lines: &[&str]) -> Option<Slide> {
        let start = lines.iter().position(|line| !line.trim().is_empty())?;
        let end = lines.iter().rposition(|line| !line.trim().is_empty())?;
        let title = lines[start].trim().to_owned();
        let body = lines[start + 1..=end]
            .iter()
            .map(|line| line.trim_end().to_owned())
            .collect();
        Some(Slide { title, body })
    }

    pub(crate) fn len(&self) -> usize {
        self.slides.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// The next slide after `from` (wrapping) that contains `needle`.
    pub(crate) fn find_from(&self, from: usize, needle: &str) -> Option<usize> {
        let n = self.slides.len();
        (1..=n)
            .map(|offset| (from + offset) % n)
            .find(|&i| self.slides[i].contains(needle))
    }
}
