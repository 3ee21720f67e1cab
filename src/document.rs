// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The section/key-value form of a board description, and its conversion
//! from and to INI text.
//!
//! Lexing and rendering of the INI syntax is left to the `rust-ini` crate.
//! A [`Document`] keeps sections and keys in file order, and keeps repeated
//! sections apart, so that the parser can report them.

use std::path::Path;

use ini::Ini;

use crate::Error;

/// A named block of `key=value` entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    /// Creates an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Adds an entry to the section and returns it, for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Adds an entry to the section, replacing any entry with the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of the given key.  Keys are matched
    /// case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the entries of the section, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An ordered list of sections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section and returns the document, for chaining.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Returns an iterator over the sections, in insertion order.
    pub fn sections(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    /// Parses INI text into a document.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let ini = Ini::load_from_str(text)
            .map_err(|e| Error::invalid_config(format!("Malformed INI input: {e}")))?;
        Ok(Self::from_ini(&ini))
    }

    /// Reads and parses the INI file at the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(e) => Error::io(format!("Can't read {}: {e}", path.display())),
            ini::Error::Parse(e) => {
                Error::invalid_config(format!("Malformed INI file {}: {e}", path.display()))
            }
        })?;
        Ok(Self::from_ini(&ini))
    }

    /// Writes the document to the given path as INI text.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        self.to_ini()
            .write_to_file(path)
            .map_err(|e| Error::io(format!("Can't write {}: {e}", path.display())))
    }

    /// Converts an already lexed INI file into a document.
    ///
    /// Entries that precede the first section header belong to no node and
    /// are dropped.
    pub fn from_ini(ini: &Ini) -> Self {
        let mut document = Document::new();
        for (name, properties) in ini.iter() {
            let Some(name) = name else {
                if properties.iter().next().is_some() {
                    tracing::warn!("Ignoring keys outside of any section.");
                }
                continue;
            };
            let mut section = Section::new(name);
            for (key, value) in properties.iter() {
                section.entries.push((key.to_string(), value.to_string()));
            }
            document.push(section);
        }
        document
    }

    /// Converts the document into a `rust-ini` value, for writing.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for section in &self.sections {
            let mut setter = ini.with_section(Some(section.name.as_str()));
            for (key, value) in &section.entries {
                setter.set(key.as_str(), value.as_str());
            }
        }
        ini
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = Vec::new();
        self.to_ini()
            .write_to(&mut buf)
            .map_err(|_| std::fmt::Error)?;
        write!(f, "{}", String::from_utf8_lossy(&buf))
    }
}
