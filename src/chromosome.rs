//! Chromosome registry entries.

use serde::Serialize;

/// Chromosome of an organism. Owned by the store registry; the organism is
/// referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chromosome {
    pub name: String,
    pub organism: String,
}

impl Chromosome {
    #[must_use]
    pub fn new(name: &str, organism: &str) -> Self {
        Self {
            name: name.to_string(),
            organism: organism.to_string(),
        }
    }

    /// Unplaced/unknown scaffolds are named `Un...`/`unknown...` by the assemblies.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.name.to_lowercase().starts_with("unk")
    }
}

/// Chromosome name derived from a `chr<NAME>.gbk` file name.
#[must_use]
pub fn name_from_file_name(file_name: &str) -> Option<&str> {
    let pos = file_name.find("chr")?;
    let rest = &file_name[pos + 3..];
    let ext = rest.rfind("gbk")?;
    // one arbitrary separator character precedes the extension
    let name_end = ext.checked_sub(1)?;
    if !rest.is_char_boundary(name_end) {
        return None;
    }
    Some(&rest[..name_end]).filter(|name| !name.is_empty())
}
