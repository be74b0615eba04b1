use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::organism::Organism;

/// Optional JSON settings for a batch run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchConfig {
    /// Replaces the organism name declared in every input file.
    pub organism_name: Option<String>,
    /// Lineage applied to organisms that have none after parsing a sequence.
    #[serde(default)]
    pub taxonomy: Vec<String>,
    pub threads: Option<usize>,
}

impl BatchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self
            .organism_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            bail!("invalid organismName: must not be blank");
        }
        if self.taxonomy.iter().any(|rank| rank.trim().is_empty()) {
            bail!("invalid taxonomy: ranks must not be blank");
        }
        if self.threads == Some(0) {
            bail!("invalid threads: must be at least 1");
        }
        Ok(())
    }

    /// Per-sequence taxonomy hook: fill the organism's lineage when it has none.
    pub fn apply_taxonomy(&self, organism: &Organism) -> bool {
        organism.set_taxonomy_if_empty(self.taxonomy.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn valid_config_all_fields() {
        let json = r#"{
            "organismName": "Homo sapiens",
            "taxonomy": ["Eukaryota", "Metazoa", "Chordata"],
            "threads": 4
        }"#;
        let f = write_config(json);
        let config = BatchConfig::from_file(f.path()).unwrap();
        assert_eq!(config.organism_name.as_deref(), Some("Homo sapiens"));
        assert_eq!(config.taxonomy.len(), 3);
        assert_eq!(config.threads, Some(4));
    }

    #[test]
    fn empty_object_is_valid() {
        let f = write_config("{}");
        let config = BatchConfig::from_file(f.path()).unwrap();
        assert!(config.organism_name.is_none());
        assert!(config.taxonomy.is_empty());
        assert!(config.threads.is_none());
    }

    #[test]
    fn blank_organism_name() {
        let f = write_config(r#"{ "organismName": "   " }"#);
        let err = BatchConfig::from_file(f.path()).unwrap_err();
        assert!(err.to_string().contains("invalid organismName"));
    }

    #[test]
    fn zero_threads() {
        let f = write_config(r#"{ "threads": 0 }"#);
        let err = BatchConfig::from_file(f.path()).unwrap_err();
        assert!(err.to_string().contains("invalid threads"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let f = write_config(r#"{ "organism": "Homo sapiens" }"#);
        let err = BatchConfig::from_file(f.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn taxonomy_hook_only_fills_empty_lineage() {
        let config = BatchConfig {
            taxonomy: vec!["Eukaryota".to_string()],
            ..Default::default()
        };
        let organism = Organism::new("Homo sapiens");
        assert!(config.apply_taxonomy(&organism));
        assert!(!config.apply_taxonomy(&organism));
        assert_eq!(organism.taxonomy(), vec!["Eukaryota"]);
    }
}
