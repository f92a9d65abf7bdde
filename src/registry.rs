//! Topic registry configuration
//!
//! The registry declares the Topics of interest, the title words recognized
//! as section headers, and the knobs for ML cluster gating. It loads from a
//! TOML file in the user config directory and falls back to compiled
//! defaults. The derived [`TitleRegistry`] holds the expanded title-alias set
//! and compiled patterns; it is built once at startup and passed around by
//! reference.

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Registry configuration for one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    /// Topic names in summarization priority order.
    pub priority_topics: Vec<String>,
    /// Lowercase title words expanded into the canonical title-alias set
    /// (case variants, optional trailing colon).
    pub title_words: Vec<String>,
    /// Titles added to the alias set verbatim, no variant expansion.
    pub static_titles: Vec<String>,
    /// Per-topic header patterns checked against a completed section header,
    /// for topics whose headers are too irregular for the alias set.
    pub specific_titles: BTreeMap<String, Vec<String>>,
    /// Name of the canonical Period-of-Performance Topic.
    pub pop_topic: String,
    /// Minimum confidence score for a cluster match whose self-named cluster
    /// is not the top-ranked one.
    pub cluster_cutoff_score: f64,
    /// Attach every cluster match regardless of rank and score.
    pub add_all_clusters: bool,
    /// Sentence-count cutoff for the summary input assembly.
    pub summary_sentence_cutoff: usize,
    /// Lines matching any of these patterns are skipped entirely during the
    /// scan (conversion-service artifacts).
    pub skip_line_patterns: Vec<String>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut specific_titles = BTreeMap::new();
        specific_titles.insert(
            "GENERAL:".to_string(),
            vec![r"general information".to_string()],
        );
        specific_titles.insert(
            "DOCUMENT REQUIREMENTS:".to_string(),
            vec![r"^\s*\d*\.?\s*general\s*:?\s*$".to_string()],
        );

        Registry {
            priority_topics: vec![
                "GENERAL:".to_string(),
                "DOCUMENT REQUIREMENTS:".to_string(),
                "REFILL REQUIREMENTS:".to_string(),
                "INDICATIONS:".to_string(),
            ],
            title_words: vec![
                "refill requirements".to_string(),
                "indications".to_string(),
            ],
            static_titles: vec![
                "Period of Performance".to_string(),
                "Scope of Work".to_string(),
            ],
            specific_titles,
            pop_topic: "PERIOD OF PERFORMANCE:".to_string(),
            cluster_cutoff_score: 0.0,
            add_all_clusters: false,
            summary_sentence_cutoff: 10,
            skip_line_patterns: vec!["Created on".to_string()],
        }
    }
}

impl Registry {
    /// Load registry config from an explicit path, else the config directory,
    /// else compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let content = fs::read_to_string(path)?;
            let registry: Registry = toml::from_str(&content)?;
            return Ok(registry);
        }

        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                let content = fs::read_to_string(&config_path)?;
                let registry: Registry = toml::from_str(&content)?;
                return Ok(registry);
            }
        }

        // Return default registry if no config found
        Ok(Registry::default())
    }

    /// Save registry config to the config directory.
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let content = toml::to_string_pretty(self)?;
            fs::write(&config_path, content)?;
        }

        Ok(())
    }

    /// Get the path to the registry config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("popx").join("registry.toml"))
    }

    /// Build the compiled scan-time companion of this config.
    pub fn title_registry(&self) -> Result<TitleRegistry> {
        TitleRegistry::from_config(self)
    }
}

/// Expanded title aliases plus compiled header patterns, built once from a
/// [`Registry`] and passed by reference through the scan.
#[derive(Debug)]
pub struct TitleRegistry {
    aliases: Vec<String>,
    specific_titles: Vec<(String, Vec<Regex>)>,
    skip_patterns: Vec<Regex>,
    pop_topic: String,
}

impl TitleRegistry {
    pub fn from_config(config: &Registry) -> Result<Self> {
        let mut aliases: Vec<String> = config.static_titles.clone();
        for title in &config.title_words {
            let capitalized = capitalize(title);

            push_unique(&mut aliases, title.to_uppercase());
            push_unique(&mut aliases, title_case(title));
            // check to see if the title-cased version is the same as the
            // capitalized version before adding both colon variants
            if !aliases.contains(&capitalized) {
                push_unique(&mut aliases, format!("{capitalized}:"));
                push_unique(&mut aliases, capitalized);
            }

            push_unique(&mut aliases, format!("{}:", title.to_uppercase()));
            push_unique(&mut aliases, format!("{}:", title_case(title)));
        }

        let mut specific_titles = Vec::new();
        for (topic, patterns) in &config.specific_titles {
            let mut compiled = Vec::new();
            for pattern in patterns {
                compiled.push(
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()?,
                );
            }
            specific_titles.push((topic.clone(), compiled));
        }

        let mut skip_patterns = Vec::new();
        for pattern in &config.skip_line_patterns {
            skip_patterns.push(Regex::new(pattern)?);
        }

        Ok(TitleRegistry {
            aliases,
            specific_titles,
            skip_patterns,
            pop_topic: config.pop_topic.clone(),
        })
    }

    /// Whether a matched string is a canonical section title.
    pub fn is_canonical_title(&self, matched: &str) -> bool {
        self.aliases.iter().any(|alias| alias == matched)
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub(crate) fn specific_titles(&self) -> &[(String, Vec<Regex>)] {
        &self.specific_titles
    }

    pub(crate) fn should_skip_line(&self, text: &str) -> bool {
        self.skip_patterns.iter().any(|re| re.is_match(text))
    }

    pub fn pop_topic(&self) -> &str {
        &self.pop_topic
    }
}

fn push_unique(aliases: &mut Vec<String>, alias: String) {
    if !aliases.contains(&alias) {
        aliases.push(alias);
    }
}

/// First character uppercased, the rest lowercased.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Every whitespace-separated word capitalized.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_alias_expansion() {
        let registry = Registry::default();
        let titles = registry.title_registry().unwrap();

        // static titles come through verbatim
        assert!(titles.is_canonical_title("Period of Performance"));
        assert!(titles.is_canonical_title("Scope of Work"));

        // configured words expand into case and colon variants
        assert!(titles.is_canonical_title("REFILL REQUIREMENTS"));
        assert!(titles.is_canonical_title("REFILL REQUIREMENTS:"));
        assert!(titles.is_canonical_title("Refill Requirements"));
        assert!(titles.is_canonical_title("Refill Requirements:"));
        assert!(titles.is_canonical_title("Refill requirements"));
        assert!(titles.is_canonical_title("Refill requirements:"));

        // the raw lowercase form is not an alias
        assert!(!titles.is_canonical_title("refill requirements"));
    }

    #[test]
    fn test_single_word_title_variants_collapse() {
        let registry = Registry::default();
        let titles = registry.title_registry().unwrap();

        // "indications": Title Case and Capitalized coincide, so the alias
        // set stays free of duplicates but keeps both colon forms
        assert!(titles.is_canonical_title("INDICATIONS"));
        assert!(titles.is_canonical_title("INDICATIONS:"));
        assert!(titles.is_canonical_title("Indications"));
        assert!(titles.is_canonical_title("Indications:"));
        let indications = titles
            .aliases()
            .iter()
            .filter(|a| a.as_str() == "Indications")
            .count();
        assert_eq!(indications, 1);
    }

    #[test]
    fn test_registry_defaults_round_trip_toml() {
        let registry = Registry::default();
        let serialized = toml::to_string_pretty(&registry).unwrap();
        let parsed: Registry = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.priority_topics, registry.priority_topics);
        assert_eq!(parsed.pop_topic, registry.pop_topic);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Registry = toml::from_str(r#"pop_topic = "POP:""#).unwrap();
        assert_eq!(parsed.pop_topic, "POP:");
        assert_eq!(
            parsed.priority_topics,
            Registry::default().priority_topics
        );
    }
}
