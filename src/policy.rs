use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

/// Declarative filter rule set, loadable from a JSON file. Missing fields
/// fall back to `Default`, so partial rule files stay valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Exact category matches, case-insensitive.
    pub category_exclusions: Vec<String>,
    /// Regex patterns matched against the raw category.
    pub category_patterns: Vec<String>,
    /// Substrings that force admission past the category pass.
    pub category_whitelist: Vec<String>,
    /// Regex patterns matched against the display name.
    pub name_patterns: Vec<String>,
    /// Substrings matched against the stream address.
    pub address_markers: Vec<String>,
    pub category_pass: bool,
    pub name_pass: bool,
    pub address_pass: bool,
}

impl Default for FilterRules {
    fn default() -> Self {
        FilterRules {
            category_exclusions: Vec::new(),
            category_patterns: Vec::new(),
            category_whitelist: Vec::new(),
            name_patterns: Vec::new(),
            address_markers: Vec::new(),
            category_pass: true,
            name_pass: true,
            address_pass: true,
        }
    }
}

impl FilterRules {
    /// Rule set applied when no rules file is supplied: drops episodic and
    /// on-demand content, keeps linear channels.
    pub fn builtin() -> Self {
        FilterRules {
            category_exclusions: vec![
                "SERIES".to_string(),
                "MOVIES".to_string(),
                "VOD".to_string(),
            ],
            category_patterns: vec![
                r"(?i)\bS\d{1,2}\s?E\d{1,2}\b".to_string(),
                r"\[(?:19|20)\d{2}\]".to_string(),
            ],
            category_whitelist: Vec::new(),
            name_patterns: vec![
                r"\((?:19|20)\d{2}\)".to_string(),
                r"(?i)\bS\d{1,2}\s?E\d{1,2}\b".to_string(),
            ],
            address_markers: vec!["/movie/".to_string(), "/series/".to_string()],
            category_pass: true,
            name_pass: true,
            address_pass: true,
        }
    }
}

/// Which pass rejected an entry. Counted per pass by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Category,
    Name,
    Address,
}

pub struct PolicyFilter {
    exact_categories: Vec<String>,
    category_patterns: Vec<Regex>,
    whitelist: Vec<String>,
    name_patterns: Vec<Regex>,
    address_markers: Vec<String>,
    category_pass: bool,
    name_pass: bool,
    address_pass: bool,
}

impl PolicyFilter {
    /// Compiles the rule set. A bad pattern is an invalid configuration and
    /// fails here, before any entry is processed.
    pub fn compile(rules: &FilterRules) -> Result<Self> {
        Ok(PolicyFilter {
            exact_categories: lowered(&rules.category_exclusions),
            category_patterns: compile_all(&rules.category_patterns, "category")?,
            whitelist: lowered(&rules.category_whitelist),
            name_patterns: compile_all(&rules.name_patterns, "name")?,
            address_markers: rules.address_markers.clone(),
            category_pass: rules.category_pass,
            name_pass: rules.name_pass,
            address_pass: rules.address_pass,
        })
    }

    /// `None` means admitted. Passes run in category → name → address order;
    /// the whitelist overrides only the category pass.
    pub fn evaluate(
        &self,
        display_name: &str,
        category: Option<&str>,
        address: &str,
    ) -> Option<Rejection> {
        if self.category_pass {
            if let Some(category) = category {
                let folded = category.to_lowercase();
                let whitelisted = self.whitelist.iter().any(|w| folded.contains(w));

                if !whitelisted {
                    let excluded = self.exact_categories.iter().any(|c| *c == folded)
                        || self
                            .category_patterns
                            .iter()
                            .any(|re| re.is_match(category));
                    if excluded {
                        return Some(Rejection::Category);
                    }
                }
            }
        }

        if self.name_pass
            && self.name_patterns.iter().any(|re| re.is_match(display_name))
        {
            return Some(Rejection::Name);
        }

        if self.address_pass
            && self.address_markers.iter().any(|m| address.contains(m))
        {
            return Some(Rejection::Address);
        }

        None
    }
}

fn lowered(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn compile_all(sources: &[String], which: &str) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source)
                .with_context(|| format!("Invalid {which} pattern: {source}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    mod passes;
}
