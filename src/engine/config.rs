//! Search-time options. Every field has a sane default so a caller can
//! start from `SearchOptions::default()` and override only what matters.

use std::collections::HashMap;

use crate::error::{Result, SylvanError};
use crate::index::traversal::TraversalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortBy {
    Score,
    Field(String),
}

/// Everything a single `search` call can be asked to do.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub fuzzy: bool,
    pub max_distance: u32,
    pub prefix_match: bool,
    pub fields: Vec<String>,
    pub boost: HashMap<String, f64>,
    pub max_results: usize,
    pub threshold: f64,
    pub min_score: f64,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: usize,
    pub page_size: usize,
    pub regex: Option<String>,
    pub regex_config: TraversalConfig,
    pub case_sensitive: bool,
    pub include_matches: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fuzzy: false,
            max_distance: 2,
            prefix_match: false,
            fields: Vec::new(),
            boost: HashMap::new(),
            max_results: 10,
            // A fraction of the result set's max score, not an absolute
            // cutoff, so this is safe to default away from zero even
            // though the underlying scorer isn't normalized to [0, 1].
            threshold: 0.5,
            min_score: 0.0,
            sort_by: SortBy::Score,
            sort_order: SortOrder::Descending,
            page: 1,
            page_size: 10,
            regex: None,
            regex_config: TraversalConfig::default(),
            case_sensitive: false,
            include_matches: false,
        }
    }
}

impl SearchOptions {
    pub fn builder() -> SearchOptionsBuilder {
        SearchOptionsBuilder::default()
    }

    /// Rejects option combinations that don't make sense: a zero page size,
    /// an out-of-[0,1] threshold, a max_distance so large fuzzy matching
    /// becomes meaningless, or a regex paired with fuzzy/prefix matching
    /// (the two query modes are mutually exclusive).
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(SylvanError::invalid_options("max_results must be greater than zero"));
        }
        if self.page == 0 || self.page_size == 0 {
            return Err(SylvanError::invalid_options("page and page_size must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SylvanError::invalid_options("threshold must be between 0.0 and 1.0"));
        }
        if self.min_score < 0.0 {
            return Err(SylvanError::invalid_options("min_score must not be negative"));
        }
        if self.max_distance > 8 {
            return Err(SylvanError::invalid_options("max_distance greater than 8 is not supported"));
        }
        if self.regex.is_some() && (self.fuzzy || self.prefix_match) {
            return Err(SylvanError::invalid_options(
                "regex cannot be combined with fuzzy or prefix matching",
            ));
        }
        if self.fields.iter().any(|f| f.is_empty()) {
            return Err(SylvanError::invalid_options("fields must not contain an empty name"));
        }
        Ok(())
    }
}

/// Consuming builder for [`SearchOptions`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptionsBuilder {
    options: SearchOptions,
}

impl SearchOptionsBuilder {
    pub fn fuzzy(mut self, max_distance: u32) -> Self {
        self.options.fuzzy = true;
        self.options.max_distance = max_distance;
        self
    }

    pub fn prefix_match(mut self, enabled: bool) -> Self {
        self.options.prefix_match = enabled;
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.options.fields = fields;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.options.max_results = max_results;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.options.threshold = threshold;
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.options.min_score = min_score;
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.options.page = page;
        self.options.page_size = page_size;
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.options.regex = Some(pattern.into());
        self
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.options.case_sensitive = enabled;
        self
    }

    pub fn include_matches(mut self, enabled: bool) -> Self {
        self.options.include_matches = enabled;
        self
    }

    pub fn build(self) -> SearchOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(SearchOptions::default().validate().is_ok());
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let options = SearchOptions::builder().threshold(1.5).build();
        assert!(options.validate().is_err());
    }

    #[test]
    fn rejects_regex_combined_with_fuzzy() {
        let options = SearchOptions::builder().regex("a+").fuzzy(1).build();
        assert!(options.validate().is_err());
    }

    #[test]
    fn builder_sets_requested_fields() {
        let options = SearchOptions::builder().fields(vec!["title".into()]).build();
        assert_eq!(options.fields, vec!["title".to_string()]);
    }
}
