use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};
use crate::utils::is_markup;

/// Whether any or all of the search terms must match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Any,
    All,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Any => "any",
            SearchMode::All => "all",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any" => Ok(SearchMode::Any),
            "all" => Ok(SearchMode::All),
            other => Err(ValidationError::InvalidSearchMode(other.to_string())),
        }
    }
}

/// Query parameters sent along with a search request.
///
/// Parameters left unset are not sent. OData system parameters (`count`,
/// `filter`, `orderby`, `select`, `top`, `skip`) go out with a `$` prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    count: Option<bool>,
    filter: Option<String>,
    orderby: Option<String>,
    select: Option<String>,
    search_fields: Option<String>,
    facets: Option<Vec<String>>,
    highlight: Option<String>,
    highlight_pre_tag: Option<String>,
    highlight_post_tag: Option<String>,
    scoring_profile: Option<String>,
    scoring_parameters: Option<Vec<String>>,
    top: Option<u32>,
    skip: Option<u32>,
    search_mode: Option<SearchMode>,
    minimum_coverage: Option<f64>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the total count of matching documents
    pub fn include_count(mut self, val: bool) -> Self {
        self.count = Some(val);
        self
    }

    /// Structured search expression in OData syntax
    pub fn filter(mut self, val: impl Into<String>) -> Self {
        self.filter = Some(val.into());
        self
    }

    /// Comma-separated expressions to sort the results by
    pub fn order_by(mut self, val: impl Into<String>) -> Self {
        self.orderby = Some(val.into());
        self
    }

    /// Comma-separated fields to retrieve
    pub fn select(mut self, val: impl Into<String>) -> Self {
        self.select = Some(val.into());
        self
    }

    /// Comma-separated field names the search text is matched against
    pub fn search_fields(mut self, val: impl Into<String>) -> Self {
        self.search_fields = Some(val.into());
        self
    }

    /// Fields to facet by; each one becomes a separate `facet` parameter
    pub fn facets<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Comma-separated field names used for hit highlights
    pub fn highlight(mut self, val: impl Into<String>) -> Self {
        self.highlight = Some(val.into());
        self
    }

    /// Tag prepended to hit highlights (service default `<em>`)
    pub fn highlight_pre_tag(mut self, tag: impl Into<String>) -> Result<Self> {
        self.highlight_pre_tag = Some(markup_tag("highlight_pre_tag", tag.into())?);
        Ok(self)
    }

    /// Tag appended to hit highlights (service default `</em>`)
    pub fn highlight_post_tag(mut self, tag: impl Into<String>) -> Result<Self> {
        self.highlight_post_tag = Some(markup_tag("highlight_post_tag", tag.into())?);
        Ok(self)
    }

    pub fn scoring_profile(mut self, profile: impl Into<String>) -> Self {
        self.scoring_profile = Some(profile.into());
        self
    }

    /// Values for the parameters of the scoring functions, e.g. `"mylocation--122.2,44.8"`
    pub fn scoring_parameters<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scoring_parameters = Some(params.into_iter().map(Into::into).collect());
        self
    }

    /// Number of results to retrieve (service default 50)
    pub fn top(mut self, val: u32) -> Self {
        self.top = Some(val);
        self
    }

    /// Number of results to skip, for paging
    pub fn skip(mut self, val: u32) -> Self {
        self.skip = Some(val);
        self
    }

    /// Whether any or all of the search terms must match
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = Some(mode);
        self
    }

    /// Percentage of the index a query must cover to succeed, within [0, 100]
    pub fn minimum_coverage(mut self, val: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&val) {
            return Err(ValidationError::OutOfRange {
                name: "minimum_coverage",
                min: 0.0,
                max: 100.0,
                value: val,
            });
        }
        self.minimum_coverage = Some(val);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Query parameters in the order they are sent.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();

        put(&mut map, "$count", self.count.map(Value::Bool));
        put(&mut map, "$filter", self.filter.clone().map(Value::from));
        put(&mut map, "$orderby", self.orderby.clone().map(Value::from));
        put(&mut map, "$select", self.select.clone().map(Value::from));
        put(&mut map, "searchFields", self.search_fields.clone().map(Value::from));
        put(&mut map, "facet", self.facets.clone().map(Value::from));
        put(&mut map, "highlight", self.highlight.clone().map(Value::from));
        put(&mut map, "highlightPreTag", self.highlight_pre_tag.clone().map(Value::from));
        put(&mut map, "highlightPostTag", self.highlight_post_tag.clone().map(Value::from));
        put(&mut map, "scoringProfile", self.scoring_profile.clone().map(Value::from));
        put(&mut map, "scoringParameter", self.scoring_parameters.clone().map(Value::from));
        put(&mut map, "$top", self.top.map(Value::from));
        put(&mut map, "$skip", self.skip.map(Value::from));
        put(&mut map, "searchMode", self.search_mode.map(|m| Value::from(m.as_str())));
        put(&mut map, "minimumCoverage", self.minimum_coverage.map(Value::from));

        map
    }
}

fn put(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

fn markup_tag(name: &'static str, tag: String) -> Result<String> {
    if is_markup(&tag) {
        Ok(tag)
    } else {
        Err(ValidationError::InvalidMarkup { name, value: tag })
    }
}
