//! Queries, as requested by users of the data browser.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::url::{
    decode_query_string, encode_query_string, quote_path_segment, quote_segment_part, unquote,
};
use crate::Error;

/// The URL namespace under which queries are served unless configured
/// otherwise.
pub const DEFAULT_NAMESPACE: &str = "data_browser";

/// The separator between the segments of a field path, and between a field
/// path and its lookup in filter parameters.
pub const PATH_SEPARATOR: &str = "__";

/// How the results of a query are to be sorted by a particular field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Ascending,
    Descending,
    /// The field is displayed, but not sorted by.
    #[default]
    Unsorted,
}

impl SortDirection {
    /// The prefix used for this direction in a fields specification.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ascending => "+",
            Self::Descending => "-",
            Self::Unsorted => "",
        }
    }
}

/// A filter exactly as it was requested: a field path, a lookup and an unparsed
/// value.
pub type FilterSpec = (String, String, String);

/// The parameters with which a query is stored as a saved view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveParams {
    pub app: String,
    pub model: String,
    /// The compact fields specification, e.g. `+fa,-fd,fn`.
    pub fields: String,
    /// A JSON object mapping `path__lookup` keys to lists of values.
    pub query: String,
}

/// A structurally parsed, but not yet validated, request for data.
///
/// Queries are immutable once constructed.
#[derive(Debug, Clone)]
pub struct Query {
    app: String,
    model: String,
    fields: IndexMap<String, SortDirection>,
    format: String,
    filters: Vec<FilterSpec>,
}

impl Query {
    /// Constructor.
    pub fn new<A, M, F>(
        app: A,
        model: M,
        fields: IndexMap<String, SortDirection>,
        format: F,
        filters: Vec<FilterSpec>,
    ) -> Self
    where
        A: AsRef<str>,
        M: AsRef<str>,
        F: AsRef<str>,
    {
        Self {
            app: app.as_ref().to_string(),
            model: model.as_ref().to_string(),
            fields,
            format: format.as_ref().to_string(),
            filters,
        }
    }

    /// Parse a query from the parameters of a request.
    ///
    /// `fields_spec` is a comma-separated list of field paths, each optionally
    /// prefixed by `+` (ascending) or `-` (descending). Each key of
    /// `filter_params` is of the form `path__lookup`, and each of its values
    /// produces one filter.
    pub fn from_request<A, M, S, F, I, K, V>(
        app: A,
        model: M,
        fields_spec: S,
        format: F,
        filter_params: I,
    ) -> Result<Self, Error>
    where
        A: AsRef<str>,
        M: AsRef<str>,
        S: AsRef<str>,
        F: AsRef<str>,
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs = filter_params.into_iter().flat_map(|(key, values)| {
            let key = key.as_ref().to_string();
            values
                .into_iter()
                .map(move |value| (key.clone(), value.as_ref().to_string()))
        });
        Self::from_pairs(app, model, fields_spec, format, pairs)
    }

    fn from_pairs<A, M, S, F, I>(
        app: A,
        model: M,
        fields_spec: S,
        format: F,
        filter_pairs: I,
    ) -> Result<Self, Error>
    where
        A: AsRef<str>,
        M: AsRef<str>,
        S: AsRef<str>,
        F: AsRef<str>,
        I: IntoIterator<Item = (String, String)>,
    {
        let fields = parse_fields_spec(fields_spec.as_ref())?;
        let filters = filter_pairs
            .into_iter()
            .map(|(key, value)| {
                let (path, lookup) = split_filter_key(&key)?;
                Ok((path.to_string(), lookup.to_string(), value))
            })
            .collect::<Result<Vec<FilterSpec>, Error>>()?;
        let query = Self::new(app, model, fields, format, filters);
        debug!(
            "Parsed query for {}.{} with {} field(s) and {} filter(s)",
            query.app,
            query.model,
            query.fields.len(),
            query.filters.len()
        );
        Ok(query)
    }

    /// Parse a query from a URL previously produced by [`Query::url_in`] for
    /// the given namespace.
    ///
    /// The URL may be absolute, i.e. include a scheme and host.
    pub fn from_url<U: AsRef<str>, N: AsRef<str>>(url: U, namespace: N) -> Result<Self, Error> {
        let url = url.as_ref();
        let malformed = |reason: &str| Error::MalformedUrl(url.to_string(), reason.to_string());

        let (path, query_string) = url.split_once('?').unwrap_or((url, ""));
        let path = strip_origin(path);
        let prefix = format!("/{}/query/", namespace.as_ref().trim_matches('/'));
        let rest = path
            .strip_prefix(&prefix)
            .ok_or_else(|| malformed(&format!("path does not start with \"{}\"", prefix)))?;
        let (app, model, last) = match rest.split('/').collect::<Vec<&str>>().as_slice() {
            [app, model, last] => (*app, *model, *last),
            _ => return Err(malformed("expected /<app>/<model>/<fields>.<format>")),
        };
        // Neither the fields nor the format contain an unescaped '.'.
        let (fields_spec, format) = last
            .rsplit_once('.')
            .filter(|(_, format)| !format.is_empty())
            .ok_or_else(|| malformed("missing output format"))?;
        let segments = [app, model, fields_spec, format]
            .iter()
            .map(|segment| unquote(segment, false))
            .collect::<Option<Vec<String>>>()
            .ok_or_else(|| malformed("invalid percent-encoding in path"))?;
        let pairs = decode_query_string(query_string)
            .ok_or_else(|| malformed("invalid percent-encoding in query string"))?;
        Self::from_pairs(&segments[0], &segments[1], &segments[2], &segments[3], pairs)
    }

    /// Parse a query from the parameters of a saved view, to be rendered in
    /// the given format.
    pub fn from_saved<F: AsRef<str>>(params: &SaveParams, format: F) -> Result<Self, Error> {
        let filter_params: IndexMap<String, Vec<String>> = if params.query.trim().is_empty() {
            IndexMap::new()
        } else {
            serde_json::from_str(&params.query)?
        };
        Self::from_request(
            &params.app,
            &params.model,
            &params.fields,
            format,
            filter_params,
        )
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The requested field paths and their sort directions, in display order.
    pub fn fields(&self) -> &IndexMap<String, SortDirection> {
        &self.fields
    }

    /// The output format tag, e.g. `html` or `csv`.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    /// The compact fields specification for this query, e.g. `+fa,-fd,fn`.
    pub fn field_str(&self) -> String {
        self.fields
            .iter()
            .map(|(name, direction)| format!("{}{}", direction.prefix(), name))
            .collect::<Vec<String>>()
            .join(",")
    }

    /// The filters of this query as `(path__lookup, value)` pairs.
    pub fn filter_fields(&self) -> Vec<(String, &str)> {
        self.filters
            .iter()
            .map(|(path, lookup, value)| {
                (format!("{}{}{}", path, PATH_SEPARATOR, lookup), value.as_str())
            })
            .collect()
    }

    /// The URL of this query without its filters.
    pub fn base_url<N: AsRef<str>>(&self, namespace: N) -> String {
        format!(
            "/{}/query/{}/{}/{}.{}",
            namespace.as_ref().trim_matches('/'),
            quote_path_segment(&self.app),
            quote_path_segment(&self.model),
            quote_segment_part(&self.field_str()),
            quote_segment_part(&self.format),
        )
    }

    /// The canonical URL of this query in the given namespace.
    pub fn url_in<N: AsRef<str>>(&self, namespace: N) -> String {
        let base_url = self.base_url(namespace);
        if self.filters.is_empty() {
            return base_url;
        }
        let filter_fields = self.filter_fields();
        let query_string = encode_query_string(
            filter_fields
                .iter()
                .map(|(key, value)| (key.as_str(), *value)),
        );
        format!("{}?{}", base_url, query_string)
    }

    /// The canonical URL of this query in the default namespace.
    pub fn url(&self) -> String {
        self.url_in(DEFAULT_NAMESPACE)
    }

    /// The parameters with which this query is stored as a saved view.
    ///
    /// Filters sharing a key are grouped together, in order of first
    /// appearance.
    pub fn save_params(&self) -> SaveParams {
        let mut grouped: JsonMap<String, JsonValue> = JsonMap::new();
        for (key, value) in self.filter_fields() {
            let entry = grouped
                .entry(key)
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            if let JsonValue::Array(values) = entry {
                values.push(JsonValue::String(value.to_string()));
            }
        }
        SaveParams {
            app: self.app.clone(),
            model: self.model.clone(),
            fields: self.field_str(),
            query: JsonValue::Object(grouped).to_string(),
        }
    }
}

/// Two queries are equal if all of their attributes are equal, including the
/// order of their fields and filters.
impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.app == other.app
            && self.model == other.model
            && self.fields.iter().eq(other.fields.iter())
            && self.format == other.format
            && self.filters == other.filters
    }
}

impl Eq for Query {}

fn parse_fields_spec(spec: &str) -> Result<IndexMap<String, SortDirection>, Error> {
    let mut fields = IndexMap::new();
    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let direction = if token.starts_with('+') {
            SortDirection::Ascending
        } else if token.starts_with('-') {
            SortDirection::Descending
        } else {
            SortDirection::Unsorted
        };
        let name = token.trim_start_matches(|c| c == '+' || c == '-');
        if name.is_empty() {
            return Err(Error::MalformedFieldSpec(token.to_string()));
        }
        fields.insert(name.to_string(), direction);
    }
    Ok(fields)
}

// Drops the scheme and host of an absolute URL, leaving only its path.
fn strip_origin(url: &str) -> &str {
    if url.starts_with('/') {
        return url;
    }
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |start| &rest[start..]),
        None => url,
    }
}

// The lookup is whatever follows the last separator, so that related field
// paths are kept intact.
fn split_filter_key(key: &str) -> Result<(&str, &str), Error> {
    key.rsplit_once(PATH_SEPARATOR)
        .ok_or_else(|| Error::MalformedFilterParam(key.to_string()))
}
