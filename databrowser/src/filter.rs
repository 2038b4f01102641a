use crate::{Field, Literal, LookupError, Query};

/// A filter whose field path has been resolved against a schema.
///
/// Whether the filter's lookup and value are well-formed for its field is
/// determined once, at construction.
#[derive(Debug, Clone)]
pub struct Filter<'q> {
    index: usize,
    field: Field<'q>,
    lookup: String,
    value: String,
    parsed: Result<Literal, LookupError>,
}

impl<'q> Filter<'q> {
    /// Constructor. An empty lookup is replaced by the default lookup of the
    /// field's kind.
    pub fn new<L, V>(index: usize, field: Field<'q>, lookup: L, value: V) -> Self
    where
        L: AsRef<str>,
        V: AsRef<str>,
    {
        let lookup = match lookup.as_ref() {
            "" => field.default_lookup().unwrap_or_default(),
            lookup => lookup,
        }
        .to_string();
        let value = value.as_ref().to_string();
        let parsed = field.check(&lookup, &value);
        Self {
            index,
            field,
            lookup,
            value,
            parsed,
        }
    }

    /// The position of this filter amongst the filters of the original query.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn field(&self) -> &Field<'q> {
        &self.field
    }

    pub fn path(&self) -> &str {
        self.field.path()
    }

    pub fn lookup(&self) -> &str {
        &self.lookup
    }

    /// The raw, unparsed value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn query(&self) -> Option<&'q Query> {
        self.field.query()
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }

    /// Why this filter is not well-formed, if it isn't.
    pub fn error(&self) -> Option<&LookupError> {
        self.parsed.as_ref().err()
    }

    pub fn err_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    /// The value parsed for this filter's lookup, if the filter is valid.
    pub fn parsed(&self) -> Option<&Literal> {
        self.parsed.as_ref().ok()
    }
}

impl<'q> PartialEq for Filter<'q> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.lookup == other.lookup && self.value == other.value
    }
}
