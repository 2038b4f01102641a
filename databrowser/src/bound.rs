//! Queries bound to a schema snapshot.

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::query::PATH_SEPARATOR;
use crate::{Error, Field, Filter, Query, Schema, SortDirection};

/// A query whose field paths are resolved against a particular schema,
/// starting from a root model.
///
/// All reachable fields are computed once, at construction. A bound query
/// reflects the schema it was bound to; bind again after the schema changes.
#[derive(Debug, Clone)]
pub struct BoundQuery<'a> {
    query: &'a Query,
    root: String,
    schema: &'a Schema,
    all_fields: IndexMap<String, Field<'a>>,
}

impl<'a> BoundQuery<'a> {
    /// Bind the given query to the given schema, with paths relative to the
    /// model with fully-qualified name `root`.
    pub fn new<R: AsRef<str>>(query: &'a Query, root: R, schema: &'a Schema) -> Self {
        let root = root.as_ref().to_string();
        if !schema.contains_model(&root) {
            warn!("Root model {} is not present in the schema", root);
        }
        let mut all_fields = IndexMap::new();
        collect_fields(query, schema, &root, "", &mut Vec::new(), &mut all_fields);
        debug!(
            "Bound query for {}.{} to {} with {} reachable field(s)",
            query.app(),
            query.model(),
            root,
            all_fields.len()
        );
        Self {
            query,
            root,
            schema,
            all_fields,
        }
    }

    /// Bind the given query to the model it names, i.e. `<app>.<model>`.
    pub fn bind(query: &'a Query, schema: &'a Schema) -> Self {
        Self::new(query, format!("{}.{}", query.app(), query.model()), schema)
    }

    pub fn query(&self) -> &'a Query {
        self.query
    }

    /// The fully-qualified name of the model from which paths are resolved.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Resolve a `__`-separated field path to a field.
    ///
    /// Every segment but the last must name a relation on the model reached so
    /// far, and the last segment must name a field on the final model.
    pub fn resolve(&self, path: &str) -> Result<Field<'a>, Error> {
        let unresolved = |model: &str, segment: &str| Error::UnresolvedPath {
            model: model.to_string(),
            path: path.to_string(),
            segment: segment.to_string(),
        };
        let segments = path.split(PATH_SEPARATOR).collect::<Vec<&str>>();
        // `split` always produces at least one segment.
        let (last, relations) = segments
            .split_last()
            .ok_or_else(|| unresolved(&self.root, path))?;

        let mut model_name: &str = &self.root;
        for segment in relations {
            model_name = self
                .schema
                .model(model_name)
                .and_then(|model| model.fk(segment))
                .ok_or_else(|| unresolved(model_name, segment))?;
        }
        let field_type = self
            .schema
            .model(model_name)
            .and_then(|model| model.field(last))
            .ok_or_else(|| unresolved(model_name, last))?;
        trace!("Resolved {} to {} on {}", path, field_type, model_name);
        Ok(Field::new(field_type, path, Some(self.query)))
    }

    /// Every field reachable from the root model, keyed by path.
    ///
    /// A model's own fields come before those reached through its relations.
    pub fn all_fields(&self) -> &IndexMap<String, Field<'a>> {
        &self.all_fields
    }

    /// The paths of the query's fields that resolve, in display order.
    pub fn fields(&self) -> Vec<&'a str> {
        self.query
            .fields()
            .keys()
            .filter(|path| self.resolve(path).is_ok())
            .map(String::as_str)
            .collect()
    }

    /// The paths of the query's fields that resolve to calculated fields, in
    /// display order.
    pub fn calculated_fields(&self) -> Vec<&'a str> {
        self.query
            .fields()
            .keys()
            .filter(|path| matches!(self.resolve(path), Ok(field) if !field.is_concrete()))
            .map(String::as_str)
            .collect()
    }

    /// The query's resolvable fields along with their sort directions, in
    /// display order.
    pub fn sort_fields(&self) -> Vec<(Field<'a>, SortDirection)> {
        self.query
            .fields()
            .iter()
            .filter_map(|(path, direction)| {
                self.resolve(path).ok().map(|field| (field, *direction))
            })
            .collect()
    }

    /// The query's filters whose paths resolve. Each filter retains its
    /// position amongst all of the query's filters.
    pub fn filters(&self) -> Vec<Filter<'a>> {
        self.query
            .filters()
            .iter()
            .enumerate()
            .filter_map(|(index, (path, lookup, value))| {
                self.resolve(path)
                    .ok()
                    .map(|field| Filter::new(index, field, lookup, value))
            })
            .collect()
    }

    /// Confirm that every field and filter path of the query resolves against
    /// the schema, returning the first one that doesn't.
    pub fn check(&self) -> Result<(), Error> {
        let field_paths = self.query.fields().keys();
        let filter_paths = self.query.filters().iter().map(|(path, _, _)| path);
        for path in field_paths.chain(filter_paths) {
            let _ = self.resolve(path)?;
        }
        Ok(())
    }

    /// Whether every path referenced by the query resolves.
    pub fn is_valid(&self) -> bool {
        match self.check() {
            Ok(()) => true,
            Err(e) => {
                debug!("Query {} is not valid: {}", self.query.url(), e);
                false
            }
        }
    }

    /// Whether every path referenced by the query resolves, and every filter
    /// is well-formed.
    pub fn all_valid(&self) -> bool {
        self.is_valid() && self.filters().iter().all(Filter::is_valid)
    }
}

// Relations are followed depth-first. A relation is not followed if its target
// model is already an ancestor of the current model on this branch, which
// bounds the walk on cyclic schemas.
fn collect_fields<'a>(
    query: &'a Query,
    schema: &Schema,
    model_name: &str,
    prefix: &str,
    ancestors: &mut Vec<String>,
    all_fields: &mut IndexMap<String, Field<'a>>,
) {
    let model = match schema.model(model_name) {
        Some(model) => model,
        None => {
            if !prefix.is_empty() {
                warn!(
                    "Relation {} points to unknown model {}",
                    prefix.trim_end_matches(PATH_SEPARATOR),
                    model_name
                );
            }
            return;
        }
    };
    for (name, field_type) in model.fields.iter() {
        let path = format!("{}{}", prefix, name);
        let field = Field::new(*field_type, &path, Some(query));
        all_fields.insert(path, field);
    }
    for (relation, target) in model.fks.iter() {
        if ancestors.contains(target) {
            trace!("Not following {}{} back to {}", prefix, relation, target);
            continue;
        }
        let relation_prefix = format!("{}{}{}", prefix, relation, PATH_SEPARATOR);
        ancestors.push(model_name.to_string());
        collect_fields(query, schema, target, &relation_prefix, ancestors, all_fields);
        let _ = ancestors.pop();
    }
}
