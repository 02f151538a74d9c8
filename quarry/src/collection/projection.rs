use std::fmt::Display;

use crate::collection::Document;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR, OPERATOR_PREFIX};
use crate::errors::{invalid_spec, QuarryResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProjectionMode {
    Include,
    Exclude,
}

/// Selects which fields of a document are emitted.
///
/// A projection either includes the listed field paths or excludes them;
/// the two can not be mixed except for `_id`, which is emitted unless it is
/// explicitly excluded. Emitted fields keep the order of the source
/// document, whatever order the projection lists them in.
///
/// ```rust
/// use quarry::collection::Projection;
/// use quarry::doc;
///
/// let projection = Projection::from_spec(&doc! { price: 1, title: 1, _id: 0 }).unwrap();
/// let book = doc! { title: "Dune", author: "Herbert", price: 9 };
/// assert_eq!(projection.apply(&book), doc! { title: "Dune", price: 9 });
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    mode: ProjectionMode,
    fields: Vec<String>,
    include_id: bool,
}

impl Projection {
    pub fn from_spec(spec: &Document) -> QuarryResult<Projection> {
        let mut include_id = true;
        let mut mode = None;
        let mut fields = Vec::with_capacity(spec.size());

        for (field_name, flag) in spec.iter() {
            if field_name.is_empty()
                || field_name.starts_with(OPERATOR_PREFIX)
                || field_name.split(FIELD_SEPARATOR).any(str::is_empty)
            {
                return Err(invalid_spec(&format!("Invalid projection field '{}'", field_name)));
            }

            let include = match flag {
                Value::Bool(include) => *include,
                other => match other.as_i64() {
                    Some(1) => true,
                    Some(0) => false,
                    _ => {
                        return Err(invalid_spec(&format!(
                            "Projection of '{}' must be 1, 0, true or false, found {}",
                            field_name, other
                        )))
                    }
                },
            };

            if field_name == DOC_ID {
                include_id = include;
                continue;
            }

            let field_mode = if include {
                ProjectionMode::Include
            } else {
                ProjectionMode::Exclude
            };
            match mode {
                Some(existing) if existing != field_mode => {
                    return Err(invalid_spec(
                        "Projection cannot mix inclusion and exclusion of fields other than _id",
                    ));
                }
                _ => mode = Some(field_mode),
            }
            fields.push(field_name.clone());
        }

        let mode = match mode {
            Some(mode) => mode,
            // only _id listed: {_id: 1} keeps just the id, {_id: 0} keeps everything else
            None if include_id && !spec.is_empty() => ProjectionMode::Include,
            None => ProjectionMode::Exclude,
        };

        Ok(Projection {
            mode,
            fields,
            include_id,
        })
    }

    /// Projects one document.
    pub fn apply(&self, document: &Document) -> Document {
        let paths: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        let mut result = project(document, &paths, self.mode);

        if !self.include_id {
            result.remove(DOC_ID);
        } else if self.mode == ProjectionMode::Include {
            if let Some(id) = document.get(DOC_ID) {
                let mut with_id = Document::new();
                with_id.insert(DOC_ID, id.clone());
                for (key, value) in result {
                    if key != DOC_ID {
                        with_id.insert(key, value);
                    }
                }
                return with_id;
            }
        }
        result
    }
}

/// Splits `paths` into whole-field matches on `key` and the sub-paths below
/// `key`.
fn paths_below<'a>(paths: &[&'a str], key: &str) -> (bool, Vec<&'a str>) {
    let mut whole = false;
    let mut nested = Vec::new();
    for path in paths {
        if *path == key {
            whole = true;
        } else if let Some(rest) = path
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(FIELD_SEPARATOR))
        {
            nested.push(rest);
        }
    }
    (whole, nested)
}

fn project(document: &Document, paths: &[&str], mode: ProjectionMode) -> Document {
    let mut result = Document::new();
    for (key, value) in document.iter() {
        let (whole, nested) = paths_below(paths, key);
        match mode {
            ProjectionMode::Include => {
                if whole {
                    result.insert(key.clone(), value.clone());
                } else if !nested.is_empty() {
                    if let Value::Document(inner) = value {
                        result.insert(key.clone(), project(inner, &nested, mode));
                    }
                }
            }
            ProjectionMode::Exclude => {
                if whole {
                    continue;
                }
                match value {
                    Value::Document(inner) if !nested.is_empty() => {
                        result.insert(key.clone(), project(inner, &nested, mode));
                    }
                    _ => {
                        result.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }
    result
}

impl Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = match self.mode {
            ProjectionMode::Include => 1,
            ProjectionMode::Exclude => 0,
        };
        write!(f, "{{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field, flag)?;
        }
        if !self.include_id {
            if !self.fields.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{}: 0", DOC_ID)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::RecordId;
    use crate::doc;
    use crate::errors::ErrorKind;

    fn stored_book() -> Document {
        doc! {
            title: "Dune",
            author: { name: "Frank Herbert", born: 1920 },
            price: 9.5,
            published_year: 1965,
        }
        .with_id(RecordId::from_raw(1).unwrap())
    }

    #[test]
    fn inclusion_keeps_source_order_and_id() {
        let projection = Projection::from_spec(&doc! { price: 1, title: 1 }).unwrap();
        let projected = projection.apply(&stored_book());
        let keys: Vec<&String> = projected.keys().collect();
        assert_eq!(keys, vec!["_id", "title", "price"]);
    }

    #[test]
    fn inclusion_with_id_excluded() {
        let projection = Projection::from_spec(&doc! { title: 1, author: 1, price: 1, _id: 0 }).unwrap();
        let projected = projection.apply(&stored_book());
        assert_eq!(
            projected,
            doc! { title: "Dune", author: { name: "Frank Herbert", born: 1920 }, price: 9.5 }
        );
    }

    #[test]
    fn exclusion_removes_listed_fields() {
        let projection = Projection::from_spec(&doc! { price: 0, "author.born": 0 }).unwrap();
        let projected = projection.apply(&stored_book());
        assert!(projected.has_id());
        assert_eq!(projected.get("author"), Some(&Value::Document(doc! { name: "Frank Herbert" })));
        assert_eq!(projected.get("price"), None);
        assert_eq!(projected.get("published_year"), Some(&Value::from(1965)));
    }

    #[test]
    fn nested_inclusion() {
        let projection = Projection::from_spec(&doc! { "author.name": true, _id: false }).unwrap();
        assert_eq!(
            projection.apply(&stored_book()),
            doc! { author: { name: "Frank Herbert" } }
        );
    }

    #[test]
    fn id_only_specs() {
        let only_id = Projection::from_spec(&doc! { _id: 1 }).unwrap();
        assert_eq!(only_id.apply(&stored_book()).size(), 1);

        let without_id = Projection::from_spec(&doc! { _id: 0 }).unwrap();
        let projected = without_id.apply(&stored_book());
        assert!(!projected.has_id());
        assert_eq!(projected.size(), 4);
    }

    #[test]
    fn missing_fields_are_skipped() {
        let projection = Projection::from_spec(&doc! { isbn: 1, title: 1, _id: 0 }).unwrap();
        assert_eq!(projection.apply(&stored_book()), doc! { title: "Dune" });
    }

    #[test]
    fn rejects_mixed_and_malformed_specs() {
        for spec in [
            doc! { title: 1, price: 0 },
            doc! { title: "yes" },
            doc! { title: 2 },
            doc! { "$title": 1 },
            doc! { "a..b": 1 },
        ] {
            assert_eq!(
                Projection::from_spec(&spec).unwrap_err().kind(),
                &ErrorKind::InvalidSpecification
            );
        }
        assert!(Projection::from_spec(&doc! { title: 1, _id: 0 }).is_ok());
    }

    #[test]
    fn display_round_trips_shape() {
        let projection = Projection::from_spec(&doc! { title: 1, _id: 0 }).unwrap();
        assert_eq!(projection.to_string(), "{title: 1, _id: 0}");
    }
}
