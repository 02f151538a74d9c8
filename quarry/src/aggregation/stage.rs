use std::collections::BTreeMap;

use crate::collection::{Document, Projection};
use crate::common::stream::{DocumentStream, FilteredStream, PagedStream, ProjectedStream, SortedStream};
use crate::common::{SortableFields, Value, DOC_ID, FIELD_SEPARATOR, OPERATOR_PREFIX};
use crate::errors::{invalid_spec, ErrorKind, QuarryError, QuarryResult};
use crate::filter::Filter;

use super::accumulator::AccumulatorState;
use super::{Accumulator, Expression};

/// `$group`: one output document per distinct key, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStage {
    id: Expression,
    accumulators: Vec<(String, Accumulator)>,
}

impl GroupStage {
    pub fn new(id: Expression) -> Self {
        GroupStage {
            id,
            accumulators: Vec::new(),
        }
    }

    pub fn accumulate(mut self, field_name: &str, accumulator: Accumulator) -> Self {
        self.accumulators.push((field_name.to_string(), accumulator));
        self
    }

    fn parse(spec: &Document) -> QuarryResult<GroupStage> {
        let id = spec
            .get(DOC_ID)
            .ok_or_else(|| invalid_spec("$group requires an _id key expression"))?;

        let mut stage = GroupStage::new(Expression::parse(id)?);
        for (field_name, accumulator) in spec.iter() {
            if field_name != DOC_ID {
                stage = stage.accumulate(field_name, Accumulator::parse(accumulator)?);
            }
        }
        Ok(stage)
    }

    fn validate(&self) -> QuarryResult<()> {
        for (i, (field_name, _)) in self.accumulators.iter().enumerate() {
            validate_output_name("$group", field_name)?;
            if field_name == DOC_ID || self.accumulators[..i].iter().any(|(f, _)| f == field_name) {
                return Err(invalid_spec(&format!(
                    "$group output field '{}' is defined twice",
                    field_name
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, documents: Vec<Document>) -> Vec<Document> {
        let mut positions: BTreeMap<Value, usize> = BTreeMap::new();
        let mut groups: Vec<(Value, Vec<AccumulatorState>)> = Vec::new();

        for document in &documents {
            let key = self.id.evaluate(document);
            let position = match positions.get(&key) {
                Some(position) => *position,
                None => {
                    let states = self.accumulators.iter().map(|(_, acc)| acc.start()).collect();
                    positions.insert(key.clone(), groups.len());
                    groups.push((key, states));
                    groups.len() - 1
                }
            };

            let (_, states) = &mut groups[position];
            for ((_, accumulator), state) in self.accumulators.iter().zip(states.iter_mut()) {
                accumulator.accumulate(state, document);
            }
        }

        log::debug!("Grouped {} document(s) into {} group(s)", documents.len(), groups.len());
        groups
            .into_iter()
            .map(|(key, states)| {
                let mut output = Document::new();
                output.insert(DOC_ID, key);
                for ((field_name, _), state) in self.accumulators.iter().zip(states) {
                    output.insert(field_name.clone(), state.finish());
                }
                output
            })
            .collect()
    }
}

/// `$unwind`: one output document per element of an array field.
#[derive(Debug, Clone, PartialEq)]
pub struct UnwindStage {
    path: String,
    include_array_index: Option<String>,
    preserve_null_and_empty_arrays: bool,
}

impl UnwindStage {
    pub fn new(path: &str) -> Self {
        UnwindStage {
            path: path.trim_start_matches(OPERATOR_PREFIX).to_string(),
            include_array_index: None,
            preserve_null_and_empty_arrays: false,
        }
    }

    pub fn include_array_index(mut self, field_name: &str) -> Self {
        self.include_array_index = Some(field_name.to_string());
        self
    }

    pub fn preserve_null_and_empty_arrays(mut self, preserve: bool) -> Self {
        self.preserve_null_and_empty_arrays = preserve;
        self
    }

    fn parse(spec: &Value) -> QuarryResult<UnwindStage> {
        match spec {
            Value::String(path) => UnwindStage::parse_path(path),
            Value::Document(options) => {
                let mut stage = match options.get("path") {
                    Some(Value::String(path)) => UnwindStage::parse_path(path)?,
                    _ => return Err(invalid_spec("$unwind requires a string path")),
                };
                for (key, value) in options.iter() {
                    match (key.as_str(), value) {
                        ("path", _) => {}
                        ("includeArrayIndex", Value::String(name)) => {
                            stage = stage.include_array_index(name);
                        }
                        ("preserveNullAndEmptyArrays", Value::Bool(preserve)) => {
                            stage = stage.preserve_null_and_empty_arrays(*preserve);
                        }
                        _ => {
                            return Err(invalid_spec(&format!(
                                "Invalid $unwind option {}: {}",
                                key, value
                            )))
                        }
                    }
                }
                Ok(stage)
            }
            _ => Err(invalid_spec(&format!(
                "$unwind expects a field path or a document, found {}",
                spec
            ))),
        }
    }

    fn parse_path(path: &str) -> QuarryResult<UnwindStage> {
        if !path.starts_with(OPERATOR_PREFIX) {
            return Err(invalid_spec(&format!(
                "$unwind path must be prefixed with '$', found '{}'",
                path
            )));
        }
        Ok(UnwindStage::new(path))
    }

    fn validate(&self) -> QuarryResult<()> {
        validate_output_name("$unwind", &self.path)?;
        if let Some(index_field) = &self.include_array_index {
            validate_output_name("$unwind", index_field)?;
        }
        Ok(())
    }

    fn execute(&self, document: Document) -> Vec<QuarryResult<Document>> {
        let value = document.get(&self.path).cloned();
        match value {
            Some(Value::Array(items)) if !items.is_empty() => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    let mut unwound = document.clone();
                    unwound.put(&self.path, item)?;
                    if let Some(index_field) = &self.include_array_index {
                        unwound.put(index_field, Value::I64(i as i64))?;
                    }
                    Ok(unwound)
                })
                .collect(),
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                if !self.preserve_null_and_empty_arrays {
                    return Vec::new();
                }
                let mut preserved = document;
                if let Some(Value::Array(_)) = preserved.get(&self.path) {
                    preserved.remove(&self.path);
                }
                if let Some(index_field) = &self.include_array_index {
                    if let Err(e) = preserved.put(index_field, Value::Null) {
                        return vec![Err(e)];
                    }
                }
                vec![Ok(preserved)]
            }
            Some(_) => {
                let mut single = document;
                if let Some(index_field) = &self.include_array_index {
                    if let Err(e) = single.put(index_field, Value::Null) {
                        return vec![Err(e)];
                    }
                }
                vec![Ok(single)]
            }
        }
    }
}

/// One step of an aggregation [Pipeline](super::Pipeline).
#[derive(Debug, Clone)]
pub enum Stage {
    /// `$match`
    Match(Filter),
    /// `$addFields`, also accepted as `$set`
    AddFields(Vec<(String, Expression)>),
    /// `$project`
    Project(Projection),
    /// `$group`
    Group(GroupStage),
    /// `$sort`
    Sort(SortableFields),
    /// `$skip`
    Skip(u64),
    /// `$limit`, which must be positive
    Limit(u64),
    /// `$count`: a single document holding the number of inputs
    Count(String),
    /// `$unwind`
    Unwind(UnwindStage),
}

impl Stage {
    /// Parses a stage document such as `{$limit: 5}`.
    ///
    /// Fails with `UnknownStage` for an unrecognized tag and with
    /// `InvalidSpecification` for malformed parameters.
    pub fn from_spec(spec: &Document) -> QuarryResult<Stage> {
        if spec.size() != 1 {
            return Err(invalid_spec(&format!(
                "A pipeline stage must have exactly one key, found {}",
                spec
            )));
        }
        let Some((tag, operand)) = spec.iter().next() else {
            return Err(invalid_spec("Empty pipeline stage"));
        };

        let stage = match tag.as_str() {
            "$match" => Stage::Match(Filter::from_spec(stage_document(tag, operand)?)?),
            "$addFields" | "$set" => {
                let fields = stage_document(tag, operand)?;
                let mut expressions = Vec::with_capacity(fields.size());
                for (field_name, expression) in fields.iter() {
                    expressions.push((field_name.clone(), Expression::parse(expression)?));
                }
                Stage::AddFields(expressions)
            }
            "$project" => Stage::Project(Projection::from_spec(stage_document(tag, operand)?)?),
            "$group" => Stage::Group(GroupStage::parse(stage_document(tag, operand)?)?),
            "$sort" => Stage::Sort(SortableFields::from_spec(stage_document(tag, operand)?)?),
            "$skip" => Stage::Skip(non_negative(tag, operand)?),
            "$limit" => Stage::Limit(non_negative(tag, operand)?),
            "$count" => match operand {
                Value::String(name) => Stage::Count(name.clone()),
                _ => return Err(invalid_spec("$count expects a field name")),
            },
            "$unwind" => Stage::Unwind(UnwindStage::parse(operand)?),
            _ => {
                log::error!("Unknown pipeline stage {}", tag);
                return Err(QuarryError::new(
                    &format!("Unknown pipeline stage {}", tag),
                    ErrorKind::UnknownStage,
                ));
            }
        };

        stage.validate()?;
        Ok(stage)
    }

    /// Checks stages that were built directly instead of parsed.
    pub fn validate(&self) -> QuarryResult<()> {
        match self {
            Stage::AddFields(fields) => {
                if fields.is_empty() {
                    return Err(invalid_spec("$addFields requires at least one field"));
                }
                for (field_name, _) in fields {
                    validate_output_name("$addFields", field_name)?;
                }
                Ok(())
            }
            Stage::Group(group) => group.validate(),
            Stage::Sort(fields) if fields.is_empty() => {
                Err(invalid_spec("$sort requires at least one field"))
            }
            Stage::Limit(0) => Err(invalid_spec("$limit must be positive")),
            Stage::Count(name) => {
                validate_output_name("$count", name)?;
                if name.contains(FIELD_SEPARATOR) {
                    return Err(invalid_spec(&format!(
                        "$count field name cannot contain '{}'",
                        FIELD_SEPARATOR
                    )));
                }
                Ok(())
            }
            Stage::Unwind(unwind) => unwind.validate(),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::AddFields(_) => "$addFields",
            Stage::Project(_) => "$project",
            Stage::Group(_) => "$group",
            Stage::Sort(_) => "$sort",
            Stage::Skip(_) => "$skip",
            Stage::Limit(_) => "$limit",
            Stage::Count(_) => "$count",
            Stage::Unwind(_) => "$unwind",
        }
    }

    /// Chains the stage onto a stream. Blocking stages read their whole
    /// input on first pull.
    pub(crate) fn apply(&self, input: DocumentStream) -> DocumentStream {
        match self {
            Stage::Match(filter) => Box::new(FilteredStream::new(input, filter.clone())),
            Stage::AddFields(fields) => {
                let fields = fields.clone();
                Box::new(input.map(move |item| {
                    let mut document = item?;
                    let computed: Vec<(String, Value)> = fields
                        .iter()
                        .map(|(name, expr)| (name.clone(), expr.evaluate(&document)))
                        .collect();
                    for (name, value) in computed {
                        document.put(&name, value)?;
                    }
                    Ok(document)
                }))
            }
            Stage::Project(projection) => {
                Box::new(ProjectedStream::new(input, projection.clone()))
            }
            Stage::Group(group) => {
                let group = group.clone();
                materialize_with(input, move |documents| group.execute(documents))
            }
            Stage::Sort(fields) => Box::new(SortedStream::new(
                input,
                fields.sorting_order().to_vec(),
                None,
            )),
            Stage::Skip(skip) => Box::new(PagedStream::new(input, Some(*skip), None)),
            Stage::Limit(limit) => Box::new(PagedStream::new(input, None, Some(*limit))),
            Stage::Count(name) => {
                let name = name.clone();
                materialize_with(input, move |documents| {
                    if documents.is_empty() {
                        return Vec::new();
                    }
                    let mut count = Document::new();
                    count.insert(name, Value::I64(documents.len() as i64));
                    vec![count]
                })
            }
            Stage::Unwind(unwind) => {
                let unwind = unwind.clone();
                Box::new(input.flat_map(move |item| match item {
                    Ok(document) => unwind.execute(document),
                    Err(e) => vec![Err(e)],
                }))
            }
        }
    }
}

fn stage_document<'a>(tag: &str, operand: &'a Value) -> QuarryResult<&'a Document> {
    operand
        .as_document()
        .ok_or_else(|| invalid_spec(&format!("{} expects a document, found {}", tag, operand)))
}

fn non_negative(tag: &str, operand: &Value) -> QuarryResult<u64> {
    operand
        .as_i64()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| {
            invalid_spec(&format!(
                "{} expects a non-negative integer, found {}",
                tag, operand
            ))
        })
}

fn validate_output_name(stage: &str, name: &str) -> QuarryResult<()> {
    if name.is_empty()
        || name
            .split(FIELD_SEPARATOR)
            .any(|segment| segment.is_empty() || segment.starts_with(OPERATOR_PREFIX))
    {
        return Err(invalid_spec(&format!(
            "Invalid field name '{}' in {}",
            name, stage
        )));
    }
    Ok(())
}

/// Defers `transform` over the whole input until the first item is pulled.
/// An input error is reported instead of any output.
fn materialize_with<F>(input: DocumentStream, transform: F) -> DocumentStream
where
    F: FnOnce(Vec<Document>) -> Vec<Document> + 'static,
{
    let mut pending = Some((input, transform));
    let mut output = Vec::new().into_iter();
    Box::new(std::iter::from_fn(move || {
        if let Some((input, transform)) = pending.take() {
            match input.collect::<QuarryResult<Vec<Document>>>() {
                Ok(documents) => output = transform(documents).into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
        output.next().map(Ok)
    }))
}
