//! Execution context: the memory map of one simulated unit.

#![allow(missing_docs)]

mod path;

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

pub use path::{PathSegment, VarPath};

use crate::error::SimError;
use crate::stdlib::helpers::{coerce, value_type};
use crate::value::{default_value, parse_with_hint, DataType, TypeCatalog, Value};

/// Program organization unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Function,
    FunctionBlock,
    Program,
    OrganizationBlock,
}

impl UnitKind {
    /// Parses `FUNCTION`, `FUNCTION_BLOCK`/`FB`, `PROGRAM`,
    /// `ORGANIZATION_BLOCK`/`OB` in any case.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "FUNCTION" | "FC" => Some(UnitKind::Function),
            "FUNCTION_BLOCK" | "FB" => Some(UnitKind::FunctionBlock),
            "PROGRAM" => Some(UnitKind::Program),
            "ORGANIZATION_BLOCK" | "OB" => Some(UnitKind::OrganizationBlock),
            _ => None,
        }
    }

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            UnitKind::Function => "FUNCTION",
            UnitKind::FunctionBlock => "FUNCTION_BLOCK",
            UnitKind::Program => "PROGRAM",
            UnitKind::OrganizationBlock => "ORGANIZATION_BLOCK",
        }
    }

    /// Functions keep no memory between calls.
    #[must_use]
    pub fn is_stateless(self) -> bool {
        self == UnitKind::Function
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Declaration section a variable comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
    InOut,
    Static,
    Temp,
    Constant,
    Member,
}

impl Direction {
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "input" | "in" | "var_input" => Some(Direction::Input),
            "output" | "out" | "var_output" => Some(Direction::Output),
            "inout" | "in_out" | "var_in_out" => Some(Direction::InOut),
            "static" | "stat" | "var" | "var_stat" => Some(Direction::Static),
            "temp" | "var_temp" => Some(Direction::Temp),
            "constant" | "var_constant" => Some(Direction::Constant),
            "member" => Some(Direction::Member),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Direction::Input => "Input",
            Direction::Output => "Output",
            Direction::InOut => "InOut",
            Direction::Static => "Static",
            Direction::Temp => "Temp",
            Direction::Constant => "Constant",
            Direction::Member => "Member",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the parsed interface list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: SmolStr,
    pub type_name: SmolStr,
    pub direction: Direction,
    pub initial: SmolStr,
    pub comment: SmolStr,
}

impl VariableDecl {
    pub fn new(
        name: impl Into<SmolStr>,
        type_name: impl Into<SmolStr>,
        direction: Direction,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            direction,
            initial: SmolStr::default(),
            comment: SmolStr::default(),
        }
    }

    #[must_use]
    pub fn with_initial(mut self, initial: impl Into<SmolStr>) -> Self {
        self.initial = initial.into();
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<SmolStr>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// A declared variable and its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryTag {
    pub name: SmolStr,
    pub type_name: SmolStr,
    pub data_type: DataType,
    pub direction: Direction,
    pub initial: SmolStr,
    pub comment: SmolStr,
    pub value: Value,
}

/// Flattened row for a watch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRow {
    pub name: String,
    pub type_name: String,
    pub direction: Direction,
    pub value: String,
}

/// Numeric sample of one flattened signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSample {
    pub name: String,
    pub value: f64,
    pub digital: bool,
}

/// Memory of one simulated unit plus the types declared alongside it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    unit_name: SmolStr,
    kind: UnitKind,
    tags: IndexMap<SmolStr, MemoryTag>,
    catalog: TypeCatalog,
}

fn key(name: &str) -> SmolStr {
    SmolStr::new(name.trim().trim_matches('"').to_ascii_uppercase())
}

impl ExecutionContext {
    /// Builds the context, discovering enum and struct types in `source`.
    pub fn new(
        unit_name: impl Into<SmolStr>,
        kind: UnitKind,
        decls: &[VariableDecl],
        source: &str,
    ) -> Self {
        Self::with_catalog(unit_name, kind, decls, TypeCatalog::from_source(source))
    }

    pub fn with_catalog(
        unit_name: impl Into<SmolStr>,
        kind: UnitKind,
        decls: &[VariableDecl],
        catalog: TypeCatalog,
    ) -> Self {
        let mut tags = IndexMap::new();
        for decl in decls {
            let data_type = DataType::resolve(&decl.type_name, &catalog);
            let value = default_value(&data_type, &decl.initial, &catalog);
            tags.insert(
                key(&decl.name),
                MemoryTag {
                    name: decl.name.clone(),
                    type_name: decl.type_name.clone(),
                    data_type,
                    direction: decl.direction,
                    initial: decl.initial.clone(),
                    comment: decl.comment.clone(),
                    value,
                },
            );
        }
        Self {
            unit_name: unit_name.into(),
            kind,
            tags,
            catalog,
        }
    }

    #[must_use]
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    #[must_use]
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Default value for a declared type string and initializer.
    #[must_use]
    pub fn create_default_value(&self, type_name: &str, initial: &str) -> Value {
        let data_type = DataType::resolve(type_name, &self.catalog);
        default_value(&data_type, initial, &self.catalog)
    }

    /// Reinitializes Temp and Output tags of a stateless unit. Other unit
    /// kinds keep all values between scans.
    pub fn prepare_for_next_scan(&mut self) {
        if !self.kind.is_stateless() {
            return;
        }
        let catalog = &self.catalog;
        for tag in self.tags.values_mut() {
            if matches!(tag.direction, Direction::Temp | Direction::Output) {
                tag.value = default_value(&tag.data_type, "", catalog);
            }
        }
    }

    /// Restores every tag to its declared initial value.
    pub fn reset(&mut self) {
        let catalog = &self.catalog;
        for tag in self.tags.values_mut() {
            tag.value = default_value(&tag.data_type, &tag.initial, catalog);
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &MemoryTag> {
        self.tags.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&MemoryTag> {
        self.tags.get(&key(name))
    }

    pub fn tag_mut(&mut self, name: &str) -> Option<&mut MemoryTag> {
        self.tags.get_mut(&key(name))
    }

    /// Position of a tag in declaration order; stable for the context's life.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.tags.get_index_of(&key(name))
    }

    #[must_use]
    pub fn tag_at(&self, slot: usize) -> Option<&MemoryTag> {
        self.tags.get_index(slot).map(|(_, tag)| tag)
    }

    pub fn value_at_mut(&mut self, slot: usize) -> Option<&mut Value> {
        self.tags.get_index_mut(slot).map(|(_, tag)| &mut tag.value)
    }

    /// Reads a scalar, element, field or function block member.
    pub fn read_path(&self, path: &str) -> Result<Value, SimError> {
        let parsed = VarPath::parse(path)?;
        let tag = self
            .tag(&parsed.root)
            .ok_or_else(|| SimError::UnknownVariable(parsed.root.clone()))?;
        let last = parsed.segments.len();
        let mut current = &tag.value;
        for (pos, segment) in parsed.segments.iter().enumerate() {
            current = match (current, segment) {
                (Value::Array(array), PathSegment::Index(index)) => array.get(*index)?,
                (Value::Struct(record), PathSegment::Field(field)) => {
                    record.field(field).ok_or_else(|| invalid(&parsed))?
                }
                (Value::Instance(instance), PathSegment::Field(member)) if pos + 1 == last => {
                    return instance.get(member).ok_or_else(|| invalid(&parsed));
                }
                _ => return Err(invalid(&parsed)),
            };
        }
        Ok(current.clone())
    }

    /// Writes a scalar location, converting `value` to the stored shape.
    /// Function block inputs are writable; outputs are not.
    pub fn write_path(&mut self, path: &str, value: Value) -> Result<(), SimError> {
        let parsed = VarPath::parse(path)?;
        let tag = self
            .tags
            .get_mut(&key(&parsed.root))
            .ok_or_else(|| SimError::UnknownVariable(parsed.root.clone()))?;
        let last = parsed.segments.len();
        let mut current = &mut tag.value;
        for (pos, segment) in parsed.segments.iter().enumerate() {
            current = match (current, segment) {
                (Value::Array(array), PathSegment::Index(index)) => array.get_mut(*index)?,
                (Value::Struct(record), PathSegment::Field(field)) => {
                    record.field_mut(field).ok_or_else(|| invalid(&parsed))?
                }
                (Value::Instance(instance), PathSegment::Field(member)) if pos + 1 == last => {
                    instance.set_input(member, &value)?;
                    return Ok(());
                }
                _ => return Err(invalid(&parsed)),
            };
        }
        let target = value_type(current).ok_or_else(|| invalid(&parsed))?;
        *current = coerce(&value, &target)?;
        Ok(())
    }

    /// Parses `text` using the addressed location's current value as the
    /// type hint, writes it, and returns the stored value. Enum-typed tags
    /// also accept member names.
    pub fn write_path_text(&mut self, path: &str, text: &str) -> Result<Value, SimError> {
        let parsed = VarPath::parse(path)?;
        let hint = self.read_path(path)?;
        let mut value = parse_with_hint(text, &hint);
        if parsed.segments.is_empty() {
            if let Some(DataType::Enum(name)) = self.tag(&parsed.root).map(|tag| &tag.data_type) {
                let member = text.trim();
                let member = member.rsplit('#').next().unwrap_or(member);
                if let Some(ordinal) = self
                    .catalog
                    .enum_def(name)
                    .and_then(|def| def.ordinal(member))
                {
                    value = Value::Int(ordinal);
                }
            }
        }
        self.write_path(path, value)?;
        self.read_path(path)
    }

    /// Flattened display values of every non-input, non-member scalar.
    #[must_use]
    pub fn snapshot(&self) -> IndexMap<String, String> {
        let mut snapshot = IndexMap::new();
        for tag in self.tags.values() {
            if matches!(tag.direction, Direction::Input | Direction::Member) {
                continue;
            }
            flatten(tag.name.to_string(), &tag.value, &mut |name: String, value: &Value| {
                if value.is_scalar() {
                    snapshot.insert(name, value.display());
                }
            });
        }
        snapshot
    }

    /// Every non-member location, including function block members.
    #[must_use]
    pub fn watch_rows(&self) -> Vec<WatchRow> {
        let mut rows = Vec::new();
        for tag in self.tags.values() {
            if tag.direction == Direction::Member {
                continue;
            }
            flatten(tag.name.to_string(), &tag.value, &mut |name: String, value: &Value| match value {
                Value::Instance(instance) => {
                    for param in instance.kind().params() {
                        if let Some(member) = instance.get(param.name) {
                            rows.push(WatchRow {
                                name: format!("{name}.{}", param.name),
                                type_name: param.ty.data_type().to_string(),
                                direction: tag.direction,
                                value: member.display(),
                            });
                        }
                    }
                }
                scalar => {
                    let type_name = value_type(scalar)
                        .map(|ty| ty.to_string())
                        .unwrap_or_default();
                    rows.push(WatchRow {
                        name,
                        type_name,
                        direction: tag.direction,
                        value: scalar.display(),
                    });
                }
            });
        }
        rows
    }

    /// Numeric samples of every non-member signal; strings and function
    /// blocks are not charted.
    #[must_use]
    pub fn signal_samples(&self) -> Vec<SignalSample> {
        let mut samples = Vec::new();
        for tag in self.tags.values() {
            if tag.direction == Direction::Member {
                continue;
            }
            flatten(tag.name.to_string(), &tag.value, &mut |name: String, value: &Value| {
                if matches!(value, Value::String(_) | Value::Instance(_)) {
                    return;
                }
                if let Some(number) = value.as_f64() {
                    samples.push(SignalSample {
                        name,
                        value: number,
                        digital: matches!(value, Value::Bool(_)),
                    });
                }
            });
        }
        samples
    }
}

fn invalid(path: &VarPath) -> SimError {
    SimError::InvalidPath(SmolStr::new(path.to_string()))
}

/// Visits leaves, naming array elements by declared index and struct fields
/// with a dot.
fn flatten(name: String, value: &Value, visit: &mut dyn FnMut(String, &Value)) {
    match value {
        Value::Array(array) => {
            for (index, element) in array.indexed() {
                flatten(format!("{name}[{index}]"), element, visit);
            }
        }
        Value::Struct(record) => {
            for (field, inner) in &record.fields {
                flatten(format!("{name}.{field}"), inner, visit);
            }
        }
        leaf => visit(name, leaf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(kind: UnitKind) -> ExecutionContext {
        let decls = [
            VariableDecl::new("Start", "Bool", Direction::Input),
            VariableDecl::new("Count", "Int", Direction::Output).with_initial("5"),
            VariableDecl::new("Scratch", "Real", Direction::Temp).with_initial("1.5"),
            VariableDecl::new("Total", "DInt", Direction::Static).with_initial("7"),
        ];
        ExecutionContext::new("Unit", kind, &decls, "")
    }

    #[test]
    fn stateless_units_reset_temp_and_output() {
        let mut ctx = context(UnitKind::Function);
        assert_eq!(ctx.read_path("Count").unwrap(), Value::Int(5));
        ctx.prepare_for_next_scan();
        assert_eq!(ctx.read_path("count").unwrap(), Value::Int(0));
        assert_eq!(ctx.read_path("Scratch").unwrap(), Value::Real(0.0));
        assert_eq!(ctx.read_path("Total").unwrap(), Value::Int(7));
    }

    #[test]
    fn stateful_units_keep_values() {
        let mut ctx = context(UnitKind::FunctionBlock);
        ctx.write_path("Count", Value::Int(9)).unwrap();
        ctx.prepare_for_next_scan();
        assert_eq!(ctx.read_path("Count").unwrap(), Value::Int(9));
        ctx.reset();
        assert_eq!(ctx.read_path("Count").unwrap(), Value::Int(5));
    }

    #[test]
    fn writes_convert_to_stored_shape() {
        let mut ctx = context(UnitKind::Program);
        ctx.write_path("Scratch", Value::Int(2)).unwrap();
        assert_eq!(ctx.read_path("Scratch").unwrap(), Value::Real(2.0));
        assert_eq!(
            ctx.write_path_text("Start", "1").unwrap(),
            Value::Bool(true)
        );
        assert!(matches!(
            ctx.read_path("Missing"),
            Err(SimError::UnknownVariable(name)) if name == "Missing"
        ));
    }

    #[test]
    fn snapshot_skips_inputs() {
        let ctx = context(UnitKind::Program);
        let keys: Vec<_> = ctx.snapshot().keys().cloned().collect();
        assert_eq!(keys, vec!["Count", "Scratch", "Total"]);
    }
}
