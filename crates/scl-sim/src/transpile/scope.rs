//! Locals of a translated unit: one per memory tag, in declaration order.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::context::{Direction, ExecutionContext};
use crate::value::{DataType, TypeCatalog};

#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: SmolStr,
    pub data_type: DataType,
    pub direction: Direction,
}

/// Every tag is mapped in and out, members included. A local's position is
/// the tag's slot in the context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    entries: Vec<Local>,
    /// Upper-cased name to position.
    index: FxHashMap<SmolStr, usize>,
    catalog: TypeCatalog,
}

impl Locals {
    #[must_use]
    pub fn from_context(ctx: &ExecutionContext) -> Self {
        let entries: Vec<Local> = ctx
            .tags()
            .map(|tag| Local {
                name: tag.name.clone(),
                data_type: tag.data_type.clone(),
                direction: tag.direction,
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(slot, local)| (SmolStr::new(local.name.to_ascii_uppercase()), slot))
            .collect();
        Self {
            entries,
            index,
            catalog: ctx.catalog().clone(),
        }
    }

    /// Case-insensitive lookup; quotes and the `#` prefix are ignored.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(usize, &Local)> {
        let name = name.trim().trim_start_matches('#').trim_matches('"');
        let slot = *self.index.get(name.to_ascii_uppercase().as_str())?;
        self.entries.get(slot).map(|local| (slot, local))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Local> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Declared type of `field` in struct type `type_name`.
    #[must_use]
    pub fn field_type(&self, type_name: &str, field: &str) -> Option<DataType> {
        let def = self.catalog.struct_def(type_name)?;
        let text = def.field_type(field)?;
        Some(DataType::resolve(text, &self.catalog))
    }

    /// Ordinal of a bare enum member name, searched across every declared
    /// enumeration in declaration order.
    #[must_use]
    pub fn enum_member(&self, member: &str) -> Option<(SmolStr, i32)> {
        self.catalog
            .enums()
            .find_map(|def| def.ordinal(member).map(|ordinal| (def.name.clone(), ordinal)))
    }
}
