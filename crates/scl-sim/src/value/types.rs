use std::fmt;

use smol_str::SmolStr;

use crate::stdlib::fbs::FbKind;

use super::TypeCatalog;

/// Declared type of a variable, resolved from its type text.
///
/// Every elementary type the simulator does not model separately lowers to
/// `Int` (INT, DINT, WORD, TIME, ...). Array elements are always scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Bool,
    Int,
    Real,
    String,
    /// DATE, TIME_OF_DAY and DATE_AND_TIME as 100 ns ticks.
    Ticks,
    Array {
        lower: i64,
        upper: i64,
        element: Box<DataType>,
    },
    Struct(SmolStr),
    Enum(SmolStr),
    Fb(FbKind),
}

impl DataType {
    /// Resolves a declared type string against the standard function blocks,
    /// the array pattern and the catalog, in that order.
    #[must_use]
    pub fn resolve(text: &str, catalog: &TypeCatalog) -> Self {
        let cleaned = clean_type_name(text);
        let upper = cleaned.to_ascii_uppercase();

        if let Some(kind) = FbKind::from_name(&upper) {
            return DataType::Fb(kind);
        }
        if let Some((lower, upper_bound, element)) = parse_array_type(&upper) {
            return DataType::Array {
                lower,
                upper: upper_bound,
                element: Box::new(Self::lower_element(element)),
            };
        }
        if let Some(def) = catalog.struct_def(&cleaned) {
            return DataType::Struct(def.name.clone());
        }
        if let Some(def) = catalog.enum_def(&cleaned) {
            return DataType::Enum(def.name.clone());
        }
        Self::elementary(&upper)
    }

    fn elementary(upper: &str) -> Self {
        match upper {
            "BOOL" => DataType::Bool,
            "REAL" | "LREAL" => DataType::Real,
            "STRING" | "WSTRING" | "CHAR" | "WCHAR" => DataType::String,
            "DATE" | "TIME_OF_DAY" | "TOD" | "DATE_AND_TIME" | "DT" => DataType::Ticks,
            text if text.starts_with("STRING[") || text.starts_with("WSTRING[") => {
                DataType::String
            }
            _ => DataType::Int,
        }
    }

    fn lower_element(element: &str) -> Self {
        match element {
            "BOOL" => DataType::Bool,
            "REAL" | "LREAL" => DataType::Real,
            "STRING" | "WSTRING" => DataType::String,
            _ => DataType::Int,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Real | DataType::Ticks | DataType::Enum(_))
    }

    /// Integer-like types share the `Int` runtime representation.
    #[must_use]
    pub fn is_int(&self) -> bool {
        matches!(self, DataType::Int | DataType::Enum(_))
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            DataType::Array { .. } | DataType::Struct(_) | DataType::Fb(_)
        )
    }

    /// Collapses enums to `Int` for operator typing.
    #[must_use]
    pub fn normalized(&self) -> DataType {
        match self {
            DataType::Enum(_) => DataType::Int,
            other => other.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => f.write_str("bool"),
            DataType::Int => f.write_str("int"),
            DataType::Real => f.write_str("float"),
            DataType::String => f.write_str("string"),
            DataType::Ticks => f.write_str("long"),
            DataType::Array { element, .. } => write!(f, "{element}[]"),
            DataType::Struct(name) | DataType::Enum(name) => f.write_str(name),
            DataType::Fb(kind) => f.write_str(kind.name()),
        }
    }
}

/// Strips Siemens symbol quotes and surrounding whitespace.
pub(crate) fn clean_type_name(text: &str) -> String {
    text.trim().trim_matches('"').trim().to_string()
}

/// Parses `ARRAY[lo..hi] OF elem` (already upper-cased). Returns the bounds
/// and the element type name.
fn parse_array_type(upper: &str) -> Option<(i64, i64, &str)> {
    let rest = upper.strip_prefix("ARRAY")?.trim_start();
    let rest = rest.strip_prefix('[')?;
    let close = rest.find(']')?;
    let (range, tail) = rest.split_at(close);
    let (lo, hi) = range.split_once("..")?;
    let lower = lo.trim().parse::<i64>().ok()?;
    let upper_bound = hi.trim().parse::<i64>().ok()?;
    let element = tail[1..].trim_start().strip_prefix("OF")?;
    if !element.starts_with(char::is_whitespace) {
        return None;
    }
    let element = element.trim().trim_matches('"');
    let element = element.split(|c: char| c.is_whitespace() || c == ';').next()?;
    if element.is_empty() {
        return None;
    }
    Some((lower, upper_bound, element))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_elementary_types() {
        let catalog = TypeCatalog::default();
        assert_eq!(DataType::resolve("Bool", &catalog), DataType::Bool);
        assert_eq!(DataType::resolve("LReal", &catalog), DataType::Real);
        assert_eq!(DataType::resolve("String[20]", &catalog), DataType::String);
        assert_eq!(DataType::resolve("Time", &catalog), DataType::Int);
        assert_eq!(DataType::resolve("DTL", &catalog), DataType::Int);
        assert_eq!(DataType::resolve("Date_And_Time", &catalog), DataType::Ticks);
        assert_eq!(DataType::resolve("TON", &catalog), DataType::Fb(FbKind::Ton));
    }

    #[test]
    fn resolves_array_types() {
        let catalog = TypeCatalog::default();
        assert_eq!(
            DataType::resolve("Array[1..5] of Real", &catalog),
            DataType::Array {
                lower: 1,
                upper: 5,
                element: Box::new(DataType::Real)
            }
        );
        assert_eq!(
            DataType::resolve("ARRAY[-2..2] OF \"UDT_X\"", &catalog),
            DataType::Array {
                lower: -2,
                upper: 2,
                element: Box::new(DataType::Int)
            }
        );
        assert_eq!(DataType::resolve("ARRAY[a..b] OF INT", &catalog), DataType::Int);
    }
}
