use indexmap::IndexMap;
use scl_syntax::{lex_significant, Token, TokenKind};
use smol_str::SmolStr;

/// Enumeration declared in a `TYPE` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: SmolStr,
    pub members: IndexMap<SmolStr, i32>,
}

impl EnumDef {
    /// Case-insensitive member lookup.
    pub fn ordinal(&self, member: &str) -> Option<i32> {
        self.members
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(member))
            .map(|(_, ordinal)| *ordinal)
    }
}

/// Struct declared in a `TYPE` block; field types are kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: SmolStr,
    pub fields: IndexMap<SmolStr, SmolStr>,
}

impl StructDef {
    pub fn field_type(&self, field: &str) -> Option<&SmolStr> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, ty)| ty)
    }
}

/// Enum and struct declarations discovered in the full source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCatalog {
    enums: IndexMap<SmolStr, EnumDef>,
    structs: IndexMap<SmolStr, StructDef>,
}

fn key(name: &str) -> SmolStr {
    SmolStr::new(name.trim().trim_matches('"').to_ascii_uppercase())
}

impl TypeCatalog {
    /// Scans every `TYPE ... END_TYPE` block. Forms that are not an
    /// enumeration or a struct are skipped.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        let tokens = lex_significant(source);
        let mut catalog = Self::default();
        let mut pos = 0;
        while pos < tokens.len() {
            if tokens[pos].kind == TokenKind::KwType {
                pos = catalog.parse_type_block(&tokens, source, pos + 1);
            } else {
                pos += 1;
            }
        }
        catalog
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(&key(name))
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(&key(name))
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.enums.values()
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.values()
    }

    pub fn insert_enum(&mut self, def: EnumDef) {
        self.enums.insert(key(&def.name), def);
    }

    pub fn insert_struct(&mut self, def: StructDef) {
        self.structs.insert(key(&def.name), def);
    }

    /// Parses one block starting after `TYPE`; returns the position to resume at.
    fn parse_type_block(&mut self, tokens: &[Token], source: &str, mut pos: usize) -> usize {
        let Some(name_token) = tokens.get(pos) else {
            return pos;
        };
        if !matches!(name_token.kind, TokenKind::Ident | TokenKind::QuotedIdent) {
            return pos;
        }
        let name = SmolStr::new(name_token.text(source).trim_matches('"'));
        pos += 1;

        // Siemens exports carry `VERSION : 0.1` between the name and the body.
        if tokens.get(pos).is_some_and(|t| {
            t.kind == TokenKind::Ident && t.text(source).eq_ignore_ascii_case("VERSION")
        }) {
            pos += 3;
        }
        if tokens.get(pos).is_some_and(|t| t.kind == TokenKind::Colon) {
            pos += 1;
        }

        match tokens.get(pos).map(|t| t.kind) {
            Some(TokenKind::LParen) => {
                let (def, next) = parse_enum(name, tokens, source, pos + 1);
                if !def.members.is_empty() {
                    self.insert_enum(def);
                }
                skip_to_end_type(tokens, next)
            }
            Some(TokenKind::KwStruct) => {
                let (def, next) = parse_struct(name, tokens, source, pos + 1);
                if !def.fields.is_empty() {
                    self.insert_struct(def);
                }
                skip_to_end_type(tokens, next)
            }
            _ => skip_to_end_type(tokens, pos),
        }
    }
}

fn skip_to_end_type(tokens: &[Token], mut pos: usize) -> usize {
    while pos < tokens.len() {
        match tokens[pos].kind {
            TokenKind::KwEndType => return pos + 1,
            // A new TYPE keyword means this block was never closed.
            TokenKind::KwType => return pos,
            _ => pos += 1,
        }
    }
    pos
}

fn parse_enum(name: SmolStr, tokens: &[Token], source: &str, mut pos: usize) -> (EnumDef, usize) {
    let mut members = IndexMap::new();
    let mut next_ordinal = 0i32;
    while let Some(token) = tokens.get(pos) {
        match token.kind {
            TokenKind::RParen => {
                pos += 1;
                break;
            }
            TokenKind::Ident => {
                let member = SmolStr::new(token.text(source));
                pos += 1;
                let mut ordinal = next_ordinal;
                if tokens.get(pos).is_some_and(|t| t.kind == TokenKind::Assign) {
                    let negative = tokens.get(pos + 1).is_some_and(|t| t.kind == TokenKind::Minus);
                    let literal = pos + 1 + usize::from(negative);
                    if let Some(value) = tokens
                        .get(literal)
                        .filter(|t| t.kind == TokenKind::IntLiteral)
                        .and_then(|t| super::parse_integer_literal(t.text(source)))
                        .and_then(|v| i32::try_from(v).ok())
                    {
                        ordinal = if negative { -value } else { value };
                    }
                    pos = literal + 1;
                }
                members.insert(member, ordinal);
                next_ordinal = ordinal.saturating_add(1);
            }
            TokenKind::KwEndType => break,
            _ => pos += 1,
        }
    }
    (EnumDef { name, members }, pos)
}

fn parse_struct(
    name: SmolStr,
    tokens: &[Token],
    source: &str,
    mut pos: usize,
) -> (StructDef, usize) {
    let mut fields = IndexMap::new();
    while let Some(token) = tokens.get(pos) {
        match token.kind {
            TokenKind::KwEndStruct => {
                pos += 1;
                break;
            }
            TokenKind::KwEndType => break,
            TokenKind::Ident | TokenKind::QuotedIdent
                if tokens.get(pos + 1).is_some_and(|t| t.kind == TokenKind::Colon) =>
            {
                let field = SmolStr::new(token.text(source).trim_matches('"'));
                let type_start = pos + 2;
                let mut end = type_start;
                while let Some(t) = tokens.get(end) {
                    if matches!(
                        t.kind,
                        TokenKind::Semicolon
                            | TokenKind::Assign
                            | TokenKind::KwEndStruct
                            | TokenKind::KwEndType
                    ) {
                        break;
                    }
                    end += 1;
                }
                if end > type_start {
                    let start = usize::from(tokens[type_start].range.start());
                    let stop = usize::from(tokens[end - 1].range.end());
                    let type_text = source[start..stop].trim();
                    fields.insert(field, SmolStr::new(type_text));
                }
                pos = end;
                while tokens
                    .get(pos)
                    .is_some_and(|t| !matches!(t.kind, TokenKind::Semicolon | TokenKind::KwEndStruct | TokenKind::KwEndType))
                {
                    pos += 1;
                }
                if tokens.get(pos).is_some_and(|t| t.kind == TokenKind::Semicolon) {
                    pos += 1;
                }
            }
            _ => pos += 1,
        }
    }
    (StructDef { name, fields }, pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: &str = r#"
TYPE Color : (Red, Green := 5, Blue) END_TYPE

TYPE "UDT_Motor"
VERSION : 0.1
   STRUCT
      speed : Real;
      running : Bool := TRUE;
      history : Array[0..3] of Int;
   END_STRUCT;
END_TYPE

TYPE Alias : INT; END_TYPE
"#;

    #[test]
    fn enum_ordinals_continue_from_explicit_values() {
        let catalog = TypeCatalog::from_source(TYPES);
        let color = catalog.enum_def("color").expect("enum");
        assert_eq!(color.ordinal("Red"), Some(0));
        assert_eq!(color.ordinal("GREEN"), Some(5));
        assert_eq!(color.ordinal("Blue"), Some(6));
        assert_eq!(color.ordinal("Black"), None);
    }

    #[test]
    fn siemens_struct_with_version_header() {
        let catalog = TypeCatalog::from_source(TYPES);
        let motor = catalog.struct_def("\"UDT_Motor\"").expect("struct");
        assert_eq!(motor.name, "UDT_Motor");
        let fields: Vec<_> = motor
            .fields
            .iter()
            .map(|(name, ty)| format!("{name}:{ty}"))
            .collect();
        assert_eq!(
            fields,
            vec!["speed:Real", "running:Bool", "history:Array[0..3] of Int"]
        );
    }

    #[test]
    fn unrecognized_declarations_are_skipped() {
        let catalog = TypeCatalog::from_source(TYPES);
        assert!(catalog.enum_def("Alias").is_none());
        assert!(catalog.struct_def("Alias").is_none());
        assert_eq!(catalog.enums().count(), 1);
        assert_eq!(catalog.structs().count(), 1);
    }
}
