//! Recursive-descent parser from the body's token stream to [`Stmt`]s.
//!
//! Expressions use Pratt parsing with the lexer's binding powers. Errors
//! never stop the parse: the offending statement becomes
//! [`StmtKind::Invalid`] and parsing resumes after the next `;`.

use scl_syntax::{LineIndex, Token, TokenKind};
use smol_str::SmolStr;

use crate::value::{
    parse_date_and_time_literal, parse_date_literal, parse_duration_ms, parse_integer_literal,
    parse_time_of_day_literal, TypeCatalog,
};

use super::ast::{Access, Arg, BinaryOp, CaseArm, CaseLabel, Expr, Place, Stmt, StmtKind, UnaryOp};

type ParseResult<T> = Result<T, SmolStr>;

/// Deepest combined statement and expression nesting the parser descends
/// into. Anything deeper becomes an invalid statement.
pub(crate) const MAX_NESTING: usize = 128;

pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    lines: &'a LineIndex,
    catalog: &'a TypeCatalog,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        source: &'a str,
        tokens: &'a [Token],
        lines: &'a LineIndex,
        catalog: &'a TypeCatalog,
    ) -> Self {
        Self {
            source,
            tokens,
            lines,
            catalog,
            pos: 0,
            depth: 0,
        }
    }

    /// Parses every statement in the token slice.
    pub(crate) fn parse_body(mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        while !self.at_end() {
            if self.current().ends_block() {
                let line = self.line();
                let text = self.current_text().to_string();
                self.bump();
                body.push(Stmt::new(line, StmtKind::Invalid(format!("unexpected '{text}'").into())));
                continue;
            }
            if let Some(stmt) = self.parse_statement() {
                body.push(stmt);
            }
        }
        body
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    fn current(&self) -> TokenKind {
        self.peek_kind_n(0)
    }

    fn peek_kind_n(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Error, |token| token.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        !self.at_end() && self.current() == kind
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn current_text(&self) -> &'a str {
        self.tokens
            .get(self.pos)
            .map_or("", |token| token.text(self.source))
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| self.lines.line(token.range.start()))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else if self.at_end() {
            Err(format!("expected {what}, found end of body").into())
        } else {
            Err(format!("expected {what}, found '{}'", self.current_text()).into())
        }
    }

    /// Skips to just after the next `;`, stopping early at a block keyword.
    /// Always consumes at least one token unless already at a block end.
    fn recover_statement(&mut self, start: usize) {
        if self.pos == start && !self.at_end() && !self.current().ends_block() {
            self.bump();
        }
        while !self.at_end() {
            if self.eat(TokenKind::Semicolon) {
                break;
            }
            if self.current().ends_block() {
                break;
            }
            self.bump();
        }
    }

    /// Runs `parse` one nesting level deeper, failing once [`MAX_NESTING`]
    /// is reached.
    fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(format!("{what} nested too deeply").into());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        while !self.at_end() && !self.current().ends_block() {
            if let Some(stmt) = self.parse_statement() {
                body.push(stmt);
            }
        }
        body
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        let line = self.line();
        let start = self.pos;
        match self.current() {
            TokenKind::KwRegion | TokenKind::KwEndRegion | TokenKind::Semicolon => {
                self.bump();
                return None;
            }
            _ => {}
        }
        let kind = match self.nested("statement", Self::parse_statement_kind) {
            Ok(kind) => kind,
            Err(message) => {
                self.recover_statement(start);
                StmtKind::Invalid(message)
            }
        };
        Some(Stmt::new(line, kind))
    }

    fn parse_statement_kind(&mut self) -> ParseResult<StmtKind> {
        match self.current() {
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwCase => self.parse_case(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwRepeat => self.parse_repeat(),
            TokenKind::KwExit => self.parse_jump(StmtKind::Exit),
            TokenKind::KwContinue => self.parse_jump(StmtKind::Continue),
            TokenKind::KwReturn => self.parse_jump(StmtKind::Return),
            TokenKind::Ident | TokenKind::QuotedIdent | TokenKind::Hash => {
                self.parse_assign_or_call()
            }
            _ => Err(format!("unexpected '{}'", self.current_text()).into()),
        }
    }

    fn parse_jump(&mut self, kind: StmtKind) -> ParseResult<StmtKind> {
        self.bump();
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(kind)
    }

    fn parse_assign_or_call(&mut self) -> ParseResult<StmtKind> {
        let target = self.parse_place()?;
        if self.eat(TokenKind::Assign) {
            let value = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            return Ok(StmtKind::Assign { target, value });
        }
        if self.at(TokenKind::LParen) {
            let args = self.parse_arg_list()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            return Ok(StmtKind::Call {
                callee: target,
                args,
            });
        }
        Err(format!("expected ':=' or '(', found '{}'", self.current_text()).into())
    }

    fn parse_if(&mut self) -> ParseResult<StmtKind> {
        self.bump();
        let mut branches = Vec::new();
        let cond = self.parse_expression()?;
        self.expect(TokenKind::KwThen, "THEN")?;
        branches.push((cond, self.parse_block()));
        let mut else_body = Vec::new();
        loop {
            if self.eat(TokenKind::KwElsif) {
                let cond = self.parse_expression()?;
                self.expect(TokenKind::KwThen, "THEN")?;
                branches.push((cond, self.parse_block()));
            } else if self.eat(TokenKind::KwElse) {
                else_body = self.parse_block();
            } else {
                break;
            }
        }
        self.expect(TokenKind::KwEndIf, "END_IF")?;
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::If {
            branches,
            else_body,
        })
    }

    fn parse_case(&mut self) -> ParseResult<StmtKind> {
        self.bump();
        let selector = self.parse_expression()?;
        self.expect(TokenKind::KwOf, "OF")?;
        let mut arms = Vec::new();
        let mut else_body = Vec::new();
        loop {
            if self.at_end() || self.at(TokenKind::KwEndCase) {
                break;
            }
            if self.eat(TokenKind::KwElse) {
                self.eat(TokenKind::Colon);
                else_body = self.parse_case_body();
                continue;
            }
            if !self.at_case_label() {
                return Err(format!("expected CASE label, found '{}'", self.current_text()).into());
            }
            let labels = self.parse_case_labels()?;
            let body = self.parse_case_body();
            arms.push(CaseArm { labels, body });
        }
        self.expect(TokenKind::KwEndCase, "END_CASE")?;
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::Case {
            selector,
            arms,
            else_body,
        })
    }

    fn parse_case_body(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        while !self.at_end() && !self.current().ends_block() && !self.at_case_label() {
            if let Some(stmt) = self.parse_statement() {
                body.push(stmt);
            }
        }
        body
    }

    /// A label list is a run of literal-ish tokens ending in `:`.
    fn at_case_label(&self) -> bool {
        let mut n = 0;
        loop {
            match self.peek_kind_n(n) {
                TokenKind::Colon => return n > 0,
                TokenKind::IntLiteral
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::TypedLiteralPrefix
                | TokenKind::Ident
                | TokenKind::QuotedIdent
                | TokenKind::Hash
                | TokenKind::DotDot
                | TokenKind::Comma => n += 1,
                _ => return false,
            }
        }
    }

    fn parse_case_labels(&mut self) -> ParseResult<Vec<CaseLabel>> {
        let mut labels = Vec::new();
        loop {
            let first = self.parse_expression()?;
            if self.eat(TokenKind::DotDot) {
                let last = self.parse_expression()?;
                labels.push(CaseLabel::Range(first, last));
            } else {
                labels.push(CaseLabel::Single(first));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Colon, "':'")?;
        Ok(labels)
    }

    fn parse_for(&mut self) -> ParseResult<StmtKind> {
        self.bump();
        let var = self.parse_place()?;
        self.expect(TokenKind::Assign, "':='")?;
        let from = self.parse_expression()?;
        self.expect(TokenKind::KwTo, "TO")?;
        let to = self.parse_expression()?;
        let by = if self.eat(TokenKind::KwBy) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::KwDo, "DO")?;
        let body = self.parse_block();
        self.expect(TokenKind::KwEndFor, "END_FOR")?;
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::For {
            var,
            from,
            to,
            by,
            body,
        })
    }

    fn parse_while(&mut self) -> ParseResult<StmtKind> {
        self.bump();
        let cond = self.parse_expression()?;
        self.expect(TokenKind::KwDo, "DO")?;
        let body = self.parse_block();
        self.expect(TokenKind::KwEndWhile, "END_WHILE")?;
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::While { cond, body })
    }

    fn parse_repeat(&mut self) -> ParseResult<StmtKind> {
        self.bump();
        let body = self.parse_block();
        self.expect(TokenKind::KwUntil, "UNTIL")?;
        let until = self.parse_expression()?;
        self.eat(TokenKind::Semicolon);
        self.expect(TokenKind::KwEndRepeat, "END_REPEAT")?;
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::Repeat { body, until })
    }

    // =========================================================================
    // Places and arguments
    // =========================================================================

    fn parse_name(&mut self) -> ParseResult<SmolStr> {
        self.eat(TokenKind::Hash);
        match self.current() {
            TokenKind::Ident | TokenKind::QuotedIdent if !self.at_end() => {
                let name = SmolStr::new(self.current_text().trim_matches('"'));
                self.bump();
                Ok(name)
            }
            _ => Err(format!("expected identifier, found '{}'", self.current_text()).into()),
        }
    }

    fn parse_place(&mut self) -> ParseResult<Place> {
        let root = self.parse_name()?;
        self.parse_place_from(root)
    }

    fn parse_place_from(&mut self, root: SmolStr) -> ParseResult<Place> {
        let mut place = Place::var(root);
        loop {
            if self.eat(TokenKind::Dot) {
                let field = self.parse_name()?;
                place.path.push(Access::Field(field));
            } else if self.eat(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                if self.at(TokenKind::Comma) {
                    return Err("multi-dimensional arrays are not supported".into());
                }
                self.expect(TokenKind::RBracket, "']'")?;
                place.path.push(Access::Index(Box::new(index)));
            } else {
                return Ok(place);
            }
        }
    }

    fn parse_arg_list(&mut self) -> ParseResult<Vec<Arg>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_arg()?);
            if self.eat(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(args);
        }
    }

    fn parse_arg(&mut self) -> ParseResult<Arg> {
        let offset = usize::from(self.at(TokenKind::Hash));
        let is_name = matches!(
            self.peek_kind_n(offset),
            TokenKind::Ident | TokenKind::QuotedIdent
        );
        if is_name {
            match self.peek_kind_n(offset + 1) {
                TokenKind::Assign => {
                    let name = self.parse_name()?;
                    self.bump();
                    let value = self.parse_expression()?;
                    return Ok(Arg::Named { name, value });
                }
                TokenKind::Arrow => {
                    let name = self.parse_name()?;
                    self.bump();
                    let target = self.parse_place()?;
                    return Ok(Arg::Output { name, target });
                }
                _ => {}
            }
        }
        Ok(Arg::Positional(self.parse_expression()?))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        self.nested("expression", |parser| parser.parse_expr_at(min_bp))
    }

    fn parse_expr_at(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut lhs = if let Some(bp) = self.prefix_op() {
            let op = match self.current() {
                TokenKind::KwNot => UnaryOp::Not,
                TokenKind::Minus => UnaryOp::Neg,
                _ => UnaryOp::Plus,
            };
            self.bump();
            let expr = self.parse_expr_bp(bp)?;
            fold_unary(op, expr)
        } else {
            self.parse_primary()?
        };

        // Left-associative chains deepen the tree without recursing here.
        let mut chained = 0;
        loop {
            if self.at_end() {
                break;
            }
            let token = self.current();
            let Some((l_bp, r_bp)) = token.infix_binding_power() else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            chained += 1;
            if self.depth + chained > MAX_NESTING {
                return Err("expression nested too deeply".into());
            }
            self.bump();
            let rhs = self.parse_expr_bp(r_bp)?;
            lhs = Expr::Binary {
                op: binary_op(token),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn prefix_op(&self) -> Option<u8> {
        if self.at_end() {
            None
        } else {
            self.current().prefix_binding_power()
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        if self.at_end() {
            return Err("expected expression, found end of body".into());
        }
        let text = self.current_text();
        let expr = match self.current() {
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::KwTrue => Expr::Bool(true),
            TokenKind::KwFalse => Expr::Bool(false),
            TokenKind::IntLiteral => parse_integer_literal(text)
                .map_or_else(|| invalid_literal(text), Expr::Int),
            TokenKind::RealLiteral => text
                .replace('_', "")
                .parse::<f64>()
                .map_or_else(|_| invalid_literal(text), Expr::Real),
            TokenKind::TimeLiteral => {
                parse_duration_ms(text).map_or_else(|| invalid_literal(text), Expr::Duration)
            }
            TokenKind::DateLiteral => {
                parse_date_literal(text).map_or_else(|| invalid_literal(text), Expr::Ticks)
            }
            TokenKind::TimeOfDayLiteral => {
                parse_time_of_day_literal(text).map_or_else(|| invalid_literal(text), Expr::Ticks)
            }
            TokenKind::DateAndTimeLiteral => parse_date_and_time_literal(text)
                .map_or_else(|| invalid_literal(text), Expr::Ticks),
            TokenKind::StringLiteral => Expr::Str(unescape(text).into()),
            TokenKind::DirectAddress => {
                Expr::Invalid(format!("direct address {text} cannot be simulated").into())
            }
            TokenKind::TypedLiteralPrefix => return self.parse_typed_literal(),
            TokenKind::Ident | TokenKind::QuotedIdent | TokenKind::Hash => {
                let name = self.parse_name()?;
                if self.at(TokenKind::LParen) {
                    let args = self.parse_arg_list()?;
                    return Ok(Expr::Call { name, args });
                }
                return Ok(Expr::Place(self.parse_place_from(name)?));
            }
            _ => return Err(format!("expected expression, found '{text}'").into()),
        };
        self.bump();
        Ok(expr)
    }

    /// `Color#Red`, `INT#5`, `REAL#-1.5`, `BOOL#TRUE`.
    fn parse_typed_literal(&mut self) -> ParseResult<Expr> {
        let prefix = self.current_text().trim_end_matches('#');
        let prefix = SmolStr::new(prefix);
        self.bump();
        if matches!(self.current(), TokenKind::Ident | TokenKind::QuotedIdent) && !self.at_end() {
            let member = SmolStr::new(self.current_text().trim_matches('"'));
            self.bump();
            let Some(def) = self.catalog.enum_def(&prefix) else {
                return Ok(Expr::Invalid(format!("unknown enum type '{prefix}'").into()));
            };
            return Ok(match def.ordinal(&member) {
                Some(ordinal) => Expr::EnumMember {
                    type_name: def.name.clone(),
                    member,
                    ordinal,
                },
                None => Expr::Invalid(format!("'{member}' is not a member of {prefix}").into()),
            });
        }
        let negative = self.eat(TokenKind::Minus);
        let value = match self.current() {
            TokenKind::KwTrue | TokenKind::KwFalse | TokenKind::IntLiteral | TokenKind::RealLiteral
                if !self.at_end() =>
            {
                self.parse_primary()?
            }
            _ => {
                return Err(format!("expected literal after '{prefix}#'").into());
            }
        };
        let value = if negative {
            fold_unary(UnaryOp::Neg, value)
        } else {
            value
        };
        Ok(typed_literal(&prefix, value))
    }
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::KwOr => BinaryOp::Or,
        TokenKind::KwXor => BinaryOp::Xor,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::Neq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::KwMod => BinaryOp::Mod,
        TokenKind::Power => BinaryOp::Pow,
        _ => BinaryOp::And,
    }
}

/// Folds `-<literal>` so negative constants stay literals (CASE labels).
fn fold_unary(op: UnaryOp, expr: Expr) -> Expr {
    match (op, expr) {
        (UnaryOp::Neg, Expr::Int(value)) => Expr::Int(value.wrapping_neg()),
        (UnaryOp::Neg, Expr::Real(value)) => Expr::Real(-value),
        (UnaryOp::Neg, Expr::Duration(value)) => Expr::Duration(-value),
        (UnaryOp::Plus, expr @ (Expr::Int(_) | Expr::Real(_) | Expr::Duration(_))) => expr,
        (op, expr) => Expr::Unary {
            op,
            expr: Box::new(expr),
        },
    }
}

fn typed_literal(prefix: &str, value: Expr) -> Expr {
    let prefix = prefix.to_ascii_uppercase();
    match (prefix.as_str(), value) {
        ("BOOL", Expr::Int(value)) => Expr::Bool(value != 0),
        ("REAL" | "LREAL", Expr::Int(value)) => {
            #[allow(clippy::cast_precision_loss)]
            let value = value as f64;
            Expr::Real(value)
        }
        #[allow(clippy::cast_possible_truncation)]
        (
            "INT" | "DINT" | "SINT" | "USINT" | "UINT" | "UDINT" | "WORD" | "BYTE" | "DWORD",
            Expr::Real(value),
        ) => Expr::Int(value.trunc() as i64),
        (_, value) => value,
    }
}

fn invalid_literal(text: &str) -> Expr {
    Expr::Invalid(format!("malformed literal {text}").into())
}

/// Resolves `$` escapes of a single-quoted string literal.
fn unescape(text: &str) -> String {
    let inner = text
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('$') => out.push('$'),
            Some('\'') => out.push('\''),
            Some('N' | 'n' | 'L' | 'l') => out.push('\n'),
            Some('R' | 'r') => out.push('\r'),
            Some('T' | 't') => out.push('\t'),
            Some('P' | 'p') => out.push('\u{c}'),
            Some(high) if high.is_ascii_hexdigit() => {
                let low = chars.next_if(char::is_ascii_hexdigit);
                let code = low.map_or_else(
                    || high.to_digit(16),
                    |low| Some(high.to_digit(16)? * 16 + low.to_digit(16)?),
                );
                if let Some(decoded) = code.and_then(char::from_u32) {
                    out.push(decoded);
                }
            }
            Some(other) => out.push(other),
            None => out.push('$'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use scl_syntax::lex_significant;

    use super::*;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = lex_significant(source);
        let lines = LineIndex::new(source);
        let catalog = TypeCatalog::from_source(
            "TYPE Mode : (Idle, Run := 5, Stop); END_TYPE",
        );
        Parser::new(source, &tokens, &lines, &catalog).parse_body()
    }

    fn expr(source: &str) -> Expr {
        match parse(&format!("x := {source};")).remove(0).kind {
            StmtKind::Assign { value, .. } => value,
            other => panic!("not an assignment: {other:?}"),
        }
    }

    #[test]
    fn precedence_follows_iec_table() {
        let parsed = expr("a OR b AND c = 1 + 2 * 3");
        let Expr::Binary { op: BinaryOp::Or, rhs, .. } = parsed else {
            panic!("OR must be the root");
        };
        let Expr::Binary { op: BinaryOp::And, rhs, .. } = *rhs else {
            panic!("AND binds tighter than OR");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Eq, .. }));
    }

    #[test]
    fn literals_are_lowered() {
        assert_eq!(expr("T#1s500ms"), Expr::Duration(1_500));
        assert_eq!(expr("16#FF"), Expr::Int(255));
        assert_eq!(expr("-5"), Expr::Int(-5));
        assert_eq!(expr("INT#-7"), Expr::Int(-7));
        assert_eq!(expr("BOOL#1"), Expr::Bool(true));
        assert_eq!(expr("'it$'s$N'"), Expr::Str("it's\n".into()));
        assert_eq!(
            expr("Mode#Stop"),
            Expr::EnumMember {
                type_name: "Mode".into(),
                member: "Stop".into(),
                ordinal: 6
            }
        );
        assert!(matches!(expr("%I0.0"), Expr::Invalid(_)));
    }

    #[test]
    fn nesting_past_the_limit_is_invalid() {
        let fits = format!("{}1{}", "(".repeat(MAX_NESTING - 2), ")".repeat(MAX_NESTING - 2));
        assert_eq!(expr(&fits), Expr::Int(1));

        let deep = format!("x := {}1{};", "(".repeat(10_000), ")".repeat(10_000));
        let body = parse(&deep);
        assert_eq!(
            body[0].kind,
            StmtKind::Invalid("expression nested too deeply".into())
        );

        let short_chain = format!("a{}", " + a".repeat(50));
        assert!(matches!(expr(&short_chain), Expr::Binary { .. }));
        let long_chain = format!("x := a{};", " + a".repeat(10_000));
        assert!(matches!(&parse(&long_chain)[0].kind, StmtKind::Invalid(m) if m.contains("too deeply")));

        let negated = format!("x := {}1;", "-".repeat(10_000));
        assert!(matches!(&parse(&negated)[0].kind, StmtKind::Invalid(m) if m.contains("too deeply")));

        let ifs = format!("{}y := 1;{}", "IF c THEN ".repeat(1_000), "END_IF; ".repeat(1_000));
        let body = parse(&ifs);
        let mut current = &body[0];
        let mut levels = 0;
        while let StmtKind::If { branches, .. } = &current.kind {
            levels += 1;
            current = &branches[0].1[0];
        }
        // The innermost IF passes the statement check but not its condition.
        assert_eq!(levels, MAX_NESTING - 1);
        assert!(matches!(&current.kind, StmtKind::Invalid(m) if m.ends_with("nested too deeply")));
    }

    #[test]
    fn case_labels_and_ranges() {
        let body = parse("CASE n OF\n 1, 3..5: y := 1;\n -1: y := 2;\n ELSE y := 0;\nEND_CASE;");
        let StmtKind::Case { arms, else_body, .. } = &body[0].kind else {
            panic!("expected CASE");
        };
        assert_eq!(arms.len(), 2);
        assert_eq!(
            arms[0].labels,
            vec![
                CaseLabel::Single(Expr::Int(1)),
                CaseLabel::Range(Expr::Int(3), Expr::Int(5))
            ]
        );
        assert_eq!(arms[1].labels, vec![CaseLabel::Single(Expr::Int(-1))]);
        assert_eq!(else_body.len(), 1);
    }

    #[test]
    fn fb_call_arguments() {
        let body = parse("#t(IN := start, PT := T#2s, Q => done);");
        let StmtKind::Call { callee, args } = &body[0].kind else {
            panic!("expected call");
        };
        assert_eq!(callee, &Place::var("t"));
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[2], Arg::Output { name, .. } if name == "Q"));
    }

    #[test]
    fn errors_recover_at_next_statement() {
        let body = parse("x := ;\ny := 2;\nIF a THEN\n  z := 1\nEND_IF;\nw := 3;");
        assert!(matches!(body[0].kind, StmtKind::Invalid(_)));
        assert_eq!(body[1].line, 2);
        assert!(matches!(body[1].kind, StmtKind::Assign { .. }));
        assert!(matches!(body.last().map(|stmt| &stmt.kind), Some(StmtKind::Assign { .. })));
        assert!(body
            .iter()
            .any(|stmt| matches!(stmt.kind, StmtKind::Invalid(_))));
    }

    #[test]
    fn regions_are_elided() {
        let body = parse("REGION setup\nx := 1;\nEND_REGION\n");
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].line, 2);
    }
}
