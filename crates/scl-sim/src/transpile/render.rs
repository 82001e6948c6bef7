//! Renders the translated unit as a C-like snippet.
//!
//! The text is what compile errors show next to their diagnostics, so it
//! keeps the statement structure of the source one-to-one.

use std::fmt::Write;

use crate::value::DataType;

use super::ast::{Access, Arg, BinaryOp, CaseLabel, Expr, Place, Stmt, StmtKind, UnaryOp};
use super::scope::Locals;

const INDENT: &str = "    ";

/// Snippet type name of a declared type.
#[must_use]
pub fn snippet_type(data_type: &DataType) -> String {
    match data_type {
        DataType::Enum(_) => "int".to_string(),
        DataType::Struct(_) => "Dictionary<string, object>".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn render(locals: &Locals, body: &[Stmt]) -> String {
    let mut renderer = Renderer {
        locals,
        out: String::new(),
        depth: 0,
    };
    renderer.line("// --- MAP IN ---");
    for local in locals.iter() {
        let ty = snippet_type(&local.data_type);
        renderer.line(&format!("{ty} {} = ({ty})Memory[\"{}\"];", local.name, local.name));
    }
    renderer.out.push('\n');
    renderer.line("// --- LOGIC ---");
    renderer.block(body);
    renderer.out.push('\n');
    renderer.line("// --- MAP OUT ---");
    for local in locals.iter() {
        renderer.line(&format!("Memory[\"{}\"] = {};", local.name, local.name));
    }
    renderer.out
}

struct Renderer<'a> {
    locals: &'a Locals,
    out: String,
    depth: usize,
}

impl Renderer<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn nested(&mut self, body: &[Stmt]) {
        self.depth += 1;
        self.block(body);
        self.depth -= 1;
    }

    fn block(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let value = self.expr(value);
                if let Some((root, field)) = self.struct_field(target) {
                    self.line(&format!("STRUCT_SET({root}, \"{field}\", {value});"));
                } else {
                    let target = self.place(target);
                    self.line(&format!("{target} = {value};"));
                }
            }
            StmtKind::Call { callee, args } => self.call_stmt(callee, args),
            StmtKind::If {
                branches,
                else_body,
            } => {
                for (index, (cond, body)) in branches.iter().enumerate() {
                    let cond = self.expr(cond);
                    if index == 0 {
                        self.line(&format!("if ({cond}) {{"));
                    } else {
                        self.line(&format!("}} else if ({cond}) {{"));
                    }
                    self.nested(body);
                }
                if !else_body.is_empty() {
                    self.line("} else {");
                    self.nested(else_body);
                }
                self.line("}");
            }
            StmtKind::Case {
                selector,
                arms,
                else_body,
            } => {
                let selector = self.expr(selector);
                self.line(&format!("switch ({selector}) {{"));
                for arm in arms {
                    for label in &arm.labels {
                        self.case_label(label);
                    }
                    self.nested(&arm.body);
                    self.depth += 1;
                    self.line("break;");
                    self.depth -= 1;
                }
                if !else_body.is_empty() {
                    self.line("default:");
                    self.nested(else_body);
                    self.depth += 1;
                    self.line("break;");
                    self.depth -= 1;
                }
                self.line("}");
            }
            StmtKind::For {
                var,
                from,
                to,
                by,
                body,
            } => {
                let var = self.place(var);
                let from = self.expr(from);
                let to = self.expr(to);
                let by_text = by.as_ref().map_or_else(|| "1".to_string(), |by| self.expr(by));
                let cmp = match by {
                    Some(Expr::Int(step)) if *step < 0 => ">=",
                    _ => "<=",
                };
                self.line(&format!(
                    "for ({var} = {from}; {var} {cmp} {to}; {var} += {by_text}) {{"
                ));
                self.nested(body);
                self.line("}");
            }
            StmtKind::While { cond, body } => {
                let cond = self.expr(cond);
                self.line(&format!("while ({cond}) {{"));
                self.nested(body);
                self.line("}");
            }
            StmtKind::Repeat { body, until } => {
                self.line("do {");
                self.nested(body);
                let until = self.expr(until);
                self.line(&format!("}} while (!({until}));"));
            }
            StmtKind::Exit => self.line("break;"),
            StmtKind::Continue => self.line("continue;"),
            StmtKind::Return => self.line("return;"),
            StmtKind::Invalid(message) => {
                self.line(&format!("/* line {}: {message} */", stmt.line));
            }
        }
    }

    fn case_label(&mut self, label: &CaseLabel) {
        match label {
            CaseLabel::Range(Expr::Int(first), Expr::Int(last)) if last.saturating_sub(*first) < 256 => {
                for value in *first..=*last {
                    self.line(&format!("case {value}:"));
                }
            }
            CaseLabel::Range(first, last) => {
                let first = self.expr(first);
                let last = self.expr(last);
                self.line(&format!("case {first} .. {last}:"));
            }
            CaseLabel::Single(value) => {
                let value = self.expr(value);
                self.line(&format!("case {value}:"));
            }
        }
    }

    fn call_stmt(&mut self, callee: &Place, args: &[Arg]) {
        let name = self.place(callee);
        let is_instance = self
            .locals
            .lookup(&callee.root)
            .is_some_and(|(_, local)| matches!(local.data_type, DataType::Fb(_)));
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for arg in args {
            match arg {
                Arg::Positional(value) => inputs.push(self.expr(value)),
                Arg::Named { name, value } => {
                    let value = self.expr(value);
                    inputs.push(format!("{name}: {value}"));
                }
                Arg::Output { name: member, target } => {
                    let target = self.place(target);
                    outputs.push(format!("{target} = {name}.{member};"));
                }
            }
        }
        let inputs = inputs.join(", ");
        if is_instance {
            self.line(&format!("{name}.Execute({inputs});"));
        } else {
            self.line(&format!("{name}({inputs});"));
        }
        for output in outputs {
            self.line(&output);
        }
    }

    /// Root and field name when `place` is exactly `struct_tag.field`.
    fn struct_field<'p>(&self, place: &'p Place) -> Option<(&'p str, &'p str)> {
        let (_, local) = self.locals.lookup(&place.root)?;
        match (&local.data_type, place.path.as_slice()) {
            (DataType::Struct(_), [Access::Field(field)]) => Some((&place.root, field)),
            _ => None,
        }
    }

    fn place(&self, place: &Place) -> String {
        let mut out = String::new();
        let mut rest = place.path.as_slice();
        let struct_type = self.locals.lookup(&place.root).and_then(|(_, local)| match &local.data_type {
            DataType::Struct(name) => Some(name.clone()),
            _ => None,
        });
        match (struct_type, rest.first()) {
            (Some(type_name), Some(Access::Field(field))) => {
                let cast = self
                    .locals
                    .field_type(&type_name, field)
                    .map_or_else(|| "object".to_string(), |ty| snippet_type(&ty));
                let _ = write!(out, "(({cast})STRUCT_GET({}, \"{field}\"))", place.root);
                rest = &rest[1..];
            }
            _ => out.push_str(&place.root),
        }
        for access in rest {
            match access {
                Access::Field(field) => {
                    let _ = write!(out, ".{field}");
                }
                Access::Index(index) => {
                    let _ = write!(out, "[{}]", self.expr(index));
                }
            }
        }
        out
    }

    fn expr(&self, expr: &Expr) -> String {
        self.expr_prec(expr, 0)
    }

    fn expr_prec(&self, expr: &Expr, parent: u8) -> String {
        match expr {
            Expr::Bool(value) => value.to_string(),
            Expr::Int(value) | Expr::Duration(value) | Expr::Ticks(value) => value.to_string(),
            Expr::Real(value) => {
                if value.fract() == 0.0 && value.is_finite() {
                    format!("{value:.1}f")
                } else {
                    format!("{value}f")
                }
            }
            Expr::Str(text) => format!("{text:?}"),
            Expr::EnumMember { ordinal, .. } => ordinal.to_string(),
            Expr::Place(place) => self.place(place),
            Expr::Unary { op, expr } => {
                let operand = self.expr_prec(expr, UNARY_PREC);
                let symbol = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                    UnaryOp::Plus => "+",
                };
                format!("{symbol}{operand}")
            }
            Expr::Binary {
                op: BinaryOp::Pow,
                lhs,
                rhs,
            } => format!("EXPT({}, {})", self.expr(lhs), self.expr(rhs)),
            Expr::Binary { op, lhs, rhs } => {
                let prec = precedence(*op);
                let text = format!(
                    "{} {} {}",
                    self.expr_prec(lhs, prec),
                    op.symbol(),
                    self.expr_prec(rhs, prec + 1)
                );
                if prec < parent {
                    format!("({text})")
                } else {
                    text
                }
            }
            Expr::Call { name, args } => {
                let args: Vec<String> = args
                    .iter()
                    .map(|arg| match arg {
                        Arg::Positional(value) => self.expr(value),
                        Arg::Named { name, value } => format!("{name}: {}", self.expr(value)),
                        Arg::Output { name, target } => format!("{name} => {}", self.place(target)),
                    })
                    .collect();
                format!("{}({})", name.to_ascii_uppercase(), args.join(", "))
            }
            Expr::Invalid(message) => format!("/* {message} */"),
        }
    }
}

const UNARY_PREC: u8 = 9;

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::Xor => 2,
        BinaryOp::And => 3,
        BinaryOp::Eq | BinaryOp::Ne => 4,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 5,
        BinaryOp::Add | BinaryOp::Sub => 6,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 7,
        BinaryOp::Pow => 8,
    }
}
