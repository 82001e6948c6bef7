//! Lowering of the syntax tree to the typed IR.
//!
//! Every variable is resolved to its slot and every expression gets a static
//! type (enums collapse to `Int`). Numeric operands are widened with explicit
//! [`Node::Convert`] nodes so the interpreter only ever sees matching pairs.
//! Problems are collected rather than returned early, so one compile reports
//! all of them.

use smol_str::SmolStr;

use crate::context::Direction;
use crate::error::Diagnostic;
use crate::stdlib::fbs::{FbKind, FbParam, ParamRole};
use crate::stdlib::helpers::{coerce, real, saturate_i32};
use crate::stdlib::StandardLibrary;
use crate::transpile::ast::{Access, Arg, BinaryOp, CaseLabel, Expr, Place, Stmt, StmtKind, UnaryOp};
use crate::transpile::{Locals, Snippet};
use crate::value::{DataType, Value};

use super::{Location, Node, Op, Output, Step};

pub(super) fn lower(snippet: &Snippet) -> (Vec<Op>, Vec<Diagnostic>) {
    let mut lowerer = Lowerer {
        locals: &snippet.locals,
        library: StandardLibrary::new(),
        diagnostics: Vec::new(),
        loop_depth: 0,
        line: 0,
    };
    let body = lowerer.block(&snippet.body);
    (body, lowerer.diagnostics)
}

enum Resolved {
    /// Variable, struct field or array element, with its declared type and
    /// whether it may be written.
    Value(Location, DataType, bool),
    /// Input or output of a function block instance.
    Member(Location, &'static FbParam),
}

struct Lowerer<'a> {
    locals: &'a Locals,
    library: StandardLibrary,
    diagnostics: Vec<Diagnostic>,
    loop_depth: usize,
    line: usize,
}

fn is_number(ty: &DataType) -> bool {
    matches!(ty, DataType::Int | DataType::Real | DataType::Ticks)
}

fn operator_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "OR",
        BinaryOp::Xor => "XOR",
        BinaryOp::And => "AND",
        BinaryOp::Eq => "=",
        BinaryOp::Ne => "<>",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "MOD",
        BinaryOp::Pow => "**",
    }
}

fn place_text(place: &Place) -> String {
    let mut text = place.root.to_string();
    for access in &place.path {
        match access {
            Access::Field(field) => {
                text.push('.');
                text.push_str(field);
            }
            Access::Index(_) => text.push_str("[..]"),
        }
    }
    text
}

impl Lowerer<'_> {
    fn error(&mut self, message: impl Into<SmolStr>) {
        self.diagnostics.push(Diagnostic::new(self.line, message));
    }

    // ==== Statements ====

    fn block(&mut self, body: &[Stmt]) -> Vec<Op> {
        let line = self.line;
        let ops = body.iter().filter_map(|stmt| self.stmt(stmt)).collect();
        self.line = line;
        ops
    }

    fn loop_body(&mut self, body: &[Stmt]) -> Vec<Op> {
        self.loop_depth += 1;
        let ops = self.block(body);
        self.loop_depth -= 1;
        ops
    }

    fn stmt(&mut self, stmt: &Stmt) -> Option<Op> {
        self.line = stmt.line;
        match &stmt.kind {
            StmtKind::Assign { target, value } => self.assign(target, value),
            StmtKind::Call { callee, args } => self.call_stmt(callee, args),
            StmtKind::If {
                branches,
                else_body,
            } => {
                let lowered: Vec<(Option<Node>, Vec<Op>)> = branches
                    .iter()
                    .map(|(cond, body)| (self.condition(cond), self.block(body)))
                    .collect();
                let else_body = self.block(else_body);
                let branches = lowered
                    .into_iter()
                    .map(|(cond, body)| cond.map(|cond| (cond, body)))
                    .collect::<Option<Vec<_>>>()?;
                Some(Op::If {
                    branches,
                    else_body,
                })
            }
            StmtKind::Case {
                selector,
                arms,
                else_body,
            } => {
                let selector = match self.expr(selector) {
                    Some((node, DataType::Int)) => Some(node),
                    Some((_, other)) => {
                        self.error(format!("CASE selector must be an integer, found {other}"));
                        None
                    }
                    None => None,
                };
                let arms = arms
                    .iter()
                    .map(|arm| {
                        let labels: Vec<(i64, i64)> = arm
                            .labels
                            .iter()
                            .filter_map(|label| self.case_label(label))
                            .collect();
                        (labels, self.block(&arm.body))
                    })
                    .collect();
                let else_body = self.block(else_body);
                Some(Op::Case {
                    selector: selector?,
                    arms,
                    else_body,
                })
            }
            StmtKind::For {
                var,
                from,
                to,
                by,
                body,
            } => {
                let var = match self.resolve(var) {
                    Some(Resolved::Value(location, ty, true)) if ty.normalized() == DataType::Int => {
                        Some(location)
                    }
                    Some(_) => {
                        self.error(format!(
                            "FOR variable '{}' must be a writable integer",
                            place_text(var)
                        ));
                        None
                    }
                    None => None,
                };
                let from = self.expr_as(from, &DataType::Int);
                let to = self.expr_as(to, &DataType::Int);
                let by = match by {
                    Some(by) => self.expr_as(by, &DataType::Int),
                    None => Some(Node::Const(Value::Int(1))),
                };
                let body = self.loop_body(body);
                Some(Op::For {
                    var: var?,
                    from: from?,
                    to: to?,
                    by: by?,
                    body,
                })
            }
            StmtKind::While { cond, body } => {
                let cond = self.condition(cond);
                let body = self.loop_body(body);
                Some(Op::While { cond: cond?, body })
            }
            StmtKind::Repeat { body, until } => {
                let body = self.loop_body(body);
                let until = self.condition(until)?;
                Some(Op::Repeat { body, until })
            }
            StmtKind::Exit | StmtKind::Continue if self.loop_depth == 0 => {
                let keyword = if matches!(stmt.kind, StmtKind::Exit) {
                    "EXIT"
                } else {
                    "CONTINUE"
                };
                self.error(format!("{keyword} outside of a loop"));
                None
            }
            StmtKind::Exit => Some(Op::Exit),
            StmtKind::Continue => Some(Op::Continue),
            StmtKind::Return => Some(Op::Return),
            StmtKind::Invalid(message) => {
                self.error(message.clone());
                None
            }
        }
    }

    fn assign(&mut self, target: &Place, value: &Expr) -> Option<Op> {
        let resolved = self.resolve(target);
        let value = self.expr(value);
        match resolved? {
            Resolved::Value(_, _, false) => {
                self.error(format!("cannot assign to constant '{}'", place_text(target)));
                None
            }
            Resolved::Value(_, DataType::Fb(kind), _) => {
                self.error(format!(
                    "cannot assign to {} instance '{}'",
                    kind.name(),
                    place_text(target)
                ));
                None
            }
            Resolved::Value(location, ty, true) => {
                let (node, from) = value?;
                let value = self.convert(node, &from, &ty)?;
                Some(Op::Store {
                    target: location,
                    value,
                })
            }
            Resolved::Member(_, param) if param.role == ParamRole::Output => {
                self.error(format!("'{}' is an output and cannot be written", place_text(target)));
                None
            }
            Resolved::Member(location, param) => {
                let (node, from) = value?;
                let value = self.convert(node, &from, &param.ty.data_type())?;
                Some(Op::SetInput {
                    target: location,
                    member: param.name,
                    value,
                })
            }
        }
    }

    fn call_stmt(&mut self, callee: &Place, args: &[Arg]) -> Option<Op> {
        let locals = self.locals;
        if callee.path.is_empty() && locals.lookup(&callee.root).is_none() {
            let (node, _) = self.call_expr(&callee.root, args)?;
            return Some(Op::Eval(node));
        }
        match self.resolve(callee)? {
            Resolved::Value(location, DataType::Fb(kind), _) => Some(self.invoke(location, kind, args)),
            Resolved::Value(_, ty, _) => {
                self.error(format!("'{}' of type {ty} cannot be called", place_text(callee)));
                None
            }
            Resolved::Member(..) => {
                self.error(format!("'{}' cannot be called", place_text(callee)));
                None
            }
        }
    }

    /// Binds call arguments to a function block instance: named inputs,
    /// positional inputs in declaration order, and `=>` outputs.
    fn invoke(&mut self, target: Location, kind: FbKind, args: &[Arg]) -> Op {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut positional = kind.inputs();
        for arg in args {
            match arg {
                Arg::Positional(value) => {
                    let Some(param) = positional.next() else {
                        self.error(format!("too many arguments for {}", kind.name()));
                        continue;
                    };
                    if let Some(node) = self.fb_input(param, value) {
                        inputs.push((param.name, node));
                    }
                }
                Arg::Named { name, value } => match kind.param(name) {
                    Some(param) if param.role == ParamRole::Input => {
                        if let Some(node) = self.fb_input(param, value) {
                            inputs.push((param.name, node));
                        }
                    }
                    Some(param) => {
                        self.error(format!(
                            "{}.{} is an output; bind it with '=>'",
                            kind.name(),
                            param.name
                        ));
                    }
                    None => self.error(format!("{} has no input '{name}'", kind.name())),
                },
                Arg::Output { name, target } => match kind.param(name) {
                    Some(param) if param.role == ParamRole::Output => {
                        if let Some(output) = self.fb_output(param, target) {
                            outputs.push(output);
                        }
                    }
                    _ => self.error(format!("{} has no output '{name}'", kind.name())),
                },
            }
        }
        Op::Invoke {
            target,
            inputs,
            outputs,
        }
    }

    fn fb_input(&mut self, param: &FbParam, value: &Expr) -> Option<Node> {
        let (node, from) = self.expr(value)?;
        self.convert(node, &from, &param.ty.data_type())
    }

    fn fb_output(&mut self, param: &'static FbParam, target: &Place) -> Option<Output> {
        match self.resolve(target)? {
            Resolved::Value(location, ty, true) => {
                let from = param.ty.data_type();
                let ty = ty.normalized();
                if from != ty && !(is_number(&from) && is_number(&ty)) {
                    self.error(format!("cannot assign {from} output {} to {ty}", param.name));
                    return None;
                }
                Some(Output {
                    member: param.name,
                    target: location,
                    ty,
                })
            }
            _ => {
                self.error(format!("'{}' cannot receive an output", place_text(target)));
                None
            }
        }
    }

    fn case_label(&mut self, label: &CaseLabel) -> Option<(i64, i64)> {
        match label {
            CaseLabel::Single(value) => self.const_int(value).map(|v| (v, v)),
            CaseLabel::Range(first, last) => {
                let first = self.const_int(first);
                let last = self.const_int(last);
                let (first, last) = (first?, last?);
                if first > last {
                    self.error(format!("empty CASE range {first}..{last}"));
                    return None;
                }
                Some((first, last))
            }
        }
    }

    fn const_int(&mut self, expr: &Expr) -> Option<i64> {
        match expr {
            Expr::Int(value) | Expr::Duration(value) => Some(*value),
            Expr::EnumMember { ordinal, .. } => Some(i64::from(*ordinal)),
            Expr::Place(place) if place.path.is_empty() => {
                let locals = self.locals;
                if locals.lookup(&place.root).is_none() {
                    if let Some((_, ordinal)) = locals.enum_member(&place.root) {
                        return Some(i64::from(ordinal));
                    }
                }
                self.error(format!("CASE label '{}' is not a constant", place.root));
                None
            }
            Expr::Invalid(message) => {
                self.error(message.clone());
                None
            }
            _ => {
                self.error("CASE label must be an integer constant");
                None
            }
        }
    }

    // ==== Places ====

    fn resolve(&mut self, place: &Place) -> Option<Resolved> {
        let locals = self.locals;
        let Some((slot, local)) = locals.lookup(&place.root) else {
            self.error(format!("unknown variable '{}'", place.root));
            return None;
        };
        let writable = local.direction != Direction::Constant;
        let mut ty = local.data_type.clone();
        let mut path = Vec::new();
        let mut accesses = place.path.iter().peekable();
        while let Some(access) = accesses.next() {
            let (step, next) = match (access, &ty) {
                (Access::Field(field), DataType::Struct(name)) => {
                    let Some(field_ty) = locals.field_type(name, field) else {
                        self.error(format!("struct {name} has no field '{field}'"));
                        return None;
                    };
                    (Step::Field(field.clone()), field_ty)
                }
                (Access::Field(field), DataType::Fb(kind)) => {
                    let Some(param) = kind.param(field) else {
                        self.error(format!("{} has no member '{field}'", kind.name()));
                        return None;
                    };
                    if accesses.peek().is_some() {
                        self.error(format!("{}.{} has no members", kind.name(), param.name));
                        return None;
                    }
                    return Some(Resolved::Member(Location { slot, path }, param));
                }
                (Access::Index(index), DataType::Array { element, .. }) => {
                    let element = (**element).clone();
                    let index = match self.expr(index)? {
                        (node, DataType::Int) => node,
                        (_, other) => {
                            self.error(format!("array index must be an integer, found {other}"));
                            return None;
                        }
                    };
                    (Step::Index(index), element)
                }
                (Access::Field(field), other) => {
                    self.error(format!("'{field}' accessed on a value of type {other}"));
                    return None;
                }
                (Access::Index(_), other) => {
                    self.error(format!("cannot index a value of type {other}"));
                    return None;
                }
            };
            path.push(step);
            ty = next;
        }
        Some(Resolved::Value(Location { slot, path }, ty, writable))
    }

    fn place_expr(&mut self, place: &Place) -> Option<(Node, DataType)> {
        let locals = self.locals;
        if place.path.is_empty() && locals.lookup(&place.root).is_none() {
            if let Some((_, ordinal)) = locals.enum_member(&place.root) {
                return Some((Node::Const(Value::Int(ordinal)), DataType::Int));
            }
        }
        match self.resolve(place)? {
            Resolved::Value(_, DataType::Fb(kind), _) => {
                self.error(format!(
                    "{} instance '{}' cannot be used as a value",
                    kind.name(),
                    place_text(place)
                ));
                None
            }
            Resolved::Value(location, ty, _) => Some((Node::Load(location), ty.normalized())),
            Resolved::Member(location, param) => Some((
                Node::Member {
                    target: location,
                    member: param.name,
                },
                param.ty.data_type(),
            )),
        }
    }

    // ==== Expressions ====

    fn condition(&mut self, expr: &Expr) -> Option<Node> {
        match self.expr(expr)? {
            (node, DataType::Bool) => Some(node),
            (_, other) => {
                self.error(format!("condition must be BOOL, found {other}"));
                None
            }
        }
    }

    fn expr_as(&mut self, expr: &Expr, target: &DataType) -> Option<Node> {
        let (node, from) = self.expr(expr)?;
        self.convert(node, &from, target)
    }

    /// Assignment conversion. Numeric types convert into each other (REAL to
    /// INT truncates); anything else must match exactly.
    fn convert(&mut self, node: Node, from: &DataType, to: &DataType) -> Option<Node> {
        let to = to.normalized();
        if *from == to {
            return Some(node);
        }
        if !(is_number(from) && is_number(&to)) {
            self.error(format!("cannot convert {from} to {to}"));
            return None;
        }
        if let Node::Const(value) = &node {
            if let Ok(value) = coerce(value, &to) {
                return Some(Node::Const(value));
            }
        }
        Some(Node::Convert {
            operand: Box::new(node),
            to,
        })
    }

    fn expr(&mut self, expr: &Expr) -> Option<(Node, DataType)> {
        match expr {
            Expr::Bool(value) => Some((Node::Const(Value::Bool(*value)), DataType::Bool)),
            Expr::Int(value) => match i32::try_from(*value) {
                Ok(value) => Some((Node::Const(Value::Int(value)), DataType::Int)),
                Err(_) => {
                    self.error(format!("integer literal {value} is out of range"));
                    None
                }
            },
            Expr::Real(value) => Some((Node::Const(real(*value)), DataType::Real)),
            Expr::Str(text) => Some((Node::Const(Value::String(text.clone())), DataType::String)),
            Expr::Duration(ms) => Some((Node::Const(Value::Int(saturate_i32(*ms))), DataType::Int)),
            Expr::Ticks(ticks) => Some((Node::Const(Value::Ticks(*ticks)), DataType::Ticks)),
            Expr::EnumMember { ordinal, .. } => Some((Node::Const(Value::Int(*ordinal)), DataType::Int)),
            Expr::Place(place) => self.place_expr(place),
            Expr::Unary { op, expr } => self.unary(*op, expr),
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            Expr::Call { name, args } => self.call_expr(name, args),
            Expr::Invalid(message) => {
                self.error(message.clone());
                None
            }
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Option<(Node, DataType)> {
        let (node, ty) = self.expr(operand)?;
        let valid = match op {
            UnaryOp::Neg | UnaryOp::Plus => is_number(&ty),
            UnaryOp::Not => matches!(ty, DataType::Bool | DataType::Int),
        };
        if !valid {
            let text = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Plus => "+",
                UnaryOp::Not => "NOT",
            };
            self.error(format!("operator {text} cannot be applied to {ty}"));
            return None;
        }
        if op == UnaryOp::Plus {
            return Some((node, ty));
        }
        Some((
            Node::Unary {
                op,
                operand: Box::new(node),
            },
            ty,
        ))
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<(Node, DataType)> {
        let lhs = self.expr(lhs);
        let rhs = self.expr(rhs);
        let ((lhs, lhs_ty), (rhs, rhs_ty)) = (lhs?, rhs?);
        let both_numbers = is_number(&lhs_ty) && is_number(&rhs_ty);

        let result = match op {
            BinaryOp::Pow if both_numbers => Some((lhs, rhs, DataType::Real)),
            BinaryOp::Pow => None,
            _ if op.is_logical() => match (&lhs_ty, &rhs_ty) {
                (DataType::Bool, DataType::Bool) | (DataType::Int, DataType::Int) => {
                    Some((lhs, rhs, lhs_ty.clone()))
                }
                _ => None,
            },
            _ if op.is_comparison() => {
                if both_numbers {
                    let (lhs, rhs, _) = promote(lhs, &lhs_ty, rhs, &rhs_ty);
                    Some((lhs, rhs, DataType::Bool))
                } else if lhs_ty == rhs_ty && matches!(lhs_ty, DataType::Bool | DataType::String) {
                    Some((lhs, rhs, DataType::Bool))
                } else {
                    None
                }
            }
            _ if both_numbers => Some(promote(lhs, &lhs_ty, rhs, &rhs_ty)),
            _ => None,
        };

        let Some((lhs, rhs, ty)) = result else {
            self.error(format!(
                "operator {} cannot be applied to {lhs_ty} and {rhs_ty}",
                operator_text(op)
            ));
            return None;
        };
        Some((
            Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        ))
    }

    fn call_expr(&mut self, name: &str, args: &[Arg]) -> Option<(Node, DataType)> {
        let Some(func) = self.library.get(name) else {
            let locals = self.locals;
            let is_instance = locals
                .lookup(name)
                .is_some_and(|(_, local)| matches!(local.data_type, DataType::Fb(_)));
            if is_instance {
                self.error(format!("function block '{name}' must be called as a statement"));
            } else {
                self.error(format!("unknown function '{name}'"));
            }
            return None;
        };

        let mut nodes = Vec::with_capacity(args.len());
        let mut types = Vec::with_capacity(args.len());
        let mut complete = true;
        for arg in args {
            match arg {
                Arg::Positional(value) | Arg::Named { value, .. } => match self.expr(value) {
                    Some((node, ty)) if ty.is_scalar() => {
                        nodes.push(node);
                        types.push(ty);
                    }
                    Some((_, ty)) => {
                        self.error(format!("{} expects scalar arguments, found {ty}", func.name));
                        complete = false;
                    }
                    None => complete = false,
                },
                Arg::Output { name: output, .. } => {
                    self.error(format!("function {} has no output '{output}'", func.name));
                    complete = false;
                }
            }
        }
        if !func.arity.accepts(args.len()) {
            self.error(format!(
                "{} expects {} arguments, got {}",
                func.name,
                func.arity,
                args.len()
            ));
            return None;
        }
        if !complete {
            return None;
        }
        let ty = func.return_type(&types).normalized();
        Some((Node::Call { func, args: nodes }, ty))
    }
}

/// Widens the narrower operand: REAL over TICKS over INT.
fn promote(lhs: Node, lhs_ty: &DataType, rhs: Node, rhs_ty: &DataType) -> (Node, Node, DataType) {
    let common = if *lhs_ty == DataType::Real || *rhs_ty == DataType::Real {
        DataType::Real
    } else if *lhs_ty == DataType::Ticks || *rhs_ty == DataType::Ticks {
        DataType::Ticks
    } else {
        DataType::Int
    };
    let widen = |node: Node, ty: &DataType| {
        if *ty == common {
            node
        } else {
            Node::Convert {
                operand: Box::new(node),
                to: common.clone(),
            }
        }
    };
    let lhs = widen(lhs, lhs_ty);
    let rhs = widen(rhs, rhs_ty);
    (lhs, rhs, common)
}
