//! Syntax-directed translation of effect methods into stage programs.
//!
//! Each stage entry point becomes one self-contained program: the literals,
//! buffers and textures it uses, its stage interface, the helpers it calls
//! and finally `main`. Method bodies are emitted in one pass straight from
//! the `syn` tree; the only analysis is a local type inference needed to
//! lower matrix products, matrix subscripts and untyped `let` bindings.

use std::collections::HashMap;

use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::{BinOp, Expr, Lit, Member, Pat, RangeLimits, Stmt, UnOp};
use tracing::debug;

use crate::backends::{construct, MatrixOrder, ShaderBackend};
use crate::discover::data_type;
use crate::error::{Diagnostic, DiagnosticKind, Location};
use crate::model::{EffectDeclaration, ShaderMethod};
use crate::names;
use crate::resolve::{associated_name, collect_usage, is_self, Symbol, SymbolResolver};
use crate::types::{DataType, Direction, ShaderStage};
use crate::writer::SourceWriter;

pub mod intrinsics;

use self::intrinsics::Intrinsic;

type Translation<T> = Result<T, Diagnostic>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Data(DataType),
    Array(DataType),
    Texture(usize),
}

#[derive(Debug, Clone)]
struct Typed {
    text: String,
    ty: Option<ValueType>,
}

impl Typed {
    fn new(text: String, ty: DataType) -> Typed {
        Typed {
            text,
            ty: Some(ValueType::Data(ty)),
        }
    }

    fn data(&self) -> Option<DataType> {
        match self.ty {
            Some(ValueType::Data(ty)) => Some(ty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    emitted: String,
    ty: DataType,
}

fn unsupported<T: ToTokens>(node: &T) -> Diagnostic {
    Diagnostic::at(
        DiagnosticKind::UnsupportedSyntax {
            construct: node.to_token_stream().to_string(),
        },
        node,
    )
}

fn unresolved<T: ToTokens>(name: String, node: &T) -> Diagnostic {
    Diagnostic::at(DiagnosticKind::UnresolvedSymbol { name }, node)
}

/// Float literal text that both targets read as floating point.
fn float_literal(digits: &str) -> String {
    if digits.contains(['e', 'E']) {
        digits.to_owned()
    } else if digits.ends_with('.') {
        format!("{}0", digits)
    } else if digits.contains('.') {
        digits.to_owned()
    } else {
        format!("{}.0", digits)
    }
}

/// Component count of a valid swizzle of a vector with `components`
/// components.
fn swizzle_len(swizzle: &str, components: usize) -> Option<usize> {
    const SETS: [&str; 2] = ["xyzw", "rgba"];
    if swizzle.is_empty() || swizzle.len() > 4 {
        return None;
    }
    let valid = SETS.iter().any(|set| {
        swizzle
            .chars()
            .all(|c| set.find(c).is_some_and(|index| index < components))
    });
    valid.then_some(swizzle.len())
}

fn single_expr(block: &syn::Block) -> Option<&Expr> {
    match block.stmts.as_slice() {
        [Stmt::Expr(expr, None)] => Some(expr),
        _ => None,
    }
}

fn identity(backend: &dyn ShaderBackend) -> String {
    let args = (0..16)
        .map(|index| if index % 5 == 0 { "1.0" } else { "0.0" }.to_owned())
        .collect::<Vec<_>>();
    construct(backend.type_name(DataType::Matrix), &args)
}

struct FunctionTranslator<'a> {
    effect: &'a EffectDeclaration,
    resolver: &'a dyn SymbolResolver,
    backend: &'a dyn ShaderBackend,
    /// Stage of the program being generated; helpers inherit their caller's.
    stage: ShaderStage,
    return_type: Option<DataType>,
    scopes: Vec<HashMap<String, Binding>>,
    /// How often each source name has been declared in this function.
    declarations: HashMap<String, usize>,
    loops: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> FunctionTranslator<'a> {
    fn new(
        effect: &'a EffectDeclaration,
        resolver: &'a dyn SymbolResolver,
        backend: &'a dyn ShaderBackend,
        stage: ShaderStage,
        return_type: Option<DataType>,
    ) -> FunctionTranslator<'a> {
        // Locals must not hide the effect's globals, which share the prefix.
        let globals = effect
            .constants()
            .map(|constant| &constant.name)
            .chain(effect.textures.iter().map(|texture| &texture.name))
            .chain(effect.literals.iter().map(|literal| &literal.name))
            .chain(effect.methods.iter().map(|method| &method.name));
        let declarations = globals.map(|name| (name.clone(), 1)).collect();
        FunctionTranslator {
            effect,
            resolver,
            backend,
            stage,
            return_type,
            scopes: vec![HashMap::new()],
            declarations,
            loops: 0,
            diagnostics: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn bind(&mut self, name: &str, emitted: String, ty: DataType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), Binding { emitted, ty });
        }
    }

    /// Declares a local, renaming it when the name was declared before.
    fn declare(&mut self, name: &str, ty: DataType, location: Location) -> Translation<String> {
        let count = self.declarations.get(name).copied().unwrap_or(0);
        let emitted = if count == 0 {
            names::escape(name).map_err(|kind| Diagnostic::new(kind, location))?
        } else {
            names::shadowed(name, count)
        };
        self.declarations.insert(name.to_owned(), count + 1);
        self.bind(name, emitted.clone(), ty);
        Ok(emitted)
    }

    fn entry(&mut self, out: &mut SourceWriter, stage: ShaderStage, method: &ShaderMethod) {
        self.backend.write_entry_header(out, stage, method);
        out.open();
        for parameter in &method.parameters {
            let type_name = self.backend.type_name(parameter.data_type);
            match parameter.direction {
                Direction::In => match self.declare(&parameter.name, parameter.data_type, parameter.location) {
                    Ok(emitted) => out.line(format!(
                        "{} {} = {};",
                        type_name,
                        emitted,
                        self.backend.input_source(stage, parameter)
                    )),
                    Err(diagnostic) => self.diagnostics.push(diagnostic),
                },
                Direction::Out => {
                    let target = self.backend.output_target(stage, parameter);
                    out.line(format!(
                        "{} = {};",
                        target,
                        self.backend.zero_value(parameter.data_type)
                    ));
                    self.bind(&parameter.name, target, parameter.data_type);
                }
            }
        }
        self.block(out, &method.body, false);
        out.close();
    }

    fn helper(&mut self, out: &mut SourceWriter, method: &ShaderMethod) {
        let mut parameters = Vec::new();
        for parameter in &method.parameters {
            match self.declare(&parameter.name, parameter.data_type, parameter.location) {
                Ok(emitted) => {
                    let qualifier = match parameter.direction {
                        Direction::In => "",
                        Direction::Out => "inout ",
                    };
                    parameters.push(format!(
                        "{}{} {}",
                        qualifier,
                        self.backend.type_name(parameter.data_type),
                        emitted
                    ));
                }
                Err(diagnostic) => self.diagnostics.push(diagnostic),
            }
        }
        let return_type = method
            .return_type
            .map_or("void", |ty| self.backend.type_name(ty));
        out.line(format!(
            "{} {}({})",
            return_type,
            names::escaped(&method.name),
            parameters.join(", ")
        ));
        out.open();
        self.block(out, &method.body, method.return_type.is_some());
        out.close();
    }

    /// Emits the statements of `block`; the caller writes the braces.
    fn block(&mut self, out: &mut SourceWriter, block: &syn::Block, tail: bool) {
        self.scopes.push(HashMap::new());
        let last = block.stmts.len().saturating_sub(1);
        for (index, stmt) in block.stmts.iter().enumerate() {
            if let Err(diagnostic) = self.stmt(out, stmt, tail && index == last) {
                self.diagnostics.push(diagnostic);
            }
        }
        self.scopes.pop();
    }

    fn braced(&mut self, out: &mut SourceWriter, block: &syn::Block, tail: bool) {
        out.open();
        self.block(out, block, tail);
        out.close();
    }

    fn stmt(&mut self, out: &mut SourceWriter, stmt: &Stmt, tail: bool) -> Translation<()> {
        match stmt {
            Stmt::Local(local) => self.local(out, local),
            Stmt::Expr(expr, semi) => self.expr_stmt(out, expr, tail && semi.is_none()),
            Stmt::Item(item) => Err(unsupported(item)),
            Stmt::Macro(mac) => Err(unsupported(mac)),
        }
    }

    fn local(&mut self, out: &mut SourceWriter, local: &syn::Local) -> Translation<()> {
        let (ident, annotation) = match &local.pat {
            Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => (&pat.ident, None),
            Pat::Type(typed) => match typed.pat.as_ref() {
                Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => {
                    (&pat.ident, Some(typed.ty.as_ref()))
                }
                pat => return Err(unsupported(pat)),
            },
            pat => return Err(unsupported(pat)),
        };
        let name = ident.to_string();
        let annotated = match annotation {
            Some(ty) => Some(data_type(ty).ok_or_else(|| {
                Diagnostic::at(
                    DiagnosticKind::UnsupportedType {
                        item: name.clone(),
                        ty: ty.to_token_stream().to_string(),
                    },
                    ty,
                )
            })?),
            None => None,
        };
        let init = match &local.init {
            Some(init) if init.diverge.is_some() => return Err(unsupported(local)),
            Some(init) => Some(self.expr(&init.expr)?),
            None => None,
        };
        let ty = match (annotated, init.as_ref().and_then(|init| init.ty)) {
            (Some(ty), _) => ty,
            (None, Some(ValueType::Data(ty))) => ty,
            (None, Some(_)) => return Err(unsupported(local)),
            (None, None) => {
                return Err(Diagnostic::at(DiagnosticKind::CannotInferType { name }, ident));
            }
        };
        let emitted = self.declare(&name, ty, Location::of(ident.span()))?;
        let type_name = self.backend.type_name(ty);
        match init {
            Some(init) => out.line(format!("{} {} = {};", type_name, emitted, init.text)),
            None => out.line(format!("{} {};", type_name, emitted)),
        }
        Ok(())
    }

    fn expr_stmt(&mut self, out: &mut SourceWriter, expr: &Expr, tail: bool) -> Translation<()> {
        match expr {
            Expr::If(expr) => self.if_chain(out, expr, tail),
            Expr::ForLoop(expr) => self.for_loop(out, expr),
            Expr::While(expr) => {
                if let Some(label) = &expr.label {
                    return Err(unsupported(label));
                }
                let cond = self.expr(&expr.cond)?;
                out.line(format!("while ({})", cond.text));
                self.braced(out, &expr.body, false);
                Ok(())
            }
            Expr::Loop(expr) => {
                if let Some(label) = &expr.label {
                    return Err(unsupported(label));
                }
                out.line("while (true)");
                self.braced(out, &expr.body, false);
                Ok(())
            }
            Expr::Block(block) if block.label.is_none() => {
                self.braced(out, &block.block, tail);
                Ok(())
            }
            Expr::Break(expr) => {
                if expr.label.is_some() || expr.expr.is_some() {
                    return Err(unsupported(expr));
                }
                out.line("break;");
                Ok(())
            }
            Expr::Continue(expr) => {
                if expr.label.is_some() {
                    return Err(unsupported(expr));
                }
                out.line("continue;");
                Ok(())
            }
            Expr::Return(expr) => {
                match &expr.expr {
                    Some(value) => {
                        let value = self.expr(value)?;
                        out.line(format!("return {};", value.text));
                    }
                    None => out.line("return;"),
                }
                Ok(())
            }
            Expr::Call(call) if is_discard(call) => {
                if !call.args.is_empty() {
                    return Err(Diagnostic::at(
                        DiagnosticKind::ArgumentCount {
                            name: "discard".to_owned(),
                            expected: "0".to_owned(),
                            found: call.args.len(),
                        },
                        call,
                    ));
                }
                out.line("discard;");
                Ok(())
            }
            expr if tail && self.return_type.is_some() => {
                let value = self.expr(expr)?;
                out.line(format!("return {};", value.text));
                Ok(())
            }
            expr => {
                let value = self.expr(expr)?;
                out.line(format!("{};", value.text));
                Ok(())
            }
        }
    }

    fn if_chain(&mut self, out: &mut SourceWriter, expr: &syn::ExprIf, tail: bool) -> Translation<()> {
        let cond = self.expr(&expr.cond)?;
        out.line(format!("if ({})", cond.text));
        self.braced(out, &expr.then_branch, tail);
        let mut else_branch = &expr.else_branch;
        while let Some((_, branch)) = else_branch {
            match branch.as_ref() {
                Expr::If(nested) => {
                    let cond = self.expr(&nested.cond)?;
                    out.line(format!("else if ({})", cond.text));
                    self.braced(out, &nested.then_branch, tail);
                    else_branch = &nested.else_branch;
                }
                Expr::Block(block) => {
                    out.line("else");
                    self.braced(out, &block.block, tail);
                    break;
                }
                other => return Err(unsupported(other)),
            }
        }
        Ok(())
    }

    fn for_loop(&mut self, out: &mut SourceWriter, expr: &syn::ExprForLoop) -> Translation<()> {
        if let Some(label) = &expr.label {
            return Err(unsupported(label));
        }
        let Expr::Range(range) = expr.expr.as_ref() else {
            return Err(unsupported(&expr.expr));
        };
        let (Some(start), Some(end)) = (&range.start, &range.end) else {
            return Err(unsupported(range));
        };
        let start = self.expr(start)?;
        let end = self.expr(end)?;
        let comparison = match range.limits {
            RangeLimits::HalfOpen(_) => "<",
            RangeLimits::Closed(_) => "<=",
        };

        self.scopes.push(HashMap::new());
        let variable = match expr.pat.as_ref() {
            Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => self.declare(
                &pat.ident.to_string(),
                DataType::Int,
                Location::of(pat.ident.span()),
            ),
            Pat::Wild(_) => {
                self.loops += 1;
                Ok(names::shadowed("loop", self.loops))
            }
            pat => Err(unsupported(pat)),
        };
        if let Ok(variable) = &variable {
            out.line(format!(
                "for (int {v} = {}; {v} {} {}; ++{v})",
                start.text,
                comparison,
                end.text,
                v = variable
            ));
            self.braced(out, &expr.body, false);
        }
        self.scopes.pop();
        variable.map(|_| ())
    }

    fn expr(&mut self, expr: &Expr) -> Translation<Typed> {
        match expr {
            Expr::Lit(lit) => literal(&lit.lit),
            Expr::Path(path) => self.path(path),
            Expr::Field(field) => self.field(field),
            Expr::Index(index) => self.index(index),
            Expr::Binary(binary) => self.binary(binary),
            Expr::Assign(assign) => {
                let left = self.expr(&assign.left)?;
                let right = self.expr(&assign.right)?;
                Ok(Typed {
                    text: format!("{} = {}", left.text, right.text),
                    ty: left.ty,
                })
            }
            Expr::Unary(unary) => {
                let operand = self.expr(&unary.expr)?;
                let operator = match unary.op {
                    UnOp::Deref(_) => return Ok(operand),
                    UnOp::Neg(_) => "-",
                    UnOp::Not(_) => "!",
                    _ => return Err(unsupported(unary)),
                };
                Ok(Typed {
                    text: format!("{}{}", operator, operand.text),
                    ty: operand.ty,
                })
            }
            Expr::Paren(paren) => {
                let inner = self.expr(&paren.expr)?;
                Ok(Typed {
                    text: format!("({})", inner.text),
                    ty: inner.ty,
                })
            }
            Expr::Group(group) => self.expr(&group.expr),
            Expr::Reference(reference) if reference.mutability.is_some() => self.expr(&reference.expr),
            Expr::Call(call) => self.call(call),
            Expr::MethodCall(call) => self.method_call(call),
            Expr::Struct(expr) => self.struct_literal(expr),
            Expr::Cast(cast) => {
                let ty = data_type(&cast.ty)
                    .filter(|ty| ty.is_scalar())
                    .ok_or_else(|| unsupported(cast))?;
                let value = self.expr(&cast.expr)?;
                Ok(Typed::new(
                    construct(self.backend.type_name(ty), &[value.text]),
                    ty,
                ))
            }
            Expr::If(expr) => self.conditional(expr),
            other => Err(unsupported(other)),
        }
    }

    fn path(&mut self, expr: &syn::ExprPath) -> Translation<Typed> {
        if expr.qself.is_some() {
            return Err(unsupported(expr));
        }
        if let Some(ident) = expr.path.get_ident() {
            let name = ident.to_string();
            return match self.lookup(&name) {
                Some(binding) => Ok(Typed::new(binding.emitted.clone(), binding.ty)),
                None => Err(unresolved(name, expr)),
            };
        }
        if let Some(name) = associated_name(&expr.path) {
            return match self.resolver.resolve_associated(&name) {
                Some(Symbol::Literal(index)) => {
                    let literal = &self.effect.literals[index];
                    Ok(Typed::new(names::escaped(&literal.name), literal.data_type))
                }
                _ => Err(unresolved(format!("Self::{}", name), expr)),
            };
        }
        if let [ty, constant] = expr.path.segments.iter().collect::<Vec<_>>().as_slice() {
            if let Some(ty) = DataType::from_type_name(&ty.ident.to_string()) {
                match constant.ident.to_string().as_str() {
                    "ZERO" => return Ok(Typed::new(self.backend.zero_value(ty), ty)),
                    "IDENTITY" if ty == DataType::Matrix => {
                        return Ok(Typed::new(identity(self.backend), ty));
                    }
                    _ => {}
                }
            }
        }
        Err(unresolved(expr.to_token_stream().to_string(), expr))
    }

    fn field(&mut self, expr: &syn::ExprField) -> Translation<Typed> {
        let Member::Named(member) = &expr.member else {
            return Err(unsupported(expr));
        };
        let name = member.to_string();
        if is_self(&expr.base) {
            return match self.resolver.resolve_member(&name) {
                Some(Symbol::Constant { buffer, index }) => {
                    let constant = &self.effect.buffers[buffer].constants[index];
                    let ty = if constant.is_array {
                        ValueType::Array(constant.data_type)
                    } else {
                        ValueType::Data(constant.data_type)
                    };
                    Ok(Typed {
                        text: names::escaped(&constant.name),
                        ty: Some(ty),
                    })
                }
                Some(Symbol::Texture(index)) => Ok(Typed {
                    text: names::escaped(&self.effect.textures[index].name),
                    ty: Some(ValueType::Texture(index)),
                }),
                _ => Err(unresolved(format!("self.{}", name), expr)),
            };
        }
        let base = self.expr(&expr.base)?;
        self.swizzle(base, &name).ok_or_else(|| unsupported(expr))
    }

    fn swizzle(&self, base: Typed, swizzle: &str) -> Option<Typed> {
        let ty = base.data().filter(|ty| ty.is_vector())?;
        let len = swizzle_len(swizzle, ty.components())?;
        Some(Typed::new(
            format!("{}.{}", base.text, swizzle),
            DataType::vector(len)?,
        ))
    }

    fn index(&mut self, expr: &syn::ExprIndex) -> Translation<Typed> {
        let base = self.expr(&expr.expr)?;
        if let Expr::Tuple(tuple) = expr.index.as_ref() {
            let elems = tuple.elems.iter().collect::<Vec<_>>();
            let [row, column] = elems.as_slice() else {
                return Err(unsupported(expr));
            };
            if base.data() != Some(DataType::Matrix) {
                return Err(Diagnostic::at(
                    DiagnosticKind::NonMatrixIndex {
                        expression: expr.expr.to_token_stream().to_string(),
                    },
                    expr,
                ));
            }
            let row = self.expr(row)?;
            let column = self.expr(column)?;
            let text = match self.backend.matrix_order() {
                MatrixOrder::RowColumn => format!("{}[{}][{}]", base.text, row.text, column.text),
                MatrixOrder::ColumnRow => format!("{}[{}][{}]", base.text, column.text, row.text),
            };
            return Ok(Typed::new(text, DataType::Float));
        }
        let index = self.expr(&expr.index)?;
        let ty = match base.ty {
            Some(ValueType::Data(DataType::Matrix)) => {
                return Err(Diagnostic::at(
                    DiagnosticKind::AmbiguousMatrixIndex {
                        expression: expr.expr.to_token_stream().to_string(),
                    },
                    expr,
                ));
            }
            Some(ValueType::Array(ty)) => ty,
            Some(ValueType::Data(ty)) if ty.is_vector() => DataType::Float,
            _ => return Err(unsupported(expr)),
        };
        Ok(Typed::new(format!("{}[{}]", base.text, index.text), ty))
    }

    fn binary(&mut self, expr: &syn::ExprBinary) -> Translation<Typed> {
        enum Kind {
            Arithmetic,
            Boolean,
            Assign,
        }
        let (operator, kind) = match expr.op {
            BinOp::Add(_) => ("+", Kind::Arithmetic),
            BinOp::Sub(_) => ("-", Kind::Arithmetic),
            BinOp::Mul(_) => ("*", Kind::Arithmetic),
            BinOp::Div(_) => ("/", Kind::Arithmetic),
            BinOp::Rem(_) => ("%", Kind::Arithmetic),
            BinOp::And(_) => ("&&", Kind::Boolean),
            BinOp::Or(_) => ("||", Kind::Boolean),
            BinOp::Eq(_) => ("==", Kind::Boolean),
            BinOp::Lt(_) => ("<", Kind::Boolean),
            BinOp::Le(_) => ("<=", Kind::Boolean),
            BinOp::Ne(_) => ("!=", Kind::Boolean),
            BinOp::Ge(_) => (">=", Kind::Boolean),
            BinOp::Gt(_) => (">", Kind::Boolean),
            BinOp::AddAssign(_) => ("+=", Kind::Assign),
            BinOp::SubAssign(_) => ("-=", Kind::Assign),
            BinOp::MulAssign(_) => ("*=", Kind::Assign),
            BinOp::DivAssign(_) => ("/=", Kind::Assign),
            BinOp::RemAssign(_) => ("%=", Kind::Assign),
            _ => return Err(unsupported(expr)),
        };
        let left = self.expr(&expr.left)?;
        let right = self.expr(&expr.right)?;
        let (left_ty, right_ty) = (left.data(), right.data());

        let non_scalar = |ty: Option<DataType>| ty.is_some_and(|ty| !ty.is_scalar());
        let widest = || {
            if non_scalar(right_ty) && !non_scalar(left_ty) {
                right_ty
            } else {
                left_ty.or(right_ty)
            }
        };

        // `%` is integral in both targets; float operands need the backend.
        let is_float = |ty: Option<DataType>| ty.is_some_and(|ty| ty != DataType::Int);
        let is_remainder = matches!(expr.op, BinOp::Rem(_) | BinOp::RemAssign(_));
        if is_remainder && (is_float(left_ty) || is_float(right_ty)) {
            let remainder = self.backend.remainder(&left.text, &right.text);
            if let BinOp::RemAssign(_) = expr.op {
                return Ok(Typed {
                    text: format!("{} = {}", left.text, remainder),
                    ty: left.ty,
                });
            }
            return Ok(Typed {
                text: remainder,
                ty: widest().map(ValueType::Data),
            });
        }

        let is_product = matches!(expr.op, BinOp::Mul(_) | BinOp::MulAssign(_));
        let has_matrix = left_ty == Some(DataType::Matrix) || right_ty == Some(DataType::Matrix);
        if is_product && has_matrix && non_scalar(left_ty) && non_scalar(right_ty) {
            let product = self.backend.matrix_multiply(&left.text, &right.text);
            if let BinOp::MulAssign(_) = expr.op {
                return Ok(Typed {
                    text: format!("{} = {}", left.text, product),
                    ty: left.ty,
                });
            }
            let ty = match (left_ty, right_ty) {
                (Some(DataType::Matrix), Some(DataType::Matrix)) => DataType::Matrix,
                (Some(DataType::Matrix), Some(other)) | (Some(other), _) => other,
                (None, _) => DataType::Matrix,
            };
            return Ok(Typed::new(product, ty));
        }

        let ty = match kind {
            Kind::Boolean => Some(ValueType::Data(DataType::Bool)),
            Kind::Assign => left.ty,
            Kind::Arithmetic => widest().map(ValueType::Data),
        };
        Ok(Typed {
            text: format!("{} {} {}", left.text, operator, right.text),
            ty,
        })
    }

    fn call(&mut self, call: &syn::ExprCall) -> Translation<Typed> {
        let Expr::Path(func) = call.func.as_ref() else {
            return Err(unsupported(call));
        };
        if let Some(name) = associated_name(&func.path) {
            return match self.resolver.resolve_associated(&name) {
                Some(Symbol::Method(index)) => self.helper_call(index, &call.args, call),
                _ => Err(unresolved(format!("Self::{}", name), call)),
            };
        }
        if let [ty, constructor] = func.path.segments.iter().collect::<Vec<_>>().as_slice() {
            if let Some(ty) = DataType::from_type_name(&ty.ident.to_string()) {
                return self.construct(ty, &constructor.ident.to_string(), &call.args, call);
            }
        }
        if let Some(ident) = func.path.get_ident() {
            let name = ident.to_string();
            return match Intrinsic::from_name(&name) {
                Some(intrinsic) => {
                    let args = call.args.iter().collect::<Vec<_>>();
                    self.intrinsic(intrinsic, &name, &args, call)
                }
                None => Err(Diagnostic::at(DiagnosticKind::UnknownIntrinsic { name }, call)),
            };
        }
        Err(unresolved(func.to_token_stream().to_string(), call))
    }

    fn method_call(&mut self, call: &syn::ExprMethodCall) -> Translation<Typed> {
        if call.turbofish.is_some() {
            return Err(unsupported(call));
        }
        let name = call.method.to_string();
        if is_self(&call.receiver) {
            return match self.resolver.resolve_member(&name) {
                Some(Symbol::Method(index)) => self.helper_call(index, &call.args, call),
                _ => Err(unresolved(format!("self.{}", name), call)),
            };
        }
        if let Some(intrinsic) = Intrinsic::from_name(&name) {
            let mut args = vec![call.receiver.as_ref()];
            args.extend(call.args.iter());
            return self.intrinsic(intrinsic, &name, &args, call);
        }
        if call.args.is_empty() {
            let base = self.expr(&call.receiver)?;
            if let Some(swizzled) = self.swizzle(base, &name) {
                return Ok(swizzled);
            }
        }
        Err(Diagnostic::at(DiagnosticKind::UnknownIntrinsic { name }, call))
    }

    fn arguments(&mut self, args: &[&Expr]) -> Translation<Vec<Typed>> {
        args.iter().map(|arg| self.expr(arg)).collect()
    }

    fn helper_call<T: ToTokens>(
        &mut self,
        index: usize,
        args: &Punctuated<Expr, syn::token::Comma>,
        node: &T,
    ) -> Translation<Typed> {
        let effect = self.effect;
        let method = &effect.methods[index];
        if method.stage.is_some() {
            return Err(Diagnostic::at(
                DiagnosticKind::EntryPointCall {
                    name: method.name.clone(),
                },
                node,
            ));
        }
        if args.len() != method.parameters.len() {
            return Err(Diagnostic::at(
                DiagnosticKind::ArgumentCount {
                    name: method.name.clone(),
                    expected: method.parameters.len().to_string(),
                    found: args.len(),
                },
                node,
            ));
        }
        let args = self.arguments(&args.iter().collect::<Vec<_>>())?;
        let texts = args.into_iter().map(|arg| arg.text).collect::<Vec<_>>();
        Ok(Typed {
            text: construct(&names::escaped(&method.name), &texts),
            ty: method.return_type.map(ValueType::Data),
        })
    }

    fn construct<T: ToTokens>(
        &mut self,
        ty: DataType,
        constructor: &str,
        args: &Punctuated<Expr, syn::token::Comma>,
        node: &T,
    ) -> Translation<Typed> {
        let expect = |count: usize| {
            if args.len() == count {
                Ok(())
            } else {
                Err(Diagnostic::at(
                    DiagnosticKind::ArgumentCount {
                        name: format!("{}::{}", ty, constructor),
                        expected: count.to_string(),
                        found: args.len(),
                    },
                    node,
                ))
            }
        };
        match constructor {
            "new" if ty.is_vector() => {
                expect(ty.components())?;
                let args = self.arguments(&args.iter().collect::<Vec<_>>())?;
                let texts = args.into_iter().map(|arg| arg.text).collect::<Vec<_>>();
                Ok(Typed::new(construct(self.backend.type_name(ty), &texts), ty))
            }
            "splat" if ty.is_vector() => {
                expect(1)?;
                let args = self.arguments(&args.iter().collect::<Vec<_>>())?;
                let value = args.into_iter().map(|arg| arg.text).collect::<String>();
                Ok(Typed::new(self.backend.splat(ty, &value), ty))
            }
            "zero" | "default" => {
                expect(0)?;
                Ok(Typed::new(self.backend.zero_value(ty), ty))
            }
            "identity" if ty == DataType::Matrix => {
                expect(0)?;
                Ok(Typed::new(identity(self.backend), ty))
            }
            _ => Err(unresolved(format!("{}::{}", ty, constructor), node)),
        }
    }

    fn intrinsic<T: ToTokens>(
        &mut self,
        intrinsic: Intrinsic,
        name: &str,
        args: &[&Expr],
        node: &T,
    ) -> Translation<Typed> {
        let (min, max) = intrinsic.arity();
        if args.len() < min || args.len() > max {
            return Err(Diagnostic::at(
                DiagnosticKind::ArgumentCount {
                    name: name.to_owned(),
                    expected: intrinsic.describe_arity(),
                    found: args.len(),
                },
                node,
            ));
        }
        match intrinsic {
            Intrinsic::Discard => Err(unsupported(node)),
            Intrinsic::Sample | Intrinsic::SampleLevel => {
                let texture = self.expr(args[0])?;
                let Some(ValueType::Texture(index)) = texture.ty else {
                    return Err(Diagnostic::at(
                        DiagnosticKind::NotATexture {
                            expression: args[0].to_token_stream().to_string(),
                        },
                        args[0],
                    ));
                };
                let coords = self.expr(args[1])?;
                let lod = match args.get(2) {
                    Some(lod) => Some(self.expr(lod)?.text),
                    None => None,
                };
                let text = self.backend.sample(
                    self.stage,
                    &self.effect.textures[index],
                    &coords.text,
                    lod.as_deref(),
                );
                Ok(Typed::new(text, DataType::Vector4))
            }
            _ => {
                let args = self.arguments(args)?;
                let types = args.iter().map(Typed::data).collect::<Vec<_>>();
                let texts = args.into_iter().map(|arg| arg.text).collect::<Vec<_>>();
                let text = self
                    .backend
                    .intrinsic_call(intrinsic, &texts)
                    .unwrap_or_else(|| construct(self.backend.intrinsic_name(intrinsic), &texts));
                Ok(Typed {
                    text,
                    ty: intrinsic.result_type(&types).map(ValueType::Data),
                })
            }
        }
    }

    fn struct_literal(&mut self, expr: &syn::ExprStruct) -> Translation<Typed> {
        if expr.rest.is_some() || expr.dot2_token.is_some() || expr.qself.is_some() {
            return Err(unsupported(expr));
        }
        let ty = expr
            .path
            .segments
            .last()
            .and_then(|segment| DataType::from_type_name(&segment.ident.to_string()))
            .filter(|ty| ty.is_vector())
            .ok_or_else(|| unsupported(expr))?;
        if expr.fields.len() != ty.components() {
            return Err(unsupported(expr));
        }
        let mut texts = Vec::new();
        for component in ["x", "y", "z", "w"].iter().take(ty.components()) {
            let field = expr
                .fields
                .iter()
                .find(|field| matches!(&field.member, Member::Named(ident) if ident == component))
                .ok_or_else(|| unsupported(expr))?;
            texts.push(self.expr(&field.expr)?.text);
        }
        Ok(Typed::new(construct(self.backend.type_name(ty), &texts), ty))
    }

    /// `if c { a } else { b }` in value position.
    fn conditional(&mut self, expr: &syn::ExprIf) -> Translation<Typed> {
        let Some((_, otherwise)) = &expr.else_branch else {
            return Err(unsupported(expr));
        };
        let then = single_expr(&expr.then_branch).ok_or_else(|| unsupported(expr))?;
        let cond = self.expr(&expr.cond)?;
        let then = self.expr(then)?;
        let otherwise = match otherwise.as_ref() {
            Expr::Block(block) => {
                let value = single_expr(&block.block).ok_or_else(|| unsupported(expr))?;
                self.expr(value)?
            }
            Expr::If(nested) => self.conditional(nested)?,
            other => return Err(unsupported(other)),
        };
        Ok(Typed {
            text: format!("({} ? {} : {})", cond.text, then.text, otherwise.text),
            ty: then.ty.or(otherwise.ty),
        })
    }
}

fn is_discard(call: &syn::ExprCall) -> bool {
    matches!(call.func.as_ref(), Expr::Path(path) if path.path.is_ident("discard"))
}

fn literal(lit: &Lit) -> Translation<Typed> {
    match lit {
        Lit::Int(int) if int.suffix() == "f32" => {
            Ok(Typed::new(float_literal(int.base10_digits()), DataType::Float))
        }
        Lit::Int(int) => Ok(Typed::new(int.base10_digits().to_owned(), DataType::Int)),
        Lit::Float(float) => Ok(Typed::new(float_literal(float.base10_digits()), DataType::Float)),
        Lit::Bool(value) => Ok(Typed::new(value.value.to_string(), DataType::Bool)),
        other => Err(unsupported(other)),
    }
}

/// Generates the program for the stage entry point at `method` in `backend`'s
/// language.
pub fn generate_stage(
    effect: &EffectDeclaration,
    resolver: &dyn SymbolResolver,
    method: usize,
    backend: &dyn ShaderBackend,
) -> Result<String, Vec<Diagnostic>> {
    let entry = &effect.methods[method];
    let Some(stage) = entry.stage else {
        return Err(vec![Diagnostic::new(
            DiagnosticKind::InvalidAttribute {
                message: format!("`{}` is not a stage entry point", entry.name),
            },
            entry.location,
        )]);
    };
    debug!(
        effect = %effect.name,
        method = %entry.name,
        language = backend.language(),
        "generating stage program"
    );
    let usage = collect_usage(effect, resolver, method)?;

    let mut out = SourceWriter::new();
    let mut diagnostics = Vec::new();

    for &index in &usage.literals {
        let literal = &effect.literals[index];
        let mut translator = FunctionTranslator::new(effect, resolver, backend, stage, None);
        match translator.expr(&literal.value) {
            Ok(value) => backend.write_literal(&mut out, literal, &value.text),
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }
    out.blank();
    for &index in &usage.buffers {
        let buffer = &effect.buffers[index];
        backend.write_constant_buffer(&mut out, buffer, &buffer.layout());
        out.blank();
    }
    for &index in &usage.textures {
        backend.write_texture(&mut out, &effect.textures[index]);
    }
    out.blank();
    backend.write_stage_interface(&mut out, stage, entry);
    out.blank();

    for &index in &usage.helpers {
        let helper = &effect.methods[index];
        let mut translator = FunctionTranslator::new(effect, resolver, backend, stage, helper.return_type);
        translator.helper(&mut out, helper);
        diagnostics.append(&mut translator.diagnostics);
        out.blank();
    }

    let mut translator = FunctionTranslator::new(effect, resolver, backend, stage, None);
    translator.entry(&mut out, stage, entry);
    diagnostics.append(&mut translator.diagnostics);

    if diagnostics.is_empty() {
        Ok(out.finish())
    } else {
        Err(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_literals_keep_a_point() {
        assert_eq!(float_literal("1"), "1.0");
        assert_eq!(float_literal("2."), "2.0");
        assert_eq!(float_literal("0.25"), "0.25");
        assert_eq!(float_literal("1e-3"), "1e-3");
    }

    #[test]
    fn swizzles_stay_within_the_vector() {
        assert_eq!(swizzle_len("xy", 2), Some(2));
        assert_eq!(swizzle_len("rgba", 4), Some(4));
        assert_eq!(swizzle_len("xz", 2), None);
        assert_eq!(swizzle_len("xg", 4), None);
        assert_eq!(swizzle_len("xyzwx", 4), None);
    }
}
