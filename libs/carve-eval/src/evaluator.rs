//! # Evaluator
//!
//! Walks the AST against a stack of scopes, dispatching through the
//! standard-library symbol table and assembling the scene graph.
//!
//! Scope discipline: every block pushes a child context and pops it on
//! all exit paths (the pop happens before the `?` on the body's result),
//! so errors and cancellation cannot leak scope state. Cancellation is
//! polled at every statement boundary.

use std::sync::Arc;

use carve_mesh::math::Transform;
use carve_mesh::{Mesh, MeshDocument, Path, PathPoint};
use carve_parser::{
    Expression, ExpressionKind, Identifier, InfixOp, PrefixOp, Program, Span, Spanned, Statement,
};
use config::constants::{MAX_IMPORT_DEPTH, STACK_GROW_BYTES, STACK_RED_ZONE_BYTES};
use glam::DVec3;
use tracing::debug;

use crate::cache::GeometryCache;
use crate::context::{BlockClass, Context};
use crate::delegate::{Delegate, FileError};
use crate::error::{ImportedError, RuntimeError, RuntimeErrorKind};
use crate::geometry::{Geometry, GeometryKind};
use crate::scene::Scene;
use crate::stdlib::{member_allowed, stdlib};
use crate::symbols::{BuiltinBlock, Symbol};
use crate::value::{expand_range, Value, ValueType};

// =============================================================================
// EVALUATOR
// =============================================================================

/// Evaluates parsed programs into scenes.
pub struct Evaluator {
    delegate: Arc<dyn Delegate>,
    cache: GeometryCache,
    scopes: Vec<Context>,
    /// Name of the built-in function currently dispatching (used by the
    /// shared unary-math driver).
    current_function: String,
    import_depth: usize,
}

impl Evaluator {
    /// Creates an evaluator talking to the given host delegate.
    pub fn new(delegate: Arc<dyn Delegate>) -> Self {
        Self {
            delegate,
            cache: GeometryCache::new(),
            scopes: vec![Context::root()],
            current_function: String::new(),
            import_depth: 0,
        }
    }

    /// Uses an existing (shared) mesh cache.
    #[must_use]
    pub fn with_cache(mut self, cache: GeometryCache) -> Self {
        self.cache = cache;
        self
    }

    /// Evaluates a parsed program into a scene.
    pub fn evaluate(mut self, program: &Program) -> Result<Scene, RuntimeError> {
        self.eval_statements(&program.statements)?;
        let root = self.scopes.pop().expect("root scope always present");
        let mut children = Vec::new();
        for value in root.children {
            collect_geometry(value, &mut children);
        }
        debug!(nodes = children.len(), "evaluation complete");
        Ok(Scene {
            background: root.background,
            children,
            cache: self.cache,
        })
    }

    /// The current (innermost) scope.
    pub(crate) fn ctx(&self) -> &Context {
        self.scopes.last().expect("scope stack is never empty")
    }

    /// The current scope, mutably.
    pub(crate) fn ctx_mut(&mut self) -> &mut Context {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    /// The host delegate.
    pub(crate) fn delegate(&self) -> &Arc<dyn Delegate> {
        &self.delegate
    }

    /// Name of the function currently dispatching.
    pub(crate) fn current_function(&self) -> &str {
        &self.current_function
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn eval_statements(&mut self, statements: &[Statement]) -> Result<(), RuntimeError> {
        for statement in statements {
            if self.delegate.is_cancelled() {
                return Err(RuntimeError::cancelled());
            }
            self.eval_statement(statement)?;
        }
        Ok(())
    }

    fn eval_statement(&mut self, statement: &Statement) -> Result<(), RuntimeError> {
        match statement {
            Statement::Define { name, value, .. } => {
                let value = self.eval_expression(value)?;
                self.ctx_mut().define(&name.name, value);
                Ok(())
            }
            Statement::For {
                index,
                range,
                body,
                ..
            } => self.eval_for(index.as_ref(), range, body),
            Statement::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                let value = self.eval_expression(condition)?;
                let truth = value
                    .coerce(&ValueType::Boolean, condition.span())?
                    .as_boolean(condition.span())?;
                if truth {
                    self.eval_statements(then_body)
                } else if let Some(else_body) = else_body {
                    self.eval_statements(else_body)
                } else {
                    Ok(())
                }
            }
            Statement::Import { path, span } => self.eval_import(path, *span),
            Statement::Command {
                name,
                arg,
                children,
                span,
            } => self.eval_command(name, arg.as_ref(), children.as_deref(), *span),
        }
    }

    fn eval_for(
        &mut self,
        index: Option<&Identifier>,
        range: &Expression,
        body: &[Statement],
    ) -> Result<(), RuntimeError> {
        let value = self.eval_expression(range)?;
        let items: Vec<Value> = match value {
            Value::Range { from, to, step } => {
                expand_range(from, to, step).map(Value::Number).collect()
            }
            Value::Tuple(items) => items,
            other => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch {
                        expected: "a range or list".to_string(),
                        found: other.type_name().to_string(),
                    },
                    range.span(),
                ))
            }
        };

        // The loop variable shadows for the body only; any outer binding
        // is restored afterwards, including on error.
        let saved = index.and_then(|i| self.ctx().lookup(&i.name).cloned());
        let result: Result<(), RuntimeError> = (|| {
            for item in items {
                if let Some(index) = index {
                    self.ctx_mut().define(&index.name, item);
                }
                self.eval_statements(body)?;
            }
            Ok(())
        })();
        if let Some(index) = index {
            match saved {
                Some(value) => self.ctx_mut().define(&index.name, value),
                None => {
                    self.ctx_mut().symbols.remove(&index.name);
                }
            }
        }
        result
    }

    // =========================================================================
    // COMMANDS AND BLOCKS
    // =========================================================================

    fn eval_command(
        &mut self,
        name: &Identifier,
        arg: Option<&Expression>,
        children: Option<&[Statement]>,
        span: Span,
    ) -> Result<(), RuntimeError> {
        // User definitions shadow the standard library; invoking one
        // instantiates its value.
        if let Some(value) = self.lookup_user(&name.name) {
            if arg.is_some() || children.is_some() {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch {
                        expected: format!("nothing after '{}'", name.name),
                        found: "arguments".to_string(),
                    },
                    span,
                ));
            }
            return self.add_child(value, span);
        }

        if !member_allowed(self.ctx().block, &name.name) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::UnknownSymbol {
                    name: name.name.clone(),
                },
                name.span,
            ));
        }

        let symbol = match stdlib().lookup(&name.name) {
            Some(symbol) => symbol.clone(),
            None => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::UnknownSymbol {
                        name: name.name.clone(),
                    },
                    name.span,
                ))
            }
        };

        match symbol {
            Symbol::Command { param, run } | Symbol::Property { param, set: run, .. } => {
                if children.is_some() {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::TypeMismatch {
                            expected: format!("an argument for '{}'", name.name),
                            found: "a block".to_string(),
                        },
                        span,
                    ));
                }
                let (value, value_span) = match arg {
                    Some(expr) => (self.eval_expression(expr)?, expr.span()),
                    None => (Value::Void, span),
                };
                let value = value.coerce(&param, value_span)?;
                run(self, value, span)
            }
            Symbol::Function { param, run } => {
                // A function in statement position runs for its effect.
                let (value, value_span) = match arg {
                    Some(expr) => (self.eval_expression(expr)?, expr.span()),
                    None => (Value::Void, span),
                };
                let value = value.coerce(&param, value_span)?;
                self.current_function = name.name.clone();
                run(self, value, span).map(|_| ())
            }
            Symbol::Block(builtin) => {
                // `text "hello"` style content arguments are accepted by
                // the degrading blocks; other blocks only take children.
                if let Some(expr) = arg {
                    if matches!(builtin, BuiltinBlock::Text | BuiltinBlock::SvgPath) {
                        let _ = self.eval_expression(expr)?;
                    } else {
                        return Err(RuntimeError::new(
                            RuntimeErrorKind::TypeMismatch {
                                expected: format!("a block after '{}'", name.name),
                                found: "arguments".to_string(),
                            },
                            span,
                        ));
                    }
                }
                let value = self.eval_block(builtin, children.unwrap_or(&[]), span)?;
                self.add_child(value, span)
            }
            Symbol::Constant(_) => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: "a command".to_string(),
                    found: format!("the constant '{}'", name.name),
                },
                span,
            )),
            Symbol::Placeholder(expected) => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: expected.to_string(),
                    found: format!("the unbound symbol '{}'", name.name),
                },
                span,
            )),
        }
    }

    /// Evaluates a block call: push scope, run body, pop, close.
    fn eval_block(
        &mut self,
        builtin: BuiltinBlock,
        body: &[Statement],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        stacker::maybe_grow(STACK_RED_ZONE_BYTES, STACK_GROW_BYTES, || {
            let child = self.ctx().child(builtin.class(), span);
            self.scopes.push(child);
            let body_result = self.eval_statements(body);
            let ctx = self.scopes.pop().expect("block scope pushed above");
            body_result?;
            self.close_block(builtin, ctx, span)
        })
    }

    /// Turns a finished block context into the block's value.
    fn close_block(
        &mut self,
        builtin: BuiltinBlock,
        ctx: Context,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        use BuiltinBlock::*;
        let node_kind = match builtin {
            Group | Debug | MeshBlock => GeometryKind::Group,
            Union => GeometryKind::Union,
            Difference => GeometryKind::Difference,
            Intersection => GeometryKind::Intersection,
            Xor => GeometryKind::Xor,
            Stencil => GeometryKind::Stencil,
            Cube => GeometryKind::Cube,
            Sphere => GeometryKind::Sphere { detail: ctx.detail },
            Cylinder => GeometryKind::Cylinder { detail: ctx.detail },
            Cone => GeometryKind::Cone { detail: ctx.detail },
            Pyramid => GeometryKind::Pyramid {
                sides: ctx.extras.sides.unwrap_or(4),
            },
            Prism => GeometryKind::Prism {
                sides: ctx.extras.sides.unwrap_or(6),
            },
            Extrude => {
                let mut shapes = paths_in(&ctx.children);
                if shapes.is_empty() {
                    shapes.push(Path::square());
                }
                GeometryKind::Extrude {
                    shapes,
                    along: ctx.extras.along.clone(),
                }
            }
            Lathe => GeometryKind::Lathe {
                shapes: paths_in(&ctx.children),
                segments: ctx.detail,
            },
            Loft => GeometryKind::Loft {
                shapes: paths_in(&ctx.children),
            },
            Fill => GeometryKind::Fill {
                shapes: paths_in(&ctx.children),
            },
            Hull => GeometryKind::Hull {
                points: self.hull_points(&ctx, span)?,
            },
            PathBlock => {
                let mut points: Vec<PathPoint> = Vec::new();
                for child in &ctx.children {
                    match child {
                        Value::Point(point) => points.push(point.clone()),
                        Value::Path(path) => points.extend(path.points().iter().cloned()),
                        _ => {}
                    }
                }
                let path = Path::new(points, ctx.detail).transformed(&ctx.local);
                return Ok(Value::Path(path));
            }
            Circle => return Ok(Value::Path(Path::circle(ctx.detail).transformed(&ctx.local))),
            Square => return Ok(Value::Path(Path::square().transformed(&ctx.local))),
            PolygonShape => {
                let sides = ctx.extras.sides.unwrap_or(5);
                let radius = ctx.extras.radius.unwrap_or(0.5);
                return Ok(Value::Path(
                    Path::regular_polygon(sides, radius).transformed(&ctx.local),
                ));
            }
            Roundrect => {
                let radius = ctx.extras.radius.unwrap_or(0.25);
                return Ok(Value::Path(
                    Path::roundrect(1.0, 1.0, radius, ctx.detail).transformed(&ctx.local),
                ));
            }
            Text | SvgPath => {
                // No font engine or SVG sub-parser is hosted: these
                // degrade to an empty path list instead of failing the
                // build.
                debug!(block = ?builtin, "no renderer available; producing no paths");
                return Ok(Value::Void);
            }
            Camera => {
                let camera = crate::geometry::Camera {
                    position: Some(ctx.local.offset),
                    orientation: Some(ctx.local.rotation),
                    fov: ctx.extras.fov,
                    width: ctx.extras.width,
                    height: ctx.extras.height,
                    background: match &ctx.background {
                        Some(crate::context::Background::Color(c)) => Some(*c),
                        _ => None,
                    },
                };
                let mut node = Geometry::new(GeometryKind::Camera(camera), span);
                node.name = ctx.name;
                return Ok(Value::Mesh(node));
            }
            Light => {
                let light = crate::geometry::Light {
                    color: ctx.material.color.unwrap_or(carve_mesh::Color::WHITE),
                    position: Some(ctx.local.offset),
                    orientation: Some(ctx.local.rotation),
                    spread: ctx.extras.spread,
                    penumbra: ctx.extras.penumbra,
                };
                let mut node = Geometry::new(GeometryKind::Light(light), span);
                node.name = ctx.name;
                return Ok(Value::Mesh(node));
            }
        };

        let mut node = Geometry::new(node_kind, span);
        node.transform = ctx.local;
        node.material = ctx.material;
        node.smoothing = ctx.smoothing;
        node.name = ctx.name;
        if matches!(
            builtin,
            Group | Union | Difference | Intersection | Xor | Stencil | Debug | MeshBlock
        ) {
            for value in ctx.children {
                collect_geometry(value, &mut node.children);
            }
        }
        if builtin == Debug {
            debug!(children = node.children.len(), "debug block");
        }
        Ok(Value::Mesh(node))
    }

    /// Gathers hull input points from a block's children: raw points,
    /// path vertices, and the vertices of any mesh children (which must
    /// build eagerly).
    fn hull_points(&self, ctx: &Context, span: Span) -> Result<Vec<DVec3>, RuntimeError> {
        let mut points = Vec::new();
        let delegate = self.delegate.clone();
        let cancel = move || delegate.is_cancelled();
        for child in &ctx.children {
            match child {
                Value::Point(point) => points.push(point.position),
                Value::Path(path) => {
                    points.extend(path.points().iter().map(|p| p.position));
                }
                Value::Mesh(geometry) => {
                    let mesh = geometry
                        .build(&self.cache, &cancel)
                        .map_err(|e| RuntimeError::from_geometry(e, span))?;
                    for polygon in mesh.polygons() {
                        points.extend(polygon.vertices().iter().map(|v| v.position));
                    }
                }
                _ => {}
            }
        }
        Ok(points)
    }

    /// Routes a produced value into the current scope's children,
    /// applying the sibling cursor.
    fn add_child(&mut self, value: Value, span: Span) -> Result<(), RuntimeError> {
        match value {
            Value::Void => Ok(()),
            Value::Mesh(mut geometry) => {
                if !self.ctx().block.accepts_meshes()
                    && self.ctx().block != BlockClass::Builder
                {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::TypeMismatch {
                            expected: "a path or point".to_string(),
                            found: "a mesh".to_string(),
                        },
                        span,
                    ));
                }
                geometry.transform = self.ctx().cursor.combined(&geometry.transform);
                self.ctx_mut().children.push(Value::Mesh(geometry));
                Ok(())
            }
            Value::Path(path) => {
                let moved = path.transformed(&self.ctx().cursor);
                self.ctx_mut().children.push(Value::Path(moved));
                Ok(())
            }
            Value::Point(_) => {
                self.ctx_mut().children.push(value);
                Ok(())
            }
            Value::Tuple(items) => {
                for item in items {
                    self.add_child(item, span)?;
                }
                Ok(())
            }
            other => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: "a mesh, path, or point".to_string(),
                    found: other.type_name().to_string(),
                },
                span,
            )),
        }
    }

    // =========================================================================
    // IMPORT
    // =========================================================================

    fn eval_import(&mut self, path_expr: &Expression, span: Span) -> Result<(), RuntimeError> {
        let path = self
            .eval_expression(path_expr)?
            .coerce(&ValueType::String, path_expr.span())?
            .as_string(path_expr.span())?;

        if self.import_depth >= MAX_IMPORT_DEPTH {
            return Err(RuntimeError::new(
                RuntimeErrorKind::ImportDepthExceeded { path },
                span,
            ));
        }

        // Mesh documents import as concrete geometry.
        if path.ends_with(".json") || path.ends_with(".mesh") {
            let text = self.read_import(&path, span)?;
            let mesh = MeshDocument::from_json(&text)
                .and_then(MeshDocument::into_mesh)
                .map_err(|_| {
                    RuntimeError::new(
                        RuntimeErrorKind::FileParsingError { path: path.clone() },
                        span,
                    )
                })?;
            return self.push_imported_mesh(mesh, span);
        }

        // Foreign model formats go through the host.
        if !path.ends_with(".carve") {
            if let Some(mesh) = self.delegate.import_geometry(&path) {
                return self.push_imported_mesh(mesh, span);
            }
            // Any other recognizable extension is the wrong kind of
            // file, not malformed Carve source.
            if std::path::Path::new(&path).extension().is_some() {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::FileTypeMismatch {
                        path,
                        expected: "Carve script or mesh document".to_string(),
                    },
                    span,
                ));
            }
        }

        // Otherwise the file is Carve source, spliced into the current
        // scope.
        let source = self.read_import(&path, span)?;
        let parsed = carve_parser::parse(&source).map_err(|e| {
            RuntimeError::new(
                RuntimeErrorKind::ImportError {
                    path: path.clone(),
                    inner: ImportedError::Parse(e),
                    source: source.clone(),
                },
                span,
            )
        })?;
        if let Some(first) = parsed.errors.first() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::ImportError {
                    path,
                    inner: ImportedError::Parse(first.clone()),
                    source,
                },
                span,
            ));
        }

        self.import_depth += 1;
        let result = self.eval_statements(&parsed.program.statements);
        self.import_depth -= 1;
        result.map_err(|e| {
            if e.is_cancellation() {
                e
            } else {
                RuntimeError::new(
                    RuntimeErrorKind::ImportError {
                        path,
                        inner: ImportedError::Runtime(Box::new(e)),
                        source,
                    },
                    span,
                )
            }
        })
    }

    fn read_import(&self, path: &str, span: Span) -> Result<String, RuntimeError> {
        self.delegate.read_file(path).map_err(|e| {
            let kind = match e {
                FileError::NotFound(path) => RuntimeErrorKind::FileNotFound { path },
                FileError::AccessRestricted(path) => {
                    RuntimeErrorKind::FileAccessRestricted { path }
                }
            };
            RuntimeError::new(kind, span)
        })
    }

    fn push_imported_mesh(&mut self, mesh: Mesh, span: Span) -> Result<(), RuntimeError> {
        let node = Geometry::new(GeometryKind::Mesh(mesh), span);
        self.add_child(Value::Mesh(node), span)
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn eval_expression(&mut self, expr: &Expression) -> Result<Value, RuntimeError> {
        let span = expr.span();
        match &expr.kind {
            ExpressionKind::Number(n) => Ok(Value::Number(*n)),
            ExpressionKind::String(s) => Ok(Value::String(s.clone())),
            ExpressionKind::Color([r, g, b, a]) => {
                Ok(Value::Color(carve_mesh::Color::new(*r, *g, *b, *a)))
            }
            ExpressionKind::Identifier(name) => self.eval_identifier(name, span),
            ExpressionKind::Member { base, member } => {
                let value = self.eval_expression(base)?;
                value.member(member, span)
            }
            ExpressionKind::Call { name, args } => self.eval_call(name, args, span),
            ExpressionKind::Tuple(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expression(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Tuple(values))
            }
            ExpressionKind::Prefix { op, operand } => {
                let value = self.eval_expression(operand)?;
                self.eval_prefix(*op, value, span)
            }
            ExpressionKind::Infix { op, lhs, rhs } => self.eval_infix(*op, lhs, rhs, span),
            ExpressionKind::Range { from, to, step } => {
                let from = self.eval_expression(from)?.as_number(span)?;
                let to = self.eval_expression(to)?.as_number(span)?;
                let step = match step {
                    Some(step) => Some(self.eval_expression(step)?.as_number(span)?),
                    None => None,
                };
                Ok(Value::Range { from, to, step })
            }
        }
    }

    fn eval_identifier(&mut self, name: &str, span: Span) -> Result<Value, RuntimeError> {
        if let Some(value) = self.lookup_user(name) {
            return Ok(value);
        }
        match stdlib().lookup(name) {
            Some(Symbol::Constant(value)) => Ok(value.clone()),
            Some(Symbol::Property { get, .. }) => Ok(get(self)),
            Some(Symbol::Function { param, run }) if *param == ValueType::Void => {
                self.current_function = name.to_string();
                run(self, Value::Void, span)
            }
            Some(Symbol::Function { .. }) => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: format!("arguments for '{name}'"),
                    found: "nothing".to_string(),
                },
                span,
            )),
            Some(Symbol::Block(builtin)) => {
                // A bare block name in expression position produces its
                // default value, so `define ball sphere` works.
                let builtin = *builtin;
                self.eval_block(builtin, &[], span)
            }
            Some(Symbol::Placeholder(expected)) => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: expected.to_string(),
                    found: format!("the unbound symbol '{name}'"),
                },
                span,
            )),
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::UnknownSymbol {
                    name: name.to_string(),
                },
                span,
            )),
        }
    }

    fn eval_call(
        &mut self,
        name: &str,
        args: &[Expression],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match stdlib().lookup(name) {
            Some(Symbol::Function { param, run }) => {
                let param = param.clone();
                let run = *run;
                let value = match args.len() {
                    0 => Value::Void,
                    1 => self.eval_expression(&args[0])?,
                    _ => Value::Tuple(
                        args.iter()
                            .map(|a| self.eval_expression(a))
                            .collect::<Result<Vec<_>, _>>()?,
                    ),
                };
                let value = value.coerce(&param, span)?;
                self.current_function = name.to_string();
                run(self, value, span)
            }
            Some(_) => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: "a function".to_string(),
                    found: format!("'{name}'"),
                },
                span,
            )),
            None if self.lookup_user(name).is_some() => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: "a function".to_string(),
                    found: format!("the value '{name}'"),
                },
                span,
            )),
            None => Err(RuntimeError::new(
                RuntimeErrorKind::UnknownSymbol {
                    name: name.to_string(),
                },
                span,
            )),
        }
    }

    fn eval_prefix(&self, op: PrefixOp, value: Value, span: Span) -> Result<Value, RuntimeError> {
        match op {
            PrefixOp::Minus => match value {
                Value::Number(n) => Ok(Value::Number(-n)),
                Value::Vector(v) => Ok(Value::Vector(-v)),
                Value::Tuple(items) => {
                    let negated = items
                        .into_iter()
                        .map(|item| match item {
                            Value::Number(n) => Ok(Value::Number(-n)),
                            other => Err(RuntimeError::new(
                                RuntimeErrorKind::TypeMismatch {
                                    expected: "a number".to_string(),
                                    found: other.type_name().to_string(),
                                },
                                span,
                            )),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::Tuple(negated))
                }
                other => Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch {
                        expected: "a number or vector".to_string(),
                        found: other.type_name().to_string(),
                    },
                    span,
                )),
            },
            PrefixOp::Not => Ok(Value::Boolean(!value.as_boolean(span)?)),
        }
    }

    fn eval_infix(
        &mut self,
        op: InfixOp,
        lhs: &Expression,
        rhs: &Expression,
        _span: Span,
    ) -> Result<Value, RuntimeError> {
        // Boolean operators short-circuit.
        if matches!(op, InfixOp::And | InfixOp::Or) {
            let left = self.eval_expression(lhs)?.as_boolean(lhs.span())?;
            return match (op, left) {
                (InfixOp::And, false) => Ok(Value::Boolean(false)),
                (InfixOp::Or, true) => Ok(Value::Boolean(true)),
                _ => {
                    let right = self.eval_expression(rhs)?.as_boolean(rhs.span())?;
                    Ok(Value::Boolean(right))
                }
            };
        }

        let left = self.eval_expression(lhs)?;
        let right = self.eval_expression(rhs)?;

        if matches!(op, InfixOp::Equal | InfixOp::NotEqual) {
            let equal = values_equal(&left, &right);
            return Ok(Value::Boolean(if op == InfixOp::Equal {
                equal
            } else {
                !equal
            }));
        }

        let a = left.as_number(lhs.span())?;
        let b = right.as_number(rhs.span())?;
        let value = match op {
            InfixOp::Add => Value::Number(a + b),
            InfixOp::Subtract => Value::Number(a - b),
            InfixOp::Multiply => Value::Number(a * b),
            InfixOp::Divide => Value::Number(a / b),
            InfixOp::Less => Value::Boolean(a < b),
            InfixOp::LessOrEqual => Value::Boolean(a <= b),
            InfixOp::Greater => Value::Boolean(a > b),
            InfixOp::GreaterOrEqual => Value::Boolean(a >= b),
            InfixOp::Equal
            | InfixOp::NotEqual
            | InfixOp::And
            | InfixOp::Or => unreachable!("handled above"),
        };
        Ok(value)
    }

    /// Looks a name up through the scope stack, innermost first.
    fn lookup_user(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.lookup(name))
            .cloned()
    }
}

/// Tolerant equality between values (numbers compare within epsilon).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => carve_mesh::math::approx_eq(*x, *y),
        (Value::Vector(x), Value::Vector(y)) | (Value::Size(x), Value::Size(y)) => {
            carve_mesh::math::approx_eq_vec(*x, *y)
        }
        (Value::Tuple(xs), Value::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

/// Extracts the path inputs of a builder block: path children as-is,
/// with any loose points gathered into one trailing path.
fn paths_in(children: &[Value]) -> Vec<Path> {
    let mut paths = Vec::new();
    let mut loose: Vec<PathPoint> = Vec::new();
    for child in children {
        match child {
            Value::Path(path) => paths.push(path.clone()),
            Value::Point(point) => loose.push(point.clone()),
            _ => {}
        }
    }
    if !loose.is_empty() {
        paths.push(Path::from_points(loose));
    }
    paths
}

/// Flattens a child value into geometry nodes (paths become fill nodes so
/// they stay visible).
fn collect_geometry(value: Value, out: &mut Vec<Geometry>) {
    match value {
        Value::Mesh(geometry) => out.push(geometry),
        Value::Path(path) => {
            let mut node = Geometry::new(
                GeometryKind::Fill {
                    shapes: vec![path],
                },
                Span::zero(),
            );
            node.transform = Transform::IDENTITY;
            out.push(node);
        }
        Value::Tuple(items) => {
            for item in items {
                collect_geometry(item, out);
            }
        }
        _ => {}
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::InMemoryFiles;
    use carve_mesh::NEVER_CANCELLED;

    fn evaluate(source: &str) -> Result<Scene, RuntimeError> {
        evaluate_with(source, InMemoryFiles::new()).0
    }

    fn evaluate_with(
        source: &str,
        files: InMemoryFiles,
    ) -> (Result<Scene, RuntimeError>, Arc<InMemoryFiles>) {
        let delegate = Arc::new(files);
        let parsed = carve_parser::parse(source).expect("lexes");
        assert!(parsed.is_ok(), "parse errors: {:?}", parsed.errors);
        let result =
            Evaluator::new(delegate.clone() as Arc<dyn Delegate>).evaluate(&parsed.program);
        (result, delegate)
    }

    #[test]
    fn test_cube_scene() {
        let scene = evaluate("cube").unwrap();
        assert_eq!(scene.children.len(), 1);
        assert_eq!(scene.children[0].kind, GeometryKind::Cube);
    }

    #[test]
    fn test_cube_with_size() {
        let scene = evaluate("cube { size 2 }").unwrap();
        scene.build_meshes(NEVER_CANCELLED).unwrap();
        let mesh = scene.children[0].built_mesh().unwrap();
        assert_eq!(mesh.polygons().len(), 6);
        let bounds = mesh.bounds();
        assert!((bounds.min.x + 1.0).abs() < 1e-9);
        assert!((bounds.max.x - 1.0).abs() < 1e-9);
        assert!(mesh.is_watertight());
        assert!(mesh.is_convex());
    }

    #[test]
    fn test_define_and_use() {
        let scene = evaluate("define s 3\ncube { size s }").unwrap();
        scene.build_meshes(NEVER_CANCELLED).unwrap();
        let bounds = scene.children[0].built_mesh().unwrap().bounds();
        assert!((bounds.max.x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_translate_affects_later_siblings() {
        let scene = evaluate("cube\ntranslate 2 0 0\ncube").unwrap();
        scene.build_meshes(NEVER_CANCELLED).unwrap();
        let first = scene.children[0].built_mesh().unwrap().bounds();
        let second = scene.children[1].built_mesh().unwrap().bounds();
        assert!((first.center().x).abs() < 1e-9);
        assert!((second.center().x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_translate_accumulates() {
        let scene = evaluate("translate 1 0 0\ntranslate 1 0 0\ncube").unwrap();
        scene.build_meshes(NEVER_CANCELLED).unwrap();
        let bounds = scene.children[0].built_mesh().unwrap().bounds();
        assert!((bounds.center().x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_for_loop_prints() {
        let (scene, files) = evaluate_with("for i in 0 to 5 step 2 { print i }", InMemoryFiles::new());
        scene.unwrap();
        assert_eq!(files.log(), vec!["0", "2", "4"]);
    }

    #[test]
    fn test_for_loop_descending() {
        let (scene, files) = evaluate_with("for i in 3 to 1 { print i }", InMemoryFiles::new());
        scene.unwrap();
        assert_eq!(files.log(), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_for_index_is_scoped() {
        let error = evaluate("for i in 1 to 3 { cube }\nprint i").unwrap_err();
        assert!(matches!(
            error.kind,
            RuntimeErrorKind::UnknownSymbol { .. }
        ));
    }

    #[test]
    fn test_if_else() {
        let (scene, files) = evaluate_with(
            "define x 5\nif x > 3 {\nprint \"big\"\n} else {\nprint \"small\"\n}",
            InMemoryFiles::new(),
        );
        scene.unwrap();
        assert_eq!(files.log(), vec!["big"]);
    }

    #[test]
    fn test_rnd_deterministic_with_seed() {
        let (first, files_a) = evaluate_with("seed 1\nprint rnd\nprint rnd\nprint rnd\nprint rnd", InMemoryFiles::new());
        first.unwrap();
        let (second, files_b) = evaluate_with("seed 1\nprint rnd\nprint rnd\nprint rnd\nprint rnd", InMemoryFiles::new());
        second.unwrap();
        assert_eq!(files_a.log(), files_b.log());
        assert_eq!(files_a.log().len(), 4);
    }

    #[test]
    fn test_assert_failure() {
        let error = evaluate("assert 1 > 2").unwrap_err();
        assert!(matches!(
            error.kind,
            RuntimeErrorKind::AssertionFailure { .. }
        ));
    }

    #[test]
    fn test_unknown_symbol() {
        let error = evaluate("frobnicate").unwrap_err();
        match error.kind {
            RuntimeErrorKind::UnknownSymbol { name } => assert_eq!(name, "frobnicate"),
            other => panic!("expected unknown symbol, got {other:?}"),
        }
    }

    #[test]
    fn test_point_outside_path_is_unknown() {
        let error = evaluate("point 1 0 0").unwrap_err();
        assert!(matches!(
            error.kind,
            RuntimeErrorKind::UnknownSymbol { .. }
        ));
    }

    #[test]
    fn test_difference_block() {
        let scene = evaluate("difference {\ncube\ncube { size 0.5\nposition 0.5 0 0 }\n}").unwrap();
        scene.build_meshes(NEVER_CANCELLED).unwrap();
        let mesh = scene.children[0].built_mesh().unwrap();
        assert!(mesh.contains_point(DVec3::new(-0.25, 0.0, 0.0)));
        assert!(!mesh.contains_point(DVec3::new(0.45, 0.0, 0.0)));
    }

    #[test]
    fn test_path_block() {
        let scene = evaluate("path {\npoint -1 0\ncurve 0 1\npoint 1 0\n}").unwrap();
        // A bare path at the top level becomes a fill node.
        assert_eq!(scene.children.len(), 1);
        assert!(matches!(
            scene.children[0].kind,
            GeometryKind::Fill { .. }
        ));
    }

    #[test]
    fn test_path_edge_vertices_scenario() {
        let scene = evaluate("detail 4\npath {\npoint -1 0\ncurve 0 1\npoint 1 0\n}").unwrap();
        match &scene.children[0].kind {
            GeometryKind::Fill { shapes } => {
                let ev = shapes[0].edge_vertices();
                assert_eq!(ev.len(), 16); // 8 position-pairs
            }
            other => panic!("expected fill, got {other:?}"),
        }
    }

    #[test]
    fn test_define_block_value() {
        let scene = evaluate("define ball sphere\nball\ntranslate 2 0 0\nball").unwrap();
        assert_eq!(scene.children.len(), 2);
        assert!(matches!(
            scene.children[0].kind,
            GeometryKind::Sphere { .. }
        ));
    }

    #[test]
    fn test_import_source() {
        let mut files = InMemoryFiles::new();
        files.insert("lib.carve", "define unit 2");
        let (scene, _) = evaluate_with("import \"lib.carve\"\ncube { size unit }", files);
        let scene = scene.unwrap();
        scene.build_meshes(NEVER_CANCELLED).unwrap();
        let bounds = scene.children[0].built_mesh().unwrap().bounds();
        assert!((bounds.max.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_import_missing_file() {
        let error = evaluate("import \"missing.carve\"").unwrap_err();
        assert!(matches!(error.kind, RuntimeErrorKind::FileNotFound { .. }));
    }

    #[test]
    fn test_import_wraps_inner_error() {
        let mut files = InMemoryFiles::new();
        files.insert("bad.carve", "assert false");
        let (result, _) = evaluate_with("import \"bad.carve\"", files);
        let error = result.unwrap_err();
        match error.kind {
            RuntimeErrorKind::ImportError { inner, source, .. } => {
                assert!(matches!(inner, ImportedError::Runtime(_)));
                assert_eq!(source, "assert false");
            }
            other => panic!("expected import error, got {other:?}"),
        }
    }

    #[test]
    fn test_import_foreign_extension_is_type_mismatch() {
        let mut files = InMemoryFiles::new();
        files.insert("model.obj", "o cube");
        let (result, _) = evaluate_with("import \"model.obj\"", files);
        assert!(matches!(
            result.unwrap_err().kind,
            RuntimeErrorKind::FileTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_import_cycle_exceeds_depth() {
        fn innermost(error: &RuntimeError) -> &RuntimeError {
            match &error.kind {
                RuntimeErrorKind::ImportError {
                    inner: ImportedError::Runtime(inner),
                    ..
                } => innermost(inner),
                _ => error,
            }
        }

        let mut files = InMemoryFiles::new();
        files.insert("loop.carve", "import \"loop.carve\"");
        let (result, _) = evaluate_with("import \"loop.carve\"", files);
        let error = result.unwrap_err();
        assert!(matches!(
            innermost(&error).kind,
            RuntimeErrorKind::ImportDepthExceeded { .. }
        ));
    }

    #[test]
    fn test_blank_font_is_unknown() {
        let error = evaluate("font \"  \"").unwrap_err();
        assert!(matches!(error.kind, RuntimeErrorKind::UnknownFont { .. }));
    }

    #[test]
    fn test_background_flows_to_scene() {
        let scene = evaluate("background #00f").unwrap();
        assert!(matches!(
            scene.background,
            Some(crate::context::Background::Color(_))
        ));
    }

    #[test]
    fn test_camera_and_light() {
        let scene =
            evaluate("camera {\nposition 0 0 5\nfov 0.25\n}\nlight {\ncolor red\n}").unwrap();
        assert_eq!(scene.cameras().count(), 1);
        assert_eq!(scene.lights().count(), 1);
        assert_eq!(scene.shapes().count(), 0);
    }

    #[test]
    fn test_math_functions() {
        let (result, files) = evaluate_with(
            "print max(1 7 3)\nprint pow(2 10)\nprint floor(2.9)",
            InMemoryFiles::new(),
        );
        result.unwrap();
        assert_eq!(files.log(), vec!["7", "1024", "2"]);
    }

    #[test]
    fn test_string_functions() {
        let (result, files) = evaluate_with(
            "print trim(\"  hi  \")\nprint join(split(\"a-b-c\" \"-\") \"+\")",
            InMemoryFiles::new(),
        );
        result.unwrap();
        assert_eq!(files.log(), vec!["hi", "a+b+c"]);
    }

    #[test]
    fn test_cancellation_at_statement_boundary() {
        let files = InMemoryFiles::new();
        files.cancellation_flag().store(true, std::sync::atomic::Ordering::Relaxed);
        let (result, _) = evaluate_with("cube", files);
        assert!(result.unwrap_err().is_cancellation());
    }

    #[test]
    fn test_scope_restored_after_block() {
        let (result, files) = evaluate_with(
            "color red\ngroup {\ncolor blue\n}\nprint color.red",
            InMemoryFiles::new(),
        );
        result.unwrap();
        // Outer color unchanged by the block's assignment.
        assert_eq!(files.log(), vec!["1"]);
    }

    #[test]
    fn test_evaluator_determinism_property() {
        let source = "seed 7\ndefine jitter rnd\ncube { size 1 + jitter }";
        let a = evaluate(source).unwrap();
        let b = evaluate(source).unwrap();
        a.build_meshes(NEVER_CANCELLED).unwrap();
        b.build_meshes(NEVER_CANCELLED).unwrap();
        let ma = a.children[0].built_mesh().unwrap();
        let mb = b.children[0].built_mesh().unwrap();
        assert_eq!(ma, mb);
    }
}
