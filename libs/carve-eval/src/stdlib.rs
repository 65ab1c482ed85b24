//! # Standard Library
//!
//! The built-in symbol table: blocks, commands, properties, functions,
//! and constants, plus the static member rules saying which symbols are
//! legal inside which block class.
//!
//! Arguments are coerced to each symbol's declared parameter type before
//! its implementation runs, so implementations match on the expected
//! variants directly.

use std::collections::HashMap;
use std::sync::OnceLock;

use carve_mesh::{Color, PathPoint};
use carve_parser::Span;
use glam::DVec3;

use crate::context::{Background, BlockClass};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::evaluator::Evaluator;
use crate::symbols::{BuiltinBlock, Symbol};
use crate::value::{Value, ValueType};

// =============================================================================
// TABLE
// =============================================================================

/// The standard library table.
pub struct Stdlib {
    symbols: HashMap<&'static str, Symbol>,
}

impl Stdlib {
    /// Looks up a built-in symbol.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// The shared standard library.
pub fn stdlib() -> &'static Stdlib {
    static TABLE: OnceLock<Stdlib> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Whether a member symbol is legal inside a block class.
///
/// This is the "static symbol set" of each block type: commands outside
/// their home block are unknown symbols, with the span pointing at the
/// offending use.
pub fn member_allowed(class: BlockClass, name: &str) -> bool {
    use BlockClass::*;
    match name {
        // Expression-level symbols are legal everywhere.
        _ if matches!(
            name,
            "pi" | "true"
                | "false"
                | "rnd"
                | "seed"
                | "round"
                | "floor"
                | "ceil"
                | "max"
                | "min"
                | "abs"
                | "sqrt"
                | "pow"
                | "cos"
                | "sin"
                | "tan"
                | "acos"
                | "asin"
                | "atan"
                | "atan2"
                | "not"
                | "split"
                | "join"
                | "trim"
                | "print"
                | "assert"
                | "detail"
                | "smoothing"
                | "font"
        ) =>
        {
            true
        }
        "translate" | "rotate" | "scale" => matches!(
            class,
            Root | Container | Debug | MeshBlock | PathBlock | Builder
        ),
        "position" | "orientation" | "size" => !matches!(class, Root),
        "color" | "opacity" | "texture" => true,
        "background" => matches!(class, Root | Camera),
        "name" => !matches!(class, Root),
        "point" | "curve" => matches!(class, PathBlock),
        "sides" => matches!(class, Primitive | PathShape),
        "radius" => matches!(class, PathShape),
        "along" => matches!(class, Builder),
        "fov" | "width" | "height" => matches!(class, Camera),
        "spread" | "penumbra" => matches!(class, Light),
        "wrapwidth" | "linespacing" => matches!(class, TextBlock),
        // Mesh-producing blocks.
        "group" | "union" | "difference" | "intersection" | "xor" | "stencil" | "cube"
        | "sphere" | "cylinder" | "cone" | "pyramid" | "prism" | "extrude" | "lathe"
        | "loft" | "fill" | "hull" | "mesh" | "debug" => {
            class.accepts_meshes() || matches!(class, Builder)
        }
        // Path-producing blocks.
        "path" | "circle" | "square" | "polygon" | "roundrect" | "text" | "svgpath" => {
            class.accepts_paths() || matches!(class, PathShape)
        }
        "camera" | "light" => matches!(class, Root | Container | Debug),
        // Anything else (user symbols) is scope-checked, not class-checked.
        _ => true,
    }
}

fn build_table() -> Stdlib {
    let mut t: HashMap<&'static str, Symbol> = HashMap::new();

    // Blocks ------------------------------------------------------------
    let blocks: [(&'static str, BuiltinBlock); 28] = [
        ("group", BuiltinBlock::Group),
        ("union", BuiltinBlock::Union),
        ("difference", BuiltinBlock::Difference),
        ("intersection", BuiltinBlock::Intersection),
        ("xor", BuiltinBlock::Xor),
        ("stencil", BuiltinBlock::Stencil),
        ("cube", BuiltinBlock::Cube),
        ("sphere", BuiltinBlock::Sphere),
        ("cylinder", BuiltinBlock::Cylinder),
        ("cone", BuiltinBlock::Cone),
        ("pyramid", BuiltinBlock::Pyramid),
        ("prism", BuiltinBlock::Prism),
        ("extrude", BuiltinBlock::Extrude),
        ("lathe", BuiltinBlock::Lathe),
        ("loft", BuiltinBlock::Loft),
        ("fill", BuiltinBlock::Fill),
        ("hull", BuiltinBlock::Hull),
        ("path", BuiltinBlock::PathBlock),
        ("circle", BuiltinBlock::Circle),
        ("square", BuiltinBlock::Square),
        ("polygon", BuiltinBlock::PolygonShape),
        ("roundrect", BuiltinBlock::Roundrect),
        ("text", BuiltinBlock::Text),
        ("svgpath", BuiltinBlock::SvgPath),
        ("camera", BuiltinBlock::Camera),
        ("light", BuiltinBlock::Light),
        ("debug", BuiltinBlock::Debug),
        ("mesh", BuiltinBlock::MeshBlock),
    ];
    for (name, block) in blocks {
        t.insert(name, Symbol::Block(block));
    }

    // Transform commands -------------------------------------------------
    t.insert(
        "translate",
        Symbol::Command {
            param: ValueType::Vector,
            run: cmd_translate,
        },
    );
    t.insert(
        "rotate",
        Symbol::Command {
            param: ValueType::Rotation,
            run: cmd_rotate,
        },
    );
    t.insert(
        "scale",
        Symbol::Command {
            param: ValueType::Size,
            run: cmd_scale,
        },
    );

    // Placement properties ------------------------------------------------
    t.insert(
        "position",
        Symbol::Property {
            param: ValueType::Vector,
            set: set_position,
            get: get_position,
        },
    );
    t.insert(
        "orientation",
        Symbol::Property {
            param: ValueType::Rotation,
            set: set_orientation,
            get: get_orientation,
        },
    );
    t.insert(
        "size",
        Symbol::Property {
            param: ValueType::Size,
            set: set_size,
            get: get_size,
        },
    );

    // Appearance properties -----------------------------------------------
    t.insert(
        "color",
        Symbol::Property {
            param: ValueType::Color,
            set: set_color,
            get: get_color,
        },
    );
    t.insert(
        "opacity",
        Symbol::Property {
            param: ValueType::Number,
            set: set_opacity,
            get: get_opacity,
        },
    );
    t.insert(
        "texture",
        Symbol::Property {
            param: ValueType::Texture,
            set: set_texture,
            get: get_texture,
        },
    );
    t.insert(
        "background",
        Symbol::Property {
            param: ValueType::Union(vec![ValueType::Color, ValueType::Texture]),
            set: set_background,
            get: get_background,
        },
    );

    // Scope state ---------------------------------------------------------
    t.insert(
        "detail",
        Symbol::Property {
            param: ValueType::Number,
            set: set_detail,
            get: get_detail,
        },
    );
    t.insert(
        "smoothing",
        Symbol::Property {
            param: ValueType::Number,
            set: set_smoothing,
            get: get_smoothing,
        },
    );
    t.insert(
        "font",
        Symbol::Property {
            param: ValueType::Font,
            set: set_font,
            get: get_font,
        },
    );
    t.insert(
        "name",
        Symbol::Command {
            param: ValueType::String,
            run: cmd_name,
        },
    );
    t.insert(
        "seed",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_seed,
        },
    );

    // Output ---------------------------------------------------------------
    t.insert(
        "print",
        Symbol::Command {
            param: ValueType::Any,
            run: cmd_print,
        },
    );
    t.insert(
        "assert",
        Symbol::Command {
            param: ValueType::Any,
            run: cmd_assert,
        },
    );

    // Path commands ---------------------------------------------------------
    t.insert(
        "point",
        Symbol::Command {
            param: ValueType::Vector,
            run: cmd_point,
        },
    );
    t.insert(
        "curve",
        Symbol::Command {
            param: ValueType::Vector,
            run: cmd_curve,
        },
    );

    // Block options ----------------------------------------------------------
    t.insert(
        "sides",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_sides,
        },
    );
    t.insert(
        "radius",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_radius,
        },
    );
    t.insert(
        "along",
        Symbol::Command {
            param: ValueType::Path,
            run: cmd_along,
        },
    );
    t.insert(
        "fov",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_fov,
        },
    );
    t.insert(
        "width",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_width,
        },
    );
    t.insert(
        "height",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_height,
        },
    );
    t.insert(
        "spread",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_spread,
        },
    );
    t.insert(
        "penumbra",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_penumbra,
        },
    );
    // Accepted for compatibility; text layout degrades without a font
    // engine, so these set nothing.
    t.insert(
        "wrapwidth",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_ignore_number,
        },
    );
    t.insert(
        "linespacing",
        Symbol::Command {
            param: ValueType::Number,
            run: cmd_ignore_number,
        },
    );

    // Functions ---------------------------------------------------------------
    t.insert(
        "rnd",
        Symbol::Function {
            param: ValueType::Void,
            run: fn_rnd,
        },
    );
    for name in [
        "round", "floor", "ceil", "abs", "sqrt", "cos", "sin", "tan", "acos", "asin", "atan",
    ] {
        t.insert(
            name,
            Symbol::Function {
                param: ValueType::Number,
                run: fn_unary_math,
            },
        );
    }
    t.insert(
        "pow",
        Symbol::Function {
            param: ValueType::Tuple(vec![ValueType::Number, ValueType::Number]),
            run: fn_pow,
        },
    );
    t.insert(
        "atan2",
        Symbol::Function {
            param: ValueType::Tuple(vec![ValueType::Number, ValueType::Number]),
            run: fn_atan2,
        },
    );
    t.insert(
        "max",
        Symbol::Function {
            param: ValueType::List(Box::new(ValueType::Number)),
            run: fn_max,
        },
    );
    t.insert(
        "min",
        Symbol::Function {
            param: ValueType::List(Box::new(ValueType::Number)),
            run: fn_min,
        },
    );
    t.insert(
        "not",
        Symbol::Function {
            param: ValueType::Boolean,
            run: fn_not,
        },
    );
    t.insert(
        "split",
        Symbol::Function {
            param: ValueType::Tuple(vec![ValueType::String, ValueType::String]),
            run: fn_split,
        },
    );
    t.insert(
        "join",
        Symbol::Function {
            param: ValueType::Any,
            run: fn_join,
        },
    );
    t.insert(
        "trim",
        Symbol::Function {
            param: ValueType::String,
            run: fn_trim,
        },
    );

    // Constants ---------------------------------------------------------------
    t.insert("pi", Symbol::Constant(Value::Number(std::f64::consts::PI)));
    t.insert("true", Symbol::Constant(Value::Boolean(true)));
    t.insert("false", Symbol::Constant(Value::Boolean(false)));
    // The named-color set lives in one place: Color::named.
    for name in [
        "white", "black", "gray", "grey", "red", "green", "blue", "yellow", "cyan",
        "magenta", "orange",
    ] {
        let color = Color::named(name).expect("every listed name is a known color");
        t.insert(name, Symbol::Constant(Value::Color(color)));
    }

    Stdlib { symbols: t }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn vector_of(value: &Value) -> DVec3 {
    match value {
        Value::Vector(v) | Value::Size(v) => *v,
        _ => DVec3::ZERO,
    }
}

fn cmd_translate(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    let ctx = eval.ctx_mut();
    ctx.cursor = ctx.cursor.translated(vector_of(&value));
    Ok(())
}

fn cmd_rotate(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    if let Value::Rotation(q) = value {
        let ctx = eval.ctx_mut();
        ctx.cursor = ctx.cursor.rotated(q);
    }
    Ok(())
}

fn cmd_scale(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    let ctx = eval.ctx_mut();
    ctx.cursor = ctx.cursor.scaled(vector_of(&value));
    Ok(())
}

fn set_position(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    eval.ctx_mut().local.offset = vector_of(&value);
    Ok(())
}

fn get_position(eval: &Evaluator) -> Value {
    Value::Vector(eval.ctx().local.offset)
}

fn set_orientation(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    if let Value::Rotation(q) = value {
        eval.ctx_mut().local.rotation = q;
    }
    Ok(())
}

fn get_orientation(eval: &Evaluator) -> Value {
    Value::Rotation(eval.ctx().local.rotation)
}

fn set_size(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    eval.ctx_mut().local.scale = vector_of(&value);
    Ok(())
}

fn get_size(eval: &Evaluator) -> Value {
    Value::Size(eval.ctx().local.scale)
}

fn set_color(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    if let Value::Color(c) = value {
        eval.ctx_mut().material.color = Some(c);
    }
    Ok(())
}

fn get_color(eval: &Evaluator) -> Value {
    Value::Color(eval.ctx().material.color.unwrap_or(Color::WHITE))
}

fn set_opacity(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    let opacity = value.as_number(span)?.clamp(0.0, 1.0);
    eval.ctx_mut().material.opacity = Some(opacity);
    Ok(())
}

fn get_opacity(eval: &Evaluator) -> Value {
    Value::Number(eval.ctx().material.opacity.unwrap_or(1.0))
}

fn set_texture(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    if let Value::Texture(texture) = value {
        eval.ctx_mut().material.texture = Some(texture);
    }
    Ok(())
}

fn get_texture(eval: &Evaluator) -> Value {
    match &eval.ctx().material.texture {
        Some(texture) => Value::Texture(texture.clone()),
        None => Value::String(String::new()),
    }
}

fn set_background(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    let background = match value {
        Value::Color(c) => Background::Color(c),
        Value::Texture(t) => Background::Texture(t),
        _ => return Ok(()),
    };
    eval.ctx_mut().background = Some(background);
    Ok(())
}

fn get_background(eval: &Evaluator) -> Value {
    match &eval.ctx().background {
        Some(Background::Color(c)) => Value::Color(*c),
        Some(Background::Texture(t)) => Value::Texture(t.clone()),
        None => Value::Color(Color::CLEAR),
    }
}

fn set_detail(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    let detail = value.as_number(span)?.max(1.0) as u32;
    eval.ctx_mut().detail = detail;
    Ok(())
}

fn get_detail(eval: &Evaluator) -> Value {
    Value::Number(f64::from(eval.ctx().detail))
}

fn set_smoothing(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    let smoothing = value.as_number(span)?;
    eval.ctx_mut().smoothing = Some(smoothing);
    Ok(())
}

fn get_smoothing(eval: &Evaluator) -> Value {
    Value::Number(eval.ctx().smoothing.unwrap_or(0.5))
}

fn set_font(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    if let Value::Font(name) = value {
        // No font engine is hosted, so validation is limited to shape: a
        // blank name can never resolve to a font.
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::UnknownFont { name },
                span,
            ));
        }
        eval.ctx_mut().font = Some(name);
    }
    Ok(())
}

fn get_font(eval: &Evaluator) -> Value {
    Value::Font(eval.ctx().font.clone().unwrap_or_default())
}

fn cmd_name(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    let name = value.as_string(span)?;
    eval.ctx_mut().name = Some(name);
    Ok(())
}

fn cmd_seed(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    let number = value.as_number(span)?;
    // Non-negative integral seeds map directly; everything else seeds
    // from the float's bit pattern.
    let seed = if number >= 0.0 && number.fract() == 0.0 && number < u64::MAX as f64 {
        number as u64
    } else {
        number.to_bits()
    };
    eval.ctx_mut().random.reseed(seed);
    Ok(())
}

fn cmd_print(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    let message = value.to_string();
    eval.delegate().debug_log(&message);
    Ok(())
}

fn cmd_assert(_eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    // `assert condition` or `assert condition "message"`.
    let (condition, message) = match &value {
        Value::Tuple(items) if items.len() == 2 => (
            items[0].as_boolean(span)?,
            items[1].as_string(span).unwrap_or_default(),
        ),
        other => (other.as_boolean(span)?, String::new()),
    };
    if condition {
        Ok(())
    } else {
        Err(RuntimeError::new(
            RuntimeErrorKind::AssertionFailure { message },
            span,
        ))
    }
}

fn path_point(eval: &mut Evaluator, value: &Value, curved: bool) {
    let ctx = eval.ctx_mut();
    let position = ctx.cursor.apply(vector_of(value));
    let point = if curved {
        PathPoint::curved(position)
    } else {
        PathPoint::sharp(position)
    };
    let point = point.with_color(ctx.material.color);
    ctx.children.push(Value::Point(point));
}

fn cmd_point(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    path_point(eval, &value, false);
    Ok(())
}

fn cmd_curve(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    path_point(eval, &value, true);
    Ok(())
}

fn cmd_sides(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    let sides = value.as_number(span)?.max(3.0) as u32;
    eval.ctx_mut().extras.sides = Some(sides);
    Ok(())
}

fn cmd_radius(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    let radius = value.as_number(span)?;
    eval.ctx_mut().extras.radius = Some(radius);
    Ok(())
}

fn cmd_along(eval: &mut Evaluator, value: Value, _span: Span) -> Result<(), RuntimeError> {
    if let Value::Path(path) = value {
        eval.ctx_mut().extras.along = Some(path);
    }
    Ok(())
}

fn cmd_fov(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    eval.ctx_mut().extras.fov = Some(value.as_number(span)?);
    Ok(())
}

fn cmd_width(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    eval.ctx_mut().extras.width = Some(value.as_number(span)?);
    Ok(())
}

fn cmd_height(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    eval.ctx_mut().extras.height = Some(value.as_number(span)?);
    Ok(())
}

fn cmd_spread(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    eval.ctx_mut().extras.spread = value.as_number(span)?;
    Ok(())
}

fn cmd_penumbra(eval: &mut Evaluator, value: Value, span: Span) -> Result<(), RuntimeError> {
    eval.ctx_mut().extras.penumbra = value.as_number(span)?.clamp(0.0, 1.0);
    Ok(())
}

fn cmd_ignore_number(_eval: &mut Evaluator, _value: Value, _span: Span) -> Result<(), RuntimeError> {
    Ok(())
}

// =============================================================================
// FUNCTION IMPLEMENTATIONS
// =============================================================================

fn fn_rnd(eval: &mut Evaluator, _value: Value, _span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Number(eval.ctx_mut().random.next()))
}

/// Shared driver for the single-argument math functions; the function
/// name travels through the evaluator's dispatch site.
fn fn_unary_math(eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    let n = value.as_number(span)?;
    let name = eval.current_function();
    let result = match name {
        "round" => n.round(),
        "floor" => n.floor(),
        "ceil" => n.ceil(),
        "abs" => n.abs(),
        "sqrt" => n.sqrt(),
        "cos" => n.cos(),
        "sin" => n.sin(),
        "tan" => n.tan(),
        "acos" => n.acos(),
        "asin" => n.asin(),
        "atan" => n.atan(),
        _ => n,
    };
    Ok(Value::Number(result))
}

fn two_numbers(value: &Value, span: Span) -> Result<(f64, f64), RuntimeError> {
    match value {
        Value::Tuple(items) if items.len() == 2 => {
            Ok((items[0].as_number(span)?, items[1].as_number(span)?))
        }
        other => Err(RuntimeError::new(
            RuntimeErrorKind::TypeMismatch {
                expected: "two numbers".to_string(),
                found: other.type_name().to_string(),
            },
            span,
        )),
    }
}

fn fn_pow(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    let (base, exponent) = two_numbers(&value, span)?;
    Ok(Value::Number(base.powf(exponent)))
}

fn fn_atan2(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    let (y, x) = two_numbers(&value, span)?;
    Ok(Value::Number(y.atan2(x)))
}

fn number_list(value: &Value, span: Span) -> Result<Vec<f64>, RuntimeError> {
    match value {
        Value::Tuple(items) => items.iter().map(|i| i.as_number(span)).collect(),
        other => Ok(vec![other.as_number(span)?]),
    }
}

fn fn_max(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    let numbers = number_list(&value, span)?;
    Ok(Value::Number(numbers.into_iter().fold(f64::NEG_INFINITY, f64::max)))
}

fn fn_min(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    let numbers = number_list(&value, span)?;
    Ok(Value::Number(numbers.into_iter().fold(f64::INFINITY, f64::min)))
}

fn fn_not(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(!value.as_boolean(span)?))
}

fn fn_split(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    match &value {
        Value::Tuple(items) if items.len() == 2 => {
            let text = items[0].as_string(span)?;
            let separator = items[1].as_string(span)?;
            let parts = text
                .split(separator.as_str())
                .map(|part| Value::String(part.to_string()))
                .collect();
            Ok(Value::Tuple(parts))
        }
        other => Err(RuntimeError::new(
            RuntimeErrorKind::TypeMismatch {
                expected: "a string and a separator".to_string(),
                found: other.type_name().to_string(),
            },
            span,
        )),
    }
}

fn fn_join(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    // `join(list separator)` or `join(parts...)` with no separator.
    let joined = match value {
        Value::Tuple(items) => match items.as_slice() {
            [Value::Tuple(parts), separator] => {
                let separator = separator.as_string(span)?;
                parts
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(&separator)
            }
            parts => parts.iter().map(Value::to_string).collect::<Vec<_>>().join(""),
        },
        other => other.to_string(),
    };
    Ok(Value::String(joined))
}

fn fn_trim(_eval: &mut Evaluator, value: Value, span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::String(value.as_string(span)?.trim().to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_core_symbols() {
        let lib = stdlib();
        for name in ["cube", "union", "translate", "rnd", "pi", "print", "path"] {
            assert!(lib.lookup(name).is_some(), "missing symbol {name}");
        }
        assert!(lib.lookup("bogus").is_none());
    }

    #[test]
    fn test_member_rules() {
        use BlockClass::*;
        assert!(member_allowed(PathBlock, "point"));
        assert!(!member_allowed(Container, "point"));
        assert!(member_allowed(Primitive, "size"));
        assert!(!member_allowed(Root, "size"));
        assert!(member_allowed(Root, "background"));
        assert!(member_allowed(Camera, "fov"));
        assert!(!member_allowed(Container, "fov"));
        assert!(member_allowed(Container, "cube"));
        assert!(!member_allowed(Primitive, "cube"));
        assert!(member_allowed(Builder, "circle"));
    }

    #[test]
    fn test_universal_symbols_everywhere() {
        for class in [
            BlockClass::Root,
            BlockClass::Primitive,
            BlockClass::PathBlock,
            BlockClass::Camera,
        ] {
            assert!(member_allowed(class, "print"));
            assert!(member_allowed(class, "rnd"));
            assert!(member_allowed(class, "detail"));
        }
    }
}
