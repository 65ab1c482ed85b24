//! # Values
//!
//! The Carve value domain: a tagged union with explicit, documented
//! conversions. Type checking happens at symbol-dispatch time against
//! [`ValueType`] signatures; the permitted implicit conversions live in
//! [`Value::coerce`].

use std::fmt;

use carve_mesh::math::rotation_from_half_turns;
use carve_mesh::{Color, Path, PathPoint, Texture};
use carve_parser::Span;
use glam::{DQuat, DVec3};

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::geometry::Geometry;

// =============================================================================
// VALUE
// =============================================================================

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value (commands return this).
    Void,
    /// Boolean.
    Boolean(bool),
    /// Double-precision number.
    Number(f64),
    /// Text.
    String(String),
    /// RGBA color.
    Color(Color),
    /// 3D vector.
    Vector(DVec3),
    /// Per-axis scale factors.
    Size(DVec3),
    /// Orientation.
    Rotation(DQuat),
    /// Texture reference.
    Texture(Texture),
    /// Font name.
    Font(String),
    /// A path value.
    Path(Path),
    /// A single path control point.
    Point(PathPoint),
    /// Numeric range.
    Range {
        /// Inclusive start.
        from: f64,
        /// Inclusive end.
        to: f64,
        /// Stride, defaulting to 1.
        step: Option<f64>,
    },
    /// Space-separated tuple.
    Tuple(Vec<Value>),
    /// A geometry node (meshes, groups, CSG results, cameras, lights).
    Mesh(Geometry),
}

/// Static value types for symbol signatures.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    /// Any value.
    Any,
    /// No value.
    Void,
    Boolean,
    Number,
    String,
    Color,
    Vector,
    Size,
    Rotation,
    Texture,
    Font,
    Path,
    Point,
    Range,
    Mesh,
    /// Homogeneous list.
    List(Box<ValueType>),
    /// Fixed-shape tuple.
    Tuple(Vec<ValueType>),
    /// Any of the alternatives, tried in order.
    Union(Vec<ValueType>),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any value"),
            Self::Void => write!(f, "nothing"),
            Self::Boolean => write!(f, "a boolean"),
            Self::Number => write!(f, "a number"),
            Self::String => write!(f, "a string"),
            Self::Color => write!(f, "a color"),
            Self::Vector => write!(f, "a vector"),
            Self::Size => write!(f, "a size"),
            Self::Rotation => write!(f, "a rotation"),
            Self::Texture => write!(f, "a texture"),
            Self::Font => write!(f, "a font"),
            Self::Path => write!(f, "a path"),
            Self::Point => write!(f, "a point"),
            Self::Range => write!(f, "a range"),
            Self::Mesh => write!(f, "a mesh"),
            Self::List(inner) => write!(f, "a list of {inner}"),
            Self::Tuple(items) => write!(f, "a tuple of {} values", items.len()),
            Self::Union(options) => {
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{option}")?;
                }
                Ok(())
            }
        }
    }
}

impl Value {
    /// Human name of this value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "nothing",
            Value::Boolean(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Color(_) => "a color",
            Value::Vector(_) => "a vector",
            Value::Size(_) => "a size",
            Value::Rotation(_) => "a rotation",
            Value::Texture(_) => "a texture",
            Value::Font(_) => "a font",
            Value::Path(_) => "a path",
            Value::Point(_) => "a point",
            Value::Range { .. } => "a range",
            Value::Tuple(_) => "a tuple",
            Value::Mesh(_) => "a mesh",
        }
    }

    fn mismatch(&self, expected: &ValueType, span: Span) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::TypeMismatch {
                expected: expected.to_string(),
                found: self.type_name().to_string(),
            },
            span,
        )
    }

    /// Checks and converts this value to a target type.
    ///
    /// Documented implicit conversions:
    /// - number broadcasts to vector, size, color (gray), rotation (roll)
    /// - vector and size interconvert
    /// - tuples of numbers convert to vector/size/color/rotation by
    ///   component, padding vector components with zero and size
    ///   components with the last given value
    /// - a single value converts to a one-element list; tuples convert to
    ///   lists element-wise; ranges expand to number lists
    /// - strings convert to fonts
    /// - a one-element tuple converts as its element
    pub fn coerce(self, target: &ValueType, span: Span) -> Result<Value, RuntimeError> {
        // Exact and trivial cases first.
        match (&self, target) {
            (_, ValueType::Any) => return Ok(self),
            (Value::Boolean(_), ValueType::Boolean)
            | (Value::Number(_), ValueType::Number)
            | (Value::String(_), ValueType::String)
            | (Value::Color(_), ValueType::Color)
            | (Value::Vector(_), ValueType::Vector)
            | (Value::Size(_), ValueType::Size)
            | (Value::Rotation(_), ValueType::Rotation)
            | (Value::Texture(_), ValueType::Texture)
            | (Value::Font(_), ValueType::Font)
            | (Value::Path(_), ValueType::Path)
            | (Value::Point(_), ValueType::Point)
            | (Value::Range { .. }, ValueType::Range)
            | (Value::Mesh(_), ValueType::Mesh)
            | (Value::Void, ValueType::Void) => return Ok(self),
            _ => {}
        }

        match target {
            ValueType::Union(options) => {
                for option in options {
                    if let Ok(value) = self.clone().coerce(option, span) {
                        return Ok(value);
                    }
                }
                Err(self.mismatch(target, span))
            }
            ValueType::Vector => match self {
                Value::Number(n) => Ok(Value::Vector(DVec3::splat(n))),
                Value::Size(v) => Ok(Value::Vector(v)),
                Value::Tuple(items) => {
                    let numbers = numbers_from(items, 3, span, target)?;
                    let mut padded = [0.0; 3];
                    padded[..numbers.len()].copy_from_slice(&numbers);
                    Ok(Value::Vector(DVec3::from_array(padded)))
                }
                other => Err(other.mismatch(target, span)),
            },
            ValueType::Size => match self {
                Value::Number(n) => Ok(Value::Size(DVec3::splat(n))),
                Value::Vector(v) => Ok(Value::Size(v)),
                Value::Tuple(items) => {
                    let numbers = numbers_from(items, 3, span, target)?;
                    let last = *numbers.last().expect("at least one component");
                    let mut padded = [last; 3];
                    padded[..numbers.len()].copy_from_slice(&numbers);
                    Ok(Value::Size(DVec3::from_array(padded)))
                }
                other => Err(other.mismatch(target, span)),
            },
            ValueType::Rotation => match self {
                Value::Number(roll) => {
                    Ok(Value::Rotation(rotation_from_half_turns(roll, 0.0, 0.0)))
                }
                Value::Tuple(items) => {
                    let numbers = numbers_from(items, 3, span, target)?;
                    let component = |i: usize| numbers.get(i).copied().unwrap_or(0.0);
                    Ok(Value::Rotation(rotation_from_half_turns(
                        component(0),
                        component(1),
                        component(2),
                    )))
                }
                other => Err(other.mismatch(target, span)),
            },
            ValueType::Color => match self {
                Value::Number(n) => Ok(Value::Color(Color::rgb(n, n, n))),
                Value::Tuple(items) => {
                    let numbers = numbers_from(items, 4, span, target)?;
                    let color = match numbers.len() {
                        1 => Color::rgb(numbers[0], numbers[0], numbers[0]),
                        2 => Color::new(numbers[0], numbers[0], numbers[0], numbers[1]),
                        3 => Color::rgb(numbers[0], numbers[1], numbers[2]),
                        _ => Color::new(numbers[0], numbers[1], numbers[2], numbers[3]),
                    };
                    Ok(Value::Color(color))
                }
                other => Err(other.mismatch(target, span)),
            },
            ValueType::Font => match self {
                Value::String(name) => Ok(Value::Font(name)),
                other => Err(other.mismatch(target, span)),
            },
            ValueType::Texture => match self {
                Value::String(path) => Ok(Value::Texture(Texture { path })),
                other => Err(other.mismatch(target, span)),
            },
            ValueType::List(element) => match self {
                Value::Tuple(items) => {
                    let converted = items
                        .into_iter()
                        .map(|item| item.coerce(element, span))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::Tuple(converted))
                }
                Value::Range { from, to, step } if **element == ValueType::Number => {
                    let items = expand_range(from, to, step)
                        .map(Value::Number)
                        .collect();
                    Ok(Value::Tuple(items))
                }
                other => {
                    let converted = other.coerce(element, span)?;
                    Ok(Value::Tuple(vec![converted]))
                }
            },
            ValueType::Tuple(shape) => match self {
                Value::Tuple(items) if items.len() == shape.len() => {
                    let converted = items
                        .into_iter()
                        .zip(shape)
                        .map(|(item, target)| item.coerce(target, span))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::Tuple(converted))
                }
                other => Err(other.mismatch(target, span)),
            },
            _ => match self {
                // A one-element tuple converts as its element.
                Value::Tuple(items) if items.len() == 1 => {
                    items.into_iter().next().expect("one element").coerce(target, span)
                }
                other => Err(other.mismatch(target, span)),
            },
        }
    }

    /// This value as a number.
    pub fn as_number(&self, span: Span) -> Result<f64, RuntimeError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(other.mismatch(&ValueType::Number, span)),
        }
    }

    /// This value as a boolean.
    pub fn as_boolean(&self, span: Span) -> Result<bool, RuntimeError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(&ValueType::Boolean, span)),
        }
    }

    /// This value as a string.
    pub fn as_string(&self, span: Span) -> Result<String, RuntimeError> {
        match self {
            Value::String(s) => Ok(s.clone()),
            other => Err(other.mismatch(&ValueType::String, span)),
        }
    }

    /// Member access (`.x`, `.width`, color channels, tuple ordinals).
    pub fn member(&self, name: &str, span: Span) -> Result<Value, RuntimeError> {
        let unknown = || {
            RuntimeError::new(
                RuntimeErrorKind::UnknownSymbol {
                    name: name.to_string(),
                },
                span,
            )
        };
        match self {
            Value::Vector(v) | Value::Size(v) => match name {
                "x" | "width" => Ok(Value::Number(v.x)),
                "y" | "height" => Ok(Value::Number(v.y)),
                "z" | "depth" => Ok(Value::Number(v.z)),
                _ => Err(unknown()),
            },
            Value::Color(c) => match name {
                "red" => Ok(Value::Number(c.r)),
                "green" => Ok(Value::Number(c.g)),
                "blue" => Ok(Value::Number(c.b)),
                "alpha" => Ok(Value::Number(c.a)),
                _ => Err(unknown()),
            },
            Value::Tuple(items) => {
                let ordinals = [
                    "first", "second", "third", "fourth", "fifth", "sixth", "seventh",
                    "eighth",
                ];
                if name == "count" {
                    return Ok(Value::Number(items.len() as f64));
                }
                if name == "last" {
                    return items.last().cloned().ok_or_else(unknown);
                }
                if let Some(i) = ordinals.iter().position(|&o| o == name) {
                    return items.get(i).cloned().ok_or_else(unknown);
                }
                // x/y/z sugar over numeric tuples.
                if let Some(i) = ["x", "y", "z"].iter().position(|&o| o == name) {
                    return items.get(i).cloned().ok_or_else(unknown);
                }
                Err(unknown())
            }
            Value::Point(p) => match name {
                "x" => Ok(Value::Number(p.position.x)),
                "y" => Ok(Value::Number(p.position.y)),
                "z" => Ok(Value::Number(p.position.z)),
                "curved" => Ok(Value::Boolean(p.is_curved)),
                _ => Err(unknown()),
            },
            Value::Path(path) => match name {
                "bounds" => Ok(Value::Tuple(vec![
                    Value::Vector(path.bounds().min),
                    Value::Vector(path.bounds().max),
                ])),
                "count" => Ok(Value::Number(path.points().len() as f64)),
                _ => Err(unknown()),
            },
            Value::Range { from, to, step } => match name {
                "start" => Ok(Value::Number(*from)),
                "end" => Ok(Value::Number(*to)),
                "step" => Ok(Value::Number(step.unwrap_or(1.0))),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }
}

/// Iterates the values of a numeric range (inclusive bounds).
///
/// Without an explicit step the stride is 1 toward `to`, so descending
/// ranges count down. An explicit step that points away from `to` yields
/// just the start value.
pub fn expand_range(from: f64, to: f64, step: Option<f64>) -> impl Iterator<Item = f64> {
    let step = match step.filter(|s| s.abs() > f64::EPSILON) {
        Some(s) => s,
        None if to < from => -1.0,
        None => 1.0,
    };
    let count = ((to - from) / step).floor().max(0.0) as usize + 1;
    (0..count).map(move |i| from + step * i as f64)
}

fn numbers_from(
    items: Vec<Value>,
    max: usize,
    span: Span,
    target: &ValueType,
) -> Result<Vec<f64>, RuntimeError> {
    if items.is_empty() || items.len() > max {
        return Err(Value::Tuple(items).mismatch(target, span));
    }
    items.iter().map(|item| item.as_number(span)).collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => Ok(()),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
            Value::Color(c) => write!(f, "{} {} {} {}", c.r, c.g, c.b, c.a),
            Value::Vector(v) | Value::Size(v) => write!(f, "{} {} {}", v.x, v.y, v.z),
            Value::Rotation(q) => write!(f, "{} {} {} {}", q.x, q.y, q.z, q.w),
            Value::Texture(t) => write!(f, "{}", t.path),
            Value::Font(name) => write!(f, "{name}"),
            Value::Path(path) => write!(f, "path ({} points)", path.points().len()),
            Value::Point(p) => write!(f, "{} {} {}", p.position.x, p.position.y, p.position.z),
            Value::Range { from, to, step } => {
                write!(f, "{from} to {to}")?;
                if let Some(step) = step {
                    write!(f, " step {step}")?;
                }
                Ok(())
            }
            Value::Tuple(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Mesh(geometry) => write!(f, "mesh ({})", geometry.kind_name()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::zero()
    }

    #[test]
    fn test_number_broadcasts_to_vector() {
        let v = Value::Number(2.0).coerce(&ValueType::Vector, span()).unwrap();
        assert_eq!(v, Value::Vector(DVec3::splat(2.0)));
    }

    #[test]
    fn test_tuple_to_vector_pads_with_zero() {
        let v = Value::Tuple(vec![Value::Number(1.0), Value::Number(2.0)])
            .coerce(&ValueType::Vector, span())
            .unwrap();
        assert_eq!(v, Value::Vector(DVec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_tuple_to_size_pads_with_last() {
        let v = Value::Tuple(vec![Value::Number(2.0), Value::Number(3.0)])
            .coerce(&ValueType::Size, span())
            .unwrap();
        assert_eq!(v, Value::Size(DVec3::new(2.0, 3.0, 3.0)));
    }

    #[test]
    fn test_vector_size_interconvert() {
        let v = Value::Vector(DVec3::ONE).coerce(&ValueType::Size, span()).unwrap();
        assert!(matches!(v, Value::Size(_)));
    }

    #[test]
    fn test_number_to_color_is_gray() {
        let v = Value::Number(0.5).coerce(&ValueType::Color, span()).unwrap();
        assert_eq!(v, Value::Color(Color::rgb(0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_single_value_to_list_wraps() {
        let v = Value::Number(1.0)
            .coerce(&ValueType::List(Box::new(ValueType::Number)), span())
            .unwrap();
        assert_eq!(v, Value::Tuple(vec![Value::Number(1.0)]));
    }

    #[test]
    fn test_range_expands_to_number_list() {
        let v = Value::Range {
            from: 0.0,
            to: 5.0,
            step: Some(2.0),
        }
        .coerce(&ValueType::List(Box::new(ValueType::Number)), span())
        .unwrap();
        assert_eq!(
            v,
            Value::Tuple(vec![
                Value::Number(0.0),
                Value::Number(2.0),
                Value::Number(4.0),
            ])
        );
    }

    #[test]
    fn test_singleton_tuple_unwraps() {
        let v = Value::Tuple(vec![Value::Number(3.0)])
            .coerce(&ValueType::Number, span())
            .unwrap();
        assert_eq!(v, Value::Number(3.0));
    }

    #[test]
    fn test_mismatch_reports_both_types() {
        let error = Value::String("hi".into())
            .coerce(&ValueType::Number, span())
            .unwrap_err();
        match error.kind {
            RuntimeErrorKind::TypeMismatch { expected, found } => {
                assert!(expected.contains("number"));
                assert!(found.contains("string"));
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_member_access() {
        let v = Value::Vector(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(v.member("x", span()).unwrap(), Value::Number(1.0));
        assert_eq!(v.member("depth", span()).unwrap(), Value::Number(3.0));
        assert!(v.member("w", span()).is_err());

        let t = Value::Tuple(vec![Value::Number(5.0), Value::Number(6.0)]);
        assert_eq!(t.member("second", span()).unwrap(), Value::Number(6.0));
        assert_eq!(t.member("count", span()).unwrap(), Value::Number(2.0));
        assert_eq!(t.member("last", span()).unwrap(), Value::Number(6.0));
    }

    #[test]
    fn test_range_expansion_descending() {
        let values: Vec<f64> = expand_range(5.0, 1.0, None).collect();
        assert_eq!(values, vec![5.0, 4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::Number(2.0).to_string(), "2");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }
}
