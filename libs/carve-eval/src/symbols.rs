//! # Symbols
//!
//! The symbol kinds the evaluator dispatches on. The standard library is
//! one table of these; user `define`s enter scope symbol maps as plain
//! values and shadow the table.

use carve_parser::Span;

use crate::context::BlockClass;
use crate::error::RuntimeError;
use crate::evaluator::Evaluator;
use crate::value::{Value, ValueType};

/// Implementation of a side-effecting command.
pub type CommandImpl = fn(&mut Evaluator, Value, Span) -> Result<(), RuntimeError>;

/// Implementation of a value-producing function.
pub type FunctionImpl = fn(&mut Evaluator, Value, Span) -> Result<Value, RuntimeError>;

/// Getter for a readable property.
pub type GetterImpl = fn(&Evaluator) -> Value;

/// The built-in blocks, by identity.
///
/// The block's [`BlockClass`] governs which member symbols are legal
/// inside it; the tag itself selects what the evaluator constructs when
/// the block closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinBlock {
    Group,
    Union,
    Difference,
    Intersection,
    Xor,
    Stencil,
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Pyramid,
    Prism,
    Extrude,
    Lathe,
    Loft,
    Fill,
    Hull,
    PathBlock,
    Circle,
    Square,
    PolygonShape,
    Roundrect,
    Text,
    SvgPath,
    Camera,
    Light,
    Debug,
    MeshBlock,
}

impl BuiltinBlock {
    /// The scope class a block of this kind opens.
    pub fn class(&self) -> BlockClass {
        match self {
            Self::Group
            | Self::Union
            | Self::Difference
            | Self::Intersection
            | Self::Xor
            | Self::Stencil => BlockClass::Container,
            Self::Cube
            | Self::Sphere
            | Self::Cylinder
            | Self::Cone
            | Self::Pyramid
            | Self::Prism => BlockClass::Primitive,
            Self::Extrude | Self::Lathe | Self::Loft | Self::Fill | Self::Hull => {
                BlockClass::Builder
            }
            Self::PathBlock => BlockClass::PathBlock,
            Self::Circle | Self::Square | Self::PolygonShape | Self::Roundrect => {
                BlockClass::PathShape
            }
            Self::Text => BlockClass::TextBlock,
            Self::SvgPath => BlockClass::SvgPath,
            Self::Camera => BlockClass::Camera,
            Self::Light => BlockClass::Light,
            Self::Debug => BlockClass::Debug,
            Self::MeshBlock => BlockClass::MeshBlock,
        }
    }
}

/// A resolvable symbol.
#[derive(Clone)]
pub enum Symbol {
    /// Side-effecting command; returns nothing.
    Command {
        /// Required argument type.
        param: ValueType,
        /// Implementation.
        run: CommandImpl,
    },
    /// Value-producing function.
    Function {
        /// Required argument type (`Void` for nullary functions like
        /// `rnd`).
        param: ValueType,
        /// Implementation.
        run: FunctionImpl,
    },
    /// Settable and readable scope state (`color`, `detail`, ...).
    Property {
        /// Required argument type for the setter.
        param: ValueType,
        /// Setter.
        set: CommandImpl,
        /// Getter, used when the name appears in an expression.
        get: GetterImpl,
    },
    /// Child-accepting construct.
    Block(BuiltinBlock),
    /// Fixed value.
    Constant(Value),
    /// Declared but not yet bound; using one is an error naming the
    /// expected type.
    Placeholder(ValueType),
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command { param, .. } => f.debug_struct("Command").field("param", param).finish(),
            Self::Function { param, .. } => {
                f.debug_struct("Function").field("param", param).finish()
            }
            Self::Property { param, .. } => {
                f.debug_struct("Property").field("param", param).finish()
            }
            Self::Block(block) => f.debug_tuple("Block").field(block).finish(),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Placeholder(ty) => f.debug_tuple("Placeholder").field(ty).finish(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_classes() {
        assert_eq!(BuiltinBlock::Union.class(), BlockClass::Container);
        assert_eq!(BuiltinBlock::Sphere.class(), BlockClass::Primitive);
        assert_eq!(BuiltinBlock::Lathe.class(), BlockClass::Builder);
        assert_eq!(BuiltinBlock::Circle.class(), BlockClass::PathShape);
    }

    #[test]
    fn test_symbol_debug_omits_pointers() {
        let symbol = Symbol::Constant(Value::Number(1.0));
        assert!(format!("{symbol:?}").contains("Constant"));
    }
}
