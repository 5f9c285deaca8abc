//! The Comet type model
//!
//! [`TypeId`] is both an identity and a widening rank: when two numeric
//! types meet in a binary expression, the common type is the one with the
//! larger id. `Void`, `Bool` and `Custom` never widen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered type identity; the declaration order is the widening rank
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum TypeId {
    /// Also the "not yet declared" sentinel on variable declarations
    #[default]
    Void,
    Bool,
    Custom,
    Int8,
    UnsignedInt8,
    Int16,
    UnsignedInt16,
    Float32,
    Int32,
    UnsignedInt32,
    Float64,
    Complex64,
    Complex128,
    Int64,
    UnsignedInt64,
}

impl TypeId {
    /// Numeric types participate in widening; the rest never combine
    pub fn is_numeric(self) -> bool {
        !matches!(self, TypeId::Void | TypeId::Bool | TypeId::Custom)
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeId::Void => "void",
            TypeId::Bool => "bool",
            TypeId::Custom => "custom",
            TypeId::Int8 => "int8",
            TypeId::UnsignedInt8 => "uint8",
            TypeId::Int16 => "int16",
            TypeId::UnsignedInt16 => "uint16",
            TypeId::Float32 => "float32",
            TypeId::Int32 => "int32",
            TypeId::UnsignedInt32 => "uint32",
            TypeId::Float64 => "float64",
            TypeId::Complex64 => "complex64",
            TypeId::Complex128 => "complex128",
            TypeId::Int64 => "int64",
            TypeId::UnsignedInt64 => "uint64",
        }
    }
}

/// Variadic marker on a function's last parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariadicKind {
    /// `...` — extra arguments are type-checked against the parameter
    Validated,
    /// `..?` — extra arguments skip type validation
    Unvalidated,
}

/// A concrete type as written or inferred
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActualType {
    pub id: TypeId,
    /// Set only when `id` is `Custom`
    pub custom_name: Option<String>,
    /// Set only on a function's last parameter
    pub variadic: Option<VariadicKind>,
}

impl ActualType {
    pub fn simple(id: TypeId) -> Self {
        Self {
            id,
            custom_name: None,
            variadic: None,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            id: TypeId::Custom,
            custom_name: Some(name.into()),
            variadic: None,
        }
    }

    /// The Comet string type; string literals infer to it
    pub fn string() -> Self {
        Self::custom("string")
    }

    pub fn is_string(&self) -> bool {
        self.id == TypeId::Custom && self.custom_name.as_deref() == Some("string")
    }

    /// Map a type identifier at type position; unknown names become `Custom`
    pub fn from_name(name: &str) -> Self {
        match name {
            "void" => Self::simple(TypeId::Void),
            "bool" => Self::simple(TypeId::Bool),
            "int8" => Self::simple(TypeId::Int8),
            "int16" => Self::simple(TypeId::Int16),
            "int32" | "int" => Self::simple(TypeId::Int32),
            "int64" => Self::simple(TypeId::Int64),
            "uint8" => Self::simple(TypeId::UnsignedInt8),
            "uint16" => Self::simple(TypeId::UnsignedInt16),
            "uint32" => Self::simple(TypeId::UnsignedInt32),
            "uint64" => Self::simple(TypeId::UnsignedInt64),
            "float32" | "float" => Self::simple(TypeId::Float32),
            "float64" | "double" => Self::simple(TypeId::Float64),
            "complex64" => Self::simple(TypeId::Complex64),
            "complex128" => Self::simple(TypeId::Complex128),
            _ => Self::custom(name),
        }
    }

    /// The common type of two operands, widening to the larger rank.
    /// Fails when either side is not numeric.
    pub fn common(left: &ActualType, right: &ActualType) -> Option<ActualType> {
        if !left.id.is_numeric() || !right.id.is_numeric() {
            return None;
        }
        if left.id >= right.id {
            Some(left.clone())
        } else {
            Some(right.clone())
        }
    }

    /// Type identity as the checker sees it: ids must match, and custom
    /// types must also agree on their name
    pub fn matches(&self, other: &ActualType) -> bool {
        self.id == other.id && (self.id != TypeId::Custom || self.custom_name == other.custom_name)
    }

    /// Can a value of type `value` flow into a slot of this type?
    /// Identical types always; numeric values may widen into a
    /// larger-ranked slot; narrowing is an error at the call site.
    pub fn accepts(&self, value: &ActualType) -> bool {
        if self.matches(value) {
            return true;
        }
        self.id.is_numeric() && value.id.is_numeric() && self.id >= value.id
    }
}

impl fmt::Display for ActualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.custom_name, self.id) {
            (Some(name), TypeId::Custom) => write!(f, "{name}")?,
            _ => write!(f, "{}", self.id.name())?,
        }
        match self.variadic {
            Some(VariadicKind::Validated) => write!(f, "..."),
            Some(VariadicKind::Unvalidated) => write!(f, "..?"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_picks_larger_rank() {
        let a = ActualType::simple(TypeId::Int32);
        let b = ActualType::simple(TypeId::Int64);
        assert_eq!(ActualType::common(&a, &b).unwrap().id, TypeId::Int64);
        assert_eq!(ActualType::common(&b, &a).unwrap().id, TypeId::Int64);
    }

    #[test]
    fn test_bool_and_custom_never_widen() {
        let b = ActualType::simple(TypeId::Bool);
        let i = ActualType::simple(TypeId::Int32);
        assert!(ActualType::common(&b, &i).is_none());
        assert!(ActualType::common(&b, &b).is_none());
        assert!(ActualType::common(&ActualType::string(), &i).is_none());
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(ActualType::from_name("int").id, TypeId::Int32);
        assert_eq!(ActualType::from_name("float").id, TypeId::Float32);
        assert_eq!(ActualType::from_name("double").id, TypeId::Float64);
        let custom = ActualType::from_name("FileHandle");
        assert_eq!(custom.id, TypeId::Custom);
        assert_eq!(custom.custom_name.as_deref(), Some("FileHandle"));
    }

    #[test]
    fn test_custom_identity_compares_names() {
        assert!(ActualType::string().matches(&ActualType::custom("string")));
        assert!(!ActualType::string().matches(&ActualType::custom("path")));
    }

    #[test]
    fn test_accepts_widens_but_never_narrows() {
        let int32 = ActualType::simple(TypeId::Int32);
        let int64 = ActualType::simple(TypeId::Int64);
        assert!(int64.accepts(&int32));
        assert!(!int32.accepts(&int64));
        assert!(!ActualType::simple(TypeId::Bool).accepts(&int32));
    }
}
