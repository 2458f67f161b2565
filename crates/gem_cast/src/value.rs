//! Typed configuration values
//!
//! Every config value string casts to one of these variants. The `Display`
//! impl is the serializer: its output casts back to an equal value.

use std::fmt;

use crate::error::{CastError, Result};

/// Tag of a numeric vector literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorKind {
    /// `Vec(..)`, a direction
    Vec,
    /// `Point(..)`, a position
    Point,
}

impl VectorKind {
    /// Constructor keyword as written in config files
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Vec => "Vec",
            Self::Point => "Point",
        }
    }
}

/// A 2, 3 or 4 component numeric vector
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    kind: VectorKind,
    components: Vec<f64>,
}

impl Vector {
    pub const MIN_ARITY: usize = 2;
    pub const MAX_ARITY: usize = 4;

    /// Build a vector, rejecting arities outside 2..=4
    pub fn new(kind: VectorKind, components: Vec<f64>) -> Result<Self> {
        if !(Self::MIN_ARITY..=Self::MAX_ARITY).contains(&components.len()) {
            return Err(CastError::Value(format!(
                "Malformed {} literal (wrong number of elements: {})",
                kind.keyword(),
                components.len()
            )));
        }
        Ok(Self { kind, components })
    }

    pub fn vec3(x: f64, y: f64, z: f64) -> Self {
        Self {
            kind: VectorKind::Vec,
            components: vec![x, y, z],
        }
    }

    pub fn point3(x: f64, y: f64, z: f64) -> Self {
        Self {
            kind: VectorKind::Point,
            components: vec![x, y, z],
        }
    }

    pub fn kind(&self) -> VectorKind {
        self.kind
    }

    pub fn components(&self) -> &[f64] {
        &self.components
    }

    pub fn arity(&self) -> usize {
        self.components.len()
    }

    /// Sized type name, e.g. `Vec3` or `Point2`
    pub fn type_name(&self) -> String {
        format!("{}{}", self.kind.keyword(), self.arity())
    }

    pub fn x(&self) -> f64 {
        self.components[0]
    }

    pub fn y(&self) -> f64 {
        self.components[1]
    }

    pub fn z(&self) -> Option<f64> {
        self.components.get(2).copied()
    }

    pub fn w(&self) -> Option<f64> {
        self.components.get(3).copied()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind.keyword())?;
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_float(f, *component)?;
        }
        write!(f, ")")
    }
}

/// A cast configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered pairs; keys are unique
    Dict(Vec<(Value, Value)>),
    Vector(Vector),
    /// `Bit(n, ...)` literal, one bit set per index
    BitMask(u32),
}

impl Value {
    /// Get type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Vector(_) => "vector",
            Self::BitMask(_) => "bitmask",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float value; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or tuple
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a dict entry
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Dict(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Build a bit mask from bit indices
    pub fn bits(indices: &[u32]) -> Result<Self> {
        let mut mask = 0u32;
        for &index in indices {
            mask |= bit(index as i64)?;
        }
        Ok(Self::BitMask(mask))
    }
}

/// Insert into an ordered dict, replacing an existing key in place
pub(crate) fn insert_pair(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => pairs.push((key, value)),
    }
}

pub(crate) fn bit(index: i64) -> Result<u32> {
    if (0..32).contains(&index) {
        Ok(1 << index)
    } else {
        Err(CastError::Value(format!("Bit index out of range: {}", index)))
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    // Debug keeps a decimal point on whole numbers
    write!(f, "{:?}", value)
}

/// Quote a string so the lexer reads it back unchanged. Backslashes are
/// always escaped.
fn write_str(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let body = s.replace('\\', "\\\\");
    if !s.contains('\'') {
        write!(f, "'{}'", body)
    } else if !s.contains('"') {
        write!(f, "\"{}\"", body)
    } else {
        write!(f, "'{}'", body.replace('\'', "\\'"))
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) => write_float(f, *x),
            Self::String(s) => write_str(f, s),
            Self::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Self::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Self::Vector(v) => write!(f, "{}", v),
            Self::BitMask(mask) => {
                write!(f, "Bit(")?;
                let set: Vec<String> = (0..32)
                    .filter(|i| mask & (1 << i) != 0)
                    .map(|i| i.to_string())
                    .collect();
                write!(f, "{})", set.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Self::Vector(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_arity() {
        assert!(Vector::new(VectorKind::Vec, vec![1.0]).is_err());
        assert!(Vector::new(VectorKind::Vec, vec![1.0; 5]).is_err());
        let v = Vector::new(VectorKind::Point, vec![1.0, 2.0]).unwrap();
        assert_eq!(v.type_name(), "Point2");
        assert_eq!(v.z(), None);
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::None.to_string(), "none");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
    }

    #[test]
    fn test_display_strings_pick_quote() {
        assert_eq!(Value::from("Hero").to_string(), "'Hero'");
        assert_eq!(Value::from("it's").to_string(), "\"it's\"");
    }

    #[test]
    fn test_display_containers() {
        let tuple = Value::Tuple(vec![Value::Int(1)]);
        assert_eq!(tuple.to_string(), "(1,)");

        let dict = Value::Dict(vec![(Value::from("a"), Value::List(vec![Value::Int(1), Value::Int(2)]))]);
        assert_eq!(dict.to_string(), "{'a': [1, 2]}");

        assert_eq!(Value::Vector(Vector::vec3(1.0, 2.0, 3.0)).to_string(), "Vec(1.0, 2.0, 3.0)");
        assert_eq!(Value::bits(&[0, 3]).unwrap().to_string(), "Bit(0, 3)");
        assert_eq!(Value::BitMask(0).to_string(), "Bit()");
    }

    #[test]
    fn test_insert_pair_replaces() {
        let mut pairs = Vec::new();
        insert_pair(&mut pairs, Value::Int(1), Value::from("a"));
        insert_pair(&mut pairs, Value::Int(2), Value::from("b"));
        insert_pair(&mut pairs, Value::Int(1), Value::from("c"));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].1, Value::from("c"));
    }

    #[test]
    fn test_bit_out_of_range() {
        assert!(Value::bits(&[32]).is_err());
        assert_eq!(Value::bits(&[31]).unwrap(), Value::BitMask(1 << 31));
    }
}
