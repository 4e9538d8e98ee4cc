//! The runtime value representation shared by the parser (for literal and
//! declared types), the codegen/instruction layer (for `Push` payloads) and
//! the VM (for the operand stack).

use thiserror::Error;

/// The four kinds a [`Value`] can carry. Also doubles as the parser's notion
/// of a declared/expected type and as the `Convert` instruction's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Char,
    Int,
    Long,
}

impl ValueKind {
    /// Promotion rank: higher wins when two kinds meet in a binary operator.
    fn rank(self) -> u8 {
        match self {
            ValueKind::Bool => 0,
            ValueKind::Char => 1,
            ValueKind::Int => 2,
            ValueKind::Long => 3,
        }
    }

    /// The common kind both operands of a binary arithmetic/bitwise operator
    /// are coerced to, per the promotion table.
    pub fn common(self, other: ValueKind) -> ValueKind {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    /// Byte tag used on the wire (`Push` payload, serialized `Value`s).
    pub fn tag(self) -> u8 {
        match self {
            ValueKind::Bool => 0,
            ValueKind::Char => 1,
            ValueKind::Int => 2,
            ValueKind::Long => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<ValueKind> {
        match tag {
            0 => Some(ValueKind::Bool),
            1 => Some(ValueKind::Char),
            2 => Some(ValueKind::Int),
            3 => Some(ValueKind::Long),
            _ => None,
        }
    }

    /// Number of payload bytes following the kind tag.
    pub fn width(self) -> usize {
        match self {
            ValueKind::Bool | ValueKind::Char => 1,
            ValueKind::Int => 4,
            ValueKind::Long => 8,
        }
    }
}

/// A tagged runtime value: `Bool`, `Char` (signed 8-bit), `Int` (signed
/// 32-bit) or `Long` (signed 64-bit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(i8),
    Int(i32),
    Long(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
}

impl Value {
    pub fn kind(self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
        }
    }

    /// Every kind's bit pattern widened to `i64` for uniform arithmetic.
    fn as_i64(self) -> i64 {
        match self {
            Value::Bool(b) => b as i64,
            Value::Char(c) => c as i64,
            Value::Int(i) => i as i64,
            Value::Long(l) => l,
        }
    }

    fn truthy(self) -> bool {
        self.as_i64() != 0
    }

    fn pack(raw: i64, kind: ValueKind) -> Value {
        match kind {
            ValueKind::Bool => Value::Bool(raw != 0),
            ValueKind::Char => Value::Char(raw as i8),
            ValueKind::Int => Value::Int(raw as i32),
            ValueKind::Long => Value::Long(raw),
        }
    }

    fn binary(self, other: Value, f: impl FnOnce(i64, i64) -> i64) -> Value {
        let kind = self.kind().common(other.kind());
        Value::pack(f(self.as_i64(), other.as_i64()), kind)
    }

    pub fn add(self, other: Value) -> Value {
        self.binary(other, |a, b| a.wrapping_add(b))
    }

    pub fn sub(self, other: Value) -> Value {
        self.binary(other, |a, b| a.wrapping_sub(b))
    }

    pub fn mul(self, other: Value) -> Value {
        self.binary(other, |a, b| a.wrapping_mul(b))
    }

    pub fn div(self, other: Value) -> Result<Value, ValueError> {
        if other.as_i64() == 0 {
            return Err(ValueError::DivisionByZero);
        }
        Ok(self.binary(other, |a, b| a.wrapping_div(b)))
    }

    pub fn rem(self, other: Value) -> Result<Value, ValueError> {
        if other.as_i64() == 0 {
            return Err(ValueError::ModuloByZero);
        }
        Ok(self.binary(other, |a, b| a.wrapping_rem(b)))
    }

    pub fn bitand(self, other: Value) -> Value {
        self.binary(other, |a, b| a & b)
    }

    pub fn bitor(self, other: Value) -> Value {
        self.binary(other, |a, b| a | b)
    }

    pub fn bitxor(self, other: Value) -> Value {
        self.binary(other, |a, b| a ^ b)
    }

    /// Unary bitwise complement; stays in the operand's own kind.
    pub fn bitnot(self) -> Value {
        Value::pack(!self.as_i64(), self.kind())
    }

    pub fn lt(self, other: Value) -> Value {
        Value::Bool(self.as_i64() < other.as_i64())
    }

    pub fn lte(self, other: Value) -> Value {
        Value::Bool(self.as_i64() <= other.as_i64())
    }

    pub fn gt(self, other: Value) -> Value {
        Value::Bool(self.as_i64() > other.as_i64())
    }

    pub fn gte(self, other: Value) -> Value {
        Value::Bool(self.as_i64() >= other.as_i64())
    }

    pub fn eq_value(self, other: Value) -> Value {
        Value::Bool(self.as_i64() == other.as_i64())
    }

    pub fn not_eq_value(self, other: Value) -> Value {
        Value::Bool(self.as_i64() != other.as_i64())
    }

    pub fn bool_and(self, other: Value) -> Value {
        Value::Bool(self.truthy() && other.truthy())
    }

    pub fn bool_or(self, other: Value) -> Value {
        Value::Bool(self.truthy() || other.truthy())
    }

    pub fn bool_not(self) -> Value {
        Value::Bool(!self.truthy())
    }

    /// Truncates or widens to `target`, per standard integer conversion
    /// rules; converting to `Bool` is `value != 0`.
    pub fn convert(self, target: ValueKind) -> Value {
        Value::pack(self.as_i64(), target)
    }

    /// Textual form used by the `Print` instruction: `Bool` prints as
    /// `true`/`false`, everything else prints its numeric value.
    pub fn display_text(self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Long(l) => l.to_string(),
        }
    }

    /// Number of bytes `write` produces, including the leading kind tag.
    pub fn size(self) -> usize {
        1 + self.kind().width()
    }

    pub fn write(self, buf: &mut Vec<u8>) {
        buf.push(self.kind().tag());
        match self {
            Value::Bool(b) => buf.push(b as u8),
            Value::Char(c) => buf.push(c as u8),
            Value::Int(i) => buf.extend_from_slice(&i.to_le_bytes()),
            Value::Long(l) => buf.extend_from_slice(&l.to_le_bytes()),
        }
    }

    /// Decodes a `Value` starting at `*index`, advancing it past the value.
    pub fn read(buf: &[u8], index: &mut usize) -> Option<Value> {
        let tag = *buf.get(*index)?;
        let kind = ValueKind::from_tag(tag)?;
        let start = *index + 1;
        let end = start + kind.width();
        let bytes = buf.get(start..end)?;
        let value = match kind {
            ValueKind::Bool => Value::Bool(bytes[0] != 0),
            ValueKind::Char => Value::Char(bytes[0] as i8),
            ValueKind::Int => Value::Int(i32::from_le_bytes(bytes.try_into().ok()?)),
            ValueKind::Long => Value::Long(i64::from_le_bytes(bytes.try_into().ok()?)),
        };
        *index = end;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_picks_the_wider_kind() {
        assert_eq!(Value::Bool(true).add(Value::Long(1)), Value::Long(2));
        assert_eq!(Value::Char(1).add(Value::Int(2)), Value::Int(3));
    }

    #[test]
    fn bool_arithmetic_stays_bool() {
        assert_eq!(Value::Bool(true).add(Value::Bool(true)), Value::Bool(true));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(Value::Int(1).div(Value::Int(0)), Err(ValueError::DivisionByZero));
    }

    #[test]
    fn round_trips_through_bytes() {
        for v in [Value::Bool(true), Value::Char(-5), Value::Int(-1234), Value::Long(i64::MIN)] {
            let mut buf = Vec::new();
            v.write(&mut buf);
            assert_eq!(buf.len(), v.size());
            let mut idx = 0;
            assert_eq!(Value::read(&buf, &mut idx), Some(v));
            assert_eq!(idx, buf.len());
        }
    }

    #[test]
    fn print_text_matches_bool_vs_numeric_rule() {
        assert_eq!(Value::Bool(true).display_text(), "true");
        assert_eq!(Value::Char(65).display_text(), "65");
        assert_eq!(Value::Long(-3).display_text(), "-3");
    }

    #[test]
    fn convert_to_bool_is_nonzero_check() {
        assert_eq!(Value::Int(0).convert(ValueKind::Bool), Value::Bool(false));
        assert_eq!(Value::Int(5).convert(ValueKind::Bool), Value::Bool(true));
    }
}
