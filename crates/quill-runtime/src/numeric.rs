//! Implicit numeric widening table.
//!
//! Every numeric kind maps to a `(group, rank)` pair. Widening is allowed
//! iff the source pair precedes the target pair in this partial order:
//!
//! ```text
//!              0      1      2      3
//! Unsigned:   U1 ->  U2 ->  U4 ->  U8
//!               \      \      \
//! Signed:     I1 ->  I2 ->  I4 ->  I8        (unsigned -> signed of higher rank)
//! Char:       C  -> (U2, U4, U8, I4, I8)
//! Float:      R4 ->  R8                      (every integral kind -> R4, R8)
//! Decimal:    M                              (every integral kind -> M)
//! ```
//!
//! Floats and decimal never convert implicitly into each other, and nothing
//! converts implicitly into `Char`.

use quill_core::NumericKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Group {
    Unsigned,
    Signed,
    Char,
    Float,
    Decimal,
}

fn conversion_order(kind: NumericKind) -> (Group, u8) {
    match kind {
        NumericKind::Byte => (Group::Unsigned, 0),
        NumericKind::UInt16 => (Group::Unsigned, 1),
        NumericKind::UInt32 => (Group::Unsigned, 2),
        NumericKind::UInt64 => (Group::Unsigned, 3),

        NumericKind::SByte => (Group::Signed, 0),
        NumericKind::Int16 => (Group::Signed, 1),
        NumericKind::Int32 => (Group::Signed, 2),
        NumericKind::Int64 => (Group::Signed, 3),

        NumericKind::Char => (Group::Char, 0),

        NumericKind::Single => (Group::Float, 0),
        NumericKind::Double => (Group::Float, 1),

        NumericKind::Decimal => (Group::Decimal, 0),
    }
}

/// Whether `from` widens implicitly to `to`. Reflexive.
pub fn is_implicitly_convertible(from: NumericKind, to: NumericKind) -> bool {
    let (from_group, from_rank) = conversion_order(from);
    let (to_group, to_rank) = conversion_order(to);
    match (from_group, to_group) {
        (a, b) if a == b => from_rank <= to_rank,
        (Group::Unsigned, Group::Signed) => from_rank < to_rank,
        (Group::Char, Group::Unsigned) => to_rank >= 1,
        (Group::Char, Group::Signed) => to_rank >= 2,
        (Group::Unsigned | Group::Signed | Group::Char, Group::Float | Group::Decimal) => true,
        _ => false,
    }
}

/// Kind that arithmetic on `kind` is carried out in: everything narrower
/// than `Int32` promotes to `Int32`.
pub fn arithmetic_promotion(kind: NumericKind) -> NumericKind {
    match kind {
        NumericKind::SByte
        | NumericKind::Byte
        | NumericKind::Int16
        | NumericKind::UInt16
        | NumericKind::Char => NumericKind::Int32,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NumericKind::*;

    /// Implicit numeric conversions of the host platform, per source kind.
    fn host_widenings(from: NumericKind) -> &'static [NumericKind] {
        match from {
            SByte => &[Int16, Int32, Int64, Single, Double, Decimal],
            Byte => &[
                Int16, UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal,
            ],
            Int16 => &[Int32, Int64, Single, Double, Decimal],
            UInt16 => &[Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
            Int32 => &[Int64, Single, Double, Decimal],
            UInt32 => &[Int64, UInt64, Single, Double, Decimal],
            Int64 => &[Single, Double, Decimal],
            UInt64 => &[Single, Double, Decimal],
            Char => &[UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
            Single => &[Double],
            Double => &[],
            Decimal => &[],
        }
    }

    #[test]
    fn test_table_matches_host_widenings() {
        for from in NumericKind::ALL {
            for to in NumericKind::ALL {
                let expected = from == to || host_widenings(from).contains(&to);
                assert_eq!(
                    is_implicitly_convertible(from, to),
                    expected,
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_arithmetic_promotion() {
        assert_eq!(arithmetic_promotion(Byte), Int32);
        assert_eq!(arithmetic_promotion(Char), Int32);
        assert_eq!(arithmetic_promotion(Int64), Int64);
        assert_eq!(arithmetic_promotion(Double), Double);
    }
}
