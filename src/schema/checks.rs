use crate::encoder::encode_compact;
use crate::primitive_type::primitive_type_of;
use crate::schema::error::{ValidationError, ValidationErrorKind};
use crate::schema::node::{NumberKeywords, SchemaNode, SchemaNumber, StringKeywords};
use crate::value::Value;
use num_cmp::NumCmp;
use std::cmp::Ordering;
use std::rc::Rc;

pub(crate) fn render(value: &Value) -> String {
    encode_compact(value)
}

/// Type gate plus the scalar keyword bundle plus `enum`, applied to one
/// delivered scalar value. Container values go through the event-driven
/// structural checks instead; only their `enum` uses [`check_enum`].
pub(crate) fn check_scalar(node: &SchemaNode, value: &Value) -> Result<(), ValidationError> {
    let kind = primitive_type_of(value);
    if !node.allows(kind) {
        return Err(ValidationError::new(ValidationErrorKind::Type {
            instance: render(value),
            kind: node.type_error_kind(),
        }));
    }
    match value {
        Value::Int(int) => {
            if let Some(bundle) = node.number_keywords() {
                check_int(bundle, *int)?;
            }
        }
        Value::Double(double) => {
            if let Some(bundle) = node.number_keywords() {
                check_double(bundle, *double)?;
            }
        }
        Value::String(text) => {
            if let Some(bundle) = node.string_keywords() {
                check_string(bundle, text)?;
            }
        }
        _ => {}
    }
    if let Some(entries) = &node.common.enum_ {
        check_enum(entries, value)?;
    }
    Ok(())
}

pub(crate) fn check_enum(entries: &[Value], value: &Value) -> Result<(), ValidationError> {
    if entries.iter().any(|entry| entry == value) {
        return Ok(());
    }
    let options = Value::Array(Rc::new(entries.to_vec()));
    Err(ValidationError::new(ValidationErrorKind::Enum {
        instance: render(value),
        options: render(&options),
    }))
}

fn check_int(bundle: &NumberKeywords, int: i64) -> Result<(), ValidationError> {
    check_number(bundle, NumCmpSide::Int(int))
}

fn check_double(bundle: &NumberKeywords, double: f64) -> Result<(), ValidationError> {
    check_number(bundle, NumCmpSide::Double(double))
}

enum NumCmpSide {
    Int(i64),
    Double(f64),
}

impl NumCmpSide {
    fn cmp(&self, bound: SchemaNumber) -> Option<Ordering> {
        match (self, bound) {
            (NumCmpSide::Int(a), SchemaNumber::Int(b)) => Some(a.cmp(&b)),
            (NumCmpSide::Int(a), SchemaNumber::Double(b)) => NumCmp::num_cmp(*a, b),
            (NumCmpSide::Double(a), SchemaNumber::Int(b)) => NumCmp::num_cmp(*a, b),
            (NumCmpSide::Double(a), SchemaNumber::Double(b)) => a.partial_cmp(&b),
        }
    }

    /// Divisibility per the int/double pairing: pure ints use `%`,
    /// anything involving a double uses `fmod == 0`.
    fn is_multiple_of(&self, divisor: SchemaNumber) -> bool {
        match (self, divisor) {
            (NumCmpSide::Int(a), SchemaNumber::Int(b)) => a % b == 0,
            (NumCmpSide::Int(a), SchemaNumber::Double(b)) => (*a as f64) % b == 0.0,
            (NumCmpSide::Double(a), SchemaNumber::Int(b)) => a % (b as f64) == 0.0,
            (NumCmpSide::Double(a), SchemaNumber::Double(b)) => a % b == 0.0,
        }
    }

    fn render(&self) -> String {
        match self {
            NumCmpSide::Int(int) => int.to_string(),
            NumCmpSide::Double(double) => double.to_string(),
        }
    }
}

fn check_number(bundle: &NumberKeywords, instance: NumCmpSide) -> Result<(), ValidationError> {
    if let Some(divisor) = bundle.multiple_of {
        if !instance.is_multiple_of(divisor) {
            return Err(ValidationError::new(ValidationErrorKind::MultipleOf {
                instance: instance.render(),
                multiple_of: divisor.to_string(),
            }));
        }
    }
    if let Some(minimum) = bundle.minimum {
        let ordering = instance.cmp(minimum);
        let ok = if bundle.exclusive_minimum {
            ordering == Some(Ordering::Greater)
        } else {
            matches!(ordering, Some(Ordering::Greater) | Some(Ordering::Equal))
        };
        if !ok {
            return Err(ValidationError::new(ValidationErrorKind::Minimum {
                instance: instance.render(),
                limit: minimum.to_string(),
                exclusive: bundle.exclusive_minimum,
            }));
        }
    }
    if let Some(maximum) = bundle.maximum {
        let ordering = instance.cmp(maximum);
        let ok = if bundle.exclusive_maximum {
            ordering == Some(Ordering::Less)
        } else {
            matches!(ordering, Some(Ordering::Less) | Some(Ordering::Equal))
        };
        if !ok {
            return Err(ValidationError::new(ValidationErrorKind::Maximum {
                instance: instance.render(),
                limit: maximum.to_string(),
                exclusive: bundle.exclusive_maximum,
            }));
        }
    }
    Ok(())
}

fn check_string(bundle: &StringKeywords, text: &str) -> Result<(), ValidationError> {
    // Length limits count code points, not bytes.
    let length = text.chars().count() as u64;
    if let Some(minimum) = bundle.min_length {
        if length < minimum {
            return Err(ValidationError::new(ValidationErrorKind::MinLength {
                instance: text.to_string(),
                limit: minimum,
            }));
        }
    }
    if let Some(maximum) = bundle.max_length {
        if length > maximum {
            return Err(ValidationError::new(ValidationErrorKind::MaxLength {
                instance: text.to_string(),
                limit: maximum,
            }));
        }
    }
    if let Some(pattern) = &bundle.pattern {
        if !pattern.is_match(text) {
            return Err(ValidationError::new(ValidationErrorKind::Pattern {
                instance: text.to_string(),
                pattern: pattern.source.to_string(),
            }));
        }
    }
    Ok(())
}
