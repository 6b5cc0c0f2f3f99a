//! Codecs for values stored as CQL tuples.
//!
//! A [CompositeCodec] drives one [ElementCodec] per tuple component. The
//! element codecs know how to read and write their component of the
//! composite value; the composite codec owns the framing:
//! - binary: the components' `[bytes]` concatenated in order, a null
//!   component being written as length -1,
//! - text: `(c1,c2,...)` where each component is any CQL value, including
//!   `NULL`.
//!
//! Decoding stops at the end of the input, leaving the remaining components
//! absent, and ignores bytes left after the last component.

use bytes::{Bytes, BytesMut};

use super::dynamic::CqlValueCodec;
use super::TypeCodec;
use crate::cql_type::ColumnType;
use crate::errors::{mk_err, unparsable, InvalidTypeError, InvalidTypeErrorKind};
use crate::frame::types::{read_bytes_opt, write_bytes_opt};
use crate::frame::ProtocolVersion;
use crate::utils::parse::ParserState;
use crate::value::CqlValue;

/// A value assembled component by component.
pub trait CompositeValue: Sized {
    /// A value with all `arity` components absent.
    fn with_arity(arity: usize) -> Self;

    /// Number of components the value carries, if it tracks it.
    ///
    /// Used to reject values with more components than the type has.
    fn component_count(&self) -> Option<usize> {
        None
    }
}

/// Reads and writes one component of a composite value.
pub trait ElementCodec<T>: Send + Sync {
    /// The CQL type of the component.
    fn element_type(&self) -> &ColumnType;

    /// Serializes the component; `None` stands for null.
    fn serialize_element(
        &self,
        value: &T,
        version: ProtocolVersion,
    ) -> Result<Option<Bytes>, InvalidTypeError>;

    /// Stores the deserialized component into `value`.
    fn deserialize_element(
        &self,
        value: &mut T,
        bytes: Option<&[u8]>,
        version: ProtocolVersion,
    ) -> Result<(), InvalidTypeError>;

    /// Formats the component, `NULL` when absent.
    fn format_element(&self, value: &T) -> Result<String, InvalidTypeError>;

    /// Stores the parsed component into `value`. The literal may be `NULL`.
    fn parse_element(&self, value: &mut T, literal: &str) -> Result<(), InvalidTypeError>;
}

/// A codec for a tuple-shaped CQL type driven by per-component codecs.
pub struct CompositeCodec<T> {
    cql_type: ColumnType,
    elements: Vec<Box<dyn ElementCodec<T>>>,
}

impl<T> std::fmt::Debug for CompositeCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeCodec")
            .field("cql_type", &self.cql_type)
            .finish_non_exhaustive()
    }
}

impl<T: CompositeValue> CompositeCodec<T> {
    /// Binds element codecs to a tuple type.
    ///
    /// Fails unless `cql_type` is a tuple with exactly one component per
    /// element codec, each of the type the codec handles.
    pub fn new(
        cql_type: ColumnType,
        elements: Vec<Box<dyn ElementCodec<T>>>,
    ) -> Result<Self, InvalidTypeError> {
        let ColumnType::Tuple(components) = &cql_type else {
            return Err(mk_err(
                &cql_type,
                InvalidTypeErrorKind::UnsupportedType {
                    codec: "CompositeCodec",
                },
            ));
        };
        if components.len() != elements.len() {
            return Err(mk_err(
                &cql_type,
                InvalidTypeErrorKind::ArityMismatch {
                    expected: components.len(),
                    got: elements.len(),
                },
            ));
        }
        if components
            .iter()
            .zip(&elements)
            .any(|(component, element)| component != element.element_type())
        {
            return Err(mk_err(
                &cql_type,
                InvalidTypeErrorKind::IncompatibleValue {
                    expected: "element codecs matching the tuple components",
                },
            ));
        }
        Ok(Self { cql_type, elements })
    }

    /// Number of components.
    pub fn arity(&self) -> usize {
        self.elements.len()
    }

    fn unparsable(&self, literal: &str, reason: &'static str) -> InvalidTypeError {
        mk_err(&self.cql_type, unparsable(literal, reason))
    }
}

impl<T: CompositeValue> TypeCodec for CompositeCodec<T> {
    type Value = T;

    fn cql_type(&self) -> &ColumnType {
        &self.cql_type
    }

    fn encode(&self, value: &T, version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        if let Some(got) = value.component_count() {
            if got > self.arity() {
                return Err(mk_err(
                    &self.cql_type,
                    InvalidTypeErrorKind::ArityMismatch {
                        expected: self.arity(),
                        got,
                    },
                ));
            }
        }
        let mut buf = BytesMut::new();
        for element in &self.elements {
            let component = element.serialize_element(value, version)?;
            write_bytes_opt(component.as_ref(), &mut buf).map_err(|_| {
                mk_err(
                    &self.cql_type,
                    InvalidTypeErrorKind::ValueTooBig {
                        size: component.as_ref().map_or(0, Bytes::len),
                    },
                )
            })?;
        }
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], version: ProtocolVersion) -> Result<Option<T>, InvalidTypeError> {
        let mut value = T::with_arity(self.arity());
        let mut buf = bytes;
        for element in &self.elements {
            if buf.is_empty() {
                break;
            }
            let component = read_bytes_opt(&mut buf).map_err(|err| mk_err(&self.cql_type, err))?;
            element.deserialize_element(&mut value, component, version)?;
        }
        Ok(Some(value))
    }

    fn format_value(&self, value: &T) -> Result<String, InvalidTypeError> {
        let components = self
            .elements
            .iter()
            .map(|element| element.format_element(value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("({})", components.join(",")))
    }

    fn parse_literal(&self, literal: &str) -> Result<T, InvalidTypeError> {
        let mut value = T::with_arity(self.arity());
        let p = ParserState::new(literal).skip_white();
        let p = p
            .accept("(")
            .map_err(|_| self.unparsable(literal, "expecting '('"))?
            .skip_white();

        let finish = |p: ParserState<'_>| {
            if p.skip_white().is_at_eof() {
                Ok(())
            } else {
                Err(self.unparsable(literal, "unexpected characters after ')'"))
            }
        };

        if let Ok(p) = p.accept(")") {
            finish(p)?;
            return Ok(value);
        }

        let mut p = p;
        let mut elements = self.elements.iter();
        loop {
            let element = elements
                .next()
                .ok_or_else(|| self.unparsable(literal, "too many components"))?;
            let (component, next) = p
                .skip_cql_value()
                .map_err(|_| self.unparsable(literal, "invalid CQL value"))?;
            element.parse_element(&mut value, component)?;

            p = next.skip_white();
            if let Ok(p) = p.accept(")") {
                finish(p)?;
                return Ok(value);
            }
            if p.is_at_eof() {
                return Err(self.unparsable(literal, "missing closing ')'"));
            }
            p = p
                .accept(",")
                .map_err(|_| self.unparsable(literal, "expecting ',' or ')'"))?
                .skip_white();
        }
    }
}

impl CompositeValue for Vec<Option<CqlValue>> {
    fn with_arity(arity: usize) -> Self {
        vec![None; arity]
    }

    fn component_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

/// Handles one position of a dynamically typed tuple.
struct TupleElement {
    index: usize,
    codec: CqlValueCodec,
}

impl ElementCodec<Vec<Option<CqlValue>>> for TupleElement {
    fn element_type(&self) -> &ColumnType {
        self.codec.cql_type()
    }

    fn serialize_element(
        &self,
        value: &Vec<Option<CqlValue>>,
        version: ProtocolVersion,
    ) -> Result<Option<Bytes>, InvalidTypeError> {
        let component = value.get(self.index).and_then(Option::as_ref);
        self.codec.serialize(component, version)
    }

    fn deserialize_element(
        &self,
        value: &mut Vec<Option<CqlValue>>,
        bytes: Option<&[u8]>,
        version: ProtocolVersion,
    ) -> Result<(), InvalidTypeError> {
        value[self.index] = self.codec.deserialize(bytes, version)?;
        Ok(())
    }

    fn format_element(&self, value: &Vec<Option<CqlValue>>) -> Result<String, InvalidTypeError> {
        let component = value.get(self.index).and_then(Option::as_ref);
        self.codec.format(component)
    }

    fn parse_element(
        &self,
        value: &mut Vec<Option<CqlValue>>,
        literal: &str,
    ) -> Result<(), InvalidTypeError> {
        value[self.index] = self.codec.parse(literal)?;
        Ok(())
    }
}

/// A codec for any tuple type, with components as optional [CqlValue]s.
pub type TupleCodec = CompositeCodec<Vec<Option<CqlValue>>>;

impl CompositeCodec<Vec<Option<CqlValue>>> {
    /// Builds the codec of a tuple type from the codecs of its components.
    pub fn for_tuple(cql_type: &ColumnType) -> Result<Self, InvalidTypeError> {
        let ColumnType::Tuple(components) = cql_type else {
            return Err(mk_err(
                cql_type,
                InvalidTypeErrorKind::UnsupportedType {
                    codec: "TupleCodec",
                },
            ));
        };
        let elements = components
            .iter()
            .enumerate()
            .map(|(index, component)| {
                let codec = CqlValueCodec::new(component)?;
                Ok(Box::new(TupleElement { index, codec }) as Box<dyn ElementCodec<_>>)
            })
            .collect::<Result<Vec<_>, InvalidTypeError>>()?;
        Self::new(cql_type.clone(), elements)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::TupleCodec;
    use crate::codec::TypeCodec;
    use crate::cql_type::{ColumnType, NativeType};
    use crate::errors::InvalidTypeErrorKind;
    use crate::frame::ProtocolVersion;
    use crate::value::CqlValue;

    fn int_text() -> TupleCodec {
        TupleCodec::for_tuple(&ColumnType::tuple([
            NativeType::Int.into(),
            NativeType::Text.into(),
        ]))
        .unwrap()
    }

    #[test]
    fn binary_layout() {
        let codec = int_text();
        let value = vec![Some(CqlValue::Int(7)), None];
        let bytes = codec.encode(&value, ProtocolVersion::V4).unwrap();
        assert_eq!(
            &bytes[..],
            &[0, 0, 0, 4, 0, 0, 0, 7, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(
            codec.decode(&bytes, ProtocolVersion::V4).unwrap(),
            Some(value)
        );
    }

    #[test]
    fn short_input_leaves_components_absent() {
        let codec = int_text();
        assert_eq!(
            codec.decode(&[0, 0, 0, 4, 0, 0, 0, 7], ProtocolVersion::V4).unwrap(),
            Some(vec![Some(CqlValue::Int(7)), None])
        );
        assert_eq!(
            codec.decode(&[], ProtocolVersion::V4).unwrap(),
            Some(vec![None, None])
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let codec = int_text();
        let bytes = [0, 0, 0, 4, 0, 0, 0, 7, 0xff, 0xff, 0xff, 0xff, 1, 2, 3];
        assert_eq!(
            codec.decode(&bytes, ProtocolVersion::V4).unwrap(),
            Some(vec![Some(CqlValue::Int(7)), None])
        );
    }

    #[test]
    fn text_form() {
        let codec = int_text();
        let value = vec![Some(CqlValue::Int(7)), Some(CqlValue::Text("a,b)".into()))];
        assert_eq!(codec.format_value(&value).unwrap(), "(7,'a,b)')");
        assert_eq!(codec.parse("( 7 , 'a,b)' )").unwrap(), Some(value));
        assert_eq!(
            codec.parse("(NULL,'x')").unwrap(),
            Some(vec![None, Some(CqlValue::Text("x".into()))])
        );
        assert_eq!(codec.parse("()").unwrap(), Some(vec![None, None]));
        assert_eq!(codec.parse("(7)").unwrap(), Some(vec![Some(CqlValue::Int(7)), None]));
        assert_eq!(codec.format(None).unwrap(), "NULL");
    }

    #[test]
    fn malformed_text() {
        let codec = int_text();
        for (literal, reason) in [
            ("7,'x'", "expecting '('"),
            ("(7,'x'", "missing closing ')'"),
            ("(7,'x',8)", "too many components"),
            ("(7;'x')", "expecting ',' or ')'"),
            ("(7,'x') tail", "unexpected characters after ')'"),
        ] {
            let err = codec.parse(literal).unwrap_err();
            assert_matches!(
                err.kind,
                InvalidTypeErrorKind::UnparsableLiteral { reason: r, .. } if r == reason,
                "{literal}"
            );
        }
    }

    #[test]
    fn too_many_values_are_rejected() {
        let codec = int_text();
        let value = vec![Some(CqlValue::Int(1)), None, None];
        assert_matches!(
            codec.encode(&value, ProtocolVersion::V4).unwrap_err().kind,
            InvalidTypeErrorKind::ArityMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn requires_tuple_type() {
        assert_matches!(
            TupleCodec::for_tuple(NativeType::Int.column_type()).unwrap_err().kind,
            InvalidTypeErrorKind::UnsupportedType { .. }
        );
    }
}
