//! Descriptors of CQL types.

use std::fmt;
use std::sync::Arc;

use itertools::Itertools as _;

use crate::pretty::CqlIdentifierDisplayer;

/// A CQL native (simple) type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum NativeType {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Inet,
    Int,
    Text,
    Varchar,
    Timestamp,
    Date,
    Time,
    Uuid,
    Varint,
    Timeuuid,
    TinyInt,
    SmallInt,
}

// Indexed by `NativeType as usize`.
static NATIVE_TYPE_NAMES: [&str; 20] = [
    "ascii",
    "bigint",
    "blob",
    "boolean",
    "counter",
    "decimal",
    "double",
    "float",
    "inet",
    "int",
    "text",
    "varchar",
    "timestamp",
    "date",
    "time",
    "uuid",
    "varint",
    "timeuuid",
    "tinyint",
    "smallint",
];

// One shared descriptor per native kind, indexed by `NativeType as usize`.
static NATIVE_COLUMN_TYPES: [ColumnType; 20] = [
    ColumnType::Native(NativeType::Ascii),
    ColumnType::Native(NativeType::BigInt),
    ColumnType::Native(NativeType::Blob),
    ColumnType::Native(NativeType::Boolean),
    ColumnType::Native(NativeType::Counter),
    ColumnType::Native(NativeType::Decimal),
    ColumnType::Native(NativeType::Double),
    ColumnType::Native(NativeType::Float),
    ColumnType::Native(NativeType::Inet),
    ColumnType::Native(NativeType::Int),
    ColumnType::Native(NativeType::Text),
    ColumnType::Native(NativeType::Varchar),
    ColumnType::Native(NativeType::Timestamp),
    ColumnType::Native(NativeType::Date),
    ColumnType::Native(NativeType::Time),
    ColumnType::Native(NativeType::Uuid),
    ColumnType::Native(NativeType::Varint),
    ColumnType::Native(NativeType::Timeuuid),
    ColumnType::Native(NativeType::TinyInt),
    ColumnType::Native(NativeType::SmallInt),
];

impl NativeType {
    /// All native types, in declaration order.
    pub const ALL: [NativeType; 20] = [
        NativeType::Ascii,
        NativeType::BigInt,
        NativeType::Blob,
        NativeType::Boolean,
        NativeType::Counter,
        NativeType::Decimal,
        NativeType::Double,
        NativeType::Float,
        NativeType::Inet,
        NativeType::Int,
        NativeType::Text,
        NativeType::Varchar,
        NativeType::Timestamp,
        NativeType::Date,
        NativeType::Time,
        NativeType::Uuid,
        NativeType::Varint,
        NativeType::Timeuuid,
        NativeType::TinyInt,
        NativeType::SmallInt,
    ];

    /// The lowercase CQL keyword of this type.
    pub fn name(self) -> &'static str {
        NATIVE_TYPE_NAMES[self as usize]
    }

    /// Looks a native type up by its CQL keyword, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<NativeType> {
        NATIVE_TYPE_NAMES
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|idx| NativeType::ALL[idx])
    }

    /// The shared, process-wide descriptor of this type.
    pub fn column_type(self) -> &'static ColumnType {
        &NATIVE_COLUMN_TYPES[self as usize]
    }

    /// Size of the wire representation for fixed-width types.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            NativeType::TinyInt => Some(1),
            NativeType::Boolean => Some(1),
            NativeType::SmallInt => Some(2),
            NativeType::Int | NativeType::Float | NativeType::Date => Some(4),
            NativeType::BigInt
            | NativeType::Counter
            | NativeType::Double
            | NativeType::Timestamp
            | NativeType::Time => Some(8),
            NativeType::Uuid | NativeType::Timeuuid => Some(16),
            _ => None,
        }
    }

    /// Whether a zero-length payload is a legal "empty" value distinct from
    /// the value of a zero-length string or blob.
    pub fn supports_empty(self) -> bool {
        !matches!(
            self,
            NativeType::Ascii
                | NativeType::Text
                | NativeType::Varchar
                | NativeType::Blob
                | NativeType::Counter
        )
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A CQL collection type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CollectionType {
    List(Box<ColumnType>),
    Set(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
}

impl CollectionType {
    /// The CQL keyword of the collection kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            CollectionType::List(_) => "list",
            CollectionType::Set(_) => "set",
            CollectionType::Map(_, _) => "map",
        }
    }
}

/// Definition of a user defined type, scoped to a keyspace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserDefinedType {
    pub name: String,
    pub keyspace: String,
    /// Fields in declaration order.
    pub field_types: Vec<(String, ColumnType)>,
}

impl UserDefinedType {
    pub fn new(
        keyspace: impl Into<String>,
        name: impl Into<String>,
        field_types: Vec<(String, ColumnType)>,
    ) -> Self {
        Self {
            name: name.into(),
            keyspace: keyspace.into(),
            field_types,
        }
    }
}

/// Descriptor of a CQL type.
///
/// Equality is structural. Native descriptors are equal iff their kinds are,
/// user defined types additionally compare their keyspace-qualified names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColumnType {
    Native(NativeType),
    Collection {
        frozen: bool,
        typ: CollectionType,
    },
    /// Tuples are always frozen.
    Tuple(Vec<ColumnType>),
    UserDefinedType {
        frozen: bool,
        definition: Arc<UserDefinedType>,
    },
    /// A type known only by its name: an unresolved user defined type or
    /// a type this crate does not understand.
    Custom(String),
    /// The legacy zero-width `empty` type. Opaque like [ColumnType::Custom],
    /// but never produced for an unresolved name, whatever its spelling.
    Empty,
}

/// Name of the legacy zero-width type.
pub const EMPTY_TYPE_NAME: &str = "empty";

impl ColumnType {
    /// `list<element>`
    pub fn list(element: ColumnType, frozen: bool) -> Self {
        ColumnType::Collection {
            frozen,
            typ: CollectionType::List(Box::new(element)),
        }
    }

    /// `set<element>`
    pub fn set(element: ColumnType, frozen: bool) -> Self {
        ColumnType::Collection {
            frozen,
            typ: CollectionType::Set(Box::new(element)),
        }
    }

    /// `map<key, value>`
    pub fn map(key: ColumnType, value: ColumnType, frozen: bool) -> Self {
        ColumnType::Collection {
            frozen,
            typ: CollectionType::Map(Box::new(key), Box::new(value)),
        }
    }

    /// `tuple<..>` of the given elements, in order.
    pub fn tuple(elements: impl IntoIterator<Item = ColumnType>) -> Self {
        ColumnType::Tuple(elements.into_iter().collect())
    }

    /// A reference to a user defined type.
    pub fn user_defined(definition: Arc<UserDefinedType>, frozen: bool) -> Self {
        ColumnType::UserDefinedType { frozen, definition }
    }

    /// Whether the `frozen` modifier means anything for this type.
    pub fn supports_freezing(&self) -> bool {
        matches!(
            self,
            ColumnType::Collection { .. } | ColumnType::Tuple(_) | ColumnType::UserDefinedType { .. }
        )
    }

    /// Whether values of this type are stored as a single unit.
    pub fn is_frozen(&self) -> bool {
        match self {
            ColumnType::Collection { frozen, .. } | ColumnType::UserDefinedType { frozen, .. } => {
                *frozen
            }
            ColumnType::Tuple(_) => true,
            ColumnType::Native(_) | ColumnType::Custom(_) | ColumnType::Empty => false,
        }
    }

    /// Returns the frozen variant of this type.
    ///
    /// Types that cannot be frozen are returned unchanged; the caller
    /// decides whether that deserves a diagnostic.
    pub fn frozen(self) -> Self {
        match self {
            ColumnType::Collection { typ, .. } => ColumnType::Collection { frozen: true, typ },
            ColumnType::UserDefinedType { definition, .. } => ColumnType::UserDefinedType {
                frozen: true,
                definition,
            },
            other => other,
        }
    }

    /// Whether this is the legacy `empty` type.
    pub fn is_empty_sentinel(&self) -> bool {
        matches!(self, ColumnType::Empty)
    }

    /// The native kind, if this is a native type.
    pub fn as_native(&self) -> Option<NativeType> {
        match self {
            ColumnType::Native(native) => Some(*native),
            _ => None,
        }
    }
}

impl From<NativeType> for ColumnType {
    fn from(native: NativeType) -> Self {
        ColumnType::Native(native)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Native(native) => write!(f, "{}", native),
            ColumnType::Collection { frozen, typ } => {
                if *frozen {
                    f.write_str("frozen<")?;
                }
                match typ {
                    CollectionType::List(elem) | CollectionType::Set(elem) => {
                        write!(f, "{}<{}>", typ.keyword(), elem)?
                    }
                    CollectionType::Map(key, value) => write!(f, "map<{}, {}>", key, value)?,
                }
                if *frozen {
                    f.write_str(">")?;
                }
                Ok(())
            }
            ColumnType::Tuple(elements) => write!(f, "tuple<{}>", elements.iter().join(", ")),
            ColumnType::UserDefinedType { frozen, definition } => {
                let qualified = format!(
                    "{}.{}",
                    CqlIdentifierDisplayer(&definition.keyspace),
                    CqlIdentifierDisplayer(&definition.name)
                );
                if *frozen {
                    write!(f, "frozen<{}>", qualified)
                } else {
                    f.write_str(&qualified)
                }
            }
            ColumnType::Custom(name) => write!(f, "'{}'", name),
            ColumnType::Empty => write!(f, "'{}'", EMPTY_TYPE_NAME),
        }
    }
}
