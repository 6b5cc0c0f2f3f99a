//! CQL schema metadata built on top of [cql_types].
//!
//! - [type_parser] turns textual type names, as stored in the schema
//!   tables, into [ColumnType](cql_types::ColumnType) descriptors,
//! - [metadata] holds keyspace, table and materialized view descriptors,
//! - [keyspace] assembles a keyspace from its schema rows, ordering user
//!   defined types by dependency,
//! - [registry] defines the lookups the parser needs and a shared registry
//!   implementing them.

pub mod errors;
pub mod keyspace;
pub mod metadata;
pub mod registry;
pub mod type_parser;

#[cfg(test)]
mod test_utils;

pub use errors::{MetadataError, TableOptionError, TypeParseError};
pub use keyspace::{KeyspaceBuilder, UdtRow};
pub use metadata::{
    ClusteringOrder, Column, ColumnKind, Keyspace, MaterializedView, RawColumn, Table,
    TableOptions, TableRow, ViewRow,
};
pub use registry::{EmptyRegistry, KeyspaceRegistry, SchemaRegistry, TupleTypeFactory, TypeResolver};
pub use type_parser::{parse_type, ParsedType, ParserConfig, TypeParser};
