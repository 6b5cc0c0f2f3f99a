//! Descriptors of keyspaces, tables, materialized views and their columns.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;

use cql_types::codec::{CqlValueCodec, DoubleCodec, IntCodec, TextCodec, TypeCodec};
use cql_types::pretty::CqlIdentifierDisplayer;
use cql_types::{
    ColumnType, CqlValue, InvalidTypeError, InvalidTypeErrorKind, NativeType, UserDefinedType,
};
use itertools::Itertools;
use tracing::{error, trace};
use uuid::Uuid;

use crate::errors::{MetadataError, TableOptionError};
use crate::registry::TypeResolver;
use crate::type_parser::TypeParser;

/// Metadata of a keyspace.
#[derive(Clone, Debug, Default)]
pub struct Keyspace {
    /// Name of the keyspace.
    pub name: String,
    /// User defined types, by name.
    pub user_defined_types: HashMap<String, Arc<UserDefinedType>>,
    /// Tables, by name.
    pub tables: HashMap<String, Arc<Table>>,
    /// Materialized views, by name.
    pub views: HashMap<String, Arc<MaterializedView>>,
}

impl Keyspace {
    /// An empty keyspace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Views whose base table is `table_name`, ordered by name.
    pub fn views_of<'a>(
        &'a self,
        table_name: &'a str,
    ) -> impl Iterator<Item = &'a Arc<MaterializedView>> + 'a {
        self.views
            .values()
            .filter(move |view| view.base_table_name == table_name)
            .sorted_by(|a, b| a.name.cmp(&b.name))
    }
}

/// Role of a column in its table or view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColumnKind {
    /// An ordinary column.
    Regular,
    /// A column shared by all rows of a partition.
    Static,
    /// Part of the clustering key.
    Clustering,
    /// Part of the partition key.
    PartitionKey,
}

/// [ColumnKind] parse error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnKindFromStrError;

impl std::str::FromStr for ColumnKind {
    type Err = ColumnKindFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Self::Regular),
            "static" => Ok(Self::Static),
            "clustering" => Ok(Self::Clustering),
            "partition_key" => Ok(Self::PartitionKey),
            _ => Err(ColumnKindFromStrError),
        }
    }
}

/// Sort order of a clustering column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClusteringOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl ClusteringOrder {
    /// Reads the `clustering_order` schema column. Anything but `desc` is
    /// ascending, including `none` used for non clustering columns.
    pub fn from_schema(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            ClusteringOrder::Desc
        } else {
            ClusteringOrder::Asc
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            ClusteringOrder::Asc => "ASC",
            ClusteringOrder::Desc => "DESC",
        }
    }
}

/// A row of the columns schema table. The type is still textual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawColumn {
    /// Column name, exactly as stored.
    pub name: String,
    /// Role of the column.
    pub kind: ColumnKind,
    /// Position within the partition or clustering key, `-1` otherwise.
    pub position: i32,
    /// The textual CQL type.
    pub type_name: String,
    /// Sort order, meaningful for clustering columns only.
    pub clustering_order: ClusteringOrder,
}

impl RawColumn {
    /// Builds a raw column from schema strings.
    pub fn from_schema(
        name: impl Into<String>,
        kind: &str,
        position: i32,
        type_name: impl Into<String>,
        clustering_order: &str,
    ) -> Result<Self, MetadataError> {
        let name = name.into();
        let kind = kind
            .parse::<ColumnKind>()
            .map_err(|_| MetadataError::UnknownColumnKind {
                column: name.clone(),
                kind: kind.to_owned(),
            })?;
        Ok(Self {
            name,
            kind,
            position,
            type_name: type_name.into(),
            clustering_order: ClusteringOrder::from_schema(clustering_order),
        })
    }
}

/// A column with its resolved type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Column name, exactly as stored.
    pub name: String,
    /// Type of the column; unknown user defined types are placeholders.
    pub typ: ColumnType,
    /// Role of the column.
    pub kind: ColumnKind,
    /// `Some` for clustering columns only.
    pub clustering_order: Option<ClusteringOrder>,
}

/// Key columns and all columns of a table or view, in `SELECT *` order.
struct ArrangedColumns {
    partition_key: Vec<String>,
    clustering_key: Vec<String>,
    columns: Vec<Column>,
}

impl ArrangedColumns {
    /// Resolves column types and orders columns: partition key by position,
    /// clustering key by position, then the rest by name.
    ///
    /// Regular and static columns of the legacy `empty` type are dropped.
    fn arrange(
        parser: &TypeParser,
        registry: &(impl TypeResolver + ?Sized),
        keyspace: &str,
        raw_columns: &[RawColumn],
    ) -> Result<Self, MetadataError> {
        let mut partition_key = Vec::new();
        let mut clustering_key = Vec::new();
        let mut others = Vec::new();

        for raw in raw_columns {
            let typ = parser
                .parse(&raw.type_name, registry, keyspace, false)?
                .into_column_type();
            let column = Column {
                name: raw.name.clone(),
                typ,
                kind: raw.kind,
                clustering_order: (raw.kind == ColumnKind::Clustering)
                    .then_some(raw.clustering_order),
            };
            match raw.kind {
                ColumnKind::PartitionKey => partition_key.push((raw.position, column)),
                ColumnKind::Clustering => clustering_key.push((raw.position, column)),
                ColumnKind::Regular | ColumnKind::Static => {
                    if !column.typ.is_empty_sentinel() {
                        others.push(column);
                    }
                }
            }
        }

        let partition_key =
            validate_key_columns(partition_key).map_err(MetadataError::IncompletePartitionKey)?;
        let clustering_key =
            validate_key_columns(clustering_key).map_err(MetadataError::IncompleteClusteringKey)?;
        others.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            partition_key: partition_key.iter().map(|c| c.name.clone()).collect(),
            clustering_key: clustering_key.iter().map(|c| c.name.clone()).collect(),
            columns: partition_key
                .into_iter()
                .chain(clustering_key)
                .chain(others)
                .collect(),
        })
    }
}

/// Sorts key columns by position. Returns the first position with no
/// column on a gap or a duplicate.
fn validate_key_columns(mut key_columns: Vec<(i32, Column)>) -> Result<Vec<Column>, i32> {
    key_columns.sort_by_key(|(position, _)| *position);

    key_columns
        .into_iter()
        .enumerate()
        .map(|(idx, (position, column))| {
            let idx = i32::try_from(idx).map_err(|_| i32::MAX)?;
            if idx == position {
                Ok(column)
            } else {
                Err(idx)
            }
        })
        .collect::<Result<Vec<_>, _>>()
}

/// A row of the tables schema table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableRow {
    /// Keyspace of the table.
    pub keyspace_name: String,
    /// Name of the table.
    pub table_name: String,
    /// Table id.
    pub id: Option<Uuid>,
    /// Option names with their CQL literals.
    pub options: Vec<(String, String)>,
}

/// An immutable table descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Keyspace of the table.
    pub keyspace: String,
    /// Name of the table.
    pub name: String,
    /// Table id.
    pub id: Option<Uuid>,
    /// Partition key column names, by position.
    pub partition_key: Vec<String>,
    /// Clustering key column names, by position.
    pub clustering_key: Vec<String>,
    /// All columns, in `SELECT *` order.
    pub columns: Vec<Column>,
    /// `None` when the option block could not be read.
    pub options: Option<TableOptions>,
}

impl Table {
    /// Builds a table from its schema rows.
    ///
    /// Column types naming unknown user defined types degrade to
    /// [ColumnType::Custom] placeholders.
    pub fn build(
        registry: &(impl TypeResolver + ?Sized),
        row: &TableRow,
        raw_columns: &[RawColumn],
    ) -> Result<Self, MetadataError> {
        Self::build_with(&TypeParser::default(), registry, row, raw_columns)
    }

    /// [Table::build] with a custom type parser.
    pub fn build_with(
        parser: &TypeParser,
        registry: &(impl TypeResolver + ?Sized),
        row: &TableRow,
        raw_columns: &[RawColumn],
    ) -> Result<Self, MetadataError> {
        let ArrangedColumns {
            partition_key,
            clustering_key,
            columns,
        } = ArrangedColumns::arrange(parser, registry, &row.keyspace_name, raw_columns)?;

        let options = TableOptions::from_raw(&row.options)
            .map_err(|err| {
                error!(
                    "Error parsing schema options for table {}.{}: {}; its options will be absent",
                    row.keyspace_name, row.table_name, err
                );
            })
            .ok();

        Ok(Self {
            keyspace: row.keyspace_name.clone(),
            name: row.table_name.clone(),
            id: row.id,
            partition_key,
            clustering_key,
            columns,
            options,
        })
    }

    /// Finds a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// A row of the views schema table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewRow {
    /// Keyspace of the view and of its base table.
    pub keyspace_name: String,
    /// Name of the view.
    pub view_name: String,
    /// Name of the table the view is built from.
    pub base_table_name: String,
    /// View id.
    pub id: Option<Uuid>,
    /// Whether the view selects `*`.
    pub include_all_columns: bool,
    /// The `WHERE` clause of the view definition.
    pub where_clause: Option<String>,
    /// Option names with their CQL literals.
    pub options: Vec<(String, String)>,
}

/// An immutable materialized view descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterializedView {
    /// Keyspace of the view.
    pub keyspace: String,
    /// Name of the view.
    pub name: String,
    /// View id.
    pub id: Option<Uuid>,
    /// Name of the table the view is built from.
    pub base_table_name: String,
    /// Whether the view selects `*`.
    pub include_all_columns: bool,
    /// The `WHERE` clause of the view definition.
    pub where_clause: Option<String>,
    /// Partition key column names, by position.
    pub partition_key: Vec<String>,
    /// Clustering key column names, by position.
    pub clustering_key: Vec<String>,
    /// All columns, in `SELECT *` order.
    pub columns: Vec<Column>,
    /// `None` when the option block could not be read.
    pub options: Option<TableOptions>,
}

impl MaterializedView {
    /// Builds a view from its schema rows.
    ///
    /// Returns `Ok(None)` when the base table is not known to `registry`:
    /// the view is unavailable until a later refresh registers the table.
    /// Unreadable options leave [MaterializedView::options] empty.
    pub fn build(
        registry: &(impl TypeResolver + ?Sized),
        row: &ViewRow,
        raw_columns: &[RawColumn],
    ) -> Result<Option<Self>, MetadataError> {
        Self::build_with(&TypeParser::default(), registry, row, raw_columns)
    }

    /// [MaterializedView::build] with a custom type parser.
    pub fn build_with(
        parser: &TypeParser,
        registry: &(impl TypeResolver + ?Sized),
        row: &ViewRow,
        raw_columns: &[RawColumn],
    ) -> Result<Option<Self>, MetadataError> {
        let keyspace = &row.keyspace_name;
        let name = &row.view_name;
        if registry
            .lookup_table(keyspace, &row.base_table_name)
            .is_none()
        {
            trace!(
                "Cannot find base table {} for materialized view {}.{}: the view is unavailable",
                row.base_table_name,
                keyspace,
                name
            );
            return Ok(None);
        }

        let options = TableOptions::from_raw(&row.options)
            .map_err(|err| {
                error!(
                    "Error parsing schema options for view {}.{}: {}; its options will be absent",
                    keyspace, name, err
                );
            })
            .ok();

        let ArrangedColumns {
            partition_key,
            clustering_key,
            columns,
        } = ArrangedColumns::arrange(parser, registry, keyspace, raw_columns)?;

        Ok(Some(Self {
            keyspace: keyspace.clone(),
            name: name.clone(),
            id: row.id,
            base_table_name: row.base_table_name.clone(),
            include_all_columns: row.include_all_columns,
            where_clause: row.where_clause.clone(),
            partition_key,
            clustering_key,
            columns,
            options,
        }))
    }

    /// Finds a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Renders the `CREATE MATERIALIZED VIEW` statement of this view.
    ///
    /// With `formatted` every clause starts on its own line.
    pub fn as_cql_query(&self, formatted: bool) -> String {
        let keyspace = CqlIdentifierDisplayer(&self.keyspace);
        let (nl, indent) = if formatted { ("\n", "    ") } else { (" ", "") };

        let mut out = format!(
            "CREATE MATERIALIZED VIEW {}.{} AS{nl}SELECT",
            keyspace,
            CqlIdentifierDisplayer(&self.name)
        );
        if self.include_all_columns {
            out.push_str(" *");
        } else {
            let separator = format!(",{nl}{indent}");
            let _ = write!(out, "{nl}{indent}");
            out.push_str(
                &self
                    .columns
                    .iter()
                    .map(|column| CqlIdentifierDisplayer(&column.name))
                    .join(&separator),
            );
        }
        let _ = write!(
            out,
            "{nl}FROM {}.{}",
            keyspace,
            CqlIdentifierDisplayer(&self.base_table_name)
        );
        if let Some(where_clause) = self.where_clause.as_deref().filter(|w| !w.is_empty()) {
            let _ = write!(out, "{nl}WHERE {}", where_clause);
        }

        let partition_key = self
            .partition_key
            .iter()
            .map(|name| CqlIdentifierDisplayer(name))
            .join(", ");
        let _ = write!(out, "{nl}PRIMARY KEY (");
        if self.partition_key.len() == 1 {
            out.push_str(&partition_key);
        } else {
            let _ = write!(out, "({})", partition_key);
        }
        for name in &self.clustering_key {
            let _ = write!(out, ", {}", CqlIdentifierDisplayer(name));
        }
        out.push(')');

        let mut with = Vec::new();
        if !self.clustering_key.is_empty() {
            with.push(format!(
                "CLUSTERING ORDER BY ({})",
                self.clustering_key
                    .iter()
                    .map(|name| {
                        let order = self
                            .column(name)
                            .and_then(|column| column.clustering_order)
                            .unwrap_or_default();
                        format!("{} {}", CqlIdentifierDisplayer(name), order.keyword())
                    })
                    .join(", ")
            ));
        }
        if let Some(options) = &self.options {
            with.extend(
                options
                    .to_cql_entries()
                    .into_iter()
                    .map(|(name, literal)| format!("{} = {}", name, literal)),
            );
        }
        if !with.is_empty() {
            let separator = format!("{nl}{indent}AND ");
            let _ = write!(out, "{nl}WITH {}", with.join(&separator));
        }
        out.push(';');
        out
    }
}

/// Typed view of a table or view option block.
///
/// Options without a typed field are kept verbatim in [TableOptions::other].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableOptions {
    /// `comment`
    pub comment: Option<String>,
    /// `default_time_to_live`, in seconds.
    pub default_time_to_live: Option<i32>,
    /// `gc_grace_seconds`
    pub gc_grace_seconds: Option<i32>,
    /// `bloom_filter_fp_chance`
    pub bloom_filter_fp_chance: Option<f64>,
    /// `crc_check_chance`
    pub crc_check_chance: Option<f64>,
    /// `speculative_retry`, e.g. `99PERCENTILE`.
    pub speculative_retry: Option<String>,
    /// `caching` sub-options.
    pub caching: BTreeMap<String, String>,
    /// `compaction` sub-options, including its `class`.
    pub compaction: BTreeMap<String, String>,
    /// `compression` sub-options.
    pub compression: BTreeMap<String, String>,
    /// Remaining options, with their CQL literals.
    pub other: BTreeMap<String, String>,
}

fn text_map_type() -> ColumnType {
    ColumnType::map(NativeType::Text.into(), NativeType::Text.into(), false)
}

impl TableOptions {
    /// Reads options from `(name, CQL literal)` pairs.
    pub fn from_raw(raw: &[(String, String)]) -> Result<Self, TableOptionError> {
        let text_map = CqlValueCodec::new(&text_map_type()).map_err(|source| TableOptionError {
            option: String::new(),
            source,
        })?;
        let mut options = TableOptions::default();

        for (name, literal) in raw {
            let wrap = |source| TableOptionError {
                option: name.clone(),
                source,
            };
            match name.as_str() {
                "comment" => options.comment = TextCodec::text().parse(literal).map_err(wrap)?,
                "speculative_retry" => {
                    options.speculative_retry = TextCodec::text().parse(literal).map_err(wrap)?
                }
                "default_time_to_live" => {
                    options.default_time_to_live = IntCodec.parse(literal).map_err(wrap)?
                }
                "gc_grace_seconds" => {
                    options.gc_grace_seconds = IntCodec.parse(literal).map_err(wrap)?
                }
                "bloom_filter_fp_chance" => {
                    options.bloom_filter_fp_chance = DoubleCodec.parse(literal).map_err(wrap)?
                }
                "crc_check_chance" => {
                    options.crc_check_chance = DoubleCodec.parse(literal).map_err(wrap)?
                }
                "caching" => options.caching = parse_text_map(&text_map, literal).map_err(wrap)?,
                "compaction" => {
                    options.compaction = parse_text_map(&text_map, literal).map_err(wrap)?
                }
                "compression" => {
                    options.compression = parse_text_map(&text_map, literal).map_err(wrap)?
                }
                _ => {
                    options.other.insert(name.clone(), literal.clone());
                }
            }
        }
        Ok(options)
    }

    /// Option names with their CQL literals, ordered by name.
    pub fn to_cql_entries(&self) -> Vec<(String, String)> {
        let mut entries = self.other.clone();
        let mut put = |name: &str, literal: Result<String, InvalidTypeError>| {
            if let Ok(literal) = literal {
                entries.insert(name.to_owned(), literal);
            }
        };

        if let Some(comment) = &self.comment {
            put("comment", TextCodec::text().format_value(comment));
        }
        if let Some(retry) = &self.speculative_retry {
            put("speculative_retry", TextCodec::text().format_value(retry));
        }
        if let Some(ttl) = &self.default_time_to_live {
            put("default_time_to_live", IntCodec.format_value(ttl));
        }
        if let Some(grace) = &self.gc_grace_seconds {
            put("gc_grace_seconds", IntCodec.format_value(grace));
        }
        if let Some(chance) = &self.bloom_filter_fp_chance {
            put("bloom_filter_fp_chance", DoubleCodec.format_value(chance));
        }
        if let Some(chance) = &self.crc_check_chance {
            put("crc_check_chance", DoubleCodec.format_value(chance));
        }
        for (name, map) in [
            ("caching", &self.caching),
            ("compaction", &self.compaction),
            ("compression", &self.compression),
        ] {
            if !map.is_empty() {
                put(name, format_text_map(map));
            }
        }

        entries.into_iter().collect()
    }
}

fn parse_text_map(
    codec: &CqlValueCodec,
    literal: &str,
) -> Result<BTreeMap<String, String>, InvalidTypeError> {
    let Some(value) = codec.parse(literal)? else {
        return Ok(BTreeMap::new());
    };
    let not_text = || {
        InvalidTypeError::new(
            codec.cql_type(),
            InvalidTypeErrorKind::IncompatibleValue {
                expected: "map<text, text>",
            },
        )
    };
    match value {
        CqlValue::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| {
                let k = k.into_string().ok_or_else(not_text)?;
                let v = v.into_string().ok_or_else(not_text)?;
                Ok::<_, InvalidTypeError>((k, v))
            })
            .collect(),
        CqlValue::Empty => Ok(BTreeMap::new()),
        _ => Err(not_text()),
    }
}

fn format_text_map(map: &BTreeMap<String, String>) -> Result<String, InvalidTypeError> {
    let codec = CqlValueCodec::new(&text_map_type())?;
    let value = CqlValue::Map(
        map.iter()
            .map(|(k, v)| (CqlValue::Text(k.clone()), CqlValue::Text(v.clone())))
            .collect(),
    );
    codec.format_value(&value)
}
