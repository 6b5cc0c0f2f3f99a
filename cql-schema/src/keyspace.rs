//! Assembling the metadata of one keyspace from its schema rows.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use cql_types::{ColumnType, UserDefinedType};
use tracing::debug;

use crate::errors::MetadataError;
use crate::metadata::{Keyspace, MaterializedView, RawColumn, Table, TableRow, ViewRow};
use crate::registry::{KeyspaceRegistry, TupleTypeFactory, TypeResolver};
use crate::type_parser::{ParserConfig, TypeParser};

/// A row of the types schema table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UdtRow {
    /// Name of the type.
    pub type_name: String,
    /// Field names, in declaration order.
    pub field_names: Vec<String>,
    /// Textual field types, matching `field_names`.
    pub field_types: Vec<String>,
}

struct UdtRowWithReferences {
    row: UdtRow,
    /// User defined types named by the field types.
    referenced: Vec<String>,
}

/// Builds the metadata of a single keyspace.
///
/// Types are added first, then tables, then views, so that every step can
/// resolve what the previous ones produced. The builder is itself a
/// registry: lookups in its keyspace see what was added so far, and
/// everything else goes to the fallback registry, if any.
pub struct KeyspaceBuilder {
    name: String,
    parser: TypeParser,
    fallback: Option<Arc<dyn TypeResolver + Send + Sync>>,
    keyspace: Keyspace,
}

impl std::fmt::Debug for KeyspaceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyspaceBuilder")
            .field("name", &self.name)
            .field("parser", &self.parser)
            .field("has_fallback", &self.fallback.is_some())
            .field("keyspace", &self.keyspace)
            .finish()
    }
}

impl KeyspaceBuilder {
    /// Starts an empty keyspace.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            keyspace: Keyspace::new(name.clone()),
            name,
            parser: TypeParser::default(),
            fallback: None,
        }
    }

    /// Resolves names that are not part of this keyspace through `fallback`.
    pub fn with_fallback(mut self, fallback: Arc<dyn TypeResolver + Send + Sync>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Parses types with the given settings.
    pub fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.parser = TypeParser::new(config);
        self
    }

    /// Adds the user defined types of the keyspace.
    ///
    /// Rows may come in any order: they are sorted so that every type is
    /// built after the types it refers to. Names not defined by the rows
    /// are resolved through the types added earlier and the fallback.
    pub fn add_user_types(&mut self, rows: Vec<UdtRow>) -> Result<&mut Self, MetadataError> {
        let mut udt_rows = rows
            .into_iter()
            .map(|row| {
                if row.field_names.len() != row.field_types.len() {
                    return Err(MetadataError::UdtFieldCountMismatch {
                        type_name: row.type_name.clone(),
                        names: row.field_names.len(),
                        types: row.field_types.len(),
                    });
                }
                let mut referenced = Vec::new();
                for field_type in &row.field_types {
                    referenced.extend(self.parser.referenced_user_types(field_type)?);
                }
                Ok(UdtRowWithReferences { row, referenced })
            })
            .collect::<Result<Vec<_>, MetadataError>>()?;

        let instant_before_toposort = Instant::now();
        topo_sort_udts(&mut udt_rows)?;
        let toposort_elapsed = instant_before_toposort.elapsed();
        debug!(
            "Toposort of UDT definitions took {:.2} ms (udts len: {})",
            toposort_elapsed.as_secs_f64() * 1000.,
            udt_rows.len(),
        );

        for UdtRowWithReferences { row, .. } in udt_rows {
            let UdtRow {
                type_name,
                field_names,
                field_types,
            } = row;

            let mut fields = Vec::with_capacity(field_names.len());
            for (field_name, field_type) in field_names.into_iter().zip(field_types.iter()) {
                let typ = self
                    .parser
                    .parse(field_type, &*self, &self.name, false)?
                    .into_column_type();
                fields.push((field_name, typ));
            }

            let udt = Arc::new(UserDefinedType::new(self.name.clone(), type_name.clone(), fields));
            self.keyspace.user_defined_types.insert(type_name, udt);
        }
        Ok(self)
    }

    /// Adds a table.
    pub fn add_table(
        &mut self,
        row: &TableRow,
        raw_columns: &[RawColumn],
    ) -> Result<&mut Self, MetadataError> {
        let table = Table::build_with(&self.parser, &*self, row, raw_columns)?;
        self.keyspace
            .tables
            .insert(table.name.clone(), Arc::new(table));
        Ok(self)
    }

    /// Adds a materialized view. Returns `false`, leaving the view out,
    /// when its base table is neither in this keyspace nor in the fallback.
    pub fn add_view(
        &mut self,
        row: &ViewRow,
        raw_columns: &[RawColumn],
    ) -> Result<bool, MetadataError> {
        match MaterializedView::build_with(&self.parser, &*self, row, raw_columns)? {
            Some(view) => {
                self.keyspace.views.insert(view.name.clone(), Arc::new(view));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Finishes the keyspace.
    pub fn build(self) -> Keyspace {
        self.keyspace
    }
}

impl KeyspaceRegistry for KeyspaceBuilder {
    fn lookup_user_type(&self, keyspace: &str, type_name: &str) -> Option<Arc<UserDefinedType>> {
        let local = (keyspace == self.name)
            .then(|| self.keyspace.user_defined_types.get(type_name).cloned())
            .flatten();
        local.or_else(|| self.fallback.as_ref()?.lookup_user_type(keyspace, type_name))
    }

    fn lookup_table(&self, keyspace: &str, table_name: &str) -> Option<Arc<Table>> {
        let local = (keyspace == self.name)
            .then(|| self.keyspace.tables.get(table_name).cloned())
            .flatten();
        local.or_else(|| self.fallback.as_ref()?.lookup_table(keyspace, table_name))
    }
}

impl TupleTypeFactory for KeyspaceBuilder {
    fn make_tuple(&self, components: Vec<ColumnType>) -> ColumnType {
        match &self.fallback {
            Some(fallback) => fallback.make_tuple(components),
            None => ColumnType::Tuple(components),
        }
    }
}

/// Orders type definitions so that every type comes after the types it
/// refers to. References to types outside of `udts` are ignored.
fn topo_sort_udts(udts: &mut Vec<UdtRowWithReferences>) -> Result<(), MetadataError> {
    // Build an indegree map: for each node in the graph, how many directly depending types it has.
    let mut indegs = udts
        .drain(..)
        .map(|def| (def.row.type_name.clone(), (def, Cell::new(0u32))))
        .collect::<HashMap<_, _>>();

    // For each node in the graph...
    for (def, _) in indegs.values() {
        // For each type referred by the node...
        for type_name in &def.referenced {
            if let Some((_, deg_cell)) = indegs.get(type_name) {
                deg_cell.set(deg_cell.get() + 1);
            }
        }
    }

    let mut sorted = Vec::with_capacity(indegs.len());
    let mut next_idx = 0;

    // Schedule keys that had an initial indeg of 0
    for (key, _) in indegs.iter().filter(|(_, (_, deg))| deg.get() == 0) {
        sorted.push(key);
    }

    while let Some(key) = sorted.get(next_idx).copied() {
        next_idx += 1;
        let Some((def, _)) = indegs.get(key) else {
            continue;
        };
        // Decrement the counters of all UDTs that this UDT depends upon
        // and then schedule them if their counter drops to 0
        for type_name in &def.referenced {
            if let Some((ref_key, (_, cnt))) = indegs.get_key_value(type_name) {
                let new_cnt = cnt.get() - 1;
                cnt.set(new_cnt);
                if new_cnt == 0 {
                    sorted.push(ref_key);
                }
            }
        }
    }

    if sorted.len() < indegs.len() {
        // Some UDTs could not become leaves in the graph, which implies cycles.
        return Err(MetadataError::CircularTypeDependency);
    }

    let owned_sorted = sorted.into_iter().cloned().collect::<Vec<_>>();
    for key in owned_sorted.into_iter().rev() {
        if let Some((def, _)) = indegs.remove(&key) {
            udts.push(def);
        }
    }

    Ok(())
}
