//! Lookup interfaces consumed by the type parser and the view builder,
//! and a shared in-memory registry implementing them.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use cql_types::{ColumnType, UserDefinedType};

use crate::metadata::{Keyspace, Table};

/// Resolves schema objects that were already materialized.
///
/// A `None` answer is not authoritative: while the schema is refreshed on
/// another thread, an object may simply not be registered yet. Callers fall
/// back to a placeholder instead of retrying.
pub trait KeyspaceRegistry {
    /// Finds a user defined type by exact keyspace and type names.
    fn lookup_user_type(&self, keyspace: &str, type_name: &str) -> Option<Arc<UserDefinedType>>;

    /// Finds a table by exact keyspace and table names.
    fn lookup_table(&self, keyspace: &str, table_name: &str) -> Option<Arc<Table>>;
}

/// Builds tuple descriptors for the type parser.
pub trait TupleTypeFactory {
    /// Returns the tuple of the given components, in order.
    fn make_tuple(&self, components: Vec<ColumnType>) -> ColumnType {
        ColumnType::Tuple(components)
    }
}

/// Everything the type parser needs from its environment.
pub trait TypeResolver: KeyspaceRegistry + TupleTypeFactory {}

impl<T: KeyspaceRegistry + TupleTypeFactory + ?Sized> TypeResolver for T {}

impl<T: KeyspaceRegistry + ?Sized> KeyspaceRegistry for Arc<T> {
    fn lookup_user_type(&self, keyspace: &str, type_name: &str) -> Option<Arc<UserDefinedType>> {
        (**self).lookup_user_type(keyspace, type_name)
    }

    fn lookup_table(&self, keyspace: &str, table_name: &str) -> Option<Arc<Table>> {
        (**self).lookup_table(keyspace, table_name)
    }
}

impl<T: TupleTypeFactory + ?Sized> TupleTypeFactory for Arc<T> {
    fn make_tuple(&self, components: Vec<ColumnType>) -> ColumnType {
        (**self).make_tuple(components)
    }
}

/// A registry which knows nothing. Every lookup misses.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyRegistry;

impl KeyspaceRegistry for EmptyRegistry {
    fn lookup_user_type(&self, _keyspace: &str, _type_name: &str) -> Option<Arc<UserDefinedType>> {
        None
    }

    fn lookup_table(&self, _keyspace: &str, _table_name: &str) -> Option<Arc<Table>> {
        None
    }
}

impl TupleTypeFactory for EmptyRegistry {}

type KeyspaceMap = HashMap<String, Arc<Keyspace>>;

/// Keyspace metadata shared between a schema refresher and any number of
/// readers.
///
/// Reads take a lock-free snapshot of the keyspace map. Writers replace a
/// whole keyspace at once, so readers never see a keyspace half updated.
/// Concurrent writers are serialized by a compare-and-swap loop.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    keyspaces: ArcSwap<KeyspaceMap>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current version of a keyspace.
    pub fn keyspace(&self, name: &str) -> Option<Arc<Keyspace>> {
        self.keyspaces.load().get(name).cloned()
    }

    /// Returns a snapshot of all keyspaces.
    pub fn keyspaces(&self) -> Arc<HashMap<String, Arc<Keyspace>>> {
        self.keyspaces.load_full()
    }

    /// Inserts or replaces a keyspace, returning the previous version.
    pub fn replace_keyspace(&self, keyspace: Keyspace) -> Option<Arc<Keyspace>> {
        let keyspace = Arc::new(keyspace);
        let mut previous = None;
        self.keyspaces.rcu(|current| {
            let mut next = KeyspaceMap::clone(current);
            previous = next.insert(keyspace.name.clone(), Arc::clone(&keyspace));
            next
        });
        previous
    }

    /// Drops a keyspace with all its types, tables and views.
    pub fn remove_keyspace(&self, name: &str) -> Option<Arc<Keyspace>> {
        let mut removed = None;
        self.keyspaces.rcu(|current| {
            let mut next = KeyspaceMap::clone(current);
            removed = next.remove(name);
            next
        });
        removed
    }
}

impl KeyspaceRegistry for SchemaRegistry {
    fn lookup_user_type(&self, keyspace: &str, type_name: &str) -> Option<Arc<UserDefinedType>> {
        self.keyspaces
            .load()
            .get(keyspace)?
            .user_defined_types
            .get(type_name)
            .cloned()
    }

    fn lookup_table(&self, keyspace: &str, table_name: &str) -> Option<Arc<Table>> {
        self.keyspaces
            .load()
            .get(keyspace)?
            .tables
            .get(table_name)
            .cloned()
    }
}

impl TupleTypeFactory for SchemaRegistry {}
