//! Parsing of CQL type names as they appear in schema tables.
//!
//! The parser reads one head name per call. Collection, tuple and frozen
//! parameters are first cut out of the input as raw balanced text and only
//! then parsed by a recursive call of their own, so every nesting level is
//! scanned once.

use cql_types::cql_type::EMPTY_TYPE_NAME;
use cql_types::utils::parse::{is_cql_identifier_char, ParserState};
use cql_types::{ColumnType, NativeType};
use tracing::warn;

use crate::errors::TypeParseError;
use crate::registry::{EmptyRegistry, TypeResolver};

/// Default limit of nested type parameters.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Head names with a fixed meaning in the type grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKeyword {
    /// One of the native types.
    Native(NativeType),
    /// `list<T>`
    List,
    /// `set<T>`
    Set,
    /// `map<K, V>`
    Map,
    /// `frozen<T>`
    Frozen,
    /// `tuple<T1, ..., Tn>`
    Tuple,
    /// The legacy zero-width type.
    Empty,
}

impl TypeKeyword {
    /// Matches a head name against the keywords, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(native) = NativeType::from_name(name) {
            return Some(TypeKeyword::Native(native));
        }
        let keyword = match name.to_ascii_lowercase().as_str() {
            "list" => TypeKeyword::List,
            "set" => TypeKeyword::Set,
            "map" => TypeKeyword::Map,
            "frozen" => TypeKeyword::Frozen,
            "tuple" => TypeKeyword::Tuple,
            EMPTY_TYPE_NAME => TypeKeyword::Empty,
            _ => return None,
        };
        Some(keyword)
    }

    fn name(self) -> &'static str {
        match self {
            TypeKeyword::Native(native) => native.name(),
            TypeKeyword::List => "list",
            TypeKeyword::Set => "set",
            TypeKeyword::Map => "map",
            TypeKeyword::Frozen => "frozen",
            TypeKeyword::Tuple => "tuple",
            TypeKeyword::Empty => EMPTY_TYPE_NAME,
        }
    }
}

/// Result of parsing a type name.
///
/// A user defined type that is not registered yet does not fail the parse:
/// it is replaced by a [ColumnType::Custom] carrying its raw name, and the
/// result says so.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedType {
    /// Every name in the type was resolved.
    Resolved(ColumnType),
    /// Some user defined types could not be found.
    Unresolved {
        /// The type with `Custom` descriptors standing in for missing types.
        placeholder: ColumnType,
        /// Raw names of the missing types, in order of appearance.
        missing: Vec<String>,
    },
}

impl ParsedType {
    /// Whether every user defined type was found.
    pub fn is_resolved(&self) -> bool {
        matches!(self, ParsedType::Resolved(_))
    }

    /// The parsed type, with placeholders where types were missing.
    pub fn column_type(&self) -> &ColumnType {
        match self {
            ParsedType::Resolved(typ) => typ,
            ParsedType::Unresolved { placeholder, .. } => placeholder,
        }
    }

    /// Consumes the result, keeping placeholders where types were missing.
    pub fn into_column_type(self) -> ColumnType {
        match self {
            ParsedType::Resolved(typ) => typ,
            ParsedType::Unresolved { placeholder, .. } => placeholder,
        }
    }
}

/// Parser settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// How many type parameter levels may be nested, `frozen<..>` included.
    pub max_nesting_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Parses type names against a registry of user defined types.
#[derive(Clone, Debug, Default)]
pub struct TypeParser {
    config: ParserConfig,
}

/// Parses `text` with the default [ParserConfig].
///
/// See [TypeParser::parse].
pub fn parse_type(
    text: &str,
    registry: &(impl TypeResolver + ?Sized),
    current_keyspace: &str,
    frozen: bool,
) -> Result<ParsedType, TypeParseError> {
    TypeParser::default().parse(text, registry, current_keyspace, frozen)
}

impl TypeParser {
    /// Creates a parser with the given settings.
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// The settings of this parser.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a type name.
    ///
    /// Keywords are matched without regard to case and whitespace around
    /// names, brackets and commas is ignored. User defined types are looked
    /// up in `current_keyspace` by their exact name. `frozen` freezes the
    /// outermost type, as if it was wrapped in `frozen<..>`.
    ///
    /// ```
    /// # use cql_schema::registry::EmptyRegistry;
    /// # use cql_schema::type_parser::parse_type;
    /// # use cql_types::{ColumnType, NativeType};
    /// let parsed = parse_type("FROZEN<mAp<Date,Tuple<timeUUID>>>", &EmptyRegistry, "ks", false).unwrap();
    /// assert_eq!(
    ///     parsed.into_column_type(),
    ///     ColumnType::map(
    ///         NativeType::Date.into(),
    ///         ColumnType::tuple([NativeType::Timeuuid.into()]),
    ///         true,
    ///     )
    /// );
    /// ```
    pub fn parse(
        &self,
        text: &str,
        registry: &(impl TypeResolver + ?Sized),
        current_keyspace: &str,
        frozen: bool,
    ) -> Result<ParsedType, TypeParseError> {
        let mut call = ParseCall {
            config: &self.config,
            input: text,
            registry,
            current_keyspace,
            resolve: true,
            missing: Vec::new(),
        };
        let typ = call.parse_fragment(Fragment::whole(text), frozen, 0)?;
        Ok(if call.missing.is_empty() {
            ParsedType::Resolved(typ)
        } else {
            ParsedType::Unresolved {
                placeholder: typ,
                missing: call.missing,
            }
        })
    }

    /// Names of the user defined types a type name refers to, in order of
    /// appearance, without looking any of them up.
    pub(crate) fn referenced_user_types(&self, text: &str) -> Result<Vec<String>, TypeParseError> {
        let mut call = ParseCall {
            config: &self.config,
            input: text,
            registry: &EmptyRegistry,
            current_keyspace: "",
            resolve: false,
            missing: Vec::new(),
        };
        call.parse_fragment(Fragment::whole(text), false, 0)?;
        Ok(call.missing)
    }
}

/// A slice of the original input together with its byte offset in it.
#[derive(Clone, Copy)]
struct Fragment<'s> {
    text: &'s str,
    offset: usize,
}

impl<'s> Fragment<'s> {
    fn whole(text: &'s str) -> Self {
        Self { text, offset: 0 }
    }

    fn byte_offset(&self, p: ParserState<'s>) -> usize {
        self.offset + self.text.len() - p.remaining_input().len()
    }

    fn end_offset(&self) -> usize {
        self.offset + self.text.len()
    }

    /// The part of this fragment between two states of a parser over it.
    fn sub(&self, start: ParserState<'s>, end: ParserState<'s>) -> Fragment<'s> {
        Fragment {
            text: start.slice_until(end),
            offset: self.byte_offset(start),
        }
    }
}

enum HeadName<'s> {
    Bare(&'s str),
    Quoted(String),
}

/// State of one top-level parse.
struct ParseCall<'a, 's, R: ?Sized> {
    config: &'a ParserConfig,
    input: &'s str,
    registry: &'a R,
    current_keyspace: &'a str,
    /// When unset, user defined types are only collected into `missing`.
    resolve: bool,
    missing: Vec<String>,
}

impl<'s, R: TypeResolver + ?Sized> ParseCall<'_, 's, R> {
    fn parse_fragment(
        &mut self,
        fragment: Fragment<'s>,
        frozen: bool,
        depth: usize,
    ) -> Result<ColumnType, TypeParseError> {
        let start = ParserState::new(fragment.text).skip_white();
        let (head, p) = self.read_head_name(&fragment, start)?;

        let (typ, p) = match head {
            HeadName::Quoted(name) => (self.resolve_user_type(name, frozen), p),
            HeadName::Bare(name) => match TypeKeyword::from_name(name) {
                Some(keyword) => self.parse_keyword(&fragment, keyword, start, p, frozen, depth)?,
                None => (self.resolve_user_type(name.to_owned(), frozen), p),
            },
        };

        let p = p.skip_white();
        if let Some(found) = p.peek() {
            return Err(self.unexpected_character(&fragment, p, found, "end of type"));
        }
        Ok(typ)
    }

    fn parse_keyword(
        &mut self,
        fragment: &Fragment<'s>,
        keyword: TypeKeyword,
        start: ParserState<'s>,
        p: ParserState<'s>,
        frozen: bool,
        depth: usize,
    ) -> Result<(ColumnType, ParserState<'s>), TypeParseError> {
        match keyword {
            TypeKeyword::Native(native) => {
                if frozen {
                    warn_frozen_dropped(native.name());
                }
                Ok((native.into(), p))
            }
            TypeKeyword::Empty => {
                if frozen {
                    warn_frozen_dropped(EMPTY_TYPE_NAME);
                }
                Ok((ColumnType::Empty, p))
            }
            TypeKeyword::List => {
                let ([element], p) = self.fixed_parameters(fragment, keyword, start, p)?;
                let element = self.parse_parameter(element, false, depth)?;
                Ok((ColumnType::list(element, frozen), p))
            }
            TypeKeyword::Set => {
                let ([element], p) = self.fixed_parameters(fragment, keyword, start, p)?;
                let element = self.parse_parameter(element, false, depth)?;
                Ok((ColumnType::set(element, frozen), p))
            }
            TypeKeyword::Map => {
                let ([key, value], p) = self.fixed_parameters(fragment, keyword, start, p)?;
                let key = self.parse_parameter(key, false, depth)?;
                let value = self.parse_parameter(value, false, depth)?;
                Ok((ColumnType::map(key, value, frozen), p))
            }
            TypeKeyword::Frozen => {
                let ([inner], p) = self.fixed_parameters(fragment, keyword, start, p)?;
                Ok((self.parse_parameter(inner, true, depth)?, p))
            }
            TypeKeyword::Tuple => {
                let (params, p) = self.read_parameters(fragment, p)?;
                let components = params
                    .into_iter()
                    .map(|param| self.parse_parameter(param, false, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((self.registry.make_tuple(components), p))
            }
        }
    }

    fn parse_parameter(
        &mut self,
        param: Fragment<'s>,
        frozen: bool,
        depth: usize,
    ) -> Result<ColumnType, TypeParseError> {
        let depth = depth + 1;
        if depth > self.config.max_nesting_depth {
            return Err(TypeParseError::NestingTooDeep {
                input: self.input.to_owned(),
                position: self.position_at(param.offset),
                limit: self.config.max_nesting_depth,
            });
        }
        self.parse_fragment(param, frozen, depth)
    }

    fn resolve_user_type(&mut self, name: String, frozen: bool) -> ColumnType {
        if !self.resolve {
            self.missing.push(name.clone());
            return ColumnType::Custom(name);
        }
        match self.registry.lookup_user_type(self.current_keyspace, &name) {
            Some(definition) => ColumnType::user_defined(definition, frozen),
            None => {
                // Happens when racing with the creation of the type.
                warn!(
                    keyspace = self.current_keyspace,
                    "Could not resolve type: {}", name
                );
                if frozen {
                    warn_frozen_dropped(&name);
                }
                self.missing.push(name.clone());
                ColumnType::Custom(name)
            }
        }
    }
}

impl<'s, R: ?Sized> ParseCall<'_, 's, R> {
    fn read_head_name(
        &self,
        fragment: &Fragment<'s>,
        p: ParserState<'s>,
    ) -> Result<(HeadName<'s>, ParserState<'s>), TypeParseError> {
        let missing_name = || TypeParseError::MissingTypeName {
            input: self.input.to_owned(),
            position: self.position(fragment, p),
        };

        if p.peek() == Some('"') {
            let (quoted, after) =
                p.skip_cql_identifier()
                    .map_err(|_| TypeParseError::UnexpectedEndOfInput {
                        input: self.input.to_owned(),
                        position: self.position_at(fragment.end_offset()),
                    })?;
            let name = quoted[1..quoted.len() - 1].replace("\"\"", "\"");
            if name.is_empty() {
                return Err(missing_name());
            }
            return Ok((HeadName::Quoted(name), after));
        }

        let (name, after) = p.take_while(is_cql_identifier_char);
        if name.is_empty() {
            return Err(missing_name());
        }
        Ok((HeadName::Bare(name), after))
    }

    /// Reads the parameters of `keyword`, which takes exactly `N` of them.
    fn fixed_parameters<const N: usize>(
        &self,
        fragment: &Fragment<'s>,
        keyword: TypeKeyword,
        start: ParserState<'s>,
        p: ParserState<'s>,
    ) -> Result<([Fragment<'s>; N], ParserState<'s>), TypeParseError> {
        let (params, p) = self.read_parameters(fragment, p)?;
        let params = <[Fragment<'s>; N]>::try_from(params).map_err(|params| {
            TypeParseError::InvalidParameterCount {
                input: self.input.to_owned(),
                position: self.position(fragment, start),
                keyword: keyword.name(),
                expected: N,
                got: params.len(),
            }
        })?;
        Ok((params, p))
    }

    /// Reads a bracketed parameter list following a keyword.
    ///
    /// Blanks and at most one comma are skipped before the list; no list at
    /// all means no parameters. Each parameter is a head name followed by
    /// its own arguments, taken verbatim.
    fn read_parameters(
        &self,
        fragment: &Fragment<'s>,
        p: ParserState<'s>,
    ) -> Result<(Vec<Fragment<'s>>, ParserState<'s>), TypeParseError> {
        let mut params = Vec::new();

        let Some(p) = skip_blank_and_comma(p) else {
            return Ok((params, p.take_while(|_| true).1));
        };
        let Ok(mut p) = p.accept("<") else {
            let found = p.peek().unwrap_or_default();
            return Err(self.unexpected_character(fragment, p, found, "'<'"));
        };

        loop {
            let Some(next) = skip_blank_and_comma(p) else {
                return Err(TypeParseError::UnexpectedEndOfInput {
                    input: self.input.to_owned(),
                    position: self.position_at(fragment.end_offset()),
                });
            };
            if let Ok(after) = next.accept(">") {
                return Ok((params, after));
            }

            let after_name = match self.read_head_name(fragment, next) {
                Ok((_, after_name)) => after_name,
                // The parameter's own parse reports the missing name.
                Err(TypeParseError::MissingTypeName { .. }) => next,
                Err(err) => return Err(err),
            };
            let end = self.read_raw_arguments(fragment, after_name)?;
            params.push(fragment.sub(next, end));
            p = end;
        }
    }

    /// Skips a parameter's own `<...>` arguments without interpreting them.
    fn read_raw_arguments(
        &self,
        fragment: &Fragment<'s>,
        p: ParserState<'s>,
    ) -> Result<ParserState<'s>, TypeParseError> {
        let p = p.skip_white();
        match p.peek() {
            None | Some('>') | Some(',') => return Ok(p),
            Some('<') => {}
            Some(found) => return Err(self.unexpected_character(fragment, p, found, "'<'")),
        }

        let rest = p.remaining_input();
        let mut open = 0usize;
        for (idx, c) in rest.char_indices() {
            match c {
                '<' => open += 1,
                '>' => {
                    open -= 1;
                    if open == 0 {
                        return Ok(ParserState::new(&rest[idx + 1..]));
                    }
                }
                _ => {}
            }
        }
        Err(TypeParseError::UnclosedAngleBrackets {
            input: self.input.to_owned(),
            position: self.position(fragment, p),
        })
    }

    fn position(&self, fragment: &Fragment<'s>, p: ParserState<'s>) -> usize {
        self.position_at(fragment.byte_offset(p))
    }

    /// 1-based character position of a byte offset in the input.
    fn position_at(&self, byte_offset: usize) -> usize {
        self.input
            .get(..byte_offset)
            .map_or(byte_offset, |prefix| prefix.chars().count())
            + 1
    }

    fn unexpected_character(
        &self,
        fragment: &Fragment<'s>,
        p: ParserState<'s>,
        found: char,
        expected: &'static str,
    ) -> TypeParseError {
        TypeParseError::UnexpectedCharacter {
            input: self.input.to_owned(),
            position: self.position(fragment, p),
            found,
            expected,
        }
    }
}

fn warn_frozen_dropped(name: &str) {
    warn!(
        "Got frozen keyword for {}, which cannot be frozen; \
        this version might be too old for your server",
        name
    );
}

/// Skips blanks and at most one comma. Returns `None` at the end of input.
fn skip_blank_and_comma(p: ParserState<'_>) -> Option<ParserState<'_>> {
    let mut comma_found = false;
    let (_, p) = p.take_while(|c| match c {
        ',' if !comma_found => {
            comma_found = true;
            true
        }
        c => c.is_whitespace(),
    });
    (!p.is_at_eof()).then_some(p)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use cql_types::{ColumnType, NativeType, UserDefinedType};

    use super::{parse_type, ParsedType, ParserConfig, TypeKeyword, TypeParser};
    use crate::errors::TypeParseError;
    use crate::metadata::Table;
    use crate::registry::{EmptyRegistry, KeyspaceRegistry, TupleTypeFactory};
    use crate::test_utils::setup_tracing;

    const KS: &str = "ks";

    struct Udts(Vec<Arc<UserDefinedType>>);

    impl Udts {
        fn new() -> Self {
            Udts(vec![
                Arc::new(UserDefinedType::new(
                    KS,
                    "MyUdt",
                    vec![
                        ("f1".to_owned(), NativeType::Int.into()),
                        (
                            "f2".to_owned(),
                            ColumnType::list(NativeType::Text.into(), true),
                        ),
                    ],
                )),
                Arc::new(UserDefinedType::new(KS, "address", vec![])),
            ])
        }

        fn get(&self, name: &str) -> Arc<UserDefinedType> {
            self.lookup_user_type(KS, name).unwrap()
        }
    }

    impl KeyspaceRegistry for Udts {
        fn lookup_user_type(&self, keyspace: &str, type_name: &str) -> Option<Arc<UserDefinedType>> {
            self.0
                .iter()
                .find(|udt| udt.keyspace == keyspace && udt.name == type_name)
                .cloned()
        }

        fn lookup_table(&self, _keyspace: &str, _table_name: &str) -> Option<Arc<Table>> {
            None
        }
    }

    impl TupleTypeFactory for Udts {}

    fn parse(text: &str) -> ColumnType {
        match parse_type(text, &Udts::new(), KS, false).unwrap() {
            ParsedType::Resolved(typ) => typ,
            unresolved => panic!("{text}: unexpected {unresolved:?}"),
        }
    }

    fn parse_err(text: &str) -> TypeParseError {
        parse_type(text, &Udts::new(), KS, false).unwrap_err()
    }

    #[test]
    fn native_types() {
        setup_tracing();
        for native in NativeType::ALL {
            assert_eq!(parse(native.name()), ColumnType::Native(native));
            assert_eq!(parse(&native.name().to_uppercase()), ColumnType::Native(native));
            assert_eq!(parse(&native.to_string()), ColumnType::Native(native));
        }
        assert_ne!(parse("text"), parse("varchar"));
    }

    #[test]
    fn rendered_names_parse_back() {
        setup_tracing();
        for text in [
            "list<int>",
            "set<bigint>",
            "map<date, timeuuid>",
            "frozen<list<int>>",
            "tuple<int, list<text>>",
            "set<list<frozen<map<bigint, varchar>>>>",
            "map<text, frozen<list<tuple<int, blob>>>>",
            "tuple<>",
        ] {
            let typ = parse(text);
            assert_eq!(typ.to_string(), text);
            assert_eq!(parse(&typ.to_string().to_uppercase()), typ);
        }
    }

    #[test]
    fn whitespace_is_insignificant() {
        setup_tracing();
        assert_eq!(parse("  int  "), NativeType::Int.into());
        assert_eq!(
            parse("  set < bigint > "),
            ColumnType::set(NativeType::BigInt.into(), false)
        );
        assert_eq!(
            parse("  map  <  date  ,  timeuuid  >  "),
            ColumnType::map(NativeType::Date.into(), NativeType::Timeuuid.into(), false)
        );
        assert_eq!(
            parse("frozen <tuple< int ,text > >"),
            parse("frozen<tuple<int,text>>")
        );
    }

    #[test]
    fn case_is_insignificant() {
        setup_tracing();
        assert_eq!(parse("INT"), NativeType::Int.into());
        assert_eq!(
            parse("SET<BIGint>"),
            ColumnType::set(NativeType::BigInt.into(), false)
        );
        assert_eq!(
            parse("FROZEN<mAp<Date,Tuple<timeUUID>>>"),
            ColumnType::map(
                NativeType::Date.into(),
                ColumnType::tuple([NativeType::Timeuuid.into()]),
                true
            )
        );
    }

    #[test]
    fn collections() {
        setup_tracing();
        assert_eq!(parse("list<int>"), ColumnType::list(NativeType::Int.into(), false));
        assert_eq!(
            parse("list<list<int>>"),
            ColumnType::list(ColumnType::list(NativeType::Int.into(), false), false)
        );
        assert_eq!(
            parse("set<list<frozen<map<bigint,varchar>>>>"),
            ColumnType::set(
                ColumnType::list(
                    ColumnType::map(NativeType::BigInt.into(), NativeType::Varchar.into(), true),
                    false
                ),
                false
            )
        );
    }

    #[test]
    fn freezing_is_idempotent() {
        setup_tracing();
        let once = parse("frozen<list<int>>");
        assert_eq!(once, ColumnType::list(NativeType::Int.into(), true));
        assert_eq!(parse("frozen<frozen<list<int>>>"), once);
        assert_eq!(
            parse_type("list<int>", &EmptyRegistry, KS, true).unwrap(),
            ParsedType::Resolved(once.clone())
        );
        assert_eq!(
            parse_type("frozen<list<int>>", &EmptyRegistry, KS, true).unwrap(),
            ParsedType::Resolved(once)
        );
    }

    #[test]
    fn freezing_a_native_type_is_dropped() {
        setup_tracing();
        assert_eq!(parse("frozen<int>"), NativeType::Int.into());
        assert_eq!(
            parse("list<frozen<text>>"),
            ColumnType::list(NativeType::Text.into(), false)
        );
    }

    #[test]
    fn tuples() {
        setup_tracing();
        assert_eq!(
            parse("tuple<int,list<text>>"),
            ColumnType::tuple([
                NativeType::Int.into(),
                ColumnType::list(NativeType::Text.into(), false)
            ])
        );
        assert_eq!(parse("tuple<>"), ColumnType::tuple([]));
        assert_eq!(parse("tuple"), ColumnType::tuple([]));
        assert_eq!(parse("frozen<tuple<int>>"), parse("tuple<int>"));
    }

    #[test]
    fn tuples_are_built_by_the_factory() {
        setup_tracing();
        struct Reversing;
        impl KeyspaceRegistry for Reversing {
            fn lookup_user_type(&self, _: &str, _: &str) -> Option<Arc<UserDefinedType>> {
                None
            }
            fn lookup_table(&self, _: &str, _: &str) -> Option<Arc<Table>> {
                None
            }
        }
        impl TupleTypeFactory for Reversing {
            fn make_tuple(&self, mut components: Vec<ColumnType>) -> ColumnType {
                components.reverse();
                ColumnType::Tuple(components)
            }
        }

        let parsed = parse_type("tuple<int, text>", &Reversing, KS, false).unwrap();
        assert_eq!(
            parsed.into_column_type(),
            ColumnType::tuple([NativeType::Text.into(), NativeType::Int.into()])
        );
    }

    #[test]
    fn empty_sentinel() {
        setup_tracing();
        let typ = parse("EMPTY");
        assert_eq!(typ, ColumnType::Empty);
        assert!(typ.is_empty_sentinel());
        assert_eq!(TypeKeyword::from_name("Empty"), Some(TypeKeyword::Empty));

        let quoted = parse_type("\"Empty\"", &EmptyRegistry, KS, false).unwrap();
        assert_eq!(
            quoted,
            ParsedType::Unresolved {
                placeholder: ColumnType::Custom("Empty".to_owned()),
                missing: vec!["Empty".to_owned()],
            }
        );
        assert!(!quoted.column_type().is_empty_sentinel());
    }

    #[test]
    fn user_defined_types() {
        setup_tracing();
        let udts = Udts::new();
        assert_eq!(
            parse("MyUdt"),
            ColumnType::user_defined(udts.get("MyUdt"), false)
        );
        assert_eq!(
            parse("frozen<\"MyUdt\">"),
            ColumnType::user_defined(udts.get("MyUdt"), true)
        );
        assert_eq!(
            parse("map<text, frozen<address>>"),
            ColumnType::map(
                NativeType::Text.into(),
                ColumnType::user_defined(udts.get("address"), true),
                false
            )
        );
    }

    #[test]
    fn unresolved_user_defined_types() {
        setup_tracing();
        let parsed = parse_type("map<myudt, frozen<list<Other>>>", &Udts::new(), KS, false).unwrap();
        assert!(!parsed.is_resolved());
        assert_matches!(
            &parsed,
            ParsedType::Unresolved { missing, .. } if missing == &["myudt", "Other"]
        );
        assert_eq!(
            parsed.column_type(),
            &ColumnType::map(
                ColumnType::Custom("myudt".to_owned()),
                ColumnType::list(ColumnType::Custom("Other".to_owned()), true),
                false
            )
        );

        // Types are looked up in the current keyspace only.
        let elsewhere = parse_type("MyUdt", &Udts::new(), "other_ks", false).unwrap();
        assert_eq!(
            elsewhere,
            ParsedType::Unresolved {
                placeholder: ColumnType::Custom("MyUdt".to_owned()),
                missing: vec!["MyUdt".to_owned()],
            }
        );
    }

    #[test]
    fn parameter_counts_are_enforced() {
        setup_tracing();
        assert_matches!(
            parse_err("map<int>"),
            TypeParseError::InvalidParameterCount { keyword: "map", expected: 2, got: 1, position: 1, .. }
        );
        assert_matches!(
            parse_err("list<int,text>"),
            TypeParseError::InvalidParameterCount { keyword: "list", expected: 1, got: 2, .. }
        );
        assert_matches!(
            parse_err("set"),
            TypeParseError::InvalidParameterCount { keyword: "set", expected: 1, got: 0, .. }
        );
        assert_matches!(
            parse_err("list<>"),
            TypeParseError::InvalidParameterCount { got: 0, .. }
        );
        assert_matches!(
            parse_err("frozen<int, text>"),
            TypeParseError::InvalidParameterCount { keyword: "frozen", .. }
        );
        assert_matches!(
            parse_err("tuple<map<int>>"),
            TypeParseError::InvalidParameterCount { keyword: "map", position: 7, .. }
        );
    }

    #[test]
    fn malformed_names() {
        setup_tracing();
        assert_matches!(parse_err(""), TypeParseError::MissingTypeName { position: 1, .. });
        assert_matches!(parse_err("   "), TypeParseError::MissingTypeName { position: 4, .. });
        assert_matches!(parse_err("<int>"), TypeParseError::MissingTypeName { .. });
        assert_matches!(
            parse_err("tuple<int,,text>"),
            TypeParseError::MissingTypeName { position: 11, .. }
        );
        assert_matches!(
            parse_err("map<int,,text>"),
            TypeParseError::InvalidParameterCount { expected: 2, got: 3, .. }
        );
        assert_matches!(
            parse_err("list<int"),
            TypeParseError::UnexpectedEndOfInput { position: 9, .. }
        );
        assert_matches!(
            parse_err("list<frozen<int>"),
            TypeParseError::UnexpectedEndOfInput { position: 17, .. }
        );
        assert_matches!(
            parse_err("list<frozen<list<int>"),
            TypeParseError::UnclosedAngleBrackets { position: 12, .. }
        );
        assert_matches!(
            parse_err("list(int)"),
            TypeParseError::UnexpectedCharacter { found: '(', position: 5, .. }
        );
        assert_matches!(
            parse_err("int<text>"),
            TypeParseError::UnexpectedCharacter { found: '<', position: 4, .. }
        );
        assert_matches!(
            parse_err("list<int> garbage"),
            TypeParseError::UnexpectedCharacter { found: 'g', position: 11, .. }
        );
        assert_matches!(
            parse_err("list<int x>"),
            TypeParseError::UnexpectedCharacter { found: 'x', position: 10, .. }
        );
    }

    #[test]
    fn error_positions_count_characters() {
        setup_tracing();
        let err = parse_err("map<\"żółw\", int<x>>");
        assert_matches!(err, TypeParseError::UnexpectedCharacter { found: '<', .. });
        assert_eq!(err.position(), 16);
        assert!(err.to_string().contains("at char 16"), "{err}");
    }

    #[test]
    fn nesting_is_limited() {
        setup_tracing();
        let nested = |levels: usize| {
            let mut text = "int".to_owned();
            for _ in 0..levels {
                text = format!("list<{text}>");
            }
            text
        };

        assert!(parse_type(&nested(64), &EmptyRegistry, KS, false).is_ok());
        assert_matches!(
            parse_type(&nested(65), &EmptyRegistry, KS, false).unwrap_err(),
            TypeParseError::NestingTooDeep { limit: 64, .. }
        );

        let shallow = TypeParser::new(ParserConfig {
            max_nesting_depth: 2,
        });
        assert!(shallow.parse("frozen<list<int>>", &EmptyRegistry, KS, false).is_ok());
        assert_matches!(
            shallow
                .parse("frozen<list<list<int>>>", &EmptyRegistry, KS, false)
                .unwrap_err(),
            TypeParseError::NestingTooDeep { limit: 2, position: 18, .. }
        );

        let deep = nested(1_000);
        assert_matches!(
            parse_type(&deep, &EmptyRegistry, KS, false).unwrap_err(),
            TypeParseError::NestingTooDeep { .. }
        );
    }

    #[test]
    fn referenced_user_types() {
        setup_tracing();
        let parser = TypeParser::default();
        assert_eq!(
            parser
                .referenced_user_types("map<frozen<a>, list<tuple<int, \"B\", a>>>")
                .unwrap(),
            vec!["a", "B", "a"]
        );
        assert!(parser.referenced_user_types("list<int>").unwrap().is_empty());
        assert!(parser.referenced_user_types("list<a").is_err());
    }

    #[test]
    fn keywords() {
        assert_eq!(TypeKeyword::from_name("TimeUuid"), Some(TypeKeyword::Native(NativeType::Timeuuid)));
        assert_eq!(TypeKeyword::from_name("Tuple"), Some(TypeKeyword::Tuple));
        assert_eq!(TypeKeyword::from_name("frozen"), Some(TypeKeyword::Frozen));
        assert_eq!(TypeKeyword::from_name("address"), None);
    }
}
