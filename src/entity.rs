use std::fmt;
use std::sync::Arc;

use crate::registry::{Error, Registry};

/// Capability contract for values the facade can derive identifiers for.
///
/// Implemented by application record types. The key must be the record's
/// integer primary key; the creation timestamp, when available, feeds the
/// sortable segment of the object identifier.
pub trait Identify {
    /// The record's primary key. Must be non-negative.
    fn key(&self) -> i64;

    /// The record's creation instant as Unix seconds, if known.
    fn created_at(&self) -> Option<i64> {
        None
    }
}

/// Boundary contract for the query layer.
///
/// The facade never talks to storage directly; it only asks for a record by
/// primary key or by an equality filter on a named column, and the
/// application wires this to its ORM or query builder.
pub trait Store {
    type Record;

    /// Fetches the record with the given primary key, if any.
    fn by_key(&self, key: i64) -> Option<Self::Record>;

    /// Fetches the first record whose `column` equals `value`, if any.
    fn by_column(&self, column: &str, value: &str) -> Option<Self::Record>;
}

/// Identifier facade for one logical entity type.
///
/// Holds the resolved per-type settings (hash key, object-id prefix,
/// optional persisted hash column) and a handle to the shared [`Registry`].
/// All settings are resolved and validated when the facade is built; the
/// operations themselves are stateless transformations.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use hashid_rs::{Config, EntityCodec, Registry};
///
/// let registry = Arc::new(Registry::new(Config::new("s3cr3t")));
/// let orders = EntityCodec::builder("app::models::Order")
///     .build(registry)
///     .unwrap();
///
/// let token = orders.hash(42).unwrap();
/// assert!(token.len() >= 8);
/// assert_eq!(orders.hash_to_key(&token), Some(42));
/// ```
pub struct EntityCodec {
    registry: Arc<Registry>,
    hash_key: String,
    prefix: String,
    hash_column: Option<String>,
}

impl fmt::Debug for EntityCodec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EntityCodec")
            .field("hash_key", &self.hash_key)
            .field("prefix", &self.prefix)
            .field("hash_column", &self.hash_column)
            .finish()
    }
}

/// Builder for [`EntityCodec`]. Every per-type setting is explicit; nothing
/// is probed from the entity type at call time.
pub struct EntityCodecBuilder {
    type_name: String,
    hash_key: Option<String>,
    prefix: Option<String>,
    salt: Option<String>,
    hash_column: Option<String>,
}

impl EntityCodecBuilder {
    /// Overrides the hash key. Defaults to the fully-qualified type name.
    pub fn hash_key(mut self, hash_key: &str) -> Self {
        self.hash_key = Some(hash_key.to_string());
        self
    }

    /// Overrides the object-id prefix. Defaults to the snake-cased short
    /// type name.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Uses a custom salt for this entity type instead of the registry
    /// default.
    pub fn salt(mut self, salt: &str) -> Self {
        self.salt = Some(salt.to_string());
        self
    }

    /// Marks this entity type as persisting its hash token in `column`.
    /// Lookups then filter on the stored column instead of decoding.
    pub fn persist_to(mut self, column: &str) -> Self {
        self.hash_column = Some(column.to_string());
        self
    }

    /// Resolves all settings and registers the codec configuration with the
    /// registry. Fails with [`Error::SaltConflict`] if the hash key is
    /// already registered under a different salt.
    pub fn build(self, registry: Arc<Registry>) -> Result<EntityCodec, Error> {
        let hash_key = self.hash_key.unwrap_or_else(|| self.type_name.clone());
        registry.configure(&hash_key, self.salt.as_deref())?;
        let prefix = self
            .prefix
            .unwrap_or_else(|| snake_case(short_name(&self.type_name)));
        Ok(EntityCodec {
            registry,
            hash_key,
            prefix,
            hash_column: self.hash_column,
        })
    }
}

impl EntityCodec {
    /// Starts building a facade for the entity type named `type_name`.
    /// The name is used verbatim as the default hash key, and its final
    /// path segment is snake-cased into the default object-id prefix.
    pub fn builder(type_name: &str) -> EntityCodecBuilder {
        EntityCodecBuilder {
            type_name: type_name.to_string(),
            hash_key: None,
            prefix: None,
            salt: None,
            hash_column: None,
        }
    }

    /// The hash key this facade encodes under.
    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    /// The column holding the persisted hash token, if this entity type
    /// opted into persistence.
    pub fn hash_column(&self) -> Option<&str> {
        self.hash_column.as_deref()
    }

    /// Whether lookups filter on a stored hash column instead of decoding.
    pub fn persists_hash(&self) -> bool {
        self.hash_column.is_some()
    }

    /// Encodes a primary key into its hash token.
    pub fn hash(&self, key: i64) -> Result<String, Error> {
        self.registry.id_to_hash(key, &self.hash_key)
    }

    /// Decodes a hash token back into a primary key. Returns `None` for
    /// anything that does not decode to exactly one key.
    pub fn hash_to_key(&self, token: &str) -> Option<i64> {
        self.registry.hash_to_id(token, &self.hash_key)
    }

    /// The hash token for an entity instance.
    pub fn hash_of(&self, entity: &impl Identify) -> Result<String, Error> {
        self.hash(entity.key())
    }

    /// The object-id prefix for an entity instance:
    /// `<prefix>_<base36(created_at * 10_000_000)>`, with an empty
    /// timestamp segment when the creation instant is unknown, negative,
    /// or too large to scale without overflow.
    pub fn prefix_of(&self, entity: &impl Identify) -> String {
        let ts = entity
            .created_at()
            .and_then(|secs| u64::try_from(secs).ok())
            .and_then(|secs| secs.checked_mul(10_000_000))
            .map(base36)
            .unwrap_or_default();
        format!("{}_{}", self.prefix, ts)
    }

    /// The full object identifier for an entity instance: the prefix
    /// segment followed by the hash token.
    pub fn object_id(&self, entity: &impl Identify) -> Result<String, Error> {
        Ok(format!("{}{}", self.prefix_of(entity), self.hash_of(entity)?))
    }

    /// Decodes an object identifier back into a primary key by decoding its
    /// trailing `min_length` characters; the prefix and timestamp segment
    /// are discarded. Returns `None` if the string is too short or the
    /// token does not decode.
    pub fn object_id_to_key(&self, object_id: &str) -> Option<i64> {
        let length = self.registry.min_length();
        if object_id.len() < length {
            return None;
        }
        let token = object_id.get(object_id.len() - length..)?;
        self.hash_to_key(token)
    }

    /// The token to write to the hash column when a record is created, or
    /// `None` for entity types that do not persist their hash.
    pub fn persisted_hash(&self, entity: &impl Identify) -> Result<Option<String>, Error> {
        match self.hash_column {
            Some(_) => self.hash_of(entity).map(Some),
            None => Ok(None),
        }
    }

    /// The value an entity exposes as its route key: its hash token.
    pub fn route_key(&self, entity: &impl Identify) -> Result<String, Error> {
        self.hash_of(entity)
    }

    /// Looks up a record by hash token. Persisting types filter on the
    /// stored column; others decode the token and filter by primary key.
    pub fn find_by_hash<S: Store>(&self, store: &S, token: &str) -> Option<S::Record> {
        match &self.hash_column {
            Some(column) => store.by_column(column, token),
            None => self.hash_to_key(token).and_then(|key| store.by_key(key)),
        }
    }

    /// Like [`find_by_hash`](Self::find_by_hash), but a miss is
    /// [`Error::NotFound`]. A malformed token and a genuinely absent record
    /// are indistinguishable here, deliberately.
    pub fn find_by_hash_or_fail<S: Store>(
        &self,
        store: &S,
        token: &str,
    ) -> Result<S::Record, Error> {
        self.find_by_hash(store, token).ok_or(Error::NotFound)
    }

    /// Looks up a record by object identifier. Persisting types filter the
    /// stored column against the incoming string as given; others extract
    /// and decode the trailing hash token.
    pub fn find_by_object_id<S: Store>(&self, store: &S, object_id: &str) -> Option<S::Record> {
        match &self.hash_column {
            Some(column) => store.by_column(column, object_id),
            None => self
                .object_id_to_key(object_id)
                .and_then(|key| store.by_key(key)),
        }
    }

    /// Like [`find_by_object_id`](Self::find_by_object_id), but a miss is
    /// [`Error::NotFound`].
    pub fn find_by_object_id_or_fail<S: Store>(
        &self,
        store: &S,
        object_id: &str,
    ) -> Result<S::Record, Error> {
        self.find_by_object_id(store, object_id).ok_or(Error::NotFound)
    }

    /// Resolves an inbound route segment to a record.
    ///
    /// An explicit `field` naming the hash column binds by that column. A
    /// purely numeric segment binds directly by primary key, never through
    /// the codec (legacy numeric ids keep working). Everything else goes
    /// through hash lookup.
    pub fn resolve_route<S: Store>(
        &self,
        store: &S,
        value: &str,
        field: Option<&str>,
    ) -> Option<S::Record> {
        if let Some(field) = field {
            if self.hash_column.as_deref() == Some(field) {
                return store.by_column(field, value);
            }
        }
        if is_numeric(value) {
            return value.parse().ok().and_then(|key| store.by_key(key));
        }
        self.find_by_hash(store, value)
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

// The short name is the last path segment of a fully-qualified type name,
// accepting both `::` and `\` separators.
fn short_name(type_name: &str) -> &str {
    type_name
        .rsplit(|c| c == ':' || c == '\\')
        .next()
        .unwrap_or(type_name)
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).expect("Base36 digits are ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: i64,
        hashid: Option<String>,
        created_at: Option<i64>,
    }

    impl Identify for Row {
        fn key(&self) -> i64 {
            self.id
        }

        fn created_at(&self) -> Option<i64> {
            self.created_at
        }
    }

    struct MemStore {
        rows: Vec<Row>,
    }

    impl Store for MemStore {
        type Record = Row;

        fn by_key(&self, key: i64) -> Option<Row> {
            self.rows.iter().find(|r| r.id == key).cloned()
        }

        fn by_column(&self, column: &str, value: &str) -> Option<Row> {
            assert_eq!(column, "hashid");
            self.rows
                .iter()
                .find(|r| r.hashid.as_deref() == Some(value))
                .cloned()
        }
    }

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::new(Config::new("s3cr3t")))
    }

    fn orders(registry: Arc<Registry>) -> EntityCodec {
        EntityCodec::builder("app::models::Order")
            .build(registry)
            .unwrap()
    }

    fn row(id: i64) -> Row {
        Row {
            id,
            hashid: None,
            created_at: Some(1_600_000_000),
        }
    }

    #[test]
    fn test_default_hash_key_and_prefix() {
        let codec = orders(registry());
        assert_eq!(codec.hash_key(), "app::models::Order");
        let entity = Row {
            id: 1,
            hashid: None,
            created_at: None,
        };
        assert_eq!(codec.prefix_of(&entity), "order_");
    }

    #[test]
    fn test_prefix_includes_base36_timestamp() {
        let codec = orders(registry());
        let entity = row(42);
        let expected_ts = base36(1_600_000_000 * 10_000_000);
        assert_eq!(codec.prefix_of(&entity), format!("order_{}", expected_ts));
    }

    #[test]
    fn test_prefix_with_unrepresentable_timestamp() {
        let codec = orders(registry());
        // Timestamps that cannot be scaled to the sub-microsecond integer
        // get an empty segment instead of overflowing.
        let entity = Row {
            id: 1,
            hashid: None,
            created_at: Some(i64::MAX),
        };
        assert_eq!(codec.prefix_of(&entity), "order_");
        let entity = Row {
            id: 1,
            hashid: None,
            created_at: Some(-5),
        };
        assert_eq!(codec.prefix_of(&entity), "order_");
    }

    #[test]
    fn test_object_id_round_trip() {
        let codec = orders(registry());
        let entity = row(42);
        let object_id = codec.object_id(&entity).unwrap();
        assert!(object_id.starts_with("order_"));
        assert_eq!(codec.object_id_to_key(&object_id), Some(42));
    }

    #[test]
    fn test_object_id_without_timestamp() {
        let codec = orders(registry());
        let entity = Row {
            id: 7,
            hashid: None,
            created_at: None,
        };
        let object_id = codec.object_id(&entity).unwrap();
        assert!(object_id.starts_with("order_"));
        assert_eq!(codec.object_id_to_key(&object_id), Some(7));
    }

    #[test]
    fn test_object_id_truncates_oversized_tokens() {
        let codec = orders(registry());
        let entity = Row {
            id: i64::MAX,
            hashid: None,
            created_at: Some(1_600_000_000),
        };
        // Keys this large encode to tokens longer than the configured
        // length, and only the trailing fixed-length slice is consulted on
        // the way back, so the key does not survive.
        let token = codec.hash(i64::MAX).unwrap();
        assert!(token.len() > 8);
        let object_id = codec.object_id(&entity).unwrap();
        assert_ne!(codec.object_id_to_key(&object_id), Some(i64::MAX));
    }

    #[test]
    fn test_object_id_too_short() {
        let codec = orders(registry());
        assert_eq!(codec.object_id_to_key("x"), None);
        assert_eq!(codec.object_id_to_key(""), None);
    }

    #[test]
    fn test_explicit_overrides() {
        let codec = EntityCodec::builder("app::models::PurchaseOrder")
            .hash_key("orders")
            .prefix("po")
            .build(registry())
            .unwrap();
        assert_eq!(codec.hash_key(), "orders");
        let entity = Row {
            id: 1,
            hashid: None,
            created_at: None,
        };
        assert_eq!(codec.prefix_of(&entity), "po_");
    }

    #[test]
    fn test_custom_salt_registers_eagerly() {
        let registry = registry();
        EntityCodec::builder("Order")
            .salt("order-salt")
            .build(registry.clone())
            .unwrap();
        // The salt is taken on first registration; a conflicting one fails.
        let err = EntityCodec::builder("Order")
            .salt("other-salt")
            .build(registry)
            .unwrap_err();
        assert_eq!(
            err,
            Error::SaltConflict {
                hash_key: "Order".to_string()
            }
        );
    }

    #[test]
    fn test_find_by_hash_decodes_key() {
        let codec = orders(registry());
        let store = MemStore {
            rows: vec![row(7), row(42)],
        };
        let token = codec.hash(42).unwrap();
        assert_eq!(codec.find_by_hash(&store, &token).map(|r| r.id), Some(42));
        assert_eq!(codec.find_by_hash(&store, "!garbage!"), None);
    }

    #[test]
    fn test_find_by_hash_persisted_filters_column() {
        let codec = EntityCodec::builder("app::models::Order")
            .persist_to("hashid")
            .build(registry())
            .unwrap();
        // The stored value wins even if it would never decode.
        let store = MemStore {
            rows: vec![Row {
                id: 7,
                hashid: Some("opaque-stored-token".to_string()),
                created_at: None,
            }],
        };
        let found = codec.find_by_hash(&store, "opaque-stored-token");
        assert_eq!(found.map(|r| r.id), Some(7));
    }

    #[test]
    fn test_find_by_object_id() {
        let codec = orders(registry());
        let store = MemStore {
            rows: vec![row(7), row(42)],
        };
        let object_id = codec.object_id(&row(42)).unwrap();
        let found = codec.find_by_object_id(&store, &object_id);
        assert_eq!(found.map(|r| r.id), Some(42));
    }

    #[test]
    fn test_or_fail_variants() {
        let codec = orders(registry());
        let store = MemStore { rows: vec![row(7)] };
        let token = codec.hash(7).unwrap();
        assert_eq!(
            codec.find_by_hash_or_fail(&store, &token).map(|r| r.id),
            Ok(7)
        );
        assert_eq!(
            codec.find_by_hash_or_fail(&store, "!garbage!"),
            Err(Error::NotFound)
        );
        assert_eq!(
            codec.find_by_object_id_or_fail(&store, "too-short"),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn test_persisted_hash_hook() {
        let registry = registry();
        let plain = orders(registry.clone());
        assert_eq!(plain.persisted_hash(&row(42)), Ok(None));

        let persisting = EntityCodec::builder("app::models::Invoice")
            .persist_to("hashid")
            .build(registry)
            .unwrap();
        let token = persisting.persisted_hash(&row(42)).unwrap().unwrap();
        assert_eq!(persisting.hash_to_key(&token), Some(42));
    }

    #[test]
    fn test_route_resolution_numeric_bypass() {
        let codec = orders(registry());
        let store = MemStore {
            rows: vec![row(7), row(42)],
        };
        // A purely numeric segment is a primary key, never a token.
        let found = codec.resolve_route(&store, "42", None);
        assert_eq!(found.map(|r| r.id), Some(42));
        assert_eq!(codec.resolve_route(&store, "999", None), None);
    }

    #[test]
    fn test_route_resolution_by_hash() {
        let codec = orders(registry());
        let store = MemStore {
            rows: vec![row(7), row(42)],
        };
        let token = codec.hash(7).unwrap();
        let found = codec.resolve_route(&store, &token, None);
        assert_eq!(found.map(|r| r.id), Some(7));
    }

    #[test]
    fn test_route_resolution_by_hash_column_field() {
        let codec = EntityCodec::builder("app::models::Order")
            .persist_to("hashid")
            .build(registry())
            .unwrap();
        let store = MemStore {
            rows: vec![Row {
                id: 7,
                hashid: Some("stored".to_string()),
                created_at: None,
            }],
        };
        let found = codec.resolve_route(&store, "stored", Some("hashid"));
        assert_eq!(found.map(|r| r.id), Some(7));
    }

    #[test]
    fn test_route_key_is_hash() {
        let codec = orders(registry());
        let entity = row(42);
        assert_eq!(
            codec.route_key(&entity).unwrap(),
            codec.hash(42).unwrap()
        );
    }

    #[test]
    fn test_debug_omits_registry() {
        let codec = EntityCodec::builder("app::models::Order")
            .persist_to("hashid")
            .build(registry())
            .unwrap();
        let debug = format!("{:?}", codec);
        assert!(debug.contains("app::models::Order"));
        assert!(debug.contains("hashid"));
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("app::models::Order"), "Order");
        assert_eq!(short_name("App\\Models\\Order"), "Order");
        assert_eq!(short_name("Order"), "Order");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("Order"), "order");
        assert_eq!(snake_case("OrderItem"), "order_item");
        assert_eq!(snake_case("order"), "order");
    }

    #[test]
    fn test_base36() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(1_600_000_000), "qgljwg");
        assert_eq!(base36(1_600_000_000 * 10_000_000), "4djiyj08pog");
    }
}
