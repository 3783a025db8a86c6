use std::fmt;

use diesel::deserialize::{self, FromSql, Queryable};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Registry;

pub trait TypeMarker: std::fmt::Debug {
    fn name() -> &'static str;
}

/// A generic type-safe object ID field (a wrapped i64).
///
/// When serialized with Serde, the key is automatically encoded into its
/// hash token under the marker type's hash key, using the process-wide
/// [`Registry`]. Deserialization decodes the token back to an integer and
/// rejects anything that does not decode.
///
/// Traits are also provided for Diesel compatibility with Postgres BigInt
/// columns, where the raw key is stored.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use hashid_rs::{Config, Registry};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, Debug)]
/// pub struct OrderIdMarker;
/// impl hashid_rs::TypeMarker for OrderIdMarker {
///     fn name() -> &'static str { "orders" }
/// }
///
/// type OrderId = hashid_rs::Field<OrderIdMarker>;
///
/// #[derive(Serialize, Deserialize)]
/// struct Order {
///     pub id: OrderId,
/// }
///
/// Registry::set_global(Arc::new(Registry::new(Config::new("s3cr3t"))));
/// let order = Order { id: OrderId::from(12345) };
/// let json = serde_json::to_string(&order).unwrap();
/// let back: Order = serde_json::from_str(&json).unwrap();
/// assert_eq!(i64::from(back.id), 12345);
/// ```
#[derive(AsExpression, Debug, Clone, Copy)]
#[diesel(sql_type = BigInt)]
pub struct Field<T: TypeMarker> {
    id: i64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: TypeMarker> From<Field<T>> for i64 {
    /// Returns the raw `i64` value.
    fn from(field: Field<T>) -> Self {
        field.id
    }
}

impl<T: TypeMarker> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Field {{ id: {}, marker: {} }}", self.id, T::name())
    }
}

impl<T: TypeMarker> Field<T> {
    /// Creates a `Field<T>` value from an `i64`.
    ///
    /// This method converts an `i64` into a `Field<T>`, effectively changing
    /// its type.
    pub fn from(id: i64) -> Self {
        Field {
            id,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: TypeMarker> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let registry = Registry::global()
            .ok_or_else(|| serde::ser::Error::custom("global registry is not set"))?;
        let token = registry
            .id_to_hash(self.id, T::name())
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&token)
    }
}

impl<'de, T: TypeMarker> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let registry = Registry::global()
            .ok_or_else(|| serde::de::Error::custom("global registry is not set"))?;
        let id = registry
            .hash_to_id(&encoded, T::name())
            .ok_or_else(|| serde::de::Error::custom("string is not a valid hashid token"))?;
        Ok(Field::from(id))
    }
}

impl<T: TypeMarker> ToSql<BigInt, Pg> for Field<T> {
    fn to_sql(&self, out: &mut Output<'_, '_, Pg>) -> serialize::Result {
        <i64 as ToSql<BigInt, Pg>>::to_sql(&self.id, &mut out.reborrow())
    }
}

impl<T: TypeMarker> FromSql<BigInt, Pg> for Field<T> {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let id = <i64 as FromSql<BigInt, Pg>>::from_sql(bytes)?;
        Ok(Field::from(id))
    }
}

impl<T> Queryable<BigInt, Pg> for Field<T>
where
    T: TypeMarker,
{
    type Row = <i64 as Queryable<BigInt, Pg>>::Row;

    fn build(row: Self::Row) -> deserialize::Result<Self> {
        let id = i64::build(row)?;
        Ok(Field::from(id))
    }
}
