//! The parameter set handed to a business method.
//!
//! Validators return a [`Params`] whose variant states how the values are meant
//! to be consumed: as positional arguments, as named arguments, or as one
//! single argument. Without a validator, the path arguments arrive as
//! [`Params::Named`].
//!
//! Business methods usually call [`Params::extract`], which reshapes the set
//! through serde: positional values deserialize like a tuple, named values like
//! a struct, a single value as itself.
//!
//! ```rust
//! use restview_dispatch::Params;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct Lookup { id: u64, verbose: bool }
//!
//! let named = Params::named([("id", json!(7)), ("verbose", json!(true))]);
//! let lookup: Lookup = named.extract().unwrap();
//! assert_eq!(lookup.id, 7);
//!
//! let positional = Params::positional([json!("ada"), json!(36)]);
//! let (name, age): (String, u32) = positional.extract().unwrap();
//! assert_eq!((name.as_str(), age), ("ada", 36));
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A validated parameter set.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Spread as positional arguments.
    Positional(Vec<Value>),
    /// Spread as named arguments.
    Named(Map<String, Value>),
    /// Passed as one argument.
    Single(Value),
}

impl Params {
    /// An empty named set, what a route without path arguments produces.
    pub fn none() -> Self {
        Params::Named(Map::new())
    }

    /// Builds a positional set.
    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Params::Positional(values.into_iter().collect())
    }

    /// Builds a named set.
    pub fn named<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Params::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wraps one value.
    pub fn single(value: impl Into<Value>) -> Self {
        Params::Single(value.into())
    }

    /// Serializes a domain object into a single argument.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Params::Single(serde_json::to_value(value)?))
    }

    /// Returns the positional argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        match self {
            Params::Positional(values) => values.get(index),
            Params::Single(value) if index == 0 => Some(value),
            _ => None,
        }
    }

    /// Returns the named argument `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(name),
            _ => None,
        }
    }

    /// Number of arguments the set spreads into.
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
            Params::Single(_) => 1,
        }
    }

    /// Returns `true` if the set spreads into no arguments.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the set back into one JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Params::Positional(values) => Value::Array(values),
            Params::Named(map) => Value::Object(map),
            Params::Single(value) => value,
        }
    }

    /// Deserializes the set into the business method's argument type.
    pub fn extract<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.into_value())
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::none()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_none_is_empty_named() {
        let params = Params::none();
        assert!(params.is_empty());
        assert_eq!(params, Params::Named(Map::new()));
        assert_eq!(Params::default(), params);
    }

    #[test]
    fn test_positional_access() {
        let params = Params::positional([json!(1), json!("two")]);
        assert_eq!(params.len(), 2);
        assert_eq!(params.arg(1), Some(&json!("two")));
        assert_eq!(params.arg(2), None);
        assert_eq!(params.get("x"), None);
    }

    #[test]
    fn test_named_access() {
        let params = Params::named([("id", json!(3))]);
        assert_eq!(params.get("id"), Some(&json!(3)));
        assert_eq!(params.arg(0), None);
    }

    #[test]
    fn test_single_is_first_arg() {
        let params = Params::single("ada");
        assert_eq!(params.len(), 1);
        assert_eq!(params.arg(0), Some(&json!("ada")));
        assert_eq!(params.arg(1), None);
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct User {
            id: u32,
        }

        let params = Params::from_serialize(&User { id: 9 }).unwrap();
        assert_eq!(params, Params::Single(json!({"id": 9})));
    }

    #[test]
    fn test_extract_shapes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u32,
            name: String,
        }

        let single = Params::single(json!({"id": 1, "name": "ada"}));
        assert_eq!(
            single.extract::<User>().unwrap(),
            User {
                id: 1,
                name: "ada".into()
            }
        );

        let positional = Params::positional([json!(1), json!("ada")]);
        let (id, name): (u32, String) = positional.extract().unwrap();
        assert_eq!((id, name.as_str()), (1, "ada"));

        let named = Params::named([("id", json!(2)), ("name", json!("grace"))]);
        assert_eq!(named.extract::<User>().unwrap().name, "grace");
    }

    #[test]
    fn test_extract_mismatch_is_error() {
        let params = Params::single("not a number");
        assert!(params.extract::<u32>().is_err());
    }
}
