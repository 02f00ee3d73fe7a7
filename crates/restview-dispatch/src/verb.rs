//! REST verbs and verb sets.
//!
//! [`Verb`] is the fixed list of HTTP methods the pipeline recognizes. A
//! [`VerbSet`] is a handler's capability set: the verbs whose slot it fills.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An HTTP method the dispatch pipeline recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Verb {
    /// Every supported verb, in canonical order.
    pub const ALL: [Verb; 5] = [Verb::Get, Verb::Post, Verb::Put, Verb::Delete, Verb::Head];

    /// The upper-case wire name (`"GET"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
        }
    }

    /// The lower-case name of the slot implementing this verb (`"get"`).
    pub fn method_name(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Head => "head",
        }
    }

    /// The name of the validation slot for this verb (`"validate_get_request"`).
    pub fn validator_name(&self) -> String {
        format!("validate_{}_request", self.method_name())
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A method name that is not one of the supported verbs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown verb: {0}")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    /// Parses a method name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

/// A set of verbs.
///
/// Iteration always follows [`Verb::ALL`] order, independent of insertion order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VerbSet {
    bits: u8,
}

impl VerbSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding every supported verb.
    pub fn all() -> Self {
        Verb::ALL.into_iter().collect()
    }

    /// Adds a verb. Returns `true` if it was not already present.
    pub fn insert(&mut self, verb: Verb) -> bool {
        let absent = !self.contains(verb);
        self.bits |= verb.bit();
        absent
    }

    /// Returns `true` if the set contains `verb`.
    pub fn contains(&self, verb: Verb) -> bool {
        self.bits & verb.bit() != 0
    }

    /// Number of verbs in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Returns `true` if the set holds no verbs.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates the verbs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Verb> + '_ {
        Verb::ALL.into_iter().filter(|verb| self.contains(*verb))
    }

    /// The upper-case names of the verbs, as a router expects them.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|verb| verb.as_str()).collect()
    }
}

impl FromIterator<Verb> for VerbSet {
    fn from_iter<I: IntoIterator<Item = Verb>>(iter: I) -> Self {
        let mut set = VerbSet::new();
        for verb in iter {
            set.insert(verb);
        }
        set
    }
}

impl fmt::Debug for VerbSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for VerbSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}
