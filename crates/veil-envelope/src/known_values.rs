//! Known values: small integers standing for well-known concepts.
//!
//! A known value is identified by its code alone. Names are only for
//! display; they come from the value itself or from the process-wide
//! registry, which can be replaced exactly once before first use.

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use veil_core::cbor::{expect_tagged, expect_u64};
use veil_core::{tags, FromCbor, ToCbor, Value};

/// An interned symbol, usually found in predicate position.
#[derive(Debug, Clone)]
pub struct KnownValue {
    value: u64,
    assigned_name: Option<Cow<'static, str>>,
}

impl KnownValue {
    /// A known value with no assigned name.
    pub const fn new(value: u64) -> Self {
        Self {
            value,
            assigned_name: None,
        }
    }

    /// A known value with a static name, usable in `const` items.
    pub const fn new_with_static_name(value: u64, name: &'static str) -> Self {
        Self {
            value,
            assigned_name: Some(Cow::Borrowed(name)),
        }
    }

    pub fn new_with_name(value: u64, name: impl Into<String>) -> Self {
        Self {
            value,
            assigned_name: Some(Cow::Owned(name.into())),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn assigned_name(&self) -> Option<&str> {
        self.assigned_name.as_deref()
    }

    /// Display name: the assigned name, else the registry's, else the code.
    pub fn name(&self) -> String {
        match self.assigned_name() {
            Some(name) => name.to_string(),
            None => known_values()
                .assigned_name(self)
                .map(str::to_string)
                .unwrap_or_else(|| self.value.to_string()),
        }
    }
}

impl PartialEq for KnownValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for KnownValue {}

impl Hash for KnownValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl From<u64> for KnownValue {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl ToCbor for KnownValue {
    fn to_cbor(&self) -> Value {
        Value::Tag(tags::KNOWN_VALUE, Box::new(Value::Integer(self.value.into())))
    }
}

impl FromCbor for KnownValue {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let code = expect_u64(expect_tagged(value, tags::KNOWN_VALUE)?)?;
        Ok(Self::new(code))
    }
}

macro_rules! define_known_values {
    ($($const_name:ident = $value:expr, $name:expr;)*) => {
        $(
            pub const $const_name: KnownValue = KnownValue::new_with_static_name($value, $name);
        )*

        fn predefined() -> Vec<KnownValue> {
            vec![$($const_name),*]
        }
    };
}

define_known_values! {
    IS_A = 1, "isA";
    ID = 2, "id";
    VERIFIED_BY = 3, "verifiedBy";
    NOTE = 4, "note";
    HAS_RECIPIENT = 5, "hasRecipient";
    SSKR_SHARE = 6, "sskrShare";
    CONTROLLER = 7, "controller";
    KEY = 8, "key";
    DEREFERENCE_VIA = 9, "dereferenceVia";
    ENTITY = 10, "entity";
    HAS_NAME = 11, "hasName";
    LANGUAGE = 12, "language";
    ISSUER = 13, "issuer";
    HOLDER = 14, "holder";
    SALT = 15, "salt";
    DATE = 16, "date";
    UNKNOWN_VALUE = 17, "Unknown";
    EDITS = 18, "edits";
}

/// Lookup table from codes and names to known values.
#[derive(Debug, Clone)]
pub struct KnownValuesStore {
    by_value: HashMap<u64, KnownValue>,
    by_name: HashMap<String, KnownValue>,
}

impl KnownValuesStore {
    pub fn new(values: impl IntoIterator<Item = KnownValue>) -> Self {
        let mut store = Self {
            by_value: HashMap::new(),
            by_name: HashMap::new(),
        };
        for value in values {
            store.insert(value);
        }
        store
    }

    /// Insert or replace an entry. Unnamed values are ignored.
    pub fn insert(&mut self, value: KnownValue) {
        if let Some(name) = value.assigned_name() {
            if let Some(old) = self.by_value.remove(&value.value) {
                if let Some(old_name) = old.assigned_name() {
                    self.by_name.remove(old_name);
                }
            }
            self.by_name.insert(name.to_string(), value.clone());
            self.by_value.insert(value.value, value);
        }
    }

    pub fn known_value_named(&self, name: &str) -> Option<&KnownValue> {
        self.by_name.get(name)
    }

    pub fn known_value_for_raw(&self, value: u64) -> KnownValue {
        self.by_value
            .get(&value)
            .cloned()
            .unwrap_or_else(|| KnownValue::new(value))
    }

    pub fn assigned_name(&self, value: &KnownValue) -> Option<&str> {
        self.by_value.get(&value.value).and_then(|v| v.assigned_name())
    }

    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }
}

impl Default for KnownValuesStore {
    fn default() -> Self {
        Self::new(predefined())
    }
}

static KNOWN_VALUES: OnceLock<KnownValuesStore> = OnceLock::new();

/// The process-wide registry, initialized with the predefined values on
/// first access.
pub fn known_values() -> &'static KnownValuesStore {
    KNOWN_VALUES.get_or_init(KnownValuesStore::default)
}

/// Install a custom registry. Fails, returning the store, if the registry
/// has already been initialized or read.
pub fn register_known_values(store: KnownValuesStore) -> Result<(), KnownValuesStore> {
    KNOWN_VALUES.set(store)
}
