//! Fixture parameters and the structural comparator used to match them.
//!
//! Сравнение намеренно "best-effort": это эвристика для поиска записи в кэше,
//! а не каноническое равенство. Порядок правил важен (см. `params_equal`).

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::Serialize;

static UNDEFINED: Param = Param::Undefined;

/// Opaque function value passed as a parameter. Equal only to itself
/// (and its clones): closures are never interchangeable.
#[derive(Clone)]
pub struct FnHandle(Arc<dyn Any + Send + Sync>);

impl FnHandle {
    pub fn new<F: Send + Sync + 'static>(f: F) -> Self {
        FnHandle(Arc::new(f))
    }

    pub fn same(&self, other: &FnHandle) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }

    /// Borrow the wrapped callable back, if it is an `F`.
    pub fn downcast_ref<F: 'static>(&self) -> Option<&F> {
        self.0.downcast_ref::<F>()
    }
}

impl fmt::Debug for FnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnHandle({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Pattern (regex source) parameter. Compared by instance, never by text.
#[derive(Clone)]
pub struct PatternHandle(Arc<str>);

impl PatternHandle {
    pub fn new(source: &str) -> Self {
        PatternHandle(Arc::from(source))
    }

    pub fn source(&self) -> &str {
        &self.0
    }

    pub fn same(&self, other: &PatternHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PatternHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.0)
    }
}

/// Parameter value supplied alongside a fixture.
#[derive(Debug, Clone, Default)]
pub enum Param {
    /// No parameters at all.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers above `i64::MAX` (wei amounts, hashes as numbers).
    /// Same kind as `Int`: `UInt(5)` equals `Int(5)`.
    UInt(u64),
    Float(f64),
    Str(String),
    Seq(Vec<Param>),
    Map(BTreeMap<String, Param>),
    Timestamp(SystemTime),
    Function(FnHandle),
    Pattern(PatternHandle),
}

/// Runtime kind tag (rule 2). `Int` and `Float` are different kinds;
/// `Int` and `UInt` share the integer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Undefined,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Seq,
    Map,
    Timestamp,
    Function,
    Pattern,
}

impl Param {
    pub fn kind(&self) -> ParamKind {
        match self {
            Param::Undefined => ParamKind::Undefined,
            Param::Null => ParamKind::Null,
            Param::Bool(_) => ParamKind::Bool,
            Param::Int(_) | Param::UInt(_) => ParamKind::Int,
            Param::Float(_) => ParamKind::Float,
            Param::Str(_) => ParamKind::Str,
            Param::Seq(_) => ParamKind::Seq,
            Param::Map(_) => ParamKind::Map,
            Param::Timestamp(_) => ParamKind::Timestamp,
            Param::Function(_) => ParamKind::Function,
            Param::Pattern(_) => ParamKind::Pattern,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Param::Undefined | Param::Null)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Param::Seq(_) | Param::Map(_))
    }

    /// Build a keyed parameter from (key, value) pairs.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Param>,
        I: IntoIterator<Item = (K, V)>,
    {
        Param::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Convert any serde-serializable value (via its JSON shape).
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let v = serde_json::to_value(value).context("serialize fixture parameters")?;
        Ok(Param::from(v))
    }

    /// Own keys in the order rule 9 walks them.
    fn keys(&self) -> Vec<String> {
        match self {
            Param::Seq(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            Param::Map(m) => m.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn has_key(&self, key: &str) -> bool {
        match self {
            Param::Seq(items) => key.parse::<usize>().map(|i| i < items.len()).unwrap_or(false),
            Param::Map(m) => m.contains_key(key),
            _ => false,
        }
    }

    /// Value under `key`; absent reads as `Undefined`.
    fn get(&self, key: &str) -> &Param {
        match self {
            Param::Seq(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .unwrap_or(&UNDEFINED),
            Param::Map(m) => m.get(key).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }
}

/// Structural comparator. Rules, in order:
/// 1. null/undefined: equal iff both nullish and the same one
/// 2. different kinds -> false
/// 3. functions -> same handle
/// 4. patterns -> same handle
/// 5. identical primitive values -> true
/// 6. sequences of different length -> false
/// 7. timestamps that got here -> false
/// 8. non-composite -> false
/// 9. keys(b) ⊆ keys(a) and every a[k] equals b[k]
///
/// Rule 9 is asymmetric: a key present only in `a` whose value is nullish
/// still matches when `b` lacks it, but not the other way around.
pub fn params_equal(a: &Param, b: &Param) -> bool {
    if a.is_nullish() || b.is_nullish() {
        return a.kind() == b.kind();
    }
    if a.kind() != b.kind() {
        return false;
    }

    match (a, b) {
        (Param::Function(x), Param::Function(y)) => return x.same(y),
        (Param::Pattern(x), Param::Pattern(y)) => return x.same(y),
        _ => {}
    }

    if same_primitive(a, b) {
        return true;
    }

    if let (Param::Seq(x), Param::Seq(y)) = (a, b) {
        if x.len() != y.len() {
            return false;
        }
    }

    if matches!(a, Param::Timestamp(_)) {
        return false;
    }

    if !a.is_composite() || !b.is_composite() {
        return false;
    }

    let a_keys = a.keys();
    b.keys().iter().all(|k| a.has_key(k))
        && a_keys.iter().all(|k| params_equal(a.get(k), b.get(k)))
}

fn same_primitive(a: &Param, b: &Param) -> bool {
    match (a, b) {
        (Param::Bool(x), Param::Bool(y)) => x == y,
        (Param::Int(x), Param::Int(y)) => x == y,
        (Param::UInt(x), Param::UInt(y)) => x == y,
        (Param::Int(x), Param::UInt(y)) | (Param::UInt(y), Param::Int(x)) => {
            i128::from(*x) == i128::from(*y)
        }
        // NaN != NaN, 0.0 == -0.0
        (Param::Float(x), Param::Float(y)) => x == y,
        (Param::Str(x), Param::Str(y)) => x == y,
        (Param::Timestamp(x), Param::Timestamp(y)) => x == y,
        _ => false,
    }
}

// ---------------- conversions ----------------

impl From<()> for Param {
    fn from(_: ()) -> Self {
        Param::Undefined
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<u32> for Param {
    fn from(v: u32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<u64> for Param {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Param::Int(i),
            Err(_) => Param::UInt(v),
        }
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Str(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Str(v)
    }
}

impl From<SystemTime> for Param {
    fn from(v: SystemTime) -> Self {
        Param::Timestamp(v)
    }
}

impl From<FnHandle> for Param {
    fn from(v: FnHandle) -> Self {
        Param::Function(v)
    }
}

impl From<PatternHandle> for Param {
    fn from(v: PatternHandle) -> Self {
        Param::Pattern(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Param::Undefined)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(v: Vec<T>) -> Self {
        Param::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Param>> From<BTreeMap<String, V>> for Param {
    fn from(v: BTreeMap<String, V>) -> Self {
        Param::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Param {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Param::Null,
            Value::Bool(b) => Param::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Param::Int(i),
                (None, Some(u)) => Param::UInt(u),
                (None, None) => Param::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Param::Str(s),
            Value::Array(items) => Param::Seq(items.into_iter().map(Param::from).collect()),
            Value::Object(obj) => {
                Param::Map(obj.into_iter().map(|(k, v)| (k, Param::from(v))).collect())
            }
        }
    }
}
