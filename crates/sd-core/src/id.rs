use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for element IDs. Selection tracking compares IDs on
/// every pointer event, so they are interned once and compared as integers.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for elements on a canvas.
/// Internally a 4-byte `Spur` index, so copies and comparisons are free.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern a string as an ElementId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh ID of the form `{kind}-{timestamp}-{counter}`.
    ///
    /// The counter alone guarantees uniqueness within a process; the
    /// timestamp keeps IDs from separate sessions apart once persisted.
    pub fn generate(kind: &str) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{kind}-{}-{n}", timestamp_millis()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn timestamp_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

// `SystemTime::now` is unavailable on wasm32-unknown-unknown.
#[cfg(target_arch = "wasm32")]
fn timestamp_millis() -> u128 {
    js_sys::Date::now() as u128
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ElementId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ElementId::intern("text-heading");
        let b = ElementId::intern("text-heading");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "text-heading");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = ElementId::generate("mockup");
        let b = ElementId::generate("mockup");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("mockup-"));
        assert_eq!(a.as_str().split('-').count(), 3);
    }
}
