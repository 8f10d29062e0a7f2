//! Font availability and fallback.

use sd_core::DEFAULT_FONT_FAMILY;
use sd_core::layout::{FontSpec, TextMeasure};
use std::cell::RefCell;
use std::collections::HashSet;

/// The font families the host can draw with.
///
/// An empty book accepts every family: until the host reports its catalog
/// there is nothing to fall back from.
#[derive(Debug)]
pub struct FontBook {
    families: HashSet<String>,
    default_family: String,
    warned: RefCell<HashSet<String>>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_FAMILY)
    }
}

impl FontBook {
    pub fn new(default_family: &str) -> Self {
        Self {
            families: HashSet::new(),
            default_family: default_family.to_string(),
            warned: RefCell::new(HashSet::new()),
        }
    }

    pub fn with_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for f in families {
            self.add_family(f.as_ref());
        }
        self
    }

    pub fn add_family(&mut self, family: &str) {
        self.families.insert(family.to_ascii_lowercase());
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    pub fn is_available(&self, family: &str) -> bool {
        self.families.is_empty() || self.families.contains(&family.to_ascii_lowercase())
    }

    /// The family to actually draw with. Unknown families fall back to the
    /// default one, with a warning the first time each is seen.
    pub fn resolve<'a>(&'a self, family: &'a str) -> &'a str {
        if self.is_available(family) {
            return family;
        }
        if self.warned.borrow_mut().insert(family.to_string()) {
            log::warn!(
                "font family {family:?} unavailable, using {:?}",
                self.default_family
            );
        }
        &self.default_family
    }

    pub fn resolve_spec(&self, font: &FontSpec) -> FontSpec {
        FontSpec {
            family: self.resolve(&font.family).to_string(),
            ..font.clone()
        }
    }
}

/// Measures with the resolved family, so layout agrees with what gets drawn.
pub struct FallbackMeasure<'a, M: ?Sized> {
    pub book: &'a FontBook,
    pub inner: &'a M,
}

impl<M: TextMeasure + ?Sized> TextMeasure for FallbackMeasure<'_, M> {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        self.inner.measure(text, &self.book.resolve_spec(font))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::FontWeight;

    #[test]
    fn empty_book_accepts_everything() {
        let book = FontBook::default();
        assert_eq!(book.resolve("Comic Neue"), "Comic Neue");
    }

    #[test]
    fn unknown_family_falls_back_to_default() {
        let book = FontBook::new("Inter").with_families(["Inter", "Poppins"]);
        assert_eq!(book.resolve("poppins"), "poppins");
        assert_eq!(book.resolve("Papyrus"), "Inter");
        assert_eq!(book.resolve("Papyrus"), "Inter");
        assert_eq!(book.warned.borrow().len(), 1);
    }

    #[test]
    fn fallback_measure_uses_resolved_family() {
        struct ByFamily;
        impl TextMeasure for ByFamily {
            fn measure(&self, _text: &str, font: &FontSpec) -> f32 {
                if font.family == "Inter" { 1.0 } else { 2.0 }
            }
        }
        let book = FontBook::new("Inter").with_families(["Inter"]);
        let m = FallbackMeasure {
            book: &book,
            inner: &ByFamily,
        };
        let font = FontSpec {
            family: "Missing".into(),
            weight: FontWeight::Bold,
            size: 10.0,
        };
        assert_eq!(m.measure("x", &font), 1.0);
    }
}
