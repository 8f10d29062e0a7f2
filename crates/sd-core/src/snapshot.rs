//! The persisted per-canvas configuration and its comparison snapshot.
//!
//! Saved configurations keep the flat shape older projects were stored in
//! (a heading, a subheading and one mockup transform per canvas) next to
//! the full element list. Loading a configuration that predates the element
//! list migrates those flat fields into elements. The flat mockup position
//! is an offset from the canvas center.

use crate::geometry::{Point, normalize_rotation};
use crate::id::ElementId;
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Flat text fields of a heading or subheading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyText {
    pub text: String,
    pub position: Point,
    pub font_family: String,
    pub font_size: f32,
    pub color: Color,
    pub weight: FontWeight,
    pub align: TextAlign,
    pub letter_spacing: f32,
    pub line_height: f32,
}

impl LegacyText {
    fn from_element(el: &Element, t: &TextElement) -> Self {
        Self {
            text: t.content.clone(),
            position: el.position,
            font_family: t.font_family.clone(),
            font_size: t.font_size * el.scale,
            color: t.color,
            weight: t.weight,
            align: t.align,
            letter_spacing: t.letter_spacing * el.scale,
            line_height: t.line_height,
        }
    }

    fn to_element(&self) -> Element {
        let mut el = create_text_element(&self.text, self.position);
        if let ElementKind::Text(t) = &mut el.kind {
            t.font_family = self.font_family.clone();
            t.font_size = self.font_size;
            t.color = self.color;
            t.weight = self.weight;
            t.align = self.align;
            t.letter_spacing = self.letter_spacing;
            t.line_height = self.line_height;
        }
        el
    }
}

/// What the external save interface receives for one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCanvasConfig {
    pub heading: Option<LegacyText>,
    pub subheading: Option<LegacyText>,
    pub mockup_position: Point,
    pub mockup_scale: f32,
    pub mockup_rotation: f32,
    pub background: Background,
    pub device_frame: String,
    pub view: ViewState,
    pub source: Option<String>,
    /// `None` only for configurations saved before elements existed. An
    /// empty list is a canvas the user cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Arc<Element>>>,
}

impl SavedCanvasConfig {
    /// Flatten a canvas and the shared settings.
    ///
    /// The heading and subheading are the two top-most text elements by
    /// vertical position. The mockup fields come from the first mockup
    /// element, or the canvas' legacy transform when it has none.
    pub fn from_canvas(canvas: &CanvasInstance, settings: &GlobalSettings) -> Self {
        let mut texts: Vec<(&Element, &TextElement)> = canvas
            .elements
            .iter()
            .filter_map(|e| e.as_text().map(|t| (e.as_ref(), t)))
            .collect();
        texts.sort_by(|a, b| a.0.position.y.total_cmp(&b.0.position.y));
        let mut flat = texts.into_iter().map(|(e, t)| LegacyText::from_element(e, t));

        let center = canvas_center(settings.device_class());
        let legacy = canvas
            .paint_order()
            .into_iter()
            .find(|e| e.is_mockup())
            .map(|m| LegacyMockup {
                position: Point::new(m.position.x - center.x, m.position.y - center.y),
                scale: m.scale,
                rotation: m.rotation,
            })
            .unwrap_or(canvas.legacy);

        Self {
            heading: flat.next(),
            subheading: flat.next(),
            mockup_position: legacy.position,
            mockup_scale: legacy.scale,
            mockup_rotation: legacy.rotation,
            background: settings.background.clone(),
            device_frame: settings.device_frame.clone(),
            view: settings.view,
            source: canvas.source.clone(),
            elements: Some(canvas.elements.clone()),
        }
    }

    /// Rebuild a canvas. A configuration saved before the element list
    /// existed gets its heading, subheading and mockup turned into elements.
    pub fn into_canvas(self, id: CanvasId, display_order: u32) -> CanvasInstance {
        let mut canvas = CanvasInstance::new(id, self.source.clone(), display_order);
        canvas.legacy = LegacyMockup {
            position: self.mockup_position,
            scale: if self.mockup_scale > 0.0 { self.mockup_scale } else { 1.0 },
            rotation: normalize_rotation(self.mockup_rotation),
        };

        if let Some(elements) = self.elements {
            canvas.elements = dedup_ids(elements);
            return canvas;
        }

        log::debug!("migrating flat configuration of canvas {}", canvas.id);
        let center = canvas_center(DeviceClass::from_frame_id(&self.device_frame));
        let mut elements = Vec::new();
        let mut mockup = create_mockup_element(
            &self.device_frame,
            self.source.as_deref(),
            Point::new(
                center.x + canvas.legacy.position.x,
                center.y + canvas.legacy.position.y,
            ),
        );
        mockup.scale = canvas.legacy.scale;
        mockup.rotation = canvas.legacy.rotation;
        elements.push(mockup);
        elements.extend(
            self.heading
                .iter()
                .chain(self.subheading.iter())
                .map(LegacyText::to_element),
        );
        for (z, el) in elements.iter_mut().enumerate() {
            el.z_index = z as i32;
        }
        canvas.elements = elements.into_iter().map(Arc::new).collect();
        canvas
    }

    /// Saved elements; empty for a pre-element configuration.
    pub fn elements(&self) -> &[Arc<Element>] {
        self.elements.as_deref().unwrap_or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn canvas_center(device: DeviceClass) -> Point {
    let (w, h) = device.canvas_size();
    Point::new(w / 2.0, h / 2.0)
}

/// Keeps the first element for every ID; later duplicates are dropped.
fn dedup_ids(elements: Vec<Arc<Element>>) -> Vec<Arc<Element>> {
    let mut seen: Vec<ElementId> = Vec::with_capacity(elements.len());
    elements
        .into_iter()
        .filter(|e| {
            if seen.contains(&e.id) {
                log::warn!("dropping duplicate element {}", e.id);
                false
            } else {
                seen.push(e.id);
                true
            }
        })
        .collect()
}

/// Compact, comparable encoding of a [`SavedCanvasConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSnapshot(Vec<u8>);

impl CanvasSnapshot {
    pub fn encode(config: &SavedCanvasConfig) -> Result<Self, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(config).map(CanvasSnapshot)
    }

    pub fn capture(
        canvas: &CanvasInstance,
        settings: &GlobalSettings,
    ) -> Result<Self, rmp_serde::encode::Error> {
        Self::encode(&SavedCanvasConfig::from_canvas(canvas, settings))
    }

    pub fn decode(&self) -> Result<SavedCanvasConfig, rmp_serde::decode::Error> {
        rmp_serde::from_slice(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> CanvasInstance {
        let mut c = CanvasInstance::new(CanvasId::new("c1"), Some("shot.png".into()), 3);
        let sub = create_text_element("Sub", Point::new(642.0, 400.0));
        let head = create_text_element("Head", Point::new(642.0, 200.0));
        let mut m =
            create_mockup_element("iphone-15-pro", Some("shot.png"), Point::new(642.0, 1600.0));
        m.scale = 0.8;
        m.rotation = -5.0;
        c.elements = vec![Arc::new(sub), Arc::new(head), Arc::new(m)];
        c
    }

    #[test]
    fn flattens_heading_subheading_and_mockup() {
        let config = SavedCanvasConfig::from_canvas(&canvas(), &GlobalSettings::default());
        assert_eq!(config.heading.as_ref().unwrap().text, "Head");
        assert_eq!(config.subheading.as_ref().unwrap().text, "Sub");
        // Relative to the center of the 1284×2778 phone canvas.
        assert_eq!(config.mockup_position, Point::new(0.0, 211.0));
        assert_eq!(config.mockup_scale, 0.8);
        assert_eq!(config.mockup_rotation, -5.0);
        assert_eq!(config.elements.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn json_round_trip_restores_elements() {
        let original = canvas();
        let config = SavedCanvasConfig::from_canvas(&original, &GlobalSettings::default());
        let json = config.to_json().unwrap();
        let restored = SavedCanvasConfig::from_json(&json)
            .unwrap()
            .into_canvas(CanvasId::new("c1"), 3);
        assert_eq!(restored.elements, original.elements);
        assert_eq!(restored.source, original.source);
    }

    #[test]
    fn flat_configuration_migrates_into_elements() {
        let mut config = SavedCanvasConfig::from_canvas(&canvas(), &GlobalSettings::default());
        config.elements = None;
        let migrated = config.into_canvas(CanvasId::new("c1"), 0);
        let kinds: Vec<&str> = migrated.paint_order().iter().map(|e| e.kind_name()).collect();
        assert_eq!(kinds, vec!["mockup", "text", "text"]);
        assert_eq!(migrated.legacy.scale, 0.8);
        let mockup = migrated.paint_order()[0];
        assert_eq!(mockup.position, Point::new(642.0, 1600.0));
    }

    #[test]
    fn legacy_json_without_elements_centers_the_mockup() {
        let mut config =
            SavedCanvasConfig::from_canvas(&CanvasInstance::new(CanvasId::new("old"), None, 0), &GlobalSettings::default());
        config.elements = None;
        let json = config.to_json().unwrap();
        assert!(!json.contains("elements"));

        let migrated = SavedCanvasConfig::from_json(&json)
            .unwrap()
            .into_canvas(CanvasId::new("old"), 0);
        assert_eq!(migrated.elements.len(), 1);
        assert_eq!(migrated.elements[0].position, Point::new(642.0, 1389.0));
    }

    #[test]
    fn cleared_canvas_stays_empty_after_reload() {
        let empty = CanvasInstance::new(CanvasId::new("blank"), Some("shot.png".into()), 1);
        let json = SavedCanvasConfig::from_canvas(&empty, &GlobalSettings::default())
            .to_json()
            .unwrap();
        let restored = SavedCanvasConfig::from_json(&json)
            .unwrap()
            .into_canvas(CanvasId::new("blank"), 1);
        assert!(restored.elements.is_empty());
    }

    #[test]
    fn snapshot_detects_changes() {
        let settings = GlobalSettings::default();
        let mut c = canvas();
        let before = CanvasSnapshot::capture(&c, &settings).unwrap();
        assert_eq!(CanvasSnapshot::capture(&c, &settings).unwrap(), before);

        let mut moved = Element::clone(&c.elements[0]);
        moved.position.x += 1.0;
        c.elements[0] = Arc::new(moved);
        assert!(CanvasSnapshot::capture(&c, &settings).unwrap() != before);
        assert_eq!(before.decode().unwrap().elements.map(|e| e.len()), Some(3));
    }
}
