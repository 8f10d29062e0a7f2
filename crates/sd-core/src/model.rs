//! Core data model for a Shotdeck project.
//!
//! A project is a row of canvases ("screenshots"), each holding a free-form
//! list of elements (text blocks, device mockups and arbitrary visuals)
//! and global settings (background, device frame, view) shared by every
//! canvas. All geometry is in the logical coordinate space of the target
//! device; see [`DeviceClass::canvas_size`].

use crate::geometry::Point;
use crate::id::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Quantize to 8-bit channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Same color with its alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }
}

// ─── Devices ─────────────────────────────────────────────────────────────

/// The device family a frame identifier belongs to. Decides the logical
/// canvas size and the default mockup geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Phone,
    Tablet,
}

impl DeviceClass {
    /// Resolve a device-frame identifier (`"iphone-15-pro"`, `"ipad-pro-13"`).
    /// Unknown identifiers are treated as phones.
    pub fn from_frame_id(frame: &str) -> Self {
        let f = frame.to_ascii_lowercase();
        if f.contains("ipad") || f.contains("tablet") {
            DeviceClass::Tablet
        } else {
            DeviceClass::Phone
        }
    }

    /// Logical canvas size (App Store screenshot resolution).
    pub fn canvas_size(self) -> (f32, f32) {
        match self {
            DeviceClass::Phone => (1284.0, 2778.0),
            DeviceClass::Tablet => (2048.0, 2732.0),
        }
    }

    /// Unscaled mockup size in logical units.
    pub fn mockup_base_size(self) -> (f32, f32) {
        match self {
            DeviceClass::Phone => (700.0, 1400.0),
            DeviceClass::Tablet => (1000.0, 1333.0),
        }
    }

    /// Corner radius of the screen area at scale 1.
    pub fn screen_corner_radius(self) -> f32 {
        match self {
            DeviceClass::Phone => 70.0,
            DeviceClass::Tablet => 40.0,
        }
    }

    /// Bezel thickness between the frame edge and the screen at scale 1.
    pub fn bezel(self) -> f32 {
        match self {
            DeviceClass::Phone => 28.0,
            DeviceClass::Tablet => 36.0,
        }
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// Horizontal text alignment. Also decides which edge `position.x` anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Regular,
    #[default]
    Bold,
}

impl FontWeight {
    /// CSS numeric weight.
    pub fn css(self) -> u16 {
        match self {
            FontWeight::Regular => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// A block of marketing copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub content: String,
    pub font_family: String,
    pub font_size: f32,
    pub color: Color,
    pub weight: FontWeight,
    pub align: TextAlign,
    /// Explicit wrap width. `None` wraps at a fraction of the canvas width.
    pub width: Option<f32>,
    pub letter_spacing: f32,
    /// Line advance as a multiple of the font size.
    pub line_height: f32,
}

/// A device frame with a screenshot composited into its screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockupElement {
    pub device_frame: String,
    pub base_width: f32,
    pub base_height: f32,
    pub screenshot: Option<String>,
}

/// An uploaded image placed freely on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualElement {
    pub asset: String,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
}

/// The element variants. Matches over this enum are exhaustive on purpose:
/// render, hit-test and update sites all need to learn about a new kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextElement),
    Mockup(MockupElement),
    Visual(VisualElement),
}

/// A positioned, scaled, rotated drawable on a canvas.
///
/// `position` is the center for mockups and visuals, and the alignment anchor
/// on the top edge of the first line for text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub position: Point,
    pub scale: f32,
    /// Degrees, normalized to (-180, 180].
    pub rotation: f32,
    pub z_index: i32,
    pub kind: ElementKind,
}

impl Element {
    /// Short kind name, also used as the ID prefix.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Text(_) => "text",
            ElementKind::Mockup(_) => "mockup",
            ElementKind::Visual(_) => "visual",
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    pub fn is_mockup(&self) -> bool {
        matches!(self.kind, ElementKind::Mockup(_))
    }
}

/// Default font size for new text elements.
pub const DEFAULT_FONT_SIZE: f32 = 64.0;
/// Default family; also the fallback when a requested family is unavailable.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

fn envelope(kind: &str, position: Point, kind_data: ElementKind) -> Element {
    Element {
        id: ElementId::generate(kind),
        position,
        scale: 1.0,
        rotation: 0.0,
        z_index: 0,
        kind: kind_data,
    }
}

/// New text element with the editor defaults (64px bold white, centered).
pub fn create_text_element(content: &str, position: Point) -> Element {
    envelope(
        "text",
        position,
        ElementKind::Text(TextElement {
            content: content.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: Color::WHITE,
            weight: FontWeight::Bold,
            align: TextAlign::Center,
            width: None,
            letter_spacing: 0.0,
            line_height: 1.2,
        }),
    )
}

/// New mockup sized for the device class of `device_frame`.
pub fn create_mockup_element(
    device_frame: &str,
    screenshot: Option<&str>,
    position: Point,
) -> Element {
    let (base_width, base_height) = DeviceClass::from_frame_id(device_frame).mockup_base_size();
    envelope(
        "mockup",
        position,
        ElementKind::Mockup(MockupElement {
            device_frame: device_frame.to_string(),
            base_width,
            base_height,
            screenshot: screenshot.map(str::to_string),
        }),
    )
}

/// New visual at its intrinsic size.
pub fn create_visual_element(asset: &str, width: f32, height: f32, position: Point) -> Element {
    envelope(
        "visual",
        position,
        ElementKind::Visual(VisualElement {
            asset: asset.to_string(),
            width: width.max(1.0),
            height: height.max(1.0),
            opacity: 1.0,
        }),
    )
}

// ─── Global settings ─────────────────────────────────────────────────────

/// One of the four cardinal gradient directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientAngle {
    /// 180°: start color at the top.
    #[default]
    ToBottom,
    /// 0°: start color at the bottom.
    ToTop,
    /// 90°: start color on the left, flowing across canvases.
    ToRight,
    /// 270°: start color on the right, flowing across canvases.
    ToLeft,
}

impl GradientAngle {
    /// Snap an arbitrary CSS angle to the nearest cardinal direction.
    pub fn from_degrees(deg: f32) -> Self {
        let quadrant = ((deg.rem_euclid(360.0) + 45.0) / 90.0).floor() as i32 % 4;
        match quadrant {
            0 => GradientAngle::ToTop,
            1 => GradientAngle::ToRight,
            2 => GradientAngle::ToBottom,
            _ => GradientAngle::ToLeft,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, GradientAngle::ToRight | GradientAngle::ToLeft)
    }
}

/// How a background image covers the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
    Tile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Background {
    Solid {
        color: Color,
    },
    Gradient {
        start: Color,
        end: Color,
        angle: GradientAngle,
    },
    Image {
        url: String,
        fit: ImageFit,
        opacity: f32,
    },
}

impl Default for Background {
    fn default() -> Self {
        Background::Gradient {
            start: Color::rgba(0.40, 0.49, 0.92, 1.0),
            end: Color::rgba(0.46, 0.29, 0.64, 1.0),
            angle: GradientAngle::ToBottom,
        }
    }
}

/// Editor zoom/pan. Never affects logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Settings shared by every canvas of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub background: Background,
    pub device_frame: String,
    pub view: ViewState,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            background: Background::default(),
            device_frame: "iphone-15-pro".to_string(),
            view: ViewState::default(),
        }
    }
}

impl GlobalSettings {
    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::from_frame_id(&self.device_frame)
    }
}

// ─── Canvases ────────────────────────────────────────────────────────────

/// Stable, externally assigned canvas identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasId(pub String);

impl CanvasId {
    pub fn new(id: impl Into<String>) -> Self {
        CanvasId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mockup transform fields from before the unified element list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyMockup {
    pub position: Point,
    pub scale: f32,
    pub rotation: f32,
}

impl Default for LegacyMockup {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// One marketing image being composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasInstance {
    pub id: CanvasId,
    /// Source screenshot reference.
    pub source: Option<String>,
    pub elements: Vec<Arc<Element>>,
    pub legacy: LegacyMockup,
    pub display_order: u32,
}

impl CanvasInstance {
    pub fn new(id: CanvasId, source: Option<String>, display_order: u32) -> Self {
        Self {
            id,
            source,
            elements: Vec::new(),
            legacy: LegacyMockup::default(),
            display_order,
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id).map(|e| e.as_ref())
    }

    pub fn position_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Elements in paint order: ascending z-index, ties by insertion order.
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().map(|e| e.as_ref()).collect();
        // Stable sort keeps insertion order for equal z-indices.
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }
}
