//! Decoded-image cache with stale-completion discard.
//!
//! Image loads are asynchronous and owned by the host. The cache hands out
//! a [`LoadTicket`] per request and only accepts a completion whose ticket
//! is still the latest one for its slot, so a slow decode of an old
//! screenshot can never overwrite the image of a newer one.

use crate::surface::SurfaceImage;
use sd_core::{Background, CanvasInstance, ElementKind, GlobalSettings, ImageFit};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("image has zero size")]
    Empty,
}

/// What a cached image was decoded from. A slot whose key changes drops
/// its image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub source: String,
    pub device: String,
}

impl AssetKey {
    pub fn new(source: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            device: device.into(),
        }
    }
}

/// Proof of an issued load. Pass it back to [`AssetCache::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub slot: String,
    pub key: AssetKey,
    serial: u64,
}

impl LoadTicket {
    /// Unique per request. Hosts echo it back with the finished load.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

#[derive(Debug)]
enum SlotState<I> {
    Pending(u64),
    Ready(Arc<I>),
    Failed,
}

#[derive(Debug)]
struct Slot<I> {
    key: AssetKey,
    state: SlotState<I>,
}

/// Images keyed by slot name. `I` is the surface's image type.
#[derive(Debug)]
pub struct AssetCache<I> {
    slots: HashMap<String, Slot<I>>,
    next_serial: u64,
}

impl<I> Default for AssetCache<I> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            next_serial: 0,
        }
    }
}

impl<I> AssetCache<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `key` in `slot`. Returns a ticket when a load must be
    /// started: the slot is empty or currently holds a different key. Any
    /// load still in flight for the previous key becomes stale.
    pub fn request(&mut self, slot: &str, key: AssetKey) -> Option<LoadTicket> {
        if let Some(existing) = self.slots.get(slot)
            && existing.key == key
        {
            return None;
        }
        self.next_serial += 1;
        let serial = self.next_serial;
        log::debug!("load #{serial} for {slot}: {}", key.source);
        self.slots.insert(
            slot.to_string(),
            Slot {
                key: key.clone(),
                state: SlotState::Pending(serial),
            },
        );
        Some(LoadTicket {
            slot: slot.to_string(),
            key,
            serial,
        })
    }

    /// Whether `ticket` is still the load its slot is waiting for.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.slots.get(&ticket.slot).is_some_and(|slot| {
            slot.key == ticket.key && matches!(slot.state, SlotState::Pending(s) if s == ticket.serial)
        })
    }

    /// Commit a finished load. Returns `false` (and drops the result) when
    /// the ticket is stale.
    pub fn complete(&mut self, ticket: &LoadTicket, result: Result<I, AssetError>) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                "discarding stale load #{} for {} ({})",
                ticket.serial,
                ticket.slot,
                ticket.key.source
            );
            return false;
        }
        let Some(slot) = self.slots.get_mut(&ticket.slot) else {
            return false;
        };
        slot.state = match result {
            Ok(image) => SlotState::Ready(Arc::new(image)),
            Err(e) => {
                // Failed slots are not retried until their key changes, so
                // this is logged once per key.
                log::warn!("asset {} unavailable: {e}", ticket.key.source);
                SlotState::Failed
            }
        };
        true
    }

    pub fn get(&self, slot: &str) -> Option<&I> {
        match &self.slots.get(slot)?.state {
            SlotState::Ready(image) => Some(image.as_ref()),
            _ => None,
        }
    }

    pub fn is_pending(&self, slot: &str) -> bool {
        matches!(
            self.slots.get(slot).map(|s| &s.state),
            Some(SlotState::Pending(_))
        )
    }

    pub fn is_failed(&self, slot: &str) -> bool {
        matches!(
            self.slots.get(slot).map(|s| &s.state),
            Some(SlotState::Failed)
        )
    }

    /// Drop slots not in `keep`.
    pub fn retain_slots(&mut self, keep: &[String]) {
        self.slots.retain(|name, _| keep.contains(name));
    }
}

// ─── Slot naming ─────────────────────────────────────────────────────────

pub fn frame_slot(device_frame: &str) -> String {
    format!("frame:{device_frame}")
}

pub fn screenshot_slot(source: &str) -> String {
    format!("shot:{source}")
}

pub fn visual_slot(asset: &str) -> String {
    format!("visual:{asset}")
}

pub const BACKGROUND_SLOT: &str = "background";

/// The screenshot a mockup shows: its own reference, else the canvas source.
pub fn mockup_source<'a>(
    canvas: &'a CanvasInstance,
    screenshot: Option<&'a str>,
) -> Option<&'a str> {
    screenshot.or(canvas.source.as_deref())
}

/// Every `(slot, key)` a canvas needs to render fully.
pub fn required_assets(
    canvas: &CanvasInstance,
    settings: &GlobalSettings,
) -> Vec<(String, AssetKey)> {
    let device = settings.device_frame.as_str();
    let mut out = Vec::new();
    let mut push = |slot: String, key: AssetKey| {
        if !out.iter().any(|(s, _)| *s == slot) {
            out.push((slot, key));
        }
    };

    if let Background::Image { url, .. } = &settings.background {
        push(BACKGROUND_SLOT.to_string(), AssetKey::new(url.clone(), ""));
    }
    for el in canvas.elements.iter() {
        match &el.kind {
            ElementKind::Mockup(m) => {
                push(
                    frame_slot(&m.device_frame),
                    AssetKey::new(m.device_frame.clone(), m.device_frame.clone()),
                );
                if let Some(src) = mockup_source(canvas, m.screenshot.as_deref()) {
                    push(screenshot_slot(src), AssetKey::new(src, device));
                }
            }
            ElementKind::Visual(v) => {
                push(visual_slot(&v.asset), AssetKey::new(v.asset.clone(), ""));
            }
            ElementKind::Text(_) => {}
        }
    }
    out
}

// ─── Decoding ────────────────────────────────────────────────────────────

/// An RGBA8 bitmap with premultiplied alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl SurfaceImage for DecodedImage {
    fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }
}

/// Decode encoded image bytes (PNG, JPEG, WebP).
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, AssetError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AssetError::Empty);
    }
    let mut data = rgba.into_raw();
    premultiply_in_place(&mut data);
    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(data),
    })
}

fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

/// Where an image of `image` size lands on a `canvas` sized area for a
/// fit mode. Tiling yields one rect per tile, capped at `max_tiles`.
pub fn fit_image(
    fit: ImageFit,
    image: (f32, f32),
    canvas: (f32, f32),
    max_tiles: usize,
) -> Vec<sd_core::Rect> {
    use sd_core::Rect;
    let (iw, ih) = image;
    let (cw, ch) = canvas;
    if iw <= 0.0 || ih <= 0.0 {
        return Vec::new();
    }
    let centered = |s: f32| Rect::new((cw - iw * s) / 2.0, (ch - ih * s) / 2.0, iw * s, ih * s);
    match fit {
        ImageFit::Cover => vec![centered((cw / iw).max(ch / ih))],
        ImageFit::Contain => vec![centered((cw / iw).min(ch / ih))],
        ImageFit::Fill => vec![Rect::new(0.0, 0.0, cw, ch)],
        ImageFit::Tile => {
            let cols = (cw / iw).ceil() as usize;
            let rows = (ch / ih).ceil() as usize;
            if cols.saturating_mul(rows) > max_tiles {
                log::warn!("background tile grid {cols}x{rows} too large, stretching");
                return vec![Rect::new(0.0, 0.0, cw, ch)];
            }
            (0..rows)
                .flat_map(|r| {
                    (0..cols).map(move |c| Rect::new(c as f32 * iw, r as f32 * ih, iw, ih))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stale_completion_is_discarded() {
        let mut cache: AssetCache<&'static str> = AssetCache::new();
        let old = cache
            .request("shot", AssetKey::new("a.png", "iphone"))
            .unwrap();
        let new = cache
            .request("shot", AssetKey::new("b.png", "iphone"))
            .unwrap();

        assert!(cache.complete(&new, Ok("B")));
        assert!(!cache.complete(&old, Ok("A")));
        assert_eq!(cache.get("shot"), Some(&"B"));
    }

    #[test]
    fn old_load_landing_first_leaves_the_new_one_pending() {
        let mut cache: AssetCache<&'static str> = AssetCache::new();
        let old = cache.request("background", AssetKey::new("a.png", "")).unwrap();
        let new = cache.request("background", AssetKey::new("b.png", "")).unwrap();
        assert!(!cache.is_current(&old));
        assert!(cache.is_current(&new));
        assert!(old.serial() != new.serial());

        assert!(!cache.complete(&old, Ok("A")));
        assert_eq!(cache.get("background"), None);
        assert!(cache.is_pending("background"));

        assert!(cache.complete(&new, Ok("B")));
        assert_eq!(cache.get("background"), Some(&"B"));
        assert!(!cache.is_current(&new));
    }

    #[test]
    fn same_key_is_not_requested_twice() {
        let mut cache: AssetCache<u8> = AssetCache::new();
        let key = AssetKey::new("a.png", "iphone");
        assert!(cache.request("shot", key.clone()).is_some());
        assert!(cache.request("shot", key.clone()).is_none());
        assert!(cache.is_pending("shot"));

        // A device change invalidates the slot.
        assert!(cache.request("shot", AssetKey::new("a.png", "ipad")).is_some());
    }

    #[test]
    fn failure_is_kept_until_key_changes() {
        let mut cache: AssetCache<u8> = AssetCache::new();
        let key = AssetKey::new("broken.png", "");
        let t = cache.request("v", key.clone()).unwrap();
        assert!(cache.complete(&t, Err(AssetError::Empty)));
        assert!(cache.is_failed("v"));
        assert!(cache.get("v").is_none());
        assert!(cache.request("v", key).is_none());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(AssetError::Decode(_))
        ));
    }

    #[test]
    fn decode_png_premultiplies() {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([200, 100, 50, 128]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (1, 1));
        assert_eq!(decoded.rgba8_premul.as_slice(), &[100, 50, 25, 128]);
    }

    #[test]
    fn fit_modes() {
        let cover = fit_image(ImageFit::Cover, (100.0, 100.0), (200.0, 400.0), 64);
        assert_eq!(cover, vec![sd_core::Rect::new(-100.0, 0.0, 400.0, 400.0)]);
        let contain = fit_image(ImageFit::Contain, (100.0, 100.0), (200.0, 400.0), 64);
        assert_eq!(contain, vec![sd_core::Rect::new(0.0, 100.0, 200.0, 200.0)]);
        let tiles = fit_image(ImageFit::Tile, (100.0, 150.0), (200.0, 400.0), 64);
        assert_eq!(tiles.len(), 2 * 3);
    }

    #[test]
    fn required_assets_cover_frames_and_screenshots() {
        let mut canvas =
            CanvasInstance::new(sd_core::CanvasId::new("c"), Some("up/1.png".into()), 0);
        canvas.elements.push(Arc::new(sd_core::create_mockup_element(
            "iphone-15-pro",
            None,
            sd_core::Point::ZERO,
        )));
        let wanted = required_assets(&canvas, &GlobalSettings::default());
        let slots: Vec<&str> = wanted.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(slots, vec!["frame:iphone-15-pro", "shot:up/1.png"]);
    }
}
