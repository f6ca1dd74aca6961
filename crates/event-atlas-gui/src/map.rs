// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::style;
use crate::Message;
use event_atlas_core::config::AtlasConfig;
use event_atlas_core::{BoundingBox, LayerId, Marker};
use iced::advanced::{self, layout, renderer, widget, Layout, Widget};
use iced::widget::image;
use iced::{mouse, Color, Element, Event, Length, Radians, Rectangle};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// --- Slippy Map / Mercator Math ---
pub const TILE_SIZE: f64 = 256.0;
pub const MAX_ZOOM: f64 = 19.0;
/// Zoom used when "zoom to visible" targets a single marker.
pub const POINT_FIT_ZOOM: f64 = 8.0;
const MERCATOR_MAX_LAT: f64 = 85.0511;
const FIT_PADDING_PX: f64 = 40.0;
const HIT_RADIUS_PX: f64 = 10.0;

pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    ((lon + 180.0) / 360.0) * 2.0f64.powf(zoom) * TILE_SIZE
}

pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * 2.0f64.powf(zoom)
        * TILE_SIZE
}

pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
    (x / (TILE_SIZE * 2.0f64.powf(zoom))) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / (TILE_SIZE * 2.0f64.powf(zoom));
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

/// Smallest zoom at which the world still fills the viewport width.
pub fn min_zoom(width: f32) -> f64 {
    (width as f64 / TILE_SIZE).log2().max(0.0)
}

/// Center (lat, lon) and zoom that frame `bounds` inside a viewport.
pub fn fit_bounds(bounds: &BoundingBox, width: f32, height: f32) -> ((f64, f64), f64) {
    if bounds.is_point() {
        return ((bounds.min_lat, bounds.min_lon), POINT_FIT_ZOOM);
    }

    let x1 = lon_to_x(bounds.min_lon, 0.0);
    let x2 = lon_to_x(bounds.max_lon, 0.0);
    let y1 = lat_to_y(bounds.max_lat, 0.0);
    let y2 = lat_to_y(bounds.min_lat, 0.0);

    let avail_w = (width as f64 - 2.0 * FIT_PADDING_PX).max(1.0);
    let avail_h = (height as f64 - 2.0 * FIT_PADDING_PX).max(1.0);
    let scale = (avail_w / (x2 - x1).max(1e-9)).min(avail_h / (y2 - y1).max(1e-9));
    let zoom = scale.log2().clamp(min_zoom(width), POINT_FIT_ZOOM.max(min_zoom(width)));

    let center = (y_to_lat((y1 + y2) / 2.0, 0.0), x_to_lon((x1 + x2) / 2.0, 0.0));
    (center, zoom)
}

// --- Tile Management ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoords {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct TileManager {
    config: AtlasConfig,
    tiles: Arc<Mutex<LruCache<TileCoords, image::Handle>>>,
    pending: Arc<Mutex<HashSet<TileCoords>>>,
}

impl TileManager {
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            config,
            tiles: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(300).unwrap_or(NonZeroUsize::MIN),
            ))),
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn get_tile(&self, coords: TileCoords) -> Option<image::Handle> {
        lock(&self.tiles).get(&coords).cloned()
    }

    pub fn request_tile(&self, coords: TileCoords) {
        {
            let mut pending = lock(&self.pending);
            if pending.contains(&coords) || lock(&self.tiles).contains(&coords) {
                return;
            }
            pending.insert(coords);
        }

        let tiles_arc = Arc::clone(&self.tiles);
        let pending_arc = Arc::clone(&self.pending);
        let url = self.config.tile_url_for(coords.z, coords.x, coords.y);

        // Tile downloads never touch session state
        std::thread::spawn(move || {
            let resp = ureq::get(&url)
                .set("User-Agent", concat!("Event-Atlas/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(10))
                .call();

            match resp {
                Ok(response) => {
                    let mut bytes = Vec::new();
                    if std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes).is_ok()
                    {
                        let handle = image::Handle::from_bytes(bytes);
                        lock(&tiles_arc).put(coords, handle);
                    }
                }
                Err(e) => {
                    log::warn!("Failed to fetch tile {:?}: {}", coords, e);
                }
            }
            lock(&pending_arc).remove(&coords);
        });
    }
}

pub struct MapView<'a> {
    /// Markers of attached layers only.
    pub markers: Vec<(LayerId, &'a Marker)>,
    pub selected_event: Option<usize>,
    pub hovered_event: Option<usize>,
    pub tile_manager: &'a TileManager,
    pub zoom: f64,          // Fractional zoom (e.g., 2.5)
    pub center: (f64, f64), // (Lat, Lon)
}

impl<'a> MapView<'a> {
    /// Event under the cursor, given the cursor in zoom-0 world pixels.
    fn hit_test(&self, world: (f64, f64), scale: f64) -> Option<usize> {
        let (wx, wy) = world;
        self.markers
            .iter()
            .rev()
            .find(|(_, m)| {
                let tx = lon_to_x(m.position.lon, 0.0);
                let ty = lat_to_y(m.position.lat, 0.0);
                (tx - wx).powi(2) + (ty - wy).powi(2) < (HIT_RADIUS_PX / scale).powi(2)
            })
            .map(|(_, m)| m.event_index)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MapState {
    is_dragging: bool,
    press_position: Option<iced::Point>,
    last_cursor: Option<iced::Point>,
    // Track values between prop updates to handle multiple events per frame
    current_center: (f64, f64), // (lat, lon)
    current_zoom: f64,
    last_prop_center: Option<(f64, f64)>,
    last_prop_zoom: Option<f64>,
    last_size: Option<(f32, f32)>,
}

impl<'a, Theme, Renderer> Widget<Message, Theme, Renderer> for MapView<'a>
where
    Renderer: renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn size(&self) -> iced::Size<Length> {
        iced::Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn tag(&self) -> widget::tree::Tag {
        widget::tree::Tag::of::<MapState>()
    }

    fn state(&self) -> widget::tree::State {
        widget::tree::State::new(MapState::default())
    }

    fn layout(
        &self,
        _tree: &mut widget::Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::Node::new(limits.max())
    }

    fn draw(
        &self,
        tree: &widget::Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let state = tree.state.downcast_ref::<MapState>();
        let bounds = layout.bounds();

        // Prefer internal state for zero-latency feedback during interactions
        let zoom = if state.last_prop_zoom.is_some() {
            state.current_zoom
        } else {
            self.zoom
        };
        let (center_lat, center_lon) = if state.last_prop_center.is_some() {
            state.current_center
        } else {
            self.center
        };

        let zoom_scale = 2.0f64.powf(zoom);
        let camera_center_x = lon_to_x(center_lon, 0.0);
        let camera_center_y = lat_to_y(center_lat, 0.0);

        let to_screen = |wx: f64, wy: f64| {
            (
                bounds.x + (bounds.width / 2.0) + ((wx - camera_center_x) * zoom_scale) as f32,
                bounds.y + (bounds.height / 2.0) + ((wy - camera_center_y) * zoom_scale) as f32,
            )
        };

        renderer.with_layer(bounds, |renderer| {
            renderer.fill_quad(
                renderer::Quad {
                    bounds,
                    border: iced::Border::default(),
                    ..Default::default()
                },
                Color::from_rgb(0.05, 0.05, 0.05),
            );

            // --- Tile Layer ---
            let z = zoom.floor().clamp(0.0, MAX_ZOOM) as u32;
            let num_tiles = 2u32.pow(z);
            let tile_size_z0 = TILE_SIZE / 2.0f64.powf(z as f64);

            let half_w = (bounds.width as f64 / 2.0) / zoom_scale;
            let half_h = (bounds.height as f64 / 2.0) / zoom_scale;

            let min_tx = ((camera_center_x - half_w) / tile_size_z0).floor() as i32;
            let max_tx = ((camera_center_x + half_w) / tile_size_z0).ceil() as i32;
            let min_ty = ((camera_center_y - half_h) / tile_size_z0).floor() as i32;
            let max_ty = ((camera_center_y + half_h) / tile_size_z0).ceil() as i32;

            for tx in min_tx.max(0)..=max_tx.min(num_tiles as i32 - 1) {
                for ty in min_ty.max(0)..=max_ty.min(num_tiles as i32 - 1) {
                    let coords = TileCoords {
                        x: tx as u32,
                        y: ty as u32,
                        z,
                    };
                    let (screen_x, screen_y) =
                        to_screen(tx as f64 * tile_size_z0, ty as f64 * tile_size_z0);
                    let current_tile_size = (tile_size_z0 * zoom_scale) as f32;

                    let tile_rect = Rectangle {
                        x: screen_x,
                        y: screen_y,
                        width: current_tile_size,
                        height: current_tile_size,
                    };

                    if let Some(handle) = self.tile_manager.get_tile(coords) {
                        renderer.draw_image(
                            advanced::image::Image {
                                handle,
                                filter_method: image::FilterMethod::Linear,
                                rotation: Radians(0.0),
                                opacity: 1.0,
                                snap: false,
                            },
                            tile_rect,
                        );
                    } else {
                        renderer.fill_quad(
                            renderer::Quad {
                                bounds: tile_rect,
                                ..Default::default()
                            },
                            Color::from_rgb(0.1, 0.1, 0.1),
                        );
                        self.tile_manager.request_tile(coords);
                    }
                }
            }
        });

        // --- Marker Layer ---
        renderer.with_layer(bounds, |renderer| {
            let marker_size = 8.0;
            let highlighted_size = 13.0;

            for (layer, marker) in &self.markers {
                let highlighted = self.selected_event == Some(marker.event_index)
                    || self.hovered_event == Some(marker.event_index);
                let (size, fill) = if highlighted {
                    (highlighted_size, Color::from_rgb(1.0, 1.0, 0.0))
                } else {
                    (marker_size, style::category_color(layer.0))
                };

                let (sx, sy) = to_screen(
                    lon_to_x(marker.position.lon, 0.0),
                    lat_to_y(marker.position.lat, 0.0),
                );
                if !bounds.contains(iced::Point::new(sx, sy)) {
                    continue;
                }

                renderer.fill_quad(
                    renderer::Quad {
                        bounds: Rectangle {
                            x: sx - size / 2.0,
                            y: sy - size / 2.0,
                            width: size,
                            height: size,
                        },
                        border: iced::Border {
                            color: Color::BLACK,
                            width: 1.0,
                            radius: (size / 2.0).into(),
                        },
                        ..Default::default()
                    },
                    fill,
                );
            }
        });
    }

    fn on_event(
        &mut self,
        tree: &mut widget::Tree,
        event: Event,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn advanced::Clipboard,
        shell: &mut advanced::Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> advanced::graphics::core::event::Status {
        let state = tree.state.downcast_mut::<MapState>();
        let bounds = layout.bounds();

        // Zoom-to-visible needs the viewport size
        let size = (bounds.width, bounds.height);
        if state.last_size != Some(size) {
            state.last_size = Some(size);
            shell.publish(Message::MapResized(size));
        }

        // Initialize or sync internal state from props if props changed externally
        if state.last_prop_center != Some(self.center) || state.last_prop_zoom != Some(self.zoom) {
            state.current_center = self.center;
            state.current_zoom = self.zoom;
            state.last_prop_center = Some(self.center);
            state.last_prop_zoom = Some(self.zoom);
        }

        let current_zoom = state.current_zoom;
        let (center_lat, center_lon) = state.current_center;

        let camera_x = lon_to_x(center_lon, 0.0);
        let camera_y = lat_to_y(center_lat, 0.0);
        let scale = 2.0f64.powf(current_zoom);

        let cursor_point = cursor.position_in(bounds);
        let mouse_z0 = cursor_point.map(|p| {
            let rx = (p.x as f64) - (bounds.width as f64 / 2.0);
            let ry = (p.y as f64) - (bounds.height as f64 / 2.0);
            (camera_x + rx / scale, camera_y + ry / scale)
        });

        match event {
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if let Some(p) = cursor_point {
                    let d = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y as f64,
                        mouse::ScrollDelta::Pixels { y, .. } => (y as f64) / 100.0,
                    };
                    let new_zoom =
                        (current_zoom + d * 0.2).clamp(min_zoom(bounds.width), MAX_ZOOM);

                    if (new_zoom - current_zoom).abs() > 0.001 {
                        let new_scale = 2.0f64.powf(new_zoom);

                        // Keep the world point under the cursor fixed
                        let mx = (p.x as f64) - (bounds.width as f64 / 2.0);
                        let my = (p.y as f64) - (bounds.height as f64 / 2.0);
                        let new_camera_x = camera_x + mx / scale - mx / new_scale;
                        let new_camera_y = camera_y + my / scale - my / new_scale;

                        let new_center = (
                            y_to_lat(new_camera_y.clamp(0.0, TILE_SIZE), 0.0),
                            x_to_lon(new_camera_x.clamp(0.0, TILE_SIZE), 0.0),
                        );

                        // Update internal state immediately for next event in same frame
                        state.current_center = new_center;
                        state.current_zoom = new_zoom;

                        shell.publish(Message::MapZoom {
                            new_center,
                            new_zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if cursor.is_over(bounds) {
                    if let Some(position) = cursor.position() {
                        state.is_dragging = true;
                        state.press_position = Some(position);
                        state.last_cursor = Some(position);
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let was_dragging = state.is_dragging;
                let press_pos = state.press_position;
                let release_pos = cursor.position();

                state.is_dragging = false;
                state.press_position = None;
                state.last_cursor = None;

                if was_dragging {
                    // Minimal movement counts as a click
                    if let (Some(p1), Some(p2)) = (press_pos, release_pos) {
                        if (p1.x - p2.x).hypot(p1.y - p2.y) < 5.0 {
                            if let Some(world) = mouse_z0 {
                                if let Some(index) = self.hit_test(world, scale) {
                                    shell.publish(Message::SelectEvent(index));
                                }
                            }
                        }
                    }
                    return advanced::graphics::core::event::Status::Captured;
                }
            }
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last_pos) = state.last_cursor {
                        let delta = position - last_pos;
                        state.last_cursor = Some(position);

                        let new_wx = camera_x - delta.x as f64 / scale;
                        let new_wy = camera_y - delta.y as f64 / scale;

                        let half_vw = (bounds.width as f64 / 2.0) / scale;
                        let half_vh = (bounds.height as f64 / 2.0) / scale;

                        let clamped_wx = if half_vw * 2.0 >= TILE_SIZE {
                            TILE_SIZE / 2.0
                        } else {
                            new_wx.clamp(half_vw, TILE_SIZE - half_vw)
                        };
                        let clamped_wy = if half_vh * 2.0 >= TILE_SIZE {
                            TILE_SIZE / 2.0
                        } else {
                            new_wy.clamp(half_vh, TILE_SIZE - half_vh)
                        };

                        let new_center = (y_to_lat(clamped_wy, 0.0), x_to_lon(clamped_wx, 0.0));
                        state.current_center = new_center;

                        shell.publish(Message::MapZoom {
                            new_center,
                            new_zoom: current_zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }

                let hovered = mouse_z0.and_then(|world| self.hit_test(world, scale));
                if hovered != self.hovered_event {
                    shell.publish(Message::HoverEvent(hovered));
                }
            }
            _ => {}
        }

        advanced::graphics::core::event::Status::Ignored
    }

    fn mouse_interaction(
        &self,
        _tree: &widget::Tree,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        if self.hovered_event.is_some() && cursor.is_over(layout.bounds()) {
            mouse::Interaction::Pointer
        } else if cursor.is_over(layout.bounds()) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a, Theme, Renderer> From<MapView<'a>> for Element<'a, Message, Theme, Renderer>
where
    Theme: 'a,
    Renderer: 'a + renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn from(map_view: MapView<'a>) -> Self {
        Self::new(map_view)
    }
}
