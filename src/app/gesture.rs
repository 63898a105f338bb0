use eframe::egui;
use std::f64::consts::{PI, TAU};
use std::time::{Duration, Instant};

use crate::model::LngLat;

use super::mapview::MapView;
use super::registry::OverlayRegistry;

const EDGE_PAN_INTERVAL: Duration = Duration::from_millis(50);

/// Where the rotation angle is measured from.
#[derive(Clone, Copy, Debug)]
enum RotationPivot {
    /// Angle of the segment between the first two contacts.
    TwoContact,
    /// Angle from the overlay's centroid (fixed for the gesture) to the
    /// pointer.
    Pointer { centroid: LngLat },
}

/// Tagged gesture state. At most one overlay occupies Dragging or Rotating
/// at any time; the preview fields are visual-only and are committed to the
/// registry exclusively on release.
#[derive(Clone, Copy, Debug)]
enum GestureState {
    Idle,
    Dragging {
        overlay_id: u64,
        start_geo: LngLat,
        start_offset: LngLat,
        start_rotation: f64,
        preview_offset: LngLat,
    },
    Rotating {
        overlay_id: u64,
        start_rotation: f64,
        /// Offset committed before the gesture; rotation never moves it.
        offset: LngLat,
        pivot: RotationPivot,
        /// Screen angle at the previous move, so each delta can be wrapped
        /// to the shortest arc before accumulating.
        last_angle: f64,
        /// Accumulated screen-space rotation since the gesture started.
        turned: f64,
    },
}

struct EdgePan {
    last_tick: Instant,
}

pub(super) struct GestureController {
    state: GestureState,
    edge_pan: Option<EdgePan>,
}

/// Shortest-arc wrap into [-π, π). Keeps a two-contact gesture that crosses
/// the atan2 branch cut from jumping by ~2π.
fn wrap_angle(a: f64) -> f64 {
    (a + PI).rem_euclid(TAU) - PI
}

fn measure_angle(
    map: &MapView,
    rect: egui::Rect,
    pivot: RotationPivot,
    contacts: &[egui::Pos2],
) -> Option<f64> {
    match pivot {
        RotationPivot::TwoContact => {
            if contacts.len() < 2 {
                return None;
            }
            let (a, b) = (contacts[0], contacts[1]);
            Some(((b.y - a.y) as f64).atan2((b.x - a.x) as f64))
        }
        RotationPivot::Pointer { centroid } => {
            let p = *contacts.first()?;
            let c = map.geo_to_screen(rect, centroid);
            Some(((p.y - c.y) as f64).atan2((p.x - c.x) as f64))
        }
    }
}

impl GestureController {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            edge_pan: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn active_overlay(&self) -> Option<u64> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Dragging { overlay_id, .. }
            | GestureState::Rotating { overlay_id, .. } => Some(overlay_id),
        }
    }

    pub fn mode_label(&self) -> &'static str {
        match self.state {
            GestureState::Idle => "idle",
            GestureState::Dragging { .. } => "dragging",
            GestureState::Rotating { .. } => "rotating",
        }
    }

    /// Preview transform for an overlay, if it is the gesture target:
    /// `(offset, rotation_radians)` to render instead of the committed pair.
    pub fn preview_for(&self, id: u64) -> Option<(LngLat, f64)> {
        match self.state {
            GestureState::Dragging {
                overlay_id,
                start_rotation,
                preview_offset,
                ..
            } if overlay_id == id => Some((preview_offset, start_rotation)),
            GestureState::Rotating {
                overlay_id,
                start_rotation,
                offset,
                turned,
                ..
            } if overlay_id == id => Some((offset, start_rotation - turned)),
            _ => None,
        }
    }

    /// Primary press. Starts a gesture only over the overlay that is both
    /// selected and edit-enabled; anything else is a silent no-op, as is any
    /// press while another gesture holds the lock.
    pub fn on_press(
        &mut self,
        registry: &OverlayRegistry,
        map: &mut MapView,
        rect: egui::Rect,
        contacts: &[egui::Pos2],
        rotate_modifier: bool,
    ) {
        if !self.is_idle() {
            return;
        }
        // Any contact landing on the overlay starts the gesture.
        let mut target = None;
        for &c in contacts {
            let Ok(geo) = map.screen_to_geo(rect, c) else {
                continue;
            };
            if let Some(id) = registry.hit_test(geo, |_| None) {
                target = Some((id, geo));
                break;
            }
        }
        let Some((hit, geo)) = target else {
            return;
        };
        if registry.selected_id() != Some(hit) {
            return;
        }
        let Some(overlay) = registry.get(hit) else {
            return;
        };
        if !overlay.edit_enabled {
            return;
        }

        if contacts.len() >= 2 || rotate_modifier {
            let pivot = if contacts.len() >= 2 {
                RotationPivot::TwoContact
            } else {
                RotationPivot::Pointer {
                    centroid: overlay.current_centroid,
                }
            };
            let Some(angle) = measure_angle(map, rect, pivot, contacts) else {
                return;
            };
            self.state = GestureState::Rotating {
                overlay_id: hit,
                start_rotation: overlay.rotation_radians,
                offset: overlay.offset,
                pivot,
                last_angle: angle,
                turned: 0.0,
            };
        } else {
            self.state = GestureState::Dragging {
                overlay_id: hit,
                start_geo: geo,
                start_offset: overlay.offset,
                start_rotation: overlay.rotation_radians,
                preview_offset: overlay.offset,
            };
        }
        self.edge_pan = Some(EdgePan {
            last_tick: Instant::now(),
        });
        map.set_default_panning_enabled(false);
    }

    /// Pointer/contact movement. The preview is always recomputed against
    /// the fixed start snapshot, never compounded across move events.
    pub fn on_move(
        &mut self,
        registry: &OverlayRegistry,
        map: &MapView,
        rect: egui::Rect,
        contacts: &[egui::Pos2],
        rotate_modifier: bool,
    ) {
        match &mut self.state {
            GestureState::Idle => {}
            GestureState::Dragging {
                overlay_id,
                start_geo,
                start_offset,
                preview_offset,
                ..
            } => {
                if contacts.len() >= 2 || rotate_modifier {
                    // Mode switch: the uncommitted drag preview is discarded
                    // and rotation baselines on the overlay's committed state.
                    let id = *overlay_id;
                    let Some(overlay) = registry.get(id) else {
                        return;
                    };
                    let pivot = if contacts.len() >= 2 {
                        RotationPivot::TwoContact
                    } else {
                        RotationPivot::Pointer {
                            centroid: overlay.current_centroid,
                        }
                    };
                    let Some(angle) = measure_angle(map, rect, pivot, contacts) else {
                        return;
                    };
                    self.state = GestureState::Rotating {
                        overlay_id: id,
                        start_rotation: overlay.rotation_radians,
                        offset: overlay.offset,
                        pivot,
                        last_angle: angle,
                        turned: 0.0,
                    };
                    return;
                }
                let Some(&first) = contacts.first() else {
                    return;
                };
                match map.screen_to_geo(rect, first) {
                    Ok(geo) => *preview_offset = *start_offset + (geo - *start_geo),
                    // Freeze at the last good preview; the gesture survives.
                    Err(_) => tracing::debug!("drag move outside projection domain dropped"),
                }
            }
            GestureState::Rotating {
                pivot,
                last_angle,
                turned,
                ..
            } => {
                let Some(angle) = measure_angle(map, rect, *pivot, contacts) else {
                    return;
                };
                let delta = wrap_angle(angle - *last_angle);
                *last_angle = angle;
                *turned += delta;
            }
        }
    }

    /// Release of all contacts: commits the preview through the registry
    /// (recomputed there from the original geometry) and returns to Idle.
    pub fn on_release(&mut self, registry: &mut OverlayRegistry, map: &mut MapView) {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            GestureState::Idle => {}
            GestureState::Dragging {
                overlay_id,
                start_rotation,
                preview_offset,
                ..
            } => registry.set_transform(overlay_id, preview_offset, start_rotation),
            GestureState::Rotating {
                overlay_id,
                start_rotation,
                offset,
                turned,
                ..
            } => {
                // Screen y grows downward, so the screen-space turn is
                // negated before it becomes geographic rotation.
                registry.set_transform(overlay_id, offset, start_rotation - turned);
            }
        }
        self.edge_pan = None;
        map.set_default_panning_enabled(true);
    }

    /// Aborts the gesture, discarding the preview without committing.
    pub fn cancel(&mut self, map: &mut MapView) {
        self.state = GestureState::Idle;
        self.edge_pan = None;
        map.set_default_panning_enabled(true);
    }

    /// Called by the registry when an overlay is removed, in the same call
    /// as the removal itself.
    pub fn release_if(&mut self, id: u64, map: &mut MapView) {
        if self.active_overlay() == Some(id) {
            self.cancel(map);
        }
    }

    /// Continuous pan toward viewport edges while a gesture is active and
    /// the pointer sits inside the margin. The ticker lives in `edge_pan`,
    /// which only exists between press and release.
    pub fn tick_edge_pan(
        &mut self,
        map: &mut MapView,
        rect: egui::Rect,
        pointer: egui::Pos2,
        margin: f32,
        step: f32,
        now: Instant,
    ) {
        if self.is_idle() {
            return;
        }
        let Some(edge_pan) = &mut self.edge_pan else {
            return;
        };
        let mut dx = 0.0f32;
        let mut dy = 0.0f32;
        if pointer.x <= rect.left() + margin {
            dx = -step;
        } else if pointer.x >= rect.right() - margin {
            dx = step;
        }
        if pointer.y <= rect.top() + margin {
            dy = -step;
        } else if pointer.y >= rect.bottom() - margin {
            dy = step;
        }
        if dx == 0.0 && dy == 0.0 {
            edge_pan.last_tick = now;
            return;
        }
        if now.duration_since(edge_pan.last_tick) < EDGE_PAN_INTERVAL {
            return;
        }
        edge_pan.last_tick = now;
        map.pan_by(dx, dy);
    }
}
