use eframe::egui::{Event, PointerButton, Pos2, Rect, TouchPhase, Ui};
use log::{debug, info};

use crate::layout::LayoutStrategy;

use super::super::gesture::{Gesture, PointerEvent, PointerId, PointerPhase, PointerTarget};
use super::super::render_utils::node_radius;
use super::{GraphEngine, GraphHost};

pub(super) const OVERLAY_RADIUS: f32 = 18.0;
const HIT_SLOP: f32 = 6.0;
const DRILL_DOWN_SCALE: f32 = 1.18;
const DRAG_ALPHA_TARGET: f32 = 0.3;
const MOUSE_POINTER: PointerId = 0;
const TOUCH_POINTER_BASE: PointerId = 1;

impl GraphEngine {
    /// Feeds one pointer event through the gesture recognizer and applies
    /// whatever it produces. Hit testing happens on press only.
    pub(in crate::app) fn handle_pointer(
        &mut self,
        event: PointerEvent,
        host: &mut dyn GraphHost,
    ) {
        let target = match event.phase {
            PointerPhase::Down => self.target_at(event.pos),
            _ => PointerTarget::Empty,
        };
        for gesture in self.gestures.handle(event, target) {
            self.apply_gesture(gesture, host);
        }
    }

    /// Fires long-presses that came due without any pointer movement.
    pub(in crate::app) fn poll(&mut self, now_ms: f64, host: &mut dyn GraphHost) {
        for gesture in self.gestures.poll(now_ms) {
            self.apply_gesture(gesture, host);
        }
    }

    pub(in crate::app) fn next_deadline(&self) -> Option<f64> {
        self.gestures.next_deadline()
    }

    /// Clears selection, focus and drill-down, recenters the camera and
    /// notifies the host once.
    pub(in crate::app) fn reset(&mut self, host: &mut dyn GraphHost) {
        self.clear_interaction(host);
        self.camera.reset();
        self.release_all_pins();
        host.on_reset();
    }

    pub(in crate::app) fn zoom_wheel(&mut self, anchor: Pos2, scroll: f32) {
        let rect = self.scene_rect();
        self.camera.zoom_wheel(rect, anchor, scroll);
    }

    /// The layout lives in viewport space; the scene rect maps it onto the
    /// allocated area even when the viewport size is frozen.
    pub(super) fn scene_rect(&self) -> Rect {
        Rect::from_min_size(self.rect.min, self.viewport)
    }

    pub(super) fn to_screen(&self, world: Pos2) -> Pos2 {
        self.camera.world_to_screen(self.scene_rect(), world)
    }

    fn to_world(&self, screen: Pos2) -> Pos2 {
        self.camera.screen_to_world(self.scene_rect(), screen)
    }

    /// Screen position of the resonance overlay while a pair is selected.
    pub(super) fn overlay_center(&self) -> Option<Pos2> {
        self.resonance.as_ref()?;
        let anchor = self.selection.overlay_anchor(&self.positions)?;
        Some(self.to_screen(anchor))
    }

    pub(super) fn target_at(&self, screen: Pos2) -> PointerTarget {
        let scale = self.camera.scale();
        if let Some(center) = self.overlay_center()
            && center.distance(screen) <= OVERLAY_RADIUS * scale
        {
            return PointerTarget::Overlay;
        }

        self.snapshot
            .nodes()
            .iter()
            .filter_map(|node| {
                let position = self.to_screen(*self.positions.get(&node.id)?);
                let distance = position.distance(screen);
                let reach = node_radius(node.category, node.weight) * scale + HIT_SLOP;
                (distance <= reach).then_some((node, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(PointerTarget::Empty, |(node, _)| {
                PointerTarget::Node(node.id.clone())
            })
    }

    fn apply_gesture(&mut self, gesture: Gesture, host: &mut dyn GraphHost) {
        match gesture {
            Gesture::Tap { id } => {
                if self.drill_down.as_ref().is_some_and(|drill| drill.id != id) {
                    self.leave_drill_down();
                }
                if self.focus.as_deref() != Some(id.as_str()) {
                    self.focus = Some(id);
                    self.notify_focus(host);
                }
            }
            Gesture::DoubleTap { id } => {
                self.selection.toggle(&id);
                host.on_selection_change(self.selection.ids());
                self.sync_resonance(host);
            }
            Gesture::LongPress { id, .. } => {
                debug!("drill-down on {id}");
                self.start_drill_down(&id);
                self.camera.set_scale(DRILL_DOWN_SCALE);
                if self.focus.as_deref() != Some(id.as_str()) {
                    self.focus = Some(id);
                    self.notify_focus(host);
                }
            }
            Gesture::OverlayLongPress => {
                if let Some(id) = self.stabilize_resonance() {
                    info!("resonance kept as {id}");
                }
            }
            Gesture::EmptyTap { .. } => {
                host.on_empty_tap();
                let anything_set =
                    !self.selection.is_empty() || self.focus.is_some() || self.drill_down.is_some();
                if anything_set {
                    self.clear_interaction(host);
                    host.on_reset();
                }
            }
            Gesture::DragStart { id, pos } => {
                if let Some(simulation) = self.simulation.as_mut() {
                    simulation.set_alpha_target(DRAG_ALPHA_TARGET);
                }
                self.pin_node(&id, pos);
            }
            Gesture::DragMove { id, pos } => self.pin_node(&id, pos),
            Gesture::DragEnd { id } => self.release_node(&id),
            Gesture::Pan { delta } => self.camera.pan_by(delta),
            Gesture::PinchStart { distance } => self.camera.begin_pinch(distance),
            Gesture::Pinch { distance } => {
                self.camera.update_pinch(distance);
            }
            Gesture::PinchEnd => self.camera.end_pinch(),
        }
    }

    fn notify_focus(&self, host: &mut dyn GraphHost) {
        let node = self.focus.as_deref().and_then(|id| self.snapshot.node(id));
        host.on_focus_change(node);
    }

    fn clear_interaction(&mut self, host: &mut dyn GraphHost) {
        if self.selection.clear() {
            host.on_selection_change(&[]);
        }
        self.resonance = None;
        self.leave_drill_down();
        if self.focus.take().is_some() {
            host.on_focus_change(None);
        }
    }

    pub(super) fn leave_drill_down(&mut self) {
        if let Some(drill) = self.drill_down.take() {
            self.camera.set_scale(drill.return_scale);
        }
    }

    fn pin_node(&mut self, id: &str, screen: Pos2) {
        let world = self.to_world(screen);
        match self.strategy {
            LayoutStrategy::Orbital => {
                self.pins.insert(id.to_owned(), world);
            }
            LayoutStrategy::Physics => {
                if let Some(simulation) = self.simulation.as_mut() {
                    simulation.pin(id, world);
                }
            }
        }
        if let Some(position) = self.positions.get_mut(id) {
            *position = world;
        }
    }

    fn release_node(&mut self, id: &str) {
        self.pins.remove(id);
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.unpin(id);
            simulation.set_alpha_target(0.0);
        }
    }

    fn release_all_pins(&mut self) {
        let mut released = !self.pins.is_empty();
        self.pins.clear();
        if let Some(simulation) = self.simulation.as_mut() {
            released |= simulation.unpin_all();
            // A settled simulation with nothing pinned stays settled.
            if released {
                simulation.set_alpha_target(0.0);
            }
        }
    }

    /// Translates this frame's raw egui input into pointer events. Touch
    /// events win over the mouse emulation egui derives from them.
    pub(super) fn collect_pointer_events(
        &mut self,
        ui: &Ui,
        rect: Rect,
        now_ms: f64,
    ) -> Vec<PointerEvent> {
        let events = ui.input(|input| input.events.clone());
        let has_touch = events
            .iter()
            .any(|event| matches!(event, Event::Touch { .. }));

        let mut pointer_events = Vec::new();
        for event in events {
            let translated = match event {
                Event::Touch { id, phase, pos, .. } => {
                    let phase = match phase {
                        TouchPhase::Start => PointerPhase::Down,
                        TouchPhase::Move => PointerPhase::Move,
                        TouchPhase::End => PointerPhase::Up,
                        TouchPhase::Cancel => PointerPhase::Cancel,
                    };
                    if phase == PointerPhase::Down && !rect.contains(pos) {
                        continue;
                    }
                    Some((TOUCH_POINTER_BASE + id.0, phase, pos))
                }
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    ..
                } if !has_touch => {
                    if pressed && rect.contains(pos) {
                        self.mouse_down = true;
                        Some((MOUSE_POINTER, PointerPhase::Down, pos))
                    } else if !pressed && self.mouse_down {
                        self.mouse_down = false;
                        Some((MOUSE_POINTER, PointerPhase::Up, pos))
                    } else {
                        None
                    }
                }
                Event::PointerMoved(pos) if !has_touch && self.mouse_down => {
                    Some((MOUSE_POINTER, PointerPhase::Move, pos))
                }
                Event::PointerGone if self.mouse_down => {
                    self.mouse_down = false;
                    Some((MOUSE_POINTER, PointerPhase::Cancel, rect.center()))
                }
                _ => None,
            };

            if let Some((pointer_id, phase, pos)) = translated {
                pointer_events.push(PointerEvent {
                    pointer_id,
                    phase,
                    pos,
                    time_ms: now_ms,
                });
            }
        }
        pointer_events
    }
}
