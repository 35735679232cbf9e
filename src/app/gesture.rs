//! Pointer streams to gestures. Time is supplied by the caller; long-press
//! deadlines only fire from [`GestureRecognizer::poll`], so the state machine
//! runs the same under egui and under synthetic test events.

use std::collections::BTreeMap;

use eframe::egui::{Pos2, Vec2};

pub(in crate::app) type PointerId = u64;

const LONG_PRESS_MS: f64 = 500.0;
const OVERLAY_LONG_PRESS_MS: f64 = 560.0;
const DOUBLE_TAP_MS: f64 = 320.0;
const MOVE_THRESHOLD: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct PointerEvent {
    pub pointer_id: PointerId,
    pub phase: PointerPhase,
    pub pos: Pos2,
    pub time_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum PointerTarget {
    Node(String),
    Overlay,
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum Gesture {
    Tap { id: String },
    DoubleTap { id: String },
    LongPress { id: String, pos: Pos2 },
    OverlayLongPress,
    EmptyTap { pos: Pos2 },
    DragStart { id: String, pos: Pos2 },
    DragMove { id: String, pos: Pos2 },
    DragEnd { id: String },
    Pan { delta: Vec2 },
    PinchStart { distance: f32 },
    Pinch { distance: f32 },
    PinchEnd,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PressMode {
    Pending { deadline_ms: Option<f64> },
    LongPressed,
    Dragging,
    Panning,
    /// Tracked but inert: pinch partners, extra fingers, blocked drags.
    Suppressed,
}

#[derive(Clone, Debug)]
struct Press {
    target: PointerTarget,
    origin: Pos2,
    last: Pos2,
    mode: PressMode,
}

#[derive(Default)]
pub(in crate::app) struct GestureRecognizer {
    presses: BTreeMap<PointerId, Press>,
    pinch: Option<[PointerId; 2]>,
    last_tap: Option<(String, f64)>,
}

impl GestureRecognizer {
    pub fn handle(&mut self, event: PointerEvent, target: PointerTarget) -> Vec<Gesture> {
        let mut gestures = self.poll(event.time_ms);
        match event.phase {
            PointerPhase::Down => self.pointer_down(event, target, &mut gestures),
            PointerPhase::Move => self.pointer_move(event, &mut gestures),
            PointerPhase::Up => self.pointer_up(event, &mut gestures),
            PointerPhase::Cancel => self.pointer_cancel(event.pointer_id, &mut gestures),
        }
        gestures
    }

    /// Fires every long-press whose deadline is at or before `now_ms`.
    pub fn poll(&mut self, now_ms: f64) -> Vec<Gesture> {
        let mut gestures = Vec::new();
        for press in self.presses.values_mut() {
            let PressMode::Pending {
                deadline_ms: Some(deadline),
            } = press.mode
            else {
                continue;
            };
            if deadline > now_ms {
                continue;
            }

            press.mode = PressMode::LongPressed;
            match &press.target {
                PointerTarget::Node(id) => gestures.push(Gesture::LongPress {
                    id: id.clone(),
                    pos: press.last,
                }),
                PointerTarget::Overlay => gestures.push(Gesture::OverlayLongPress),
                PointerTarget::Empty => {}
            }
        }
        gestures
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.presses
            .values()
            .filter_map(|press| match press.mode {
                PressMode::Pending { deadline_ms } => deadline_ms,
                _ => None,
            })
            .min_by(f64::total_cmp)
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.presses.is_empty()
    }

    /// Forgets every pointer, deadline and remembered tap.
    pub fn teardown(&mut self) {
        self.presses.clear();
        self.pinch = None;
        self.last_tap = None;
    }

    fn pointer_down(
        &mut self,
        event: PointerEvent,
        target: PointerTarget,
        out: &mut Vec<Gesture>,
    ) {
        // A Down on a live id means its Up or Cancel was lost.
        if self.presses.contains_key(&event.pointer_id) {
            self.pointer_cancel(event.pointer_id, out);
        }

        let existing = self.presses.keys().next().copied();
        if self.pinch.is_none()
            && let Some(other_id) = existing
            && let Some(other) = self.presses.get_mut(&other_id)
        {
            if let (PressMode::Dragging, PointerTarget::Node(id)) = (other.mode, &other.target) {
                out.push(Gesture::DragEnd { id: id.clone() });
            }
            other.mode = PressMode::Suppressed;
            out.push(Gesture::PinchStart {
                distance: other.last.distance(event.pos),
            });
            self.pinch = Some([other_id, event.pointer_id]);
            self.presses
                .insert(event.pointer_id, Self::suppressed(target, event.pos));
            return;
        }

        if !self.presses.is_empty() {
            self.presses
                .insert(event.pointer_id, Self::suppressed(target, event.pos));
            return;
        }

        let deadline_ms = match target {
            PointerTarget::Node(_) => Some(event.time_ms + LONG_PRESS_MS),
            PointerTarget::Overlay => Some(event.time_ms + OVERLAY_LONG_PRESS_MS),
            PointerTarget::Empty => None,
        };
        self.presses.insert(
            event.pointer_id,
            Press {
                target,
                origin: event.pos,
                last: event.pos,
                mode: PressMode::Pending { deadline_ms },
            },
        );
    }

    fn pointer_move(&mut self, event: PointerEvent, out: &mut Vec<Gesture>) {
        if let Some(pair) = self.pinch
            && pair.contains(&event.pointer_id)
        {
            if let Some(press) = self.presses.get_mut(&event.pointer_id) {
                press.last = event.pos;
            }
            if let (Some(first), Some(second)) =
                (self.presses.get(&pair[0]), self.presses.get(&pair[1]))
            {
                out.push(Gesture::Pinch {
                    distance: first.last.distance(second.last),
                });
            }
            return;
        }

        let drag_blocked = match self.presses.get(&event.pointer_id) {
            Some(Press {
                target: PointerTarget::Node(id),
                ..
            }) => self.is_dragging(id, event.pointer_id),
            _ => false,
        };
        let Some(press) = self.presses.get_mut(&event.pointer_id) else {
            return;
        };
        let delta = event.pos - press.last;
        press.last = event.pos;

        match press.mode {
            PressMode::Pending { .. } => {
                if press.origin.distance(event.pos) <= MOVE_THRESHOLD {
                    return;
                }
                match &press.target {
                    PointerTarget::Node(_) if drag_blocked => {
                        press.mode = PressMode::Suppressed;
                    }
                    PointerTarget::Node(id) => {
                        press.mode = PressMode::Dragging;
                        out.push(Gesture::DragStart {
                            id: id.clone(),
                            pos: event.pos,
                        });
                    }
                    PointerTarget::Overlay | PointerTarget::Empty => {
                        press.mode = PressMode::Panning;
                        out.push(Gesture::Pan {
                            delta: event.pos - press.origin,
                        });
                    }
                }
            }
            PressMode::Dragging => {
                if let PointerTarget::Node(id) = &press.target {
                    out.push(Gesture::DragMove {
                        id: id.clone(),
                        pos: event.pos,
                    });
                }
            }
            PressMode::Panning => out.push(Gesture::Pan { delta }),
            PressMode::LongPressed | PressMode::Suppressed => {}
        }
    }

    fn pointer_up(&mut self, event: PointerEvent, out: &mut Vec<Gesture>) {
        if self.end_pinch_with(event.pointer_id, out) {
            return;
        }
        let Some(press) = self.presses.remove(&event.pointer_id) else {
            return;
        };

        match (press.mode, press.target) {
            (PressMode::Pending { .. }, PointerTarget::Node(id)) => {
                let double = self.last_tap.as_ref().is_some_and(|(last_id, last_ms)| {
                    *last_id == id && event.time_ms - last_ms <= DOUBLE_TAP_MS
                });
                if double {
                    self.last_tap = None;
                    out.push(Gesture::DoubleTap { id });
                } else {
                    self.last_tap = Some((id.clone(), event.time_ms));
                    out.push(Gesture::Tap { id });
                }
            }
            (PressMode::Pending { .. }, PointerTarget::Empty) => {
                self.last_tap = None;
                out.push(Gesture::EmptyTap { pos: event.pos });
            }
            (PressMode::Dragging, PointerTarget::Node(id)) => out.push(Gesture::DragEnd { id }),
            _ => {}
        }
    }

    fn pointer_cancel(&mut self, pointer_id: PointerId, out: &mut Vec<Gesture>) {
        if self.end_pinch_with(pointer_id, out) {
            return;
        }
        if let Some(Press {
            mode: PressMode::Dragging,
            target: PointerTarget::Node(id),
            ..
        }) = self.presses.remove(&pointer_id)
        {
            out.push(Gesture::DragEnd { id });
        }
    }

    fn end_pinch_with(&mut self, pointer_id: PointerId, out: &mut Vec<Gesture>) -> bool {
        let Some(pair) = self.pinch else {
            return false;
        };
        if !pair.contains(&pointer_id) {
            return false;
        }

        self.presses.remove(&pointer_id);
        self.pinch = None;
        out.push(Gesture::PinchEnd);
        true
    }

    fn is_dragging(&self, id: &str, except: PointerId) -> bool {
        self.presses.iter().any(|(&pointer_id, press)| {
            pointer_id != except
                && press.mode == PressMode::Dragging
                && matches!(&press.target, PointerTarget::Node(other) if other == id)
        })
    }

    fn suppressed(target: PointerTarget, pos: Pos2) -> Press {
        Press {
            target,
            origin: pos,
            last: pos,
            mode: PressMode::Suppressed,
        }
    }
}
