//! Pointer/touch/wheel interaction as an explicit state machine.
//!
//! The controller owns the [`CameraState`] and is purely reactive: each
//! [`InputEvent`] is applied to completion and reports whether the camera
//! changed, so the caller can upload a new view transform and redraw.

use crate::{CameraState, Vec2};

/// Mouse button, already mapped to its orbit role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    /// Rotates (left mouse button).
    Primary,
    /// Pans (right mouse button).
    Secondary,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// Device input in window pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { button: PointerButton, position: Vec2 },
    PointerMove { position: Vec2 },
    PointerUp,
    /// `contacts` lists the contacts still down after the change.
    Touch { phase: TouchPhase, contacts: Vec<Vec2> },
    /// Positive zooms out.
    Wheel { delta: f32 },
}

/// Active gesture. Exactly one mode at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Rotating {
        last: Vec2,
    },
    /// `spread` is the last inter-contact distance of a two-finger pinch,
    /// `None` for a mouse pan.
    Panning {
        last: Vec2,
        spread: Option<f32>,
    },
}

/// Per-unit sensitivities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitSettings {
    /// Radians per pixel.
    pub rotate: f32,
    /// World units per pixel.
    pub pan: f32,
    /// Distance per pixel of pinch spread.
    pub pinch: f32,
    /// Distance per wheel unit.
    pub wheel: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            rotate: 0.01,
            pan: 0.01,
            pinch: 0.05,
            wheel: 0.01,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrbitController {
    camera: CameraState,
    gesture: Gesture,
    settings: OrbitSettings,
}

impl OrbitController {
    pub fn new(camera: CameraState, settings: OrbitSettings) -> Self {
        Self {
            camera,
            gesture: Gesture::Idle,
            settings,
        }
    }

    #[inline]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    #[inline]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Replace the camera with a fresh framing (new mesh). Ends any gesture.
    pub fn reset(&mut self, distance: f32) {
        self.camera = CameraState::framed(distance);
        self.gesture = Gesture::Idle;
    }

    /// Apply one event. Returns `true` if the camera changed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        let before = self.camera;

        match event {
            InputEvent::PointerDown { button, position } => self.pointer_down(*button, *position),
            InputEvent::PointerMove { position } => self.pointer_move(*position),
            InputEvent::PointerUp => self.gesture = Gesture::Idle,
            InputEvent::Touch { phase, contacts } => self.touch(*phase, contacts),
            InputEvent::Wheel { delta } => self.camera.dolly(delta * self.settings.wheel),
        }

        self.camera != before
    }

    fn pointer_down(&mut self, button: PointerButton, position: Vec2) {
        if self.gesture != Gesture::Idle {
            return;
        }
        self.gesture = match button {
            PointerButton::Primary => Gesture::Rotating { last: position },
            PointerButton::Secondary => Gesture::Panning {
                last: position,
                spread: None,
            },
            PointerButton::Other => Gesture::Idle,
        };
    }

    fn pointer_move(&mut self, position: Vec2) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Rotating { last } => {
                let delta = position - *last;
                *last = position;
                self.camera.rotation_y += delta.x * self.settings.rotate;
                self.camera.rotation_x += delta.y * self.settings.rotate;
            }
            Gesture::Panning { last, spread: None } => {
                let delta = position - *last;
                *last = position;
                self.camera.pan_x += delta.x * self.settings.pan;
                self.camera.pan_y -= delta.y * self.settings.pan;
            }
            // A pinch is driven by touch contacts only.
            Gesture::Panning { spread: Some(_), .. } => {}
        }
    }

    fn touch(&mut self, phase: TouchPhase, contacts: &[Vec2]) {
        match (phase, contacts) {
            (_, []) => self.gesture = Gesture::Idle,
            (TouchPhase::Move, [p]) => self.pointer_move(*p),
            (TouchPhase::Move, [a, b]) => {
                if let Gesture::Panning {
                    last,
                    spread: Some(spread),
                } = &mut self.gesture
                {
                    let current = a.distance(*b);
                    let delta = current - *spread;
                    *spread = current;
                    *last = (*a + *b) * 0.5;
                    self.camera.dolly(-delta * self.settings.pinch);
                }
            }
            (TouchPhase::Start | TouchPhase::End, [p]) => {
                self.gesture = Gesture::Rotating { last: *p };
            }
            (TouchPhase::Start | TouchPhase::End, [a, b]) => {
                self.gesture = Gesture::Panning {
                    last: (*a + *b) * 0.5,
                    spread: Some(a.distance(*b)),
                };
            }
            // Three or more contacts: keep whatever is in progress.
            _ => {}
        }
    }
}
