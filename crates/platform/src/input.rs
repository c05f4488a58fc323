//! Translate winit window events into [`InputEvent`]s.
//!
//! winit reports touches one contact at a time; the mapper keeps the set of
//! live contacts so every emitted touch event carries all of them.

use std::collections::BTreeMap;

use corelib::{InputEvent, PointerButton, TouchPhase, Vec2, vec2};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pixels per wheel line, matching browser `deltaMode` line scaling.
pub const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Debug, Default)]
pub struct InputMapper {
    cursor: Vec2,
    contacts: BTreeMap<u64, Vec2>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one window event. Returns `None` for events the camera ignores.
    pub fn map(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => Some(self.cursor_moved(*position)),
            WindowEvent::MouseInput { state, button, .. } => {
                Some(self.mouse_button(*state, *button))
            }
            WindowEvent::MouseWheel { delta, .. } => Some(self.wheel(*delta)),
            WindowEvent::Touch(touch) => Some(self.touch(touch.phase, touch.id, touch.location)),
            WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerUp),
            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> InputEvent {
        self.cursor = to_vec2(position);
        InputEvent::PointerMove {
            position: self.cursor,
        }
    }

    /// Presses start a gesture at the last cursor position; any release ends it.
    pub fn mouse_button(&mut self, state: ElementState, button: MouseButton) -> InputEvent {
        match state {
            ElementState::Pressed => InputEvent::PointerDown {
                button: match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    _ => PointerButton::Other,
                },
                position: self.cursor,
            },
            ElementState::Released => InputEvent::PointerUp,
        }
    }

    /// Positive result zooms out, so scrolling towards the user moves away.
    pub fn wheel(&self, delta: MouseScrollDelta) -> InputEvent {
        let delta = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y * PIXELS_PER_LINE,
            MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
        };
        InputEvent::Wheel { delta }
    }

    pub fn touch(
        &mut self,
        phase: winit::event::TouchPhase,
        id: u64,
        location: PhysicalPosition<f64>,
    ) -> InputEvent {
        use winit::event::TouchPhase as Phase;

        let phase = match phase {
            Phase::Started => {
                self.contacts.insert(id, to_vec2(location));
                TouchPhase::Start
            }
            Phase::Moved => {
                self.contacts.insert(id, to_vec2(location));
                TouchPhase::Move
            }
            Phase::Ended | Phase::Cancelled => {
                self.contacts.remove(&id);
                TouchPhase::End
            }
        };
        InputEvent::Touch {
            phase,
            contacts: self.contacts.values().copied().collect(),
        }
    }

    pub fn active_contacts(&self) -> usize {
        self.contacts.len()
    }
}

fn to_vec2(p: PhysicalPosition<f64>) -> Vec2 {
    vec2(p.x as f32, p.y as f32)
}
