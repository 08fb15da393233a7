//! Translation of raw input into page-turn gestures.
//!
//! Every modality yields the on-screen intent only (toward the start or the
//! end of the screen). The reading direction is applied later, by the cursor,
//! so flipping it reverses all three sources alike.

use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};

use crate::navigation::Gesture;

/// Angle delta of one wheel notch (15 degrees in eighths of a degree)
pub const WHEEL_NOTCH: i32 = 120;

pub fn gesture_from_key(code: KeyCode) -> Option<Gesture> {
    match code {
        KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
            Some(Gesture::Previous)
        }
        KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
            Some(Gesture::Next)
        }
        _ => None,
    }
}

/// Wheel rotated away from the user (positive steps) goes back a page
pub fn gesture_from_wheel_delta(angle_delta_y: i32) -> Gesture {
    let degrees = f64::from(angle_delta_y) / 8.0;
    let steps = degrees / 15.0;
    if steps > 0.0 {
        Gesture::Previous
    } else {
        Gesture::Next
    }
}

/// Taps in the left half of the viewport go back, the right half goes forward
pub fn gesture_from_tap(column: u16, viewport_width: u16) -> Gesture {
    if u32::from(column) * 2 < u32::from(viewport_width) {
        Gesture::Previous
    } else {
        Gesture::Next
    }
}

pub fn gesture_from_mouse(event: &MouseEvent, viewport_width: u16) -> Option<Gesture> {
    match event.kind {
        MouseEventKind::ScrollUp => Some(gesture_from_wheel_delta(WHEEL_NOTCH)),
        MouseEventKind::ScrollDown => Some(gesture_from_wheel_delta(-WHEEL_NOTCH)),
        MouseEventKind::Down(MouseButton::Left) => {
            Some(gesture_from_tap(event.column, viewport_width))
        }
        _ => None,
    }
}
