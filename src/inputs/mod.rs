pub mod gestures;

pub use gestures::{
    WHEEL_NOTCH, gesture_from_key, gesture_from_mouse, gesture_from_tap, gesture_from_wheel_delta,
};
