use serde::{Deserialize, Serialize};

/// Which way pages advance on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl ReadingDirection {
    pub fn toggled(self) -> Self {
        match self {
            ReadingDirection::LeftToRight => ReadingDirection::RightToLeft,
            ReadingDirection::RightToLeft => ReadingDirection::LeftToRight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingDirection::LeftToRight => "Left to right",
            ReadingDirection::RightToLeft => "Right to left",
        }
    }
}

/// Input intent stripped of its source (wheel, key or tap)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Next,
    Previous,
}

/// Index delta for a gesture. Right-to-left reading inverts the sign.
pub fn gesture_delta(gesture: Gesture, direction: ReadingDirection) -> isize {
    match (gesture, direction) {
        (Gesture::Next, ReadingDirection::LeftToRight)
        | (Gesture::Previous, ReadingDirection::RightToLeft) => 1,
        (Gesture::Previous, ReadingDirection::LeftToRight)
        | (Gesture::Next, ReadingDirection::RightToLeft) => -1,
    }
}

/// Position within a sequence of `length` pages.
///
/// While `length > 0` the index stays in `0..length`; moves saturate at both
/// ends instead of wrapping. With `length == 0` there is no current page and
/// moves do nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    index: usize,
    length: usize,
}

impl PageCursor {
    pub fn new(length: usize) -> Self {
        Self { index: 0, length }
    }

    pub fn reset(&mut self, new_length: usize) {
        self.length = new_length;
        self.index = 0;
    }

    pub fn current(&self) -> Option<usize> {
        (self.length > 0).then_some(self.index)
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Move according to a gesture; returns true if the index changed
    pub fn advance_by_gesture(&mut self, gesture: Gesture, direction: ReadingDirection) -> bool {
        self.step(gesture_delta(gesture, direction))
    }

    pub fn step(&mut self, delta: isize) -> bool {
        if self.length == 0 {
            return false;
        }
        let last = self.length - 1;
        let target = self.index.saturating_add_signed(delta).min(last);
        let moved = target != self.index;
        self.index = target;
        moved
    }
}
