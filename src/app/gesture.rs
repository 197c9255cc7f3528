use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap { x: i32, y: i32 },
    Swipe { horizontal: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeRequest {
    pub origin: Point,
    pub horizontal: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingGestures {
    pub tap: Option<Point>,
    pub swipe: Option<SwipeRequest>,
}

impl PendingGestures {
    pub fn is_empty(&self) -> bool {
        self.tap.is_none() && self.swipe.is_none()
    }

    pub fn len(&self) -> usize {
        usize::from(self.tap.is_some()) + usize::from(self.swipe.is_some())
    }
}

#[derive(Debug, Default)]
struct Slots {
    tap: Option<Point>,
    swipe: Option<bool>,
    anchor: Point,
    coalesced: u64,
}

/// One slot per gesture kind; a newer request overwrites the older one.
#[derive(Debug, Default)]
pub struct GestureMailbox {
    slots: Mutex<Slots>,
}

impl GestureMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&self, gesture: Gesture) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let overwrote = match gesture {
            Gesture::Tap { x, y } => {
                let point = Point::new(x, y);
                slots.anchor = point;
                slots.tap.replace(point).is_some()
            }
            Gesture::Swipe { horizontal } => slots.swipe.replace(horizontal).is_some(),
        };
        if overwrote {
            slots.coalesced += 1;
        }
    }

    pub fn request_tap(&self, x: i32, y: i32) {
        self.offer(Gesture::Tap { x, y });
    }

    pub fn request_swipe(&self, horizontal: bool) {
        self.offer(Gesture::Swipe { horizontal });
    }

    pub fn drain(&self) -> PendingGestures {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let origin = slots.anchor;
        PendingGestures {
            tap: slots.tap.take(),
            swipe: slots
                .swipe
                .take()
                .map(|horizontal| SwipeRequest { origin, horizontal }),
        }
    }

    pub fn coalesced(&self) -> u64 {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .coalesced
    }
}
