//! Raw pointer, touch and wheel events to abstract gestures.
//!
//! The adapter owns the only interaction state machine. Anything it cannot
//! make sense of (a zero-length drag, a second finger lifting that was never
//! down) simply produces no gesture.

use nalgebra::Vector2;

use crate::camera::OrbitCamera;

/// Screen pixels travelled before a press stops counting as a click.
const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Pixel position (y down) to normalised device coordinates (y up).
    pub fn to_ndc(&self, px: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            (px.x - self.x) / self.width * 2.0 - 1.0,
            1.0 - (px.y - self.y) / self.height * 2.0,
        )
    }

    pub fn to_pixels(&self, ndc: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            self.x + (ndc.x + 1.0) * 0.5 * self.width,
            self.y + (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawEvent {
    PointerDown(Vector2<f64>),
    PointerMove(Vector2<f64>),
    PointerUp(Vector2<f64>),
    /// Positive deltas zoom in.
    Wheel(f64),
    TouchStart { id: u64, pos: Vector2<f64> },
    TouchMove { id: u64, pos: Vector2<f64> },
    TouchEnd { id: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Rotate { dx: f64, dy: f64 },
    Zoom { factor: f64 },
    Hover { ndc: Vector2<f64> },
    Select { ndc: Vector2<f64> },
    Release,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
enum State {
    #[default]
    Idle,
    Rotating {
        origin: Vector2<f64>,
        last: Vector2<f64>,
        dragged: bool,
    },
    Pinching {
        a: (u64, Vector2<f64>),
        b: (u64, Vector2<f64>),
    },
}

#[derive(Clone, Debug, Default)]
pub struct GestureAdapter {
    state: State,
    /// Single touch currently driving `Rotating`, if any.
    touch: Option<u64>,
}

impl GestureAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Rotating { dragged: true, .. })
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.state, State::Pinching { .. })
    }

    pub fn handle(&mut self, event: RawEvent, viewport: &Viewport, camera: &OrbitCamera) -> Option<Gesture> {
        match event {
            RawEvent::PointerDown(pos) => self.press(pos),
            RawEvent::PointerMove(pos) => self.moved(pos, viewport),
            RawEvent::PointerUp(pos) => self.lift(pos, viewport),
            RawEvent::Wheel(delta) => {
                (delta.is_finite() && delta != 0.0).then(|| Gesture::Zoom { factor: camera.wheel_factor(delta) })
            }
            RawEvent::TouchStart { id, pos } => self.touch_start(id, pos),
            RawEvent::TouchMove { id, pos } => self.touch_move(id, pos, viewport),
            RawEvent::TouchEnd { id } => self.touch_end(id, viewport),
        }
    }

    fn press(&mut self, pos: Vector2<f64>) -> Option<Gesture> {
        self.state = State::Rotating { origin: pos, last: pos, dragged: false };
        None
    }

    fn moved(&mut self, pos: Vector2<f64>, viewport: &Viewport) -> Option<Gesture> {
        match &mut self.state {
            State::Idle => Some(Gesture::Hover { ndc: viewport.to_ndc(pos) }),
            State::Rotating { origin, last, dragged } => {
                let delta = pos - *last;
                if delta == Vector2::zeros() {
                    return None;
                }
                *last = pos;
                if !*dragged && (pos - *origin).norm() < CLICK_SLOP {
                    return None;
                }
                // The first qualifying move carries everything since the press.
                let delta = if *dragged { delta } else { pos - *origin };
                *dragged = true;
                Some(Gesture::Rotate { dx: delta.x, dy: delta.y })
            }
            State::Pinching { .. } => None,
        }
    }

    fn lift(&mut self, pos: Vector2<f64>, viewport: &Viewport) -> Option<Gesture> {
        match std::mem::take(&mut self.state) {
            State::Rotating { dragged: false, .. } => Some(Gesture::Select { ndc: viewport.to_ndc(pos) }),
            State::Rotating { dragged: true, .. } | State::Pinching { .. } => Some(Gesture::Release),
            State::Idle => None,
        }
    }

    fn touch_start(&mut self, id: u64, pos: Vector2<f64>) -> Option<Gesture> {
        match (self.state, self.touch) {
            (State::Idle, _) => {
                self.touch = Some(id);
                self.press(pos)
            }
            (State::Rotating { last, .. }, Some(first)) if first != id => {
                self.touch = None;
                self.state = State::Pinching { a: (first, last), b: (id, pos) };
                None
            }
            _ => None,
        }
    }

    fn touch_move(&mut self, id: u64, pos: Vector2<f64>, viewport: &Viewport) -> Option<Gesture> {
        if matches!(self.state, State::Rotating { .. }) {
            return if self.touch == Some(id) { self.moved(pos, viewport) } else { None };
        }
        let State::Pinching { a, b } = &mut self.state else {
            return None;
        };
        let before = (a.1 - b.1).norm();
        if a.0 == id {
            a.1 = pos;
        } else if b.0 == id {
            b.1 = pos;
        } else {
            return None;
        }
        let after = (a.1 - b.1).norm();
        if after <= f64::EPSILON || before <= f64::EPSILON || after == before {
            return None;
        }
        // Fingers spreading apart zoom in.
        Some(Gesture::Zoom { factor: before / after })
    }

    fn touch_end(&mut self, id: u64, viewport: &Viewport) -> Option<Gesture> {
        match self.state {
            State::Rotating { last, .. } if self.touch == Some(id) => {
                self.touch = None;
                self.lift(last, viewport)
            }
            State::Pinching { a, b } if a.0 == id || b.0 == id => {
                self.state = State::Idle;
                Some(Gesture::Release)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vector2<f64> {
        Vector2::new(x, y)
    }

    fn setup() -> (GestureAdapter, Viewport, OrbitCamera) {
        (GestureAdapter::new(), Viewport::new(0.0, 0.0, 800.0, 600.0), OrbitCamera::default())
    }

    #[test]
    fn click_selects_at_ndc() {
        let (mut input, vp, cam) = setup();
        assert_eq!(input.handle(RawEvent::PointerDown(v(400.0, 300.0)), &vp, &cam), None);
        let g = input.handle(RawEvent::PointerUp(v(400.0, 300.0)), &vp, &cam);
        assert_eq!(g, Some(Gesture::Select { ndc: v(0.0, 0.0) }));
        assert!(input.is_idle());
    }

    #[test]
    fn drag_rotates_then_releases() {
        let (mut input, vp, cam) = setup();
        input.handle(RawEvent::PointerDown(v(100.0, 100.0)), &vp, &cam);
        assert_eq!(input.handle(RawEvent::PointerMove(v(102.0, 100.0)), &vp, &cam), None);
        assert_eq!(
            input.handle(RawEvent::PointerMove(v(110.0, 95.0)), &vp, &cam),
            Some(Gesture::Rotate { dx: 10.0, dy: -5.0 })
        );
        assert_eq!(
            input.handle(RawEvent::PointerMove(v(111.0, 95.0)), &vp, &cam),
            Some(Gesture::Rotate { dx: 1.0, dy: 0.0 })
        );
        assert_eq!(input.handle(RawEvent::PointerUp(v(111.0, 95.0)), &vp, &cam), Some(Gesture::Release));
    }

    #[test]
    fn zero_length_drag_is_a_no_op() {
        let (mut input, vp, cam) = setup();
        input.handle(RawEvent::PointerDown(v(50.0, 50.0)), &vp, &cam);
        input.handle(RawEvent::PointerMove(v(70.0, 50.0)), &vp, &cam);
        assert_eq!(input.handle(RawEvent::PointerMove(v(70.0, 50.0)), &vp, &cam), None);
    }

    #[test]
    fn idle_moves_hover() {
        let (mut input, vp, cam) = setup();
        assert_eq!(
            input.handle(RawEvent::PointerMove(v(800.0, 0.0)), &vp, &cam),
            Some(Gesture::Hover { ndc: v(1.0, 1.0) })
        );
    }

    #[test]
    fn wheel_zooms_in_for_positive_delta() {
        let (mut input, vp, cam) = setup();
        let Some(Gesture::Zoom { factor }) = input.handle(RawEvent::Wheel(50.0), &vp, &cam) else {
            panic!("expected zoom");
        };
        assert!(factor < 1.0);
        assert_eq!(input.handle(RawEvent::Wheel(0.0), &vp, &cam), None);
    }

    #[test]
    fn pinch_spreading_zooms_in() {
        let (mut input, vp, cam) = setup();
        input.handle(RawEvent::TouchStart { id: 1, pos: v(100.0, 100.0) }, &vp, &cam);
        input.handle(RawEvent::TouchStart { id: 2, pos: v(200.0, 100.0) }, &vp, &cam);
        assert!(input.is_pinching());
        assert_eq!(
            input.handle(RawEvent::TouchMove { id: 2, pos: v(300.0, 100.0) }, &vp, &cam),
            Some(Gesture::Zoom { factor: 0.5 })
        );
        assert_eq!(input.handle(RawEvent::TouchEnd { id: 1 }, &vp, &cam), Some(Gesture::Release));
        assert!(input.is_idle());
        assert_eq!(input.handle(RawEvent::TouchEnd { id: 2 }, &vp, &cam), None);
    }

    #[test]
    fn single_touch_tap_selects() {
        let (mut input, vp, cam) = setup();
        input.handle(RawEvent::TouchStart { id: 9, pos: v(0.0, 600.0) }, &vp, &cam);
        assert_eq!(
            input.handle(RawEvent::TouchEnd { id: 9 }, &vp, &cam),
            Some(Gesture::Select { ndc: v(-1.0, -1.0) })
        );
    }

    #[test]
    fn viewport_round_trip() {
        let vp = Viewport::new(10.0, 20.0, 640.0, 480.0);
        let px = v(123.0, 456.0);
        assert!((vp.to_pixels(vp.to_ndc(px)) - px).norm() < 1e-9);
    }
}
