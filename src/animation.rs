//! Short-lived window animations (minimize, restore, snap).
//!
//! Animations hold the window id, not a live reference to the window, so
//! deleting a window is a simple filter over the animation list.

use crate::geometry::Rect;
use crate::session::WindowId;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    Minimize,
    Restore,
    Snap,
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub kind: AnimationKind,
    pub window_id: WindowId,
    pub start: Rect,
    pub end: Rect,
    pub started_at: Instant,
    pub duration: Duration,
    pub progress: f32,
    pub complete: bool,
}

impl Animation {
    pub fn new(kind: AnimationKind, window_id: WindowId, start: Rect, end: Rect, duration: Duration) -> Self {
        Self { kind, window_id, start, end, started_at: Instant::now(), duration, progress: 0.0, complete: false }
    }

    /// Advances progress from elapsed wall-clock time and marks the
    /// animation complete once progress reaches 1.0.
    pub fn advance(&mut self) {
        if self.complete {
            return;
        }
        let elapsed = self.started_at.elapsed().as_secs_f32();
        let total = self.duration.as_secs_f32().max(f32::EPSILON);
        self.progress = (elapsed / total).min(1.0);
        if self.progress >= 1.0 {
            self.complete = true;
        }
    }

    /// Eased (ease-out-cubic) interpolation between start and end geometry
    /// for the current progress.
    pub fn current_rect(&self) -> Rect {
        let t = ease_out_cubic(self.progress);
        lerp_rect(self.start, self.end, t)
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

fn lerp(a: i32, b: i32, t: f32) -> i32 {
    a + ((b - a) as f32 * t).round() as i32
}

fn lerp_u16(a: u16, b: u16, t: f32) -> u16 {
    (a as i32 + ((b as i32 - a as i32) as f32 * t).round() as i32).max(0) as u16
}

fn lerp_rect(a: Rect, b: Rect, t: f32) -> Rect {
    Rect::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp_u16(a.width, b.width, t), lerp_u16(a.height, b.height, t))
}

/// Holds all in-flight animations. Completed ones are pruned by the
/// scheduler after dispatching any follow-up (e.g. focus shift on minimize
/// completion).
#[derive(Default)]
pub struct AnimationSet {
    animations: Vec<Animation>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self { animations: Vec::new() }
    }

    pub fn push(&mut self, animation: Animation) {
        self.animations.retain(|a| a.window_id != animation.window_id);
        self.animations.push(animation);
    }

    pub fn advance_all(&mut self) {
        for a in &mut self.animations {
            a.advance();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animation> {
        self.animations.iter()
    }

    /// Drains completed animations, returning them so the caller can react
    /// (e.g. shift focus after a minimize animation finishes).
    pub fn drain_completed(&mut self) -> Vec<Animation> {
        let (done, remaining): (Vec<_>, Vec<_>) = self.animations.drain(..).partition(|a| a.complete);
        self.animations = remaining;
        done
    }

    /// After deleting a window, no animation may reference it.
    pub fn remove_for_window(&mut self, window_id: WindowId) {
        self.animations.retain(|a| a.window_id != window_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_completes_after_duration() {
        let mut anim = Animation::new(
            AnimationKind::Snap,
            1,
            Rect::new(0, 0, 10, 10),
            Rect::new(0, 0, 20, 20),
            Duration::from_millis(1),
        );
        std::thread::sleep(Duration::from_millis(5));
        anim.advance();
        assert!(anim.complete);
        assert_eq!(anim.current_rect(), Rect::new(0, 0, 20, 20));
    }

    #[test]
    fn remove_for_window_drops_matching_animation() {
        let mut set = AnimationSet::new();
        set.push(Animation::new(
            AnimationKind::Minimize,
            7,
            Rect::default(),
            Rect::default(),
            Duration::from_millis(100),
        ));
        set.remove_for_window(7);
        assert!(set.is_empty());
    }

    #[test]
    fn push_replaces_existing_animation_for_same_window() {
        let mut set = AnimationSet::new();
        set.push(Animation::new(AnimationKind::Snap, 1, Rect::default(), Rect::default(), Duration::from_millis(50)));
        set.push(Animation::new(AnimationKind::Minimize, 1, Rect::default(), Rect::default(), Duration::from_millis(50)));
        assert_eq!(set.iter().count(), 1);
        assert_eq!(set.iter().next().unwrap().kind, AnimationKind::Minimize);
    }
}
