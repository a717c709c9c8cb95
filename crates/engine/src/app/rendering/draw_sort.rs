use tracing::trace;

use crate::world::Vec2;

/// Stable handle to a visual loaded by a [`SpriteRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u32);

impl VisualHandle {
    /// Drawn as a solid marker; used when a visual is missing or unknown.
    pub const PLACEHOLDER: Self = Self(u32::MAX);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }

    pub const fn is_placeholder(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Which world object a draw request came from. Indices refer to the
/// collections owned by the world at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawOwner {
    BackgroundTile(usize),
    CollisionTile(usize),
    Enemy(usize),
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRequest {
    pub owner: DrawOwner,
    pub visual: VisualHandle,
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation_degrees: f32,
    pub depth: f32,
}

impl DrawRequest {
    pub fn new(owner: DrawOwner, visual: VisualHandle, position: Vec2, depth: f32) -> Self {
        Self {
            owner,
            visual,
            position,
            scale: Vec2 { x: 1.0, y: 1.0 },
            rotation_degrees: 0.0,
            depth,
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }
}

/// Rendering collaborator consumed by the world and the draw sorter.
pub trait SpriteRenderer {
    /// Resolves a visual key to a handle. Missing visuals resolve to a
    /// handle that still draws, so callers never need to branch on failure.
    fn load_visual(&mut self, key: &str) -> VisualHandle;

    /// Draws one request immediately, in world coordinates.
    fn draw_visual(&mut self, request: &DrawRequest);
}

/// Per-frame accumulator of draw requests, flushed back to front.
///
/// A frame is `submit*` → `flush` → `reset`. Requests are flushed at most
/// once per frame; anything submitted after the flush is discarded by the
/// next reset without being drawn.
#[derive(Debug, Default)]
pub struct DrawSorter {
    pending: Vec<DrawRequest>,
    flushed: bool,
}

impl DrawSorter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, request: DrawRequest) {
        self.pending.push(request);
    }

    /// Sorts pending requests by depth, greatest first, and hands each one to
    /// `renderer`. Returns how many requests were drawn.
    pub fn flush<R>(&mut self, renderer: &mut R) -> usize
    where
        R: SpriteRenderer + ?Sized,
    {
        if self.flushed {
            trace!(
                pending = self.pending.len(),
                "draw_sorter_flush_skipped_already_flushed"
            );
            return 0;
        }

        self.pending
            .sort_by(|left, right| right.depth.total_cmp(&left.depth));
        for request in &self.pending {
            renderer.draw_visual(request);
        }
        self.flushed = true;
        self.pending.len()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.flushed = false;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingRenderer {
        drawn: Vec<DrawRequest>,
    }

    impl SpriteRenderer for RecordingRenderer {
        fn load_visual(&mut self, _key: &str) -> VisualHandle {
            VisualHandle::new(0)
        }

        fn draw_visual(&mut self, request: &DrawRequest) {
            self.drawn.push(*request);
        }
    }

    fn request_at_depth(index: usize, depth: f32) -> DrawRequest {
        DrawRequest::new(
            DrawOwner::Enemy(index),
            VisualHandle::new(index as u32),
            Vec2::default(),
            depth,
        )
    }

    fn drawn_depths(renderer: &RecordingRenderer) -> Vec<f32> {
        renderer.drawn.iter().map(|request| request.depth).collect()
    }

    #[test]
    fn flush_draws_greatest_depth_first() {
        let mut sorter = DrawSorter::new();
        let mut renderer = RecordingRenderer::default();
        for (index, depth) in [3.0, 1.0, 2.0].into_iter().enumerate() {
            sorter.submit(request_at_depth(index, depth));
        }

        assert_eq!(sorter.flush(&mut renderer), 3);
        assert_eq!(drawn_depths(&renderer), vec![3.0, 2.0, 1.0]);
        assert_eq!(renderer.drawn[0].owner, DrawOwner::Enemy(0));
        assert_eq!(renderer.drawn[2].owner, DrawOwner::Enemy(1));
    }

    #[test]
    fn flush_after_reset_draws_nothing() {
        let mut sorter = DrawSorter::new();
        let mut renderer = RecordingRenderer::default();
        sorter.submit(request_at_depth(0, 1.0));
        sorter.flush(&mut renderer);
        sorter.reset();

        renderer.drawn.clear();
        assert_eq!(sorter.flush(&mut renderer), 0);
        assert!(renderer.drawn.is_empty());
    }

    #[test]
    fn second_flush_in_same_frame_draws_nothing() {
        let mut sorter = DrawSorter::new();
        let mut renderer = RecordingRenderer::default();
        sorter.submit(request_at_depth(0, 1.0));
        sorter.submit(request_at_depth(1, 5.0));

        assert_eq!(sorter.flush(&mut renderer), 2);
        assert_eq!(sorter.flush(&mut renderer), 0);
        assert_eq!(renderer.drawn.len(), 2);
    }

    #[test]
    fn submissions_after_flush_are_dropped_by_reset() {
        let mut sorter = DrawSorter::new();
        let mut renderer = RecordingRenderer::default();
        sorter.submit(request_at_depth(0, 1.0));
        sorter.flush(&mut renderer);

        sorter.submit(request_at_depth(1, 9.0));
        assert_eq!(sorter.flush(&mut renderer), 0);
        assert_eq!(sorter.pending_len(), 2);

        sorter.reset();
        assert_eq!(sorter.pending_len(), 0);
        assert!(!sorter.is_flushed());
        assert_eq!(renderer.drawn.len(), 1);
    }

    #[test]
    fn equal_depths_are_all_drawn_once() {
        let mut sorter = DrawSorter::new();
        let mut renderer = RecordingRenderer::default();
        for index in 0..4 {
            sorter.submit(request_at_depth(index, 1.0));
        }
        sorter.flush(&mut renderer);

        let mut owners: Vec<_> = renderer
            .drawn
            .iter()
            .map(|request| match request.owner {
                DrawOwner::Enemy(index) => index,
                _ => usize::MAX,
            })
            .collect();
        owners.sort_unstable();
        assert_eq!(owners, vec![0, 1, 2, 3]);
    }

    #[test]
    fn scale_and_rotation_pass_through_unchanged() {
        let mut sorter = DrawSorter::new();
        let mut renderer = RecordingRenderer::default();
        let request = DrawRequest {
            rotation_degrees: 90.0,
            ..DrawRequest::new(
                DrawOwner::Player,
                VisualHandle::new(7),
                Vec2 { x: 14.0, y: -3.0 },
                0.0,
            )
            .with_scale(Vec2 { x: -1.0, y: 1.0 })
        };
        sorter.submit(request);
        sorter.flush(&mut renderer);

        assert_eq!(renderer.drawn, vec![request]);
    }

    #[test]
    fn placeholder_handle_is_distinct_from_loaded_handles() {
        assert!(VisualHandle::PLACEHOLDER.is_placeholder());
        assert!(!VisualHandle::new(0).is_placeholder());
        assert_eq!(VisualHandle::new(12).index(), 12);
    }
}
