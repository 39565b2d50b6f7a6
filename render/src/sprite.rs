//! `SpriteBatch`: `Begin`/`Draw`/`End`, coalescing consecutive
//! draws that share a source texture into one indexed draw call.
//! Modeled on the original engine's D3D11 sprite batch; the
//! D3D12/Vulkan variants mirror the same `Begin`/`Draw`/`End` shape
//! and the same vertex coalescing, so this one implementation is
//! shared and only the final `ID3D11DeviceContext` submission would
//! differ per backend.
use geometry::Rect;

use crate::backend::TextureId;

/// 6 vertices per sprite (two triangles).
const VERTICES_PER_SPRITE: usize = 6;

/// Upper bound on vertices per single draw call; a run of
/// same-source sprites longer than this is split across multiple
/// [`DrawBatch`]es rather than growing one draw call unbounded.
pub const MAX_VERTICES: usize = 4096;

/// One sprite-batch vertex. `tex_clamp_tl`/
/// `tex_clamp_br` bound the sample to `src_rect ± 0.5px` so a sprite
/// sampling near an atlas edge doesn't bleed into its neighbours.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    pub tex_clamp_tl: [f32; 2],
    pub tex_clamp_br: [f32; 2],
}

/// One queued sprite: sample `src_rect` of `source`, draw it into
/// `dst_rect` of the current render target, tinted by `tint`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub source: TextureId,
    pub src_rect: Rect<f32>,
    pub dst_rect: Rect<f32>,
    pub tint: [f32; 4],
}

/// One coalesced draw call: every sprite in `vertices` shares `source`
/// and is submitted as a single indexed draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub source: TextureId,
    pub vertices: Vec<SpriteVertex>,
}

/// Accumulates sprites between `begin`/`end` and coalesces them into
/// the minimal number of same-source draw calls, preserving submit
/// order (two sprites from different sources can't be reordered past
/// each other - that would change the composited result when they
/// overlap).
#[derive(Default)]
pub struct SpriteBatch {
    rtv_size: Option<geometry::PixelSize>,
    sprites: Vec<Sprite>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new batch targeting a render target of `rtv_size`.
    pub fn begin(&mut self, rtv_size: geometry::PixelSize) {
        self.rtv_size = Some(rtv_size);
        self.sprites.clear();
    }

    /// Queues one sprite. Panics if called outside a `begin`/`end`
    /// pair - mirroring the original's debug-build assertion that
    /// `Draw` always follows `Begin`.
    pub fn draw(&mut self, sprite: Sprite) {
        assert!(self.rtv_size.is_some(), "SpriteBatch::draw called before begin");
        self.sprites.push(sprite);
    }

    /// Ends the batch, returning the coalesced draw calls in submit
    /// order. Consecutive sprites with the same `source` merge into
    /// one [`DrawBatch`], split every [`MAX_VERTICES`] vertices.
    pub fn end(&mut self) -> Vec<DrawBatch> {
        self.rtv_size = None;
        let mut batches: Vec<DrawBatch> = Vec::new();

        for sprite in self.sprites.drain(..) {
            let vertices = sprite_vertices(&sprite);
            match batches.last_mut() {
                Some(batch)
                    if batch.source == sprite.source
                        && batch.vertices.len() + VERTICES_PER_SPRITE <= MAX_VERTICES =>
                {
                    batch.vertices.extend_from_slice(&vertices);
                }
                _ => batches.push(DrawBatch {
                    source: sprite.source,
                    vertices: vertices.to_vec(),
                }),
            }
        }

        batches
    }
}

fn sprite_vertices(sprite: &Sprite) -> [SpriteVertex; VERTICES_PER_SPRITE] {
    let clamp_tl = [sprite.src_rect.origin.x - 0.5, sprite.src_rect.origin.y - 0.5];
    let clamp_br = [sprite.src_rect.right() + 0.5, sprite.src_rect.bottom() + 0.5];

    let corner = |x: f32, y: f32, u: f32, v: f32| SpriteVertex {
        position: [x, y, 0.0, 1.0],
        color: sprite.tint,
        tex_coord: [u, v],
        tex_clamp_tl: clamp_tl,
        tex_clamp_br: clamp_br,
    };

    let d = &sprite.dst_rect;
    let tl = corner(d.origin.x, d.origin.y, 0.0, 0.0);
    let tr = corner(d.right(), d.origin.y, 1.0, 0.0);
    let bl = corner(d.origin.x, d.bottom(), 0.0, 1.0);
    let br = corner(d.right(), d.bottom(), 1.0, 1.0);

    // Two counter-clockwise-wound triangles: TL,BL,TR and TR,BL,BR.
    [tl, bl, tr, tr, bl, br]
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::{Point, Size};
    use utils::handle::Handle;

    fn sprite(source: u64) -> Sprite {
        Sprite {
            source: Handle::from_raw(source),
            src_rect: Rect::new(Point::new(0.0, 0.0), Size::new(32.0, 32.0)),
            dst_rect: Rect::new(Point::new(10.0, 10.0), Size::new(64.0, 64.0)),
            tint: [1.0, 1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn consecutive_same_source_draws_coalesce_into_one_batch() {
        let mut batch = SpriteBatch::new();
        batch.begin(geometry::PixelSize::new(800, 600));
        batch.draw(sprite(1));
        batch.draw(sprite(1));
        batch.draw(sprite(1));
        let batches = batch.end();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].vertices.len(), 3 * VERTICES_PER_SPRITE);
    }

    #[test]
    fn alternating_sources_produce_separate_batches_in_order() {
        let mut batch = SpriteBatch::new();
        batch.begin(geometry::PixelSize::new(800, 600));
        batch.draw(sprite(1));
        batch.draw(sprite(2));
        batch.draw(sprite(1));
        let batches = batch.end();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].source, Handle::from_raw(1));
        assert_eq!(batches[1].source, Handle::from_raw(2));
        assert_eq!(batches[2].source, Handle::from_raw(1));
    }

    #[test]
    fn texture_clamp_is_half_pixel_outside_source_rect() {
        let mut batch = SpriteBatch::new();
        batch.begin(geometry::PixelSize::new(800, 600));
        batch.draw(sprite(1));
        let batches = batch.end();
        let v = &batches[0].vertices[0];
        assert_eq!(v.tex_clamp_tl, [-0.5, -0.5]);
        assert_eq!(v.tex_clamp_br, [32.5, 32.5]);
    }

    #[test]
    #[should_panic]
    fn draw_before_begin_panics() {
        let mut batch = SpriteBatch::new();
        batch.draw(sprite(1));
    }
}
