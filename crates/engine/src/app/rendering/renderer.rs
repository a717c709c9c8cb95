use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use tracing::{debug, warn};
use winit::window::Window;

use crate::visuals::validate_visual_key;
use crate::world::{Camera, Vec2};

use super::draw_sort::{DrawRequest, SpriteRenderer, VisualHandle};
use super::transform::{canvas_to_world, world_to_canvas, Viewport};

const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const PLACEHOLDER_SIZE_PX: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LoadedSprite {
    fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }
}

/// Software sprite renderer drawing into a fixed low-resolution canvas that
/// `pixels` scales up to the window surface.
pub struct Renderer {
    _window: Arc<Window>,
    pixels: Pixels<'static>,
    canvas: Viewport,
    asset_root: PathBuf,
    sprites: Vec<LoadedSprite>,
    handles_by_key: HashMap<String, VisualHandle>,
    warned_missing_sprite_keys: HashSet<String>,
    placeholder: LoadedSprite,
    camera: Camera,
    draws_this_frame: u32,
}

impl Renderer {
    pub fn new(window: Arc<Window>, canvas: Viewport, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(canvas.width, canvas.height, surface)?;
        Ok(Self {
            _window: window,
            pixels,
            canvas,
            asset_root,
            sprites: Vec::new(),
            handles_by_key: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
            placeholder: LoadedSprite::solid(
                PLACEHOLDER_SIZE_PX,
                PLACEHOLDER_SIZE_PX,
                PLACEHOLDER_COLOR,
            ),
            camera: Camera::default(),
            draws_this_frame: 0,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    /// Clears the canvas and fixes the camera used by every draw until the
    /// next frame.
    pub fn begin_frame(&mut self, clear_color: [u8; 4], camera: Camera) {
        for pixel in self.pixels.frame_mut().chunks_exact_mut(4) {
            pixel.copy_from_slice(&clear_color);
        }
        self.camera = camera;
        self.draws_this_frame = 0;
    }

    /// Upscales the canvas to the window.
    pub fn present(&mut self) -> Result<(), Error> {
        self.pixels.render()
    }

    pub fn draws_this_frame(&self) -> u32 {
        self.draws_this_frame
    }

    pub fn loaded_sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

impl SpriteRenderer for Renderer {
    fn load_visual(&mut self, key: &str) -> VisualHandle {
        if let Some(handle) = self.handles_by_key.get(key) {
            return *handle;
        }

        let handle = match resolve_sprite_image_path(&self.asset_root, key)
            .and_then(|path| load_sprite_rgba(&path).map_err(|reason| (Some(path), reason)))
        {
            Ok(sprite) => {
                let handle = VisualHandle::new(self.sprites.len() as u32);
                debug!(
                    sprite_key = key,
                    width = sprite.width,
                    height = sprite.height,
                    "renderer_sprite_loaded"
                );
                self.sprites.push(sprite);
                handle
            }
            Err((path, reason)) => {
                warn_sprite_load_once(
                    &mut self.warned_missing_sprite_keys,
                    key,
                    path.as_deref(),
                    reason.as_str(),
                );
                VisualHandle::PLACEHOLDER
            }
        };
        self.handles_by_key.insert(key.to_string(), handle);
        handle
    }

    fn draw_visual(&mut self, request: &DrawRequest) {
        let sprite = if request.visual.is_placeholder() {
            &self.placeholder
        } else {
            self.sprites
                .get(request.visual.index() as usize)
                .unwrap_or(&self.placeholder)
        };
        blit_sprite(
            self.pixels.frame_mut(),
            self.canvas,
            self.camera,
            sprite,
            request,
        );
        self.draws_this_frame = self.draws_this_frame.saturating_add(1);
    }
}

fn resolve_sprite_image_path(
    asset_root: &Path,
    key: &str,
) -> Result<PathBuf, (Option<PathBuf>, String)> {
    validate_visual_key(key).map_err(|error| (None, format!("invalid_key:{error}")))?;
    Ok(asset_root.join("sprites").join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

/// Draws `sprite` with its local origin at `request.position`. The sprite
/// box spans `width * scale.x` by `height * scale.y` world units from the
/// origin, so a negative scale mirrors it back across the origin. Rotation is
/// counter-clockwise about the origin. Every covered canvas pixel is mapped
/// back into sprite space and sampled nearest-neighbour; transparent texels
/// are skipped.
fn blit_sprite(
    frame: &mut [u8],
    canvas: Viewport,
    camera: Camera,
    sprite: &LoadedSprite,
    request: &DrawRequest,
) {
    if sprite.width == 0 || sprite.height == 0 || canvas.width == 0 || canvas.height == 0 {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len || frame.len() < canvas_len(canvas) {
        return;
    }
    let scale = request.scale;
    if scale.x == 0.0 || scale.y == 0.0 || !scale.x.is_finite() || !scale.y.is_finite() {
        return;
    }

    let (sin, cos) = request.rotation_degrees.to_radians().sin_cos();
    let extent_x = sprite.width as f32 * scale.x;
    let extent_y = sprite.height as f32 * scale.y;
    let corners = [(0.0, 0.0), (extent_x, 0.0), (0.0, extent_y), (extent_x, extent_y)];

    let mut min = Vec2 {
        x: f32::INFINITY,
        y: f32::INFINITY,
    };
    let mut max = Vec2 {
        x: f32::NEG_INFINITY,
        y: f32::NEG_INFINITY,
    };
    for (local_x, local_y) in corners {
        let world = Vec2 {
            x: request.position.x + local_x * cos - local_y * sin,
            y: request.position.y + local_x * sin + local_y * cos,
        };
        let point = world_to_canvas(world, camera, canvas);
        min.x = min.x.min(point.x);
        min.y = min.y.min(point.y);
        max.x = max.x.max(point.x);
        max.y = max.y.max(point.y);
    }

    let left = (min.x.floor() as i64).max(0);
    let top = (min.y.floor() as i64).max(0);
    let right = (max.x.ceil() as i64).min(canvas.width as i64);
    let bottom = (max.y.ceil() as i64).min(canvas.height as i64);
    if left >= right || top >= bottom {
        return;
    }

    let frame_width = canvas.width as usize;
    let sprite_width = sprite.width as usize;
    let sprite_height = sprite.height as usize;
    for out_y in top..bottom {
        for out_x in left..right {
            let center = Vec2 {
                x: out_x as f32 + 0.5,
                y: out_y as f32 + 0.5,
            };
            let world = canvas_to_world(center, camera, canvas);
            let dx = world.x - request.position.x;
            let dy = world.y - request.position.y;
            let u = (dx * cos + dy * sin) / scale.x;
            let v = (-dx * sin + dy * cos) / scale.y;
            if u < 0.0 || v < 0.0 || u >= sprite.width as f32 || v >= sprite.height as f32 {
                continue;
            }

            let src_x = (u.floor() as usize).min(sprite_width - 1);
            // texel rows run top-down; local v runs bottom-up
            let row_from_bottom = (v.floor() as usize).min(sprite_height - 1);
            let src_y = sprite_height - 1 - row_from_bottom;
            let src_offset = (src_y * sprite_width + src_x) * 4;
            let alpha = sprite.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let dst_offset = (out_y as usize * frame_width + out_x as usize) * 4;
            frame[dst_offset..dst_offset + 4]
                .copy_from_slice(&sprite.rgba[src_offset..src_offset + 4]);
        }
    }
}

fn canvas_len(canvas: Viewport) -> usize {
    canvas.width as usize * canvas.height as usize * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::DrawOwner;
    use tempfile::TempDir;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    const CANVAS: Viewport = Viewport {
        width: 8,
        height: 8,
    };
    // bottom-left of the view at world y -8, so world y -8..0 is visible
    const CAMERA: Camera = Camera { x: 0, y: -8 };

    fn sprite_from(width: u32, height: u32, texels: &[[u8; 4]]) -> LoadedSprite {
        LoadedSprite {
            width,
            height,
            rgba: texels.iter().flatten().copied().collect(),
        }
    }

    fn request_at(x: f32, y: f32) -> DrawRequest {
        DrawRequest::new(
            DrawOwner::Player,
            VisualHandle::new(0),
            Vec2 { x, y },
            0.0,
        )
    }

    fn pixel(frame: &[u8], x: usize, y: usize) -> [u8; 4] {
        let offset = (y * CANVAS.width as usize + x) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn painted_count(frame: &[u8]) -> usize {
        frame
            .chunks_exact(4)
            .filter(|pixel| pixel[3] != 0)
            .count()
    }

    fn quad() -> LoadedSprite {
        sprite_from(2, 2, &[RED, GREEN, BLUE, WHITE])
    }

    #[test]
    fn unscaled_sprite_keeps_texel_layout() {
        let mut frame = vec![0u8; canvas_len(CANVAS)];
        blit_sprite(&mut frame, CANVAS, CAMERA, &quad(), &request_at(1.0, -3.0));

        assert_eq!(pixel(&frame, 1, 1), RED);
        assert_eq!(pixel(&frame, 2, 1), GREEN);
        assert_eq!(pixel(&frame, 1, 2), BLUE);
        assert_eq!(pixel(&frame, 2, 2), WHITE);
        assert_eq!(painted_count(&frame), 4);
    }

    #[test]
    fn negative_x_scale_mirrors_back_across_origin() {
        let mut frame = vec![0u8; canvas_len(CANVAS)];
        let request = request_at(3.0, -3.0).with_scale(Vec2 { x: -1.0, y: 1.0 });
        blit_sprite(&mut frame, CANVAS, CAMERA, &quad(), &request);

        assert_eq!(pixel(&frame, 1, 1), GREEN);
        assert_eq!(pixel(&frame, 2, 1), RED);
        assert_eq!(pixel(&frame, 1, 2), WHITE);
        assert_eq!(pixel(&frame, 2, 2), BLUE);
        assert_eq!(painted_count(&frame), 4);
    }

    #[test]
    fn quarter_turn_rotates_counter_clockwise() {
        let mut frame = vec![0u8; canvas_len(CANVAS)];
        let strip = sprite_from(2, 1, &[RED, GREEN]);
        let request = DrawRequest {
            rotation_degrees: 90.0,
            ..request_at(4.0, -4.0)
        };
        blit_sprite(&mut frame, CANVAS, CAMERA, &strip, &request);

        assert_eq!(pixel(&frame, 3, 3), RED);
        assert_eq!(pixel(&frame, 3, 2), GREEN);
        assert_eq!(painted_count(&frame), 2);
    }

    #[test]
    fn transparent_texels_leave_canvas_untouched() {
        let mut frame = vec![0u8; canvas_len(CANVAS)];
        let holey = sprite_from(2, 2, &[RED, CLEAR, CLEAR, WHITE]);
        blit_sprite(&mut frame, CANVAS, CAMERA, &holey, &request_at(1.0, -3.0));

        assert_eq!(pixel(&frame, 2, 1), CLEAR);
        assert_eq!(painted_count(&frame), 2);
    }

    #[test]
    fn camera_scroll_and_clipping_are_safe() {
        let mut frame = vec![0u8; canvas_len(CANVAS)];
        let camera = Camera { x: 5, y: -8 };
        blit_sprite(&mut frame, CANVAS, camera, &quad(), &request_at(4.0, -3.0));
        // only the right column survives at canvas x 0
        assert_eq!(pixel(&frame, 0, 1), GREEN);
        assert_eq!(painted_count(&frame), 2);

        let mut frame = vec![0u8; canvas_len(CANVAS)];
        blit_sprite(&mut frame, CANVAS, CAMERA, &quad(), &request_at(500.0, 500.0));
        assert_eq!(painted_count(&frame), 0);
    }

    #[test]
    fn degenerate_inputs_draw_nothing() {
        let mut frame = vec![0u8; canvas_len(CANVAS)];
        let flat = request_at(1.0, -3.0).with_scale(Vec2 { x: 0.0, y: 1.0 });
        blit_sprite(&mut frame, CANVAS, CAMERA, &quad(), &flat);
        let empty = sprite_from(0, 0, &[]);
        blit_sprite(&mut frame, CANVAS, CAMERA, &empty, &request_at(1.0, -3.0));
        let mut short_frame = vec![0u8; 8];
        blit_sprite(&mut short_frame, CANVAS, CAMERA, &quad(), &request_at(1.0, -3.0));

        assert_eq!(painted_count(&frame), 0);
        assert!(short_frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn placeholder_sprite_is_solid() {
        let placeholder =
            LoadedSprite::solid(PLACEHOLDER_SIZE_PX, PLACEHOLDER_SIZE_PX, PLACEHOLDER_COLOR);
        assert_eq!(placeholder.rgba.len(), 16 * 16 * 4);
        assert!(placeholder
            .rgba
            .chunks_exact(4)
            .all(|texel| texel == PLACEHOLDER_COLOR));
    }

    #[test]
    fn sprite_path_resolution_and_missing_asset_fallback_behavior() {
        let temp = TempDir::new().expect("temp");
        let asset_root = temp.path();

        assert!(resolve_sprite_image_path(asset_root, r"bad\key").is_err());

        let valid_path = resolve_sprite_image_path(asset_root, "tiles/gnd1").expect("path");
        assert_eq!(
            valid_path,
            asset_root.join("sprites").join("tiles").join("gnd1.png")
        );
        assert!(load_sprite_rgba(&valid_path).is_err());
    }

    #[test]
    fn missing_sprite_warning_is_emitted_once_per_key() {
        let mut warned = HashSet::new();
        warn_sprite_load_once(&mut warned, "tiles/gnd1", None, "file_open_failed");
        warn_sprite_load_once(&mut warned, "tiles/gnd1", None, "file_open_failed");
        warn_sprite_load_once(&mut warned, "bg/cl1", None, "file_open_failed");
        assert_eq!(warned.len(), 2);
    }

    #[test]
    fn png_on_disk_decodes_to_rgba() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("dot.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba(BLUE))
            .save(&path)
            .expect("save png");

        let sprite = load_sprite_rgba(&path).expect("decode");
        assert_eq!((sprite.width, sprite.height), (3, 2));
        assert_eq!(&sprite.rgba[0..4], &BLUE);
    }
}
