mod draw_sort;
mod renderer;
mod transform;

pub use draw_sort::{DrawOwner, DrawRequest, DrawSorter, SpriteRenderer, VisualHandle};
pub use renderer::Renderer;
pub use transform::{canvas_to_world, world_to_canvas, Viewport};
