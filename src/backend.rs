//! The seam between frame encoding and the device.

use crate::commands::RenderCommand;

/// Something that can present an encoded frame.
///
/// [`Renderer::render`](crate::Renderer::render) calls [`acquire_drawable`] once per
/// frame. If it returns `None` nothing else happens that frame. Otherwise the full
/// command list is handed to [`submit`] together with the drawable.
///
/// [`acquire_drawable`]: RenderBackend::acquire_drawable
/// [`submit`]: RenderBackend::submit
pub trait RenderBackend {
    /// The presentable target for one frame.
    type Drawable;

    /// Next presentable target, or `None` if none is available right now.
    fn acquire_drawable(&mut self) -> Option<Self::Drawable>;

    /// Replay `commands` onto `drawable`. The list ends with
    /// [`RenderCommand::Present`].
    fn submit(&mut self, drawable: Self::Drawable, commands: &[RenderCommand]);

    /// The presentation surface changed size.
    fn resize(&mut self, width: u32, height: u32);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every submitted frame instead of drawing it.
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        /// When false, `acquire_drawable` returns `None`.
        pub available: bool,
        pub frames: Vec<Vec<RenderCommand>>,
        pub resizes: Vec<(u32, u32)>,
        next_drawable: u64,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self {
                available: true,
                ..Default::default()
            }
        }

        pub fn last_frame(&self) -> &[RenderCommand] {
            self.frames.last().map(Vec::as_slice).unwrap_or(&[])
        }

        pub fn draw_count(&self) -> usize {
            self.frames.iter().flatten().filter(|c| c.is_draw()).count()
        }

        pub fn present_count(&self) -> usize {
            self.frames
                .iter()
                .flatten()
                .filter(|c| matches!(c, RenderCommand::Present))
                .count()
        }
    }

    impl RenderBackend for RecordingBackend {
        type Drawable = u64;

        fn acquire_drawable(&mut self) -> Option<u64> {
            if !self.available {
                return None;
            }
            self.next_drawable += 1;
            Some(self.next_drawable)
        }

        fn submit(&mut self, _drawable: u64, commands: &[RenderCommand]) {
            self.frames.push(commands.to_vec());
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.resizes.push((width, height));
        }
    }
}
