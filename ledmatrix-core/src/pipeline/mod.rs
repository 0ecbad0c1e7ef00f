//! Frame pipeline
//!
//! Hands frame buffers between the ingestion core and the render core with
//! at most one frame in flight. Each buffer is owned by exactly one side at
//! any time; ownership travels as the `&mut FrameBuffer` itself.
//!
//! ```text
//!            to_render (1 slot)
//! Ingest ──────────────────────────▶ Render
//!        ◀──────────────────────────
//!            to_ingest (1 slot)
//! ```
//!
//! The ingest side blocks on both hops. The render side only ever looks
//! for a new buffer between passes and never waits, so the panel keeps
//! refreshing the last frame while nothing new arrives.

mod buffer;

pub use buffer::{pack_rgb, FrameBuffer, FRAME_BYTES, HEIGHT, INITIAL_FILL, PIXELS, WIDTH};

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::traits::{ColorChannel, FrameSink, SinkError};

/// Two single-slot channels connecting the cores
pub struct FramePipeline<'a, M: RawMutex> {
    to_render: Channel<M, &'a mut FrameBuffer, 1>,
    to_ingest: Channel<M, &'a mut FrameBuffer, 1>,
}

impl<'a, M: RawMutex> Default for FramePipeline<'a, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: RawMutex> FramePipeline<'a, M> {
    pub const fn new() -> Self {
        Self {
            to_render: Channel::new(),
            to_ingest: Channel::new(),
        }
    }

    /// Hand out both ends, each owning one buffer
    pub fn split<'p>(
        &'p self,
        ingest: &'a mut FrameBuffer,
        render: &'a mut FrameBuffer,
    ) -> (IngestPort<'p, 'a, M>, RenderPort<'p, 'a, M>) {
        (
            IngestPort {
                pipeline: self,
                owned: Some(ingest),
            },
            RenderPort {
                pipeline: self,
                owned: Some(render),
            },
        )
    }
}

/// Producer end, used from the ingestion core
pub struct IngestPort<'p, 'a, M: RawMutex> {
    pipeline: &'p FramePipeline<'a, M>,
    owned: Option<&'a mut FrameBuffer>,
}

impl<'p, 'a, M: RawMutex> IngestPort<'p, 'a, M> {
    /// Index of the buffer currently being filled
    pub fn owned_index(&self) -> Option<u8> {
        self.owned.as_deref().map(FrameBuffer::index)
    }

    /// Publish the owned buffer and wait for the renderer's previous one
    ///
    /// Returns the index of the buffer now owned.
    pub fn handoff(&mut self) -> Option<u8> {
        let buf = self.owned.take()?;
        trace!("publishing buffer {}", buf.index());
        block_on(self.pipeline.to_render.send(buf));

        let next = block_on(self.pipeline.to_ingest.receive());
        let index = next.index();
        self.owned = Some(next);
        Some(index)
    }
}

impl<'p, 'a, M: RawMutex> FrameSink for IngestPort<'p, 'a, M> {
    fn on_frame(&mut self, rgb: &[u8]) -> Result<(), SinkError> {
        if let Some(buf) = self.owned.as_deref_mut() {
            buf.load_rgb(rgb)?;
        }
        self.handoff();
        Ok(())
    }

    fn clear(&mut self) {
        if let Some(buf) = self.owned.as_deref_mut() {
            buf.fill(0);
        }
        self.handoff();
    }

    fn progress(&mut self, step: usize, channel: ColorChannel) {
        if let Some(buf) = self.owned.as_deref_mut() {
            buf.show_progress(step, channel);
        }
        self.handoff();
    }
}

/// Consumer end, used from the render core
pub struct RenderPort<'p, 'a, M: RawMutex> {
    pipeline: &'p FramePipeline<'a, M>,
    owned: Option<&'a mut FrameBuffer>,
}

impl<'p, 'a, M: RawMutex> RenderPort<'p, 'a, M> {
    /// Adopt a newly published buffer if there is one
    ///
    /// At most one swap per call; the displaced buffer goes straight back
    /// to the ingest side.
    pub fn poll_swap(&mut self) -> bool {
        let Ok(next) = self.pipeline.to_render.try_receive() else {
            return false;
        };
        trace!("displaying buffer {}", next.index());
        if let Some(prev) = self.owned.replace(next) {
            // Ingest holds no buffer while waiting, so this slot is free
            block_on(self.pipeline.to_ingest.send(prev));
        }
        true
    }

    /// Buffer currently being displayed
    pub fn front(&self) -> Option<&FrameBuffer> {
        self.owned.as_deref()
    }
}
