//! GPU Resource Pool
//!
//! Reuses render textures and storage buffers that only live for a frame or
//! a few. Compositor nodes request a resource during `render`, keep the
//! returned `Rc` for as long as downstream nodes need it, and drop it in
//! `clear`.
//!
//! # Design
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  GpuResourcePool                     │
//! │                                                      │
//! │  textures: [Rc<PooledRenderTexture>]   (list order)  │
//! │  buffers:  [Rc<PooledStorageBuffer>]                 │
//! │                                                      │
//! │  get_texture(desc) → Rc   first free exact match     │
//! │  get_buffer(desc)  → Rc   or a fresh allocation      │
//! │  update()          frame += 1, prune(prune_age)      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Freedom
//!
//! An entry is free when the pool holds the only strong reference
//! (`Rc::strong_count == 1`). Entries in use are never handed out again and
//! never pruned.
//!
//! # Memory Strategy
//!
//! - First fit in list order, not best fit.
//! - Free entries idle for `prune_age` frames or more are destroyed on
//!   [`GpuResourcePool::update`].

use std::cell::Cell;
use std::rc::Rc;

use crate::renderer::core::{
    BufferDesc, BufferHandle, RenderApi, RenderTargetHandle, TextureDesc, TextureHandle,
    TextureUsage,
};

/// Frames a free entry survives by default.
pub const DEFAULT_PRUNE_AGE: u64 = 3;

// ─── Pooled Types ─────────────────────────────────────────────────────────────

/// A pooled texture, plus a render-target view when its usage calls for one.
#[derive(Debug)]
pub struct PooledRenderTexture {
    texture: TextureHandle,
    render_target: Option<RenderTargetHandle>,
    desc: TextureDesc,
    last_used_frame: Cell<u64>,
}

impl PooledRenderTexture {
    #[inline]
    #[must_use]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Present iff the texture was requested with render-target or
    /// depth-stencil usage.
    #[inline]
    #[must_use]
    pub fn render_target(&self) -> Option<RenderTargetHandle> {
        self.render_target
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn last_used_frame(&self) -> u64 {
        self.last_used_frame.get()
    }
}

/// A pooled buffer.
#[derive(Debug)]
pub struct PooledStorageBuffer {
    buffer: BufferHandle,
    desc: BufferDesc,
    last_used_frame: Cell<u64>,
}

impl PooledStorageBuffer {
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn last_used_frame(&self) -> u64 {
        self.last_used_frame.get()
    }
}

// ─── Pool Implementation ──────────────────────────────────────────────────────

/// Transient pool of GPU textures and buffers keyed by descriptor match.
///
/// # Thread Safety
///
/// Not `Send`/`Sync`; the pool lives on the render thread with the
/// compositor that drains it.
pub struct GpuResourcePool {
    textures: Vec<Rc<PooledRenderTexture>>,
    buffers: Vec<Rc<PooledStorageBuffer>>,
    frame: u64,
    prune_age: u64,
}

impl Default for GpuResourcePool {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuResourcePool {
    #[must_use]
    pub fn new() -> Self {
        Self::with_prune_age(DEFAULT_PRUNE_AGE)
    }

    #[must_use]
    pub fn with_prune_age(prune_age: u64) -> Self {
        Self {
            textures: Vec::new(),
            buffers: Vec::new(),
            frame: 0,
            prune_age,
        }
    }

    // ── Acquisition ────────────────────────────────────────────────────────

    /// Returns a free texture matching `desc`, allocating one if none is free.
    ///
    /// The texture stays reserved until every clone of the returned `Rc`
    /// has been dropped.
    pub fn get_texture(&mut self, api: &mut dyn RenderApi, desc: &TextureDesc) -> Rc<PooledRenderTexture> {
        if let Some(existing) = self
            .textures
            .iter()
            .find(|t| Rc::strong_count(t) == 1 && t.desc.satisfies(desc))
        {
            existing.last_used_frame.set(self.frame);
            return Rc::clone(existing);
        }

        let texture = api.create_texture(desc);
        let render_target = desc.usage.needs_render_target().then(|| {
            api.create_render_target(texture, desc.usage.contains(TextureUsage::DEPTH_STENCIL))
        });

        log::debug!(
            "GpuResourcePool: allocated {}x{} {:?} texture ({} pooled)",
            desc.width,
            desc.height,
            desc.format,
            self.textures.len() + 1
        );

        let pooled = Rc::new(PooledRenderTexture {
            texture,
            render_target,
            desc: *desc,
            last_used_frame: Cell::new(self.frame),
        });
        self.textures.push(Rc::clone(&pooled));
        pooled
    }

    /// Buffer counterpart of [`get_texture`](Self::get_texture).
    pub fn get_buffer(&mut self, api: &mut dyn RenderApi, desc: &BufferDesc) -> Rc<PooledStorageBuffer> {
        if let Some(existing) = self
            .buffers
            .iter()
            .find(|b| Rc::strong_count(b) == 1 && b.desc.satisfies(desc))
        {
            existing.last_used_frame.set(self.frame);
            return Rc::clone(existing);
        }

        let buffer = api.create_buffer(desc);
        log::debug!(
            "GpuResourcePool: allocated {} byte {:?} buffer ({} pooled)",
            desc.size_bytes(),
            desc.ty,
            self.buffers.len() + 1
        );

        let pooled = Rc::new(PooledStorageBuffer {
            buffer,
            desc: *desc,
            last_used_frame: Cell::new(self.frame),
        });
        self.buffers.push(Rc::clone(&pooled));
        pooled
    }

    // ── Frame boundary ─────────────────────────────────────────────────────

    /// Advances the frame counter and prunes idle entries.
    ///
    /// Call once per rendered frame.
    pub fn update(&mut self, api: &mut dyn RenderApi) {
        self.frame += 1;
        self.prune(api, self.prune_age);
    }

    /// Destroys free entries not used for at least `age` frames.
    pub fn prune(&mut self, api: &mut dyn RenderApi, age: u64) {
        let frame = self.frame;
        let before = self.textures.len() + self.buffers.len();

        self.textures.retain(|t| {
            let expired = Rc::strong_count(t) == 1 && frame - t.last_used_frame.get() >= age;
            if expired {
                if let Some(rt) = t.render_target {
                    api.destroy_render_target(rt);
                }
                api.destroy_texture(t.texture);
            }
            !expired
        });

        self.buffers.retain(|b| {
            let expired = Rc::strong_count(b) == 1 && frame - b.last_used_frame.get() >= age;
            if expired {
                api.destroy_buffer(b.buffer);
            }
            !expired
        });

        let removed = before - (self.textures.len() + self.buffers.len());
        if removed > 0 {
            log::trace!("GpuResourcePool: pruned {removed} entries at frame {frame}");
        }
    }

    /// Destroys every entry regardless of use. Outstanding `Rc`s keep their
    /// metadata alive but their device handles become invalid.
    pub fn clear(&mut self, api: &mut dyn RenderApi) {
        for t in self.textures.drain(..) {
            if let Some(rt) = t.render_target {
                api.destroy_render_target(rt);
            }
            api.destroy_texture(t.texture);
        }
        for b in self.buffers.drain(..) {
            api.destroy_buffer(b.buffer);
        }
    }

    // ── Introspection ──────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    #[must_use]
    pub fn prune_age(&self) -> u64 {
        self.prune_age
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Entries currently held outside the pool.
    #[must_use]
    pub fn textures_in_use(&self) -> usize {
        self.textures.iter().filter(|t| Rc::strong_count(t) > 1).count()
    }
}
