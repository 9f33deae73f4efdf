//! GPU Resource Pool Tests
//!
//! Tests for:
//! - Reuse of released textures (round trip)
//! - Isolation of held textures
//! - First-fit matching on descriptors
//! - Age-based pruning on `update`
//! - Interaction with compositor node clears

use std::rc::Rc;

use sable::renderer::core::{BufferDesc, BufferUsage, NullRenderApi, TextureDesc, TextureUsage};
use sable::renderer::graph::GpuResourcePool;

fn rgba8(size: u32) -> TextureDesc {
    TextureDesc::create_2d(wgpu::TextureFormat::Rgba8Unorm, size, size, TextureUsage::RENDER_TARGET)
}

// ============================================================================
// Acquisition
// ============================================================================

#[test]
fn released_texture_is_reused() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::new();

    let first = pool.get_texture(&mut api, &rgba8(256));
    let first_ptr = Rc::as_ptr(&first);
    drop(first);

    let second = pool.get_texture(&mut api, &rgba8(256));

    assert_eq!(Rc::as_ptr(&second), first_ptr);
    assert_eq!(api.textures_created(), 1);
}

#[test]
fn held_texture_is_not_shared() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::new();

    let first = pool.get_texture(&mut api, &rgba8(256));
    let second = pool.get_texture(&mut api, &rgba8(256));

    assert!(!Rc::ptr_eq(&first, &second));
    assert_ne!(first.texture(), second.texture());
    assert_eq!(pool.texture_count(), 2);
    assert_eq!(pool.textures_in_use(), 2);
}

#[test]
fn third_request_reuses_released_first() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::new();
    let desc = rgba8(512);

    let first = pool.get_texture(&mut api, &desc);
    let second = pool.get_texture(&mut api, &desc);
    assert!(!Rc::ptr_eq(&first, &second));

    let first_ptr = Rc::as_ptr(&first);
    drop(first);
    let third = pool.get_texture(&mut api, &desc);

    assert_eq!(Rc::as_ptr(&third), first_ptr);
    assert_eq!(pool.texture_count(), 2);
    drop(second);
}

#[test]
fn mismatched_descriptor_allocates() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::new();

    drop(pool.get_texture(&mut api, &rgba8(256)));
    let other_size = pool.get_texture(&mut api, &rgba8(128));
    let other_format = pool.get_texture(
        &mut api,
        &TextureDesc::create_2d(wgpu::TextureFormat::Rgba16Float, 256, 256, TextureUsage::RENDER_TARGET),
    );

    assert_eq!(other_size.desc().width, 128);
    assert_eq!(other_format.desc().format, wgpu::TextureFormat::Rgba16Float);
    assert_eq!(pool.texture_count(), 3);
}

#[test]
fn superset_usage_satisfies_request() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::new();

    let rich = TextureDesc::create_2d(
        wgpu::TextureFormat::Rgba8Unorm,
        64,
        64,
        TextureUsage::RENDER_TARGET | TextureUsage::SHADER_READ,
    );
    let rich_ptr = Rc::as_ptr(&pool.get_texture(&mut api, &rich));

    let reused = pool.get_texture(&mut api, &rgba8(64));
    assert_eq!(Rc::as_ptr(&reused), rich_ptr);
}

#[test]
fn msaa_textures_match_on_sample_count() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::new();

    drop(pool.get_texture(&mut api, &rgba8(64).with_samples(4)));
    let single = pool.get_texture(&mut api, &rgba8(64));

    assert_eq!(single.desc().num_samples, 1);
    assert_eq!(pool.texture_count(), 2);
}

// ============================================================================
// Pruning
// ============================================================================

#[test]
fn idle_entries_are_pruned_after_age() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::with_prune_age(3);

    drop(pool.get_texture(&mut api, &rgba8(64)));

    pool.update(&mut api);
    pool.update(&mut api);
    assert_eq!(pool.texture_count(), 1, "unused for 2 frames");

    pool.update(&mut api);
    assert_eq!(pool.texture_count(), 0, "unused for 3 frames");
    assert_eq!(api.live_texture_count(), 0);
}

#[test]
fn recently_used_entries_survive() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::with_prune_age(3);

    for _ in 0..10 {
        drop(pool.get_texture(&mut api, &rgba8(64)));
        pool.update(&mut api);
    }

    assert_eq!(pool.texture_count(), 1);
    assert_eq!(api.textures_created(), 1);
}

#[test]
fn explicit_prune_uses_given_age() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::with_prune_age(100);

    drop(pool.get_texture(&mut api, &rgba8(64)));
    pool.update(&mut api);

    pool.prune(&mut api, 2);
    assert_eq!(pool.texture_count(), 1);
    pool.prune(&mut api, 1);
    assert_eq!(pool.texture_count(), 0);
}

#[test]
fn pruning_destroys_render_target_views() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::with_prune_age(1);

    let texture = pool.get_texture(&mut api, &rgba8(32));
    let handle = texture.texture();
    drop(texture);
    pool.update(&mut api);

    assert!(!api.is_texture_alive(handle));
}

#[test]
fn buffers_prune_like_textures() {
    let mut api = NullRenderApi::new();
    let mut pool = GpuResourcePool::with_prune_age(2);
    let desc = BufferDesc::structured(64, 16, BufferUsage::DYNAMIC);

    let held = pool.get_buffer(&mut api, &desc);
    drop(pool.get_buffer(&mut api, &desc));
    assert_eq!(pool.buffer_count(), 2);

    pool.update(&mut api);
    pool.update(&mut api);

    assert_eq!(pool.buffer_count(), 1);
    assert_eq!(api.live_buffer_count(), 1);
    drop(held);
}
