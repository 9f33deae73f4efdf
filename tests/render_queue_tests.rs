//! Render Queue Tests
//!
//! Tests for:
//! - Material state reduction minimising pipeline/material switches
//! - Distance ordering (front to back)
//! - Transparent ordering (back to front)
//! - Submission order under `StateReduction::None`

use sable::renderer::render_queue::RenderQueue;
use sable::renderer::settings::StateReduction;
use sable::scene::{MaterialId, MeshId, PipelineId, RenderableElement};

fn element(pipeline: u16, material: u32) -> RenderableElement {
    RenderableElement::new(MeshId(0), 0, MaterialId(material), PipelineId(pipeline))
}

/// Interleaved states at increasing distances: worst case for switches when
/// left in submission order.
fn fill(queue: &mut RenderQueue) {
    let states = [(1, 10), (2, 20), (1, 11), (2, 20), (1, 10), (2, 21), (1, 11), (1, 10)];
    for (i, (pipeline, material)) in states.into_iter().enumerate() {
        queue.add(&element(pipeline, material), i, 0, (i as f32 + 1.0) * 4.0);
    }
}

fn renderables(queue: &RenderQueue) -> Vec<usize> {
    queue.elements().iter().map(|e| e.renderable).collect()
}

// ============================================================================
// Opaque Ordering
// ============================================================================

#[test]
fn material_reduction_minimises_state_changes() {
    let mut unsorted = RenderQueue::opaque(StateReduction::None);
    fill(&mut unsorted);
    unsorted.sort();

    let mut sorted = RenderQueue::opaque(StateReduction::Material);
    fill(&mut sorted);
    sorted.sort();

    // Four distinct (pipeline, material) states: one switch each.
    assert_eq!(sorted.state_changes(), 4);
    assert_eq!(unsorted.state_changes(), 8);
    assert!(sorted.state_changes() < unsorted.state_changes());
    assert_eq!(sorted.len(), unsorted.len());
}

#[test]
fn material_reduction_groups_by_pipeline_first() {
    let mut queue = RenderQueue::opaque(StateReduction::Material);
    fill(&mut queue);
    queue.sort();

    let pipelines: Vec<u16> = queue.elements().iter().map(|e| e.pipeline.0).collect();
    assert_eq!(pipelines, vec![1, 1, 1, 1, 1, 2, 2, 2]);
}

#[test]
fn material_reduction_is_front_to_back_within_state() {
    let mut queue = RenderQueue::opaque(StateReduction::Material);
    fill(&mut queue);
    queue.sort();

    for pair in queue.elements().windows(2) {
        if (pair[0].pipeline, pair[0].material) == (pair[1].pipeline, pair[1].material) {
            assert!(pair[0].distance_sq <= pair[1].distance_sq);
        }
    }
}

#[test]
fn distance_reduction_is_front_to_back() {
    let mut queue = RenderQueue::opaque(StateReduction::Distance);
    for (i, distance) in [30.0, 5.0, 100.0, 0.5].into_iter().enumerate() {
        queue.add(&element(1, 1), i, 0, distance);
    }
    queue.sort();

    assert_eq!(renderables(&queue), vec![3, 1, 0, 2]);
}

#[test]
fn no_reduction_keeps_submission_order() {
    let mut queue = RenderQueue::opaque(StateReduction::None);
    fill(&mut queue);
    queue.sort();

    assert_eq!(renderables(&queue), (0..8).collect::<Vec<_>>());
}

#[test]
fn equal_keys_keep_submission_order() {
    let mut queue = RenderQueue::opaque(StateReduction::Distance);
    for i in 0..4 {
        queue.add(&element(1, 1), i, 0, 9.0);
    }
    queue.sort();

    assert_eq!(renderables(&queue), vec![0, 1, 2, 3]);
}

// ============================================================================
// Transparent Ordering
// ============================================================================

#[test]
fn transparent_is_back_to_front() {
    let mut queue = RenderQueue::transparent();
    for (i, distance) in [30.0, 5.0, 100.0, 0.5].into_iter().enumerate() {
        queue.add(&element(i as u16, i as u32), i, 0, distance);
    }
    queue.sort();

    assert_eq!(renderables(&queue), vec![2, 0, 1, 3]);
}

#[test]
fn transparent_ignores_material_state() {
    let mut queue = RenderQueue::transparent();
    queue.set_state_reduction(StateReduction::Material);
    fill(&mut queue);
    queue.sort();

    assert_eq!(renderables(&queue), (0..8).rev().collect::<Vec<_>>());
}

#[test]
fn clear_empties_queue() {
    let mut queue = RenderQueue::opaque(StateReduction::Material);
    fill(&mut queue);
    queue.clear();

    assert!(queue.is_empty());
    assert_eq!(queue.state_changes(), 0);
}
