//! Render Queues
//!
//! A view owns two queues: opaque elements sorted by the view's
//! [`StateReduction`] mode, and transparent elements always sorted back to
//! front.
//!
//! Ordering is driven by a packed 64-bit [`SortKey`]:
//!
//! ```text
//! Material:  [ pipeline:14 | material:20 | depth:30 ]   front to back within a state
//! Distance:  [                 0         | depth:32 ]   front to back
//! BackToFront: [               0         | !depth:32 ]  back to front
//! ```
//!
//! Sorting is stable, so elements with equal keys keep submission order.

use crate::renderer::settings::StateReduction;
use crate::scene::{MaterialId, MeshId, PipelineId, RenderableElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SortKey(u64);

impl SortKey {
    /// Groups by pipeline, then material, then depth.
    #[must_use]
    pub fn by_state(pipeline: PipelineId, material: MaterialId, distance_sq: f32) -> Self {
        let p_bits = u64::from(pipeline.0 & 0x3FFF) << 50;
        let m_bits = u64::from(material.0 & 0xF_FFFF) << 30;
        let d_bits = u64::from(depth_bits(distance_sq) >> 2) & 0x3FFF_FFFF;
        Self(p_bits | m_bits | d_bits)
    }

    #[must_use]
    pub fn front_to_back(distance_sq: f32) -> Self {
        Self(u64::from(depth_bits(distance_sq)))
    }

    #[must_use]
    pub fn back_to_front(distance_sq: f32) -> Self {
        Self(u64::from(!depth_bits(distance_sq)))
    }

    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Monotonic integer encoding of a non-negative float.
fn depth_bits(value: f32) -> u32 {
    if value.is_sign_negative() || value.is_nan() { 0 } else { value.to_bits() }
}

/// One draw: a single sub-mesh element of a visible renderable.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderQueueElement {
    /// Index of the renderable in the scene's renderable array.
    pub renderable: usize,
    /// Index of the element within the renderable.
    pub element: usize,
    pub mesh: MeshId,
    pub sub_mesh: u32,
    pub material: MaterialId,
    pub pipeline: PipelineId,
    /// Squared distance from the view origin to the renderable's bounds.
    pub distance_sq: f32,
    key: SortKey,
}

impl RenderQueueElement {
    #[inline]
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Opaque(StateReduction),
    BackToFront,
}

#[derive(Debug, Clone)]
pub struct RenderQueue {
    order: Order,
    elements: Vec<RenderQueueElement>,
}

impl RenderQueue {
    /// Queue sorted according to `state_reduction`.
    #[must_use]
    pub fn opaque(state_reduction: StateReduction) -> Self {
        Self {
            order: Order::Opaque(state_reduction),
            elements: Vec::new(),
        }
    }

    /// Queue sorted back to front. Blending needs the depth order, so
    /// transparent elements are never grouped by pipeline or material,
    /// whatever [`StateReduction`] the view uses.
    #[must_use]
    pub fn transparent() -> Self {
        Self {
            order: Order::BackToFront,
            elements: Vec::new(),
        }
    }

    /// Changes the ordering of an opaque queue. Transparent queues stay
    /// back to front.
    pub fn set_state_reduction(&mut self, state_reduction: StateReduction) {
        if let Order::Opaque(mode) = &mut self.order {
            *mode = state_reduction;
        }
    }

    #[must_use]
    pub fn state_reduction(&self) -> StateReduction {
        match self.order {
            Order::Opaque(mode) => mode,
            Order::BackToFront => StateReduction::Distance,
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn add(
        &mut self,
        element: &RenderableElement,
        renderable: usize,
        element_index: usize,
        distance_sq: f32,
    ) {
        let key = match self.order {
            Order::Opaque(StateReduction::None) => SortKey::default(),
            Order::Opaque(StateReduction::Material) => {
                SortKey::by_state(element.pipeline, element.material, distance_sq)
            }
            Order::Opaque(StateReduction::Distance) => SortKey::front_to_back(distance_sq),
            Order::BackToFront => SortKey::back_to_front(distance_sq),
        };

        self.elements.push(RenderQueueElement {
            renderable,
            element: element_index,
            mesh: element.mesh,
            sub_mesh: element.sub_mesh,
            material: element.material,
            pipeline: element.pipeline,
            distance_sq,
            key,
        });
    }

    /// Sorts by key. Stable, so `StateReduction::None` keeps submission order.
    pub fn sort(&mut self) {
        if self.order != Order::Opaque(StateReduction::None) {
            self.elements.sort_by_key(|e| e.key);
        }
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[RenderQueueElement] {
        &self.elements
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Pipeline or material changes a renderer walking the queue in order
    /// would make.
    #[must_use]
    pub fn state_changes(&self) -> usize {
        let mut changes = 0;
        let mut last = None;
        for e in &self.elements {
            let state = Some((e.pipeline, e.material));
            if state != last {
                changes += 1;
                last = state;
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_bits_are_monotonic() {
        let samples = [0.0_f32, 0.5, 1.0, 10.0, 1000.0, 1.0e9];
        for pair in samples.windows(2) {
            assert!(SortKey::front_to_back(pair[0]) < SortKey::front_to_back(pair[1]));
            assert!(SortKey::back_to_front(pair[0]) > SortKey::back_to_front(pair[1]));
        }
    }

    #[test]
    fn pipeline_dominates_material() {
        let a = SortKey::by_state(PipelineId(1), MaterialId(900), 0.0);
        let b = SortKey::by_state(PipelineId(2), MaterialId(1), 0.0);
        assert!(a < b);
    }

    #[test]
    fn transparent_ignores_state_reduction() {
        let mut queue = RenderQueue::transparent();
        queue.set_state_reduction(StateReduction::Material);
        assert_eq!(queue.state_reduction(), StateReduction::Distance);
    }
}
