//! GPU resource descriptors
//!
//! Describe the shape of textures and buffers requested from the device.
//! The [`GpuResourcePool`](crate::renderer::graph::transient_pool::GpuResourcePool)
//! matches pooled resources against these descriptors field by field.

use bitflags::bitflags;

bitflags! {
    /// How a texture will be used. Pool matching treats these as a superset
    /// requirement: a pooled texture may carry more flags than requested.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u8 {
        /// Sampled in shaders.
        const SHADER_READ = 1 << 0;
        /// Bound as a color attachment.
        const RENDER_TARGET = 1 << 1;
        /// Bound as a depth-stencil attachment.
        const DEPTH_STENCIL = 1 << 2;
        /// Random-access read/write from compute.
        const LOAD_STORE = 1 << 3;
        /// Written from the CPU every frame.
        const DYNAMIC = 1 << 4;
    }
}

impl TextureUsage {
    /// Whether allocation needs an accompanying render-target view.
    #[inline]
    #[must_use]
    pub fn needs_render_target(self) -> bool {
        self.intersects(Self::RENDER_TARGET | Self::DEPTH_STENCIL)
    }

    /// Maps engine usage onto wgpu usage bits for GPU backends.
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC;
        if self.needs_render_target() {
            usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        if self.contains(Self::LOAD_STORE) {
            usages |= wgpu::TextureUsages::STORAGE_BINDING;
        }
        if self.contains(Self::DYNAMIC) {
            usages |= wgpu::TextureUsages::COPY_DST;
        }
        usages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
}

/// Shape of a requested texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub ty: TextureType,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Only meaningful for 3D textures.
    pub depth: u32,
    /// Mip levels in addition to the base level.
    pub num_mips: u32,
    /// Only meaningful for 2D textures.
    pub num_samples: u32,
    /// Only meaningful for 2D textures.
    pub hw_gamma: bool,
    pub num_array_slices: u32,
    pub usage: TextureUsage,
}

impl TextureDesc {
    #[must_use]
    pub fn create_2d(format: wgpu::TextureFormat, width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            ty: TextureType::Texture2D,
            format,
            width,
            height,
            depth: 1,
            num_mips: 0,
            num_samples: 1,
            hw_gamma: false,
            num_array_slices: 1,
            usage,
        }
    }

    #[must_use]
    pub fn create_3d(format: wgpu::TextureFormat, width: u32, height: u32, depth: u32, usage: TextureUsage) -> Self {
        Self {
            ty: TextureType::Texture3D,
            depth,
            ..Self::create_2d(format, width, height, usage)
        }
    }

    #[must_use]
    pub fn create_cube(format: wgpu::TextureFormat, size: u32, usage: TextureUsage) -> Self {
        Self {
            ty: TextureType::TextureCube,
            ..Self::create_2d(format, size, size, usage)
        }
    }

    #[must_use]
    pub fn with_samples(mut self, num_samples: u32) -> Self {
        self.num_samples = num_samples.max(1);
        self
    }

    #[must_use]
    pub fn with_hw_gamma(mut self, hw_gamma: bool) -> Self {
        self.hw_gamma = hw_gamma;
        self
    }

    #[must_use]
    pub fn with_mips(mut self, num_mips: u32) -> Self {
        self.num_mips = num_mips;
        self
    }

    #[must_use]
    pub fn with_array_slices(mut self, num_array_slices: u32) -> Self {
        self.num_array_slices = num_array_slices.max(1);
        self
    }

    /// Whether a texture created from `self` can serve a request for `requested`.
    ///
    /// Type, format, dimensions, mip and array layout must be identical; sample
    /// count and gamma only matter for 2D textures, depth only for 3D. Usage
    /// must be a superset of the requested usage.
    #[must_use]
    pub fn satisfies(&self, requested: &TextureDesc) -> bool {
        if self.ty != requested.ty
            || self.format != requested.format
            || self.width != requested.width
            || self.height != requested.height
            || self.num_array_slices != requested.num_array_slices
            || self.num_mips != requested.num_mips
            || !self.usage.contains(requested.usage)
        {
            return false;
        }

        match self.ty {
            TextureType::Texture2D => {
                self.num_samples == requested.num_samples && self.hw_gamma == requested.hw_gamma
            }
            TextureType::Texture3D => self.depth == requested.depth,
            TextureType::Texture1D | TextureType::TextureCube => true,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u8 {
        /// Written once, read by shaders.
        const STATIC = 1 << 0;
        /// Rewritten from the CPU every frame.
        const DYNAMIC = 1 << 1;
        /// Random-access read/write from compute.
        const LOAD_STORE = 1 << 2;
    }
}

impl BufferUsage {
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::BufferUsages {
        let mut usages = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        if self.contains(Self::DYNAMIC) {
            usages |= wgpu::BufferUsages::UNIFORM;
        }
        usages
    }
}

/// Element format of a standard (typed) buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferFormat {
    R32Float,
    Rg32Float,
    Rgba32Float,
    R32Uint,
    Rgba32Uint,
    Rgba16Float,
    Rgba8Unorm,
}

impl BufferFormat {
    #[must_use]
    pub const fn element_size(self) -> u32 {
        match self {
            Self::R32Float | Self::R32Uint | Self::Rgba8Unorm => 4,
            Self::Rg32Float | Self::Rgba16Float => 8,
            Self::Rgba32Float | Self::Rgba32Uint => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Typed buffer with a fixed texel format.
    Standard { format: BufferFormat },
    /// Array of user structs.
    Structured { element_size: u32 },
    /// Constant parameter block of a fixed byte size.
    Uniform { size: u32 },
}

/// Shape of a requested buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub ty: BufferType,
    pub element_count: u32,
    pub usage: BufferUsage,
}

impl BufferDesc {
    #[must_use]
    pub fn standard(format: BufferFormat, element_count: u32, usage: BufferUsage) -> Self {
        Self {
            ty: BufferType::Standard { format },
            element_count,
            usage,
        }
    }

    #[must_use]
    pub fn structured(element_size: u32, element_count: u32, usage: BufferUsage) -> Self {
        Self {
            ty: BufferType::Structured { element_size },
            element_count,
            usage,
        }
    }

    /// Parameter block sized for `T`, rewritten from the CPU.
    #[must_use]
    pub fn uniform<T: bytemuck::Pod>() -> Self {
        Self {
            ty: BufferType::Uniform {
                size: std::mem::size_of::<T>() as u32,
            },
            element_count: 1,
            usage: BufferUsage::DYNAMIC,
        }
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        let element = match self.ty {
            BufferType::Standard { format } => format.element_size(),
            BufferType::Structured { element_size } => element_size,
            BufferType::Uniform { size } => size,
        };
        u64::from(element) * u64::from(self.element_count)
    }

    /// Buffer type, element count and element layout must match exactly;
    /// usage must be a superset.
    #[must_use]
    pub fn satisfies(&self, requested: &BufferDesc) -> bool {
        self.ty == requested.ty
            && self.element_count == requested.element_count
            && self.usage.contains(requested.usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_superset_matches() {
        let pooled = TextureDesc::create_2d(
            wgpu::TextureFormat::Rgba8Unorm,
            64,
            64,
            TextureUsage::RENDER_TARGET | TextureUsage::LOAD_STORE,
        );
        let requested =
            TextureDesc::create_2d(wgpu::TextureFormat::Rgba8Unorm, 64, 64, TextureUsage::RENDER_TARGET);
        assert!(pooled.satisfies(&requested));
        assert!(!requested.satisfies(&pooled));
    }

    #[test]
    fn sample_count_only_checked_for_2d() {
        let a = TextureDesc::create_2d(wgpu::TextureFormat::Rgba8Unorm, 8, 8, TextureUsage::SHADER_READ);
        assert!(!a.with_samples(4).satisfies(&a));

        let cube = TextureDesc::create_cube(wgpu::TextureFormat::Rgba8Unorm, 8, TextureUsage::SHADER_READ);
        let mut other = cube;
        other.num_samples = 4;
        assert!(other.satisfies(&cube));
    }

    #[test]
    fn depth_only_checked_for_3d() {
        let a = TextureDesc::create_3d(wgpu::TextureFormat::R32Float, 8, 8, 8, TextureUsage::LOAD_STORE);
        let b = TextureDesc::create_3d(wgpu::TextureFormat::R32Float, 8, 8, 4, TextureUsage::LOAD_STORE);
        assert!(!a.satisfies(&b));
    }

    #[test]
    fn structured_buffers_match_on_element_size() {
        let a = BufferDesc::structured(16, 32, BufferUsage::LOAD_STORE);
        let b = BufferDesc::structured(32, 32, BufferUsage::LOAD_STORE);
        assert!(a.satisfies(&a));
        assert!(!a.satisfies(&b));
        assert_eq!(a.size_bytes(), 512);
    }

    #[test]
    fn render_target_usage_maps_to_attachment() {
        let usages = TextureUsage::RENDER_TARGET.to_wgpu();
        assert!(usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
        assert!(!TextureUsage::SHADER_READ.to_wgpu().contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    }
}
