use bytemuck::{Pod, Zeroable};

use super::BenchError;

/// Largest overdraw factor whose index count (`6 × cycles`) still fits a `u32`
/// draw range.
pub const MAX_CYCLES: u32 = u32::MAX / QUAD_INDICES.len() as u32;

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 2], // NDC
    pub uv: [f32; 2],  // +V down
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Screen-filling quad. UVs are flipped vertically against the positions since
/// texture rows grow downward while NDC Y grows upward.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { pos: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { pos: [1.0, 1.0], uv: [1.0, 0.0] },
    QuadVertex { pos: [-1.0, 1.0], uv: [0.0, 0.0] },
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── batch ─────────────────────────────────────────────────────────────────

/// One quad plus an index stream that redraws it `cycles` times.
///
/// Only the index stream scales with `cycles`; the four vertices are shared.
/// Every redraw covers the same pixels, so fragment work grows linearly with
/// `cycles` while vertex work and the visible image stay fixed.
#[derive(Debug, Clone)]
pub struct GeometryBatch {
    cycles: u32,
    indices: Vec<u16>,
}

impl GeometryBatch {
    /// Builds the overdraw batch. `cycles == 0` is rejected before allocating.
    pub fn build(cycles: u32) -> Result<Self, BenchError> {
        if cycles == 0 {
            return Err(BenchError::InvalidCycles(0));
        }
        if cycles > MAX_CYCLES {
            return Err(BenchError::TooManyCycles(u64::from(cycles)));
        }

        let mut indices = Vec::with_capacity(QUAD_INDICES.len() * cycles as usize);
        for _ in 0..cycles {
            indices.extend_from_slice(&QUAD_INDICES);
        }

        log::debug!("built overdraw batch: {cycles} cycles, {} indices", indices.len());
        Ok(Self { cycles, indices })
    }

    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    #[inline]
    pub fn vertices(&self) -> &'static [QuadVertex; 4] {
        &QUAD_VERTICES
    }

    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Index count for `draw_indexed`. Fits by construction (`cycles <= MAX_CYCLES`).
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Rejects a batch whose index buffer exceeds the device's `max_buffer_size`.
    pub fn check_buffer_limit(&self, max_buffer_size: u64) -> Result<(), BenchError> {
        check_index_buffer(self.cycles, max_buffer_size)
    }
}

/// Size in bytes of the `u16` index buffer for `cycles` redraws.
pub fn index_buffer_bytes(cycles: u32) -> u64 {
    u64::from(cycles) * (QUAD_INDICES.len() * std::mem::size_of::<u16>()) as u64
}

/// Checks that the overdraw index buffer for `cycles` fits in `max_buffer_size` bytes.
pub fn check_index_buffer(cycles: u32, max_buffer_size: u64) -> Result<(), BenchError> {
    let bytes = index_buffer_bytes(cycles);
    if bytes > max_buffer_size {
        return Err(BenchError::IndexBufferTooLarge {
            cycles,
            bytes,
            max: max_buffer_size,
        });
    }
    Ok(())
}

/// Validates a signed overdraw factor coming from user input.
pub fn cycles_from_signed(cycles: i64) -> Result<u32, BenchError> {
    if cycles <= 0 {
        return Err(BenchError::InvalidCycles(cycles));
    }
    u32::try_from(cycles)
        .ok()
        .filter(|c| *c <= MAX_CYCLES)
        .ok_or(BenchError::TooManyCycles(cycles as u64))
}
