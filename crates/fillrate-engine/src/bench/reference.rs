//! CPU evaluation of the convolution shader.
//!
//! `vertex_stage` and `fragment_stage` follow `convolution.wgsl` line for line,
//! sampling the way the source texture's sampler does (bilinear,
//! clamp-to-edge), so the shader contract can be checked without a GPU.
//! When the texture side equals the target side every tap lands on a texel
//! centre and the filter reduces to a plain texel read. `convolve_image` runs the same kernel over a whole
//! image and times it, giving a single-threaded CPU baseline to compare the
//! GPU figures against.

use std::time::{Duration, Instant};

use image::RgbaImage;

use super::{ConvolutionKernel, QuadVertex};

/// Tap offsets in texel units, in kernel weight order. `+y` is `+V` (down).
pub const TAP_OFFSETS: [(f32, f32); 9] = [
    (-1.0, 1.0),
    (0.0, 1.0),
    (1.0, 1.0),
    (-1.0, 0.0),
    (0.0, 0.0),
    (1.0, 0.0),
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
];

/// Output of the vertex stage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexOutput {
    pub clip_position: [f32; 4],
    pub uv: [f32; 2],
}

/// Passthrough: NDC position with `z = 0`, `w = 1`; UV forwarded untouched.
pub fn vertex_stage(v: &QuadVertex) -> VertexOutput {
    VertexOutput {
        clip_position: [v.pos[0], v.pos[1], 0.0, 1.0],
        uv: v.uv,
    }
}

/// Anything the fragment stage can sample.
pub trait TexelSource {
    /// RGBA in `[0, 1]` at `uv`.
    fn sample(&self, uv: [f32; 2]) -> [f32; 4];
}

/// Bilinear, clamp-to-edge sampling of an RGBA8 image.
impl TexelSource for RgbaImage {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let (x0, x1, fx) = linear_taps(uv[0], self.width());
        let (y0, y1, fy) = linear_taps(uv[1], self.height());
        let texel = |x, y| self.get_pixel(x, y).0.map(|c| f32::from(c) / 255.0);

        let (a, b) = (texel(x0, y0), texel(x1, y0));
        let (c, d) = (texel(x0, y1), texel(x1, y1));
        std::array::from_fn(|i| {
            let top = a[i] + (b[i] - a[i]) * fx;
            let bottom = c[i] + (d[i] - c[i]) * fx;
            top + (bottom - top) * fy
        })
    }
}

/// The two texels straddling `coord` along one axis, plus the blend weight
/// of the second. Texel centres sit at `(i + 0.5) / extent`.
fn linear_taps(coord: f32, extent: u32) -> (u32, u32, f32) {
    let max = i64::from(extent.saturating_sub(1));
    let t = coord * extent as f32 - 0.5;
    let base = t.floor();
    let i0 = (base as i64).clamp(0, max) as u32;
    let i1 = (base as i64 + 1).clamp(0, max) as u32;
    (i0, i1, t - base)
}

/// Weighted 9-tap sum divided by the kernel divisor, per channel.
pub fn fragment_stage<S>(
    source: &S,
    uv: [f32; 2],
    kernel: &ConvolutionKernel,
    texel_step: f32,
) -> [f32; 4]
where
    S: TexelSource + ?Sized,
{
    let mut sum = [0.0f32; 4];
    for (&(dx, dy), &w) in TAP_OFFSETS.iter().zip(kernel.weights()) {
        let texel = source.sample([uv[0] + dx * texel_step, uv[1] + dy * texel_step]);
        for (acc, c) in sum.iter_mut().zip(texel) {
            *acc += c * w;
        }
    }
    sum.map(|c| c / kernel.divisor())
}

// ── CPU baseline ──────────────────────────────────────────────────────────

/// Result of a whole-image CPU convolution.
pub struct CpuConvolution {
    pub output: RgbaImage,
    pub elapsed: Duration,
}

impl CpuConvolution {
    pub fn nanoseconds_per_pixel(&self) -> f64 {
        let pixels = u64::from(self.output.width()) * u64::from(self.output.height());
        if pixels == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / pixels as f64
    }
}

/// Convolves `src` on the CPU with the shader's tap layout and edge clamping.
///
/// Color channels are clamped to `[0, 255]` after division; alpha is copied
/// from the source.
pub fn convolve_image(src: &RgbaImage, kernel: &ConvolutionKernel) -> CpuConvolution {
    let (width, height) = src.dimensions();
    let mut output = RgbaImage::new(width, height);
    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;

    let start = Instant::now();
    for y in 0..height {
        for x in 0..width {
            let mut rgb = [0.0f32; 3];
            for (&(dx, dy), &w) in TAP_OFFSETS.iter().zip(kernel.weights()) {
                let sx = (i64::from(x) + dx as i64).clamp(0, max_x) as u32;
                let sy = (i64::from(y) + dy as i64).clamp(0, max_y) as u32;
                let p = src.get_pixel(sx, sy).0;
                for (acc, c) in rgb.iter_mut().zip(p) {
                    *acc += f32::from(c) * w;
                }
            }
            let alpha = src.get_pixel(x, y).0[3];
            let [r, g, b] = rgb.map(|c| (c / kernel.divisor()).round().clamp(0.0, 255.0) as u8);
            output.put_pixel(x, y, image::Rgba([r, g, b, alpha]));
        }
    }
    let elapsed = start.elapsed();

    CpuConvolution { output, elapsed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::{GeometryBatch, KernelPreset, QUAD_VERTICES};

    const STEP: f32 = 1.0 / 1024.0;

    fn uniform(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba(rgba))
    }

    fn close4(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    // ── vertex stage ──────────────────────────────────────────────────────

    #[test]
    fn vertex_stage_leaves_corners_untouched() {
        let batch = GeometryBatch::build(4).unwrap();
        for v in batch.vertices() {
            let out = vertex_stage(v);
            assert_eq!(out.clip_position, [v.pos[0], v.pos[1], 0.0, 1.0]);
            assert_eq!(out.uv, v.uv);
        }
    }

    #[test]
    fn vertex_stage_covers_the_full_ndc_square() {
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| vertex_stage(v).clip_position[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| vertex_stage(v).clip_position[1]).collect();
        assert_eq!(xs, [-1.0, 1.0, 1.0, -1.0]);
        assert_eq!(ys, [-1.0, -1.0, 1.0, 1.0]);
    }

    // ── fragment stage ────────────────────────────────────────────────────

    #[test]
    fn box_blur_of_uniform_field_is_invariant() {
        let tex = uniform(64, 64, [200, 100, 50, 255]);
        let kernel = ConvolutionKernel::new([1.0; 9], 9.0).unwrap();
        let expected = [200.0 / 255.0, 100.0 / 255.0, 50.0 / 255.0, 1.0];

        for uv in [[0.5, 0.5], [0.0, 0.0], [1.0, 1.0], [0.01, 0.99]] {
            assert!(close4(fragment_stage(&tex, uv, &kernel, STEP), expected));
        }
    }

    #[test]
    fn edge_detect_of_uniform_field_is_zero() {
        let tex = uniform(16, 16, [255, 255, 255, 255]);
        let out = fragment_stage(&tex, [0.5, 0.5], &ConvolutionKernel::default(), STEP);
        assert!(close4(out, [0.0; 4]));
    }

    #[test]
    fn divisor_scales_the_sum() {
        let tex = uniform(8, 8, [255, 255, 255, 255]);
        let kernel = ConvolutionKernel::new([1.0; 9], 18.0).unwrap();
        let out = fragment_stage(&tex, [0.5, 0.5], &kernel, 1.0 / 8.0);
        assert!(close4(out, [0.5; 4]));
    }

    #[test]
    fn taps_follow_weight_order() {
        // 3x3 texture whose red channel encodes the texel index (row-major,
        // top row first). A one-hot kernel must pick exactly the tap at its
        // offset from the center texel.
        let mut tex = RgbaImage::new(3, 3);
        for (i, p) in tex.pixels_mut().enumerate() {
            *p = image::Rgba([i as u8 * 10, 0, 0, 255]);
        }
        let center = [0.5, 0.5];
        let step = 1.0 / 3.0;

        for (k, &(dx, dy)) in TAP_OFFSETS.iter().enumerate() {
            let mut w = [0.0; 9];
            w[k] = 1.0;
            let kernel = ConvolutionKernel::new(w, 1.0).unwrap();
            let out = fragment_stage(&tex, center, &kernel, step);

            let col = (1 + dx as i32) as u8;
            let row = (1 + dy as i32) as u8;
            let expected = f32::from((row * 3 + col) * 10) / 255.0;
            assert!((out[0] - expected).abs() < 1e-6, "tap {k}");
        }
    }

    #[test]
    fn sampling_clamps_at_edges() {
        let mut tex = uniform(2, 1, [0, 0, 0, 255]);
        tex.put_pixel(1, 0, image::Rgba([255, 0, 0, 255]));
        assert_eq!(tex.sample([-0.5, 0.5])[0], 0.0);
        assert_eq!(tex.sample([1.5, 0.5])[0], 1.0);
    }

    #[test]
    fn sampling_is_exact_at_texel_centres() {
        let mut tex = uniform(2, 1, [0, 0, 0, 255]);
        tex.put_pixel(1, 0, image::Rgba([255, 0, 0, 255]));
        assert_eq!(tex.sample([0.25, 0.5])[0], 0.0);
        assert_eq!(tex.sample([0.75, 0.5])[0], 1.0);
    }

    #[test]
    fn sampling_blends_between_texel_centres() {
        let mut tex = uniform(2, 2, [0, 0, 0, 255]);
        tex.put_pixel(1, 0, image::Rgba([255, 0, 0, 255]));
        assert!((tex.sample([0.5, 0.25])[0] - 0.5).abs() < 1e-6);
        // Halfway in both axes: one red texel out of four.
        assert!((tex.sample([0.5, 0.5])[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn matching_sizes_agree_with_cpu_baseline() {
        let mut src = RgbaImage::new(8, 8);
        for (i, p) in src.pixels_mut().enumerate() {
            *p = image::Rgba([(i * 37 % 256) as u8, (i * 11 % 256) as u8, 0, 255]);
        }
        let kernel = KernelPreset::Gauss.kernel();
        let cpu = convolve_image(&src, &kernel).output;
        let step = 1.0 / 8.0;

        for (x, y) in [(0, 0), (3, 4), (7, 7), (5, 1)] {
            let uv = [(x as f32 + 0.5) * step, (y as f32 + 0.5) * step];
            let gpu = fragment_stage(&src, uv, &kernel, step);
            let expected = cpu.get_pixel(x, y).0;
            for ch in 0..2 {
                let got = (gpu[ch] * 255.0).round().clamp(0.0, 255.0) as u8;
                assert!(got.abs_diff(expected[ch]) <= 1, "({x},{y}) ch {ch}");
            }
        }
    }

    // ── CPU baseline ──────────────────────────────────────────────────────

    #[test]
    fn cpu_box_blur_of_uniform_image_is_invariant() {
        let src = uniform(12, 9, [90, 180, 30, 255]);
        let res = convolve_image(&src, &KernelPreset::Box.kernel());
        assert!(res.output.pixels().all(|p| p.0 == [90, 180, 30, 255]));
    }

    #[test]
    fn cpu_edge_detect_clamps_negative_to_zero() {
        // Bright left half, dark right half: the vline kernel is negative
        // across the falling edge and must clamp to 0.
        let mut src = uniform(4, 4, [0, 0, 0, 255]);
        for y in 0..4 {
            for x in 0..2 {
                src.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
            }
        }
        let res = convolve_image(&src, &KernelPreset::VLine.kernel());
        assert_eq!(res.output.get_pixel(1, 1).0, [0, 0, 0, 255]);
        assert_eq!(res.output.get_pixel(0, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn cpu_edge_detect_saturates_rising_edge() {
        let mut src = uniform(4, 4, [0, 0, 0, 255]);
        for y in 0..4 {
            for x in 2..4 {
                src.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
            }
        }
        let res = convolve_image(&src, &KernelPreset::VLine.kernel());
        assert_eq!(res.output.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn cpu_ns_per_pixel_is_finite() {
        let res = convolve_image(&uniform(16, 16, [1, 2, 3, 255]), &KernelPreset::Gauss.kernel());
        assert!(res.nanoseconds_per_pixel().is_finite());
        assert!(res.nanoseconds_per_pixel() >= 0.0);
    }
}
