use std::fmt;
use std::str::FromStr;

use super::BenchError;

/// 3×3 convolution kernel: nine row-major weights and a divisor.
///
/// Invariants:
/// - `divisor != 0`
/// - every weight and the divisor are finite
///
/// Weight `i` multiplies the tap at row `i / 3`, column `i % 3` of the fragment
/// stage's sample pattern (top row first, in UV space).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConvolutionKernel {
    weights: [f32; 9],
    divisor: f32,
}

impl ConvolutionKernel {
    /// Sobel-style vertical edge detector. Benchmark default.
    pub const EDGE_DETECT: Self = Self {
        weights: [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0],
        divisor: 1.0,
    };

    pub fn new(weights: [f32; 9], divisor: f32) -> Result<Self, BenchError> {
        if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
            return Err(BenchError::NonFiniteKernel { index });
        }
        if !divisor.is_finite() {
            return Err(BenchError::NonFiniteKernel { index: 9 });
        }
        if divisor == 0.0 {
            return Err(BenchError::ZeroDivisor);
        }
        Ok(Self { weights, divisor })
    }

    #[inline]
    pub fn weights(&self) -> &[f32; 9] {
        &self.weights
    }

    #[inline]
    pub fn divisor(&self) -> f32 {
        self.divisor
    }

    /// Weight at `row`, `col` (both `0..3`).
    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f32 {
        self.weights[row * 3 + col]
    }

    /// Sum of weights divided by the divisor (gain applied to a constant field).
    pub fn gain(&self) -> f32 {
        self.weights.iter().sum::<f32>() / self.divisor
    }
}

impl Default for ConvolutionKernel {
    fn default() -> Self {
        Self::EDGE_DETECT
    }
}

/// Named kernels selectable from the command line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KernelPreset {
    Gauss,
    VLine,
    HLine,
    Box,
}

impl KernelPreset {
    pub const ALL: [KernelPreset; 4] = [Self::Gauss, Self::VLine, Self::HLine, Self::Box];

    pub fn name(self) -> &'static str {
        match self {
            Self::Gauss => "gauss",
            Self::VLine => "vline",
            Self::HLine => "hline",
            Self::Box => "box",
        }
    }

    pub fn kernel(self) -> ConvolutionKernel {
        let (weights, divisor) = match self {
            Self::Gauss => ([0.0, 4.0, 0.0, 4.0, 8.0, 4.0, 0.0, 4.0, 0.0], 24.0),
            Self::VLine => return ConvolutionKernel::EDGE_DETECT,
            Self::HLine => ([-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0], 1.0),
            Self::Box => ([1.0; 9], 9.0),
        };
        ConvolutionKernel { weights, divisor }
    }
}

impl fmt::Display for KernelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelPreset {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BenchError::UnknownKernel(wanted.to_string()))
    }
}

/// Nine comma-separated weights, e.g. `"-1,0,1,-2,0,2,-1,0,1"`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KernelWeights(pub [f32; 9]);

impl FromStr for KernelWeights {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut weights = [0.0f32; 9];
        let mut count = 0usize;

        for part in s.split(',') {
            let part = part.trim();
            if count == 9 {
                return Err(BenchError::KernelParse(format!(
                    "expected 9 weights, got more in `{s}`"
                )));
            }
            weights[count] = part
                .parse::<f32>()
                .map_err(|e| BenchError::KernelParse(format!("`{part}`: {e}")))?;
            count += 1;
        }

        if count != 9 {
            return Err(BenchError::KernelParse(format!(
                "expected 9 weights, got {count}"
            )));
        }
        Ok(Self(weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn default_is_edge_detect() {
        let k = ConvolutionKernel::default();
        assert_eq!(k.weights(), &[-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0]);
        assert_eq!(k.divisor(), 1.0);
    }

    #[test]
    fn zero_divisor_rejected() {
        let err = ConvolutionKernel::new([1.0; 9], 0.0).unwrap_err();
        assert!(matches!(err, BenchError::ZeroDivisor));
    }

    #[test]
    fn negative_zero_divisor_rejected() {
        assert!(matches!(
            ConvolutionKernel::new([1.0; 9], -0.0),
            Err(BenchError::ZeroDivisor)
        ));
    }

    #[test]
    fn non_finite_weight_reports_index() {
        let mut w = [0.0; 9];
        w[4] = f32::NAN;
        assert!(matches!(
            ConvolutionKernel::new(w, 1.0),
            Err(BenchError::NonFiniteKernel { index: 4 })
        ));
    }

    #[test]
    fn infinite_divisor_rejected() {
        assert!(matches!(
            ConvolutionKernel::new([0.0; 9], f32::INFINITY),
            Err(BenchError::NonFiniteKernel { index: 9 })
        ));
    }

    #[test]
    fn weights_kept_verbatim() {
        let w = [0.5, -3.0, 2.25, 0.0, 1.0, 7.0, -0.125, 4.0, 9.0];
        let k = ConvolutionKernel::new(w, -2.0).unwrap();
        assert_eq!(k.weights(), &w);
        assert_eq!(k.divisor(), -2.0);
        assert_eq!(k.weight(1, 2), 7.0);
        assert_eq!(k.weight(2, 0), -0.125);
    }

    // ── presets ───────────────────────────────────────────────────────────

    #[test]
    fn preset_names_round_trip() {
        for p in KernelPreset::ALL {
            assert_eq!(p.name().parse::<KernelPreset>().unwrap(), p);
        }
    }

    #[test]
    fn preset_parse_is_case_insensitive() {
        assert_eq!("GAUSS".parse::<KernelPreset>().unwrap(), KernelPreset::Gauss);
        assert_eq!(" HLine ".parse::<KernelPreset>().unwrap(), KernelPreset::HLine);
    }

    #[test]
    fn unknown_preset_rejected() {
        assert!(matches!(
            "sharpen".parse::<KernelPreset>(),
            Err(BenchError::UnknownKernel(name)) if name == "sharpen"
        ));
    }

    #[test]
    fn smoothing_presets_have_unit_gain() {
        assert_eq!(KernelPreset::Gauss.kernel().gain(), 1.0);
        assert_eq!(KernelPreset::Box.kernel().gain(), 1.0);
    }

    #[test]
    fn edge_presets_have_zero_gain() {
        assert_eq!(KernelPreset::VLine.kernel().gain(), 0.0);
        assert_eq!(KernelPreset::HLine.kernel().gain(), 0.0);
    }

    // ── weight parsing ────────────────────────────────────────────────────

    #[test]
    fn parses_nine_weights() {
        let w: KernelWeights = "-1, 0, 1, -2, 0, 2, -1, 0, 1".parse().unwrap();
        assert_eq!(w.0, *ConvolutionKernel::EDGE_DETECT.weights());
    }

    #[test]
    fn too_few_weights_rejected() {
        assert!(matches!(
            "1,2,3".parse::<KernelWeights>(),
            Err(BenchError::KernelParse(_))
        ));
    }

    #[test]
    fn too_many_weights_rejected() {
        assert!("1,1,1,1,1,1,1,1,1,1".parse::<KernelWeights>().is_err());
    }

    #[test]
    fn garbage_weight_rejected() {
        assert!("1,1,1,1,x,1,1,1,1".parse::<KernelWeights>().is_err());
    }
}
