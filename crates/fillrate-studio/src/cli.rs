use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use fillrate_engine::bench::{
    cycles_from_signed, BenchError, BenchmarkConfig, ConvolutionKernel, KernelPreset,
    KernelWeights, DEFAULT_CYCLES, DEFAULT_STREAM_CAPACITY, DEFAULT_TARGET_SIDE, DEFAULT_TEXTURE,
};
use fillrate_engine::device::GpuInit;

/// GPU fill-rate benchmark: redraws a convolution-shaded quad many times per
/// frame and reports the frame time per target pixel.
#[derive(Parser, Debug)]
#[command(name = "fillrate")]
#[command(version)]
pub struct Cli {
    /// Image sampled by the convolution shader (PNG, JPEG or BMP).
    #[arg(default_value = DEFAULT_TEXTURE)]
    pub texture: PathBuf,

    /// Named kernel. Defaults to the vertical edge detector.
    #[arg(short, long, value_name = "NAME")]
    pub kernel: Option<KernelPreset>,

    /// Nine comma-separated weights, row-major. Overrides --kernel.
    #[arg(
        short,
        long,
        value_name = "W0,..,W8",
        allow_hyphen_values = true,
        conflicts_with = "kernel"
    )]
    pub weights: Option<KernelWeights>,

    /// Kernel divisor. Replaces the divisor of the selected kernel.
    #[arg(short, long)]
    pub divisor: Option<f32>,

    /// Overdraw factor: quad redraws per frame.
    #[arg(short, long, default_value_t = i64::from(DEFAULT_CYCLES), allow_negative_numbers = true)]
    pub cycles: i64,

    /// Side of the square render target, in physical pixels.
    #[arg(short, long, default_value_t = DEFAULT_TARGET_SIDE)]
    pub size: u32,

    /// Surface present mode.
    #[arg(long, value_enum, default_value_t = PresentModeArg::Fifo)]
    pub present_mode: PresentModeArg,

    /// Prints a report line every N measured frames (0 disables).
    #[arg(long, default_value_t = 60)]
    pub report_every: u64,

    /// Stops after N measured frames.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Runs the CPU convolution once before the GPU run and prints ns/pixel.
    #[arg(long)]
    pub cpu_baseline: bool,

    /// Writes the CPU convolution result here (implies --cpu-baseline).
    #[arg(long, value_name = "PATH")]
    pub cpu_output: Option<PathBuf>,

    /// Log filter in env_logger syntax (falls back to RUST_LOG).
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum PresentModeArg {
    Fifo,
    Mailbox,
    Immediate,
    AutoVsync,
    AutoNoVsync,
}

impl From<PresentModeArg> for wgpu::PresentMode {
    fn from(mode: PresentModeArg) -> Self {
        match mode {
            PresentModeArg::Fifo => Self::Fifo,
            PresentModeArg::Mailbox => Self::Mailbox,
            PresentModeArg::Immediate => Self::Immediate,
            PresentModeArg::AutoVsync => Self::AutoVsync,
            PresentModeArg::AutoNoVsync => Self::AutoNoVsync,
        }
    }
}

impl Cli {
    pub fn kernel(&self) -> Result<ConvolutionKernel, BenchError> {
        let base = match (self.weights, self.kernel) {
            (Some(KernelWeights(weights)), _) => {
                return ConvolutionKernel::new(weights, self.divisor.unwrap_or(1.0));
            }
            (None, Some(preset)) => preset.kernel(),
            (None, None) => ConvolutionKernel::default(),
        };
        match self.divisor {
            Some(divisor) => ConvolutionKernel::new(*base.weights(), divisor),
            None => Ok(base),
        }
    }

    pub fn config(&self) -> Result<BenchmarkConfig, BenchError> {
        let config = BenchmarkConfig {
            texture_path: self.texture.clone(),
            kernel: self.kernel()?,
            cycles: cycles_from_signed(self.cycles)?,
            target_side: self.size,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn gpu_init(&self) -> GpuInit {
        GpuInit {
            present_mode: self.present_mode.into(),
            ..GpuInit::default()
        }
    }

    pub fn wants_cpu_baseline(&self) -> bool {
        self.cpu_baseline || self.cpu_output.is_some()
    }
}
