//! `fillrate`: command-line front end for the overdraw convolution benchmark.
//!
//! ```bash
//! # reference run: edge detector, 1000 redraws per frame, 1024×1024 target
//! fillrate blocks-small.bmp
//!
//! # gaussian blur, fewer redraws, stop after 600 frames
//! fillrate photo.png --kernel gauss --cycles 200 --frames 600
//!
//! # compare with the CPU convolution first and keep its output
//! fillrate blocks-small.bmp --cpu-output output.bmp
//! ```

mod cli;
mod report;

use std::path::Path;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use fillrate_engine::bench::{reference, Benchmark, BenchmarkConfig, Metrics};
use fillrate_engine::logging::{init_logging, LoggingConfig};
use fillrate_engine::texture::TextureSource;

use cli::Cli;
use report::Reporter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let config = cli.config()?;

    if cli.wants_cpu_baseline() {
        cpu_baseline(&config, cli.cpu_output.as_deref())?;
    }

    let (mut bench, stream) = Benchmark::new(config)?;

    if let Some(limit) = cli.frames {
        let stop = bench.stop_handle();
        let mut seen = 0u64;
        bench.add_observer(move |_: &Metrics| {
            seen += 1;
            if seen >= limit {
                stop.stop();
            }
        });
    }

    let mut reporter = Reporter::new(
        bench.config().target_side,
        bench.config().cycles,
        cli.report_every,
    );
    let report_thread = thread::Builder::new()
        .name("metrics-report".to_string())
        .spawn(move || {
            for m in stream {
                if let Some(line) = reporter.observe(&m) {
                    println!("{line}");
                }
            }
            reporter.summary()
        })
        .context("failed to spawn metrics reporter")?;

    // The stream closes when the benchmark is dropped at the end of `run`.
    let result = bench.run(cli.gpu_init());

    let summary = report_thread
        .join()
        .map_err(|_| anyhow!("metrics reporter panicked"))?;
    if let Some(summary) = summary {
        println!("{summary}");
    }

    result
}

fn cpu_baseline(config: &BenchmarkConfig, output: Option<&Path>) -> Result<()> {
    let image = TextureSource::load(&config.texture_path).wait()?;
    let run = reference::convolve_image(&image, &config.kernel);

    println!(
        "CPU convolution of {}x{} took around {:.3} nanoseconds per pixel.",
        image.width(),
        image.height(),
        run.nanoseconds_per_pixel()
    );

    if let Some(path) = output {
        run.output
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("CPU convolution written to {}", path.display());
    }
    Ok(())
}
