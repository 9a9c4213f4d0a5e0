use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::RgbaImage;

use crate::bench::BenchError;

type DecodeResult = Result<RgbaImage, image::ImageError>;

/// Loads the benchmark's single source image off the render thread.
pub struct TextureSource;

impl TextureSource {
    /// Starts decoding `path` on a worker thread.
    ///
    /// The returned handle yields the result exactly once through
    /// [`PendingTexture::poll`] or [`PendingTexture::wait`].
    pub fn load(path: impl Into<PathBuf>) -> PendingTexture {
        let path = path.into();
        let (tx, rx) = mpsc::sync_channel::<DecodeResult>(1);

        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name("texture-loader".to_string())
            .spawn(move || {
                let result = image::open(&worker_path).map(|img| img.to_rgba8());
                // Receiver gone means nobody is waiting any more.
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            log::error!("failed to spawn texture loader thread: {e}");
        } else {
            log::info!("loading texture {}", path.display());
        }

        PendingTexture { path, rx: Some(rx) }
    }
}

/// Handle to an in-flight texture decode.
///
/// States: pending → completed (result handed out once) → drained.
pub struct PendingTexture {
    path: PathBuf,
    rx: Option<Receiver<DecodeResult>>,
}

impl PendingTexture {
    /// `true` until the result has been handed out.
    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    /// Non-blocking completion check.
    ///
    /// Returns `Some` exactly once; `None` while decoding and after the result
    /// has been taken.
    pub fn poll(&mut self) -> Option<Result<RgbaImage, BenchError>> {
        let rx = self.rx.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result.map_err(|source| BenchError::AssetLoad {
                path: self.path.clone(),
                source,
            }),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(BenchError::LoaderDisconnected {
                path: self.path.clone(),
            }),
        };
        self.rx = None;
        Some(result.inspect(|img| self.log_loaded(img)))
    }

    /// Blocks until decoding finishes.
    pub fn wait(mut self) -> Result<RgbaImage, BenchError> {
        let Some(rx) = self.rx.take() else {
            return Err(BenchError::LoaderDisconnected { path: self.path });
        };
        match rx.recv() {
            Ok(Ok(img)) => {
                self.log_loaded(&img);
                Ok(img)
            }
            Ok(Err(source)) => Err(BenchError::AssetLoad { path: self.path, source }),
            Err(_) => Err(BenchError::LoaderDisconnected { path: self.path }),
        }
    }

    fn log_loaded(&self, img: &RgbaImage) {
        log::info!(
            "texture {} ready ({}x{})",
            self.path.display(),
            img.width(),
            img.height()
        );
    }
}
