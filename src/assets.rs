// assets.rs — background decoding of panorama and mask images

use image::io::Reader as ImageReader;
use image::RgbaImage;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Texture,
    Mask,
}

impl AssetKind {
    fn slot(self) -> usize {
        match self {
            AssetKind::Texture => 0,
            AssetKind::Mask => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub struct LoadedAsset {
    pub kind: AssetKind,
    pub path: PathBuf,
    pub image: RgbaImage,
}

struct LoadMessage {
    kind: AssetKind,
    generation: u64,
    result: Result<LoadedAsset, LoadError>,
}

pub fn decode_image(path: &Path) -> Result<RgbaImage, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let decode_err = |source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?;
    reader.no_limits();
    let img = reader.decode().map_err(decode_err)?;
    Ok(img.to_rgba8())
}

/// Decodes images off the event loop thread. Only the newest request per
/// [`AssetKind`] is delivered; older results still in flight are dropped.
pub struct AssetLoader {
    tx: Sender<LoadMessage>,
    rx: Receiver<LoadMessage>,
    latest: [u64; 2],
    pending: [bool; 2],
}

impl Default for AssetLoader {
    fn default() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            latest: [0; 2],
            pending: [false; 2],
        }
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, kind: AssetKind, path: PathBuf) {
        let slot = kind.slot();
        self.latest[slot] += 1;
        self.pending[slot] = true;
        let generation = self.latest[slot];
        let tx = self.tx.clone();

        thread::spawn(move || {
            log::info!("loading {:?} in background: {}", kind, path.display());
            let result = decode_image(&path).map(|image| {
                log::info!("{:?} decoded: {}x{}", kind, image.width(), image.height());
                LoadedAsset { kind, path, image }
            });
            let msg = LoadMessage {
                kind,
                generation,
                result,
            };
            if tx.send(msg).is_err() {
                log::warn!("viewer closed before {:?} finished loading", kind);
            }
        });
    }

    pub fn is_loading(&self) -> bool {
        self.pending.iter().any(|p| *p)
    }

    /// Non-blocking; returns the next current asset. Stale results are
    /// skipped and failures are logged, the viewer keeps running without them.
    pub fn poll(&mut self) -> Option<LoadedAsset> {
        while let Ok(msg) = self.rx.try_recv() {
            let slot = msg.kind.slot();
            if msg.generation != self.latest[slot] {
                log::debug!("dropping stale {:?} load #{}", msg.kind, msg.generation);
                continue;
            }
            self.pending[slot] = false;
            match msg.result {
                Ok(asset) => return Some(asset),
                Err(e) => log::error!("{}", e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &mut AssetLoader) -> Option<LoadedAsset> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(asset) = loader.poll() {
                return Some(asset);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn decodes_png_in_background() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("mask.png");
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        img.save(&path).expect("save png");

        let mut loader = AssetLoader::new();
        loader.request(AssetKind::Mask, path.clone());
        assert!(loader.is_loading());

        let asset = wait_for(&mut loader).expect("asset");
        assert_eq!(asset.kind, AssetKind::Mask);
        assert_eq!(asset.path, path);
        assert_eq!(asset.image.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert!(!loader.is_loading());
    }

    #[test]
    fn stale_result_is_dropped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pano.png");
        RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 255]))
            .save(&path)
            .expect("save png");

        let mut loader = AssetLoader::new();
        loader.latest[AssetKind::Texture.slot()] = 2;
        loader.pending[AssetKind::Texture.slot()] = true;

        let image = decode_image(&path).expect("decode");
        for (generation, pixel) in [(1u64, 1u8), (2, 2)] {
            let mut image = image.clone();
            image.put_pixel(0, 0, Rgba([pixel, 0, 0, 255]));
            loader
                .tx
                .send(LoadMessage {
                    kind: AssetKind::Texture,
                    generation,
                    result: Ok(LoadedAsset {
                        kind: AssetKind::Texture,
                        path: path.clone(),
                        image,
                    }),
                })
                .expect("send");
        }
        let asset = loader.poll().expect("current asset");
        assert_eq!(asset.image.get_pixel(0, 0), &Rgba([2, 0, 0, 255]));
        assert!(loader.poll().is_none());
        assert!(!loader.is_loading());
    }

    #[test]
    fn failed_load_clears_pending() {
        let mut loader = AssetLoader::new();
        loader.request(AssetKind::Texture, PathBuf::from("/no/such/panorama.jpg"));
        let deadline = Instant::now() + Duration::from_secs(10);
        while loader.is_loading() && Instant::now() < deadline {
            assert!(loader.poll().is_none());
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!loader.is_loading());
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = decode_image(Path::new("/no/such/panorama.jpg")).expect_err("missing");
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
