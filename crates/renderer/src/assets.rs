use std::fmt;
use std::fs;
use std::io::Cursor;
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use reqwest::blocking::Client;
use slideconfig::AssetSource;

/// Edge used when the device reports no usable limit.
const FALLBACK_TEXTURE_EDGE: u32 = 2048;

/// Which texture an asset is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssetSlot {
    Slide(usize),
    Displacement,
}

impl fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSlot::Slide(index) => write!(f, "slide {index}"),
            AssetSlot::Displacement => f.write_str("displacement"),
        }
    }
}

#[derive(Debug)]
pub(crate) enum AssetEvent {
    Loaded { slot: AssetSlot, image: RgbaImage },
    Failed { slot: AssetSlot, error: String },
}

/// Fetches and decodes images on worker threads.
///
/// Results arrive on a channel that the event loop drains once per frame;
/// a failed load is reported once and never retried.
pub(crate) struct AssetLoader {
    sender: Sender<AssetEvent>,
    receiver: Receiver<AssetEvent>,
    http: Option<Client>,
    max_edge: u32,
}

impl AssetLoader {
    /// `max_edge` is the device's texture limit; larger images are
    /// downscaled to fit before upload.
    pub fn new(max_edge: u32) -> Self {
        let (sender, receiver) = unbounded();
        let http = match Client::builder().build() {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::error!(error = %err, "failed to build HTTP client; remote images disabled");
                None
            }
        };
        let max_edge = if max_edge == 0 {
            FALLBACK_TEXTURE_EDGE
        } else {
            max_edge
        };
        Self {
            sender,
            receiver,
            http,
            max_edge,
        }
    }

    /// Starts loading `source` into `slot`. Returns false when no worker
    /// could be spawned; that slot keeps its placeholder.
    pub fn load(&self, slot: AssetSlot, source: AssetSource) -> bool {
        let sender = self.sender.clone();
        let http = self.http.clone();
        let max_edge = self.max_edge;
        let spawn = thread::Builder::new()
            .name(format!("slidewave-asset-{slot}"))
            .spawn(move || {
                let loaded = fetch(&source, http.as_ref()).and_then(|bytes| decode(&bytes, max_edge));
                let event = match loaded {
                    Ok(image) => AssetEvent::Loaded { slot, image },
                    Err(err) => AssetEvent::Failed {
                        slot,
                        error: format!("{source}: {err:#}"),
                    },
                };
                // The receiver only disappears when the window is shutting down.
                let _ = sender.send(event);
            });
        match spawn {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(%slot, error = %err, "failed to spawn asset worker");
                false
            }
        }
    }

    /// Returns every event that has arrived since the last call.
    pub fn drain(&self) -> Vec<AssetEvent> {
        self.receiver.try_iter().collect()
    }

    #[cfg(test)]
    fn receiver(&self) -> &Receiver<AssetEvent> {
        &self.receiver
    }
}

fn fetch(source: &AssetSource, http: Option<&Client>) -> Result<Vec<u8>> {
    match source {
        AssetSource::Path(path) => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        AssetSource::Url(url) => {
            let http = http.ok_or_else(|| anyhow!("HTTP client unavailable"))?;
            tracing::debug!(%url, "downloading image");
            let response = http
                .get(url.as_str())
                .send()
                .with_context(|| format!("requesting {url}"))?
                .error_for_status()
                .context("image request failed")?;
            Ok(response.bytes()?.to_vec())
        }
    }
}

pub(crate) fn decode(bytes: &[u8], max_edge: u32) -> Result<RgbaImage> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("failed to sniff image format")?
        .decode()
        .context("failed to decode image")?;
    let image = if image.width() > max_edge || image.height() > max_edge {
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            max = max_edge,
            "downscaling oversized image"
        );
        image.resize(max_edge, max_edge, FilterType::Triangle)
    } else {
        image
    };
    Ok(image.to_rgba8())
}
