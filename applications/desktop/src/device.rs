//! Audio output through rodio
//!
//! The output stream is not `Send`, so it lives on a dedicated thread that only
//! opens streams and keeps the current one alive. Sinks are `Send` and are
//! driven directly from the engine task through the stream's mixer.

use cadence_core::settings::DEFAULT_OUTPUT_DEVICE;
use cadence_core::{AudioDevice, CoreError, Track};
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::error::{DesktopError, Result};

/// End-of-track detection, polled by the session loop
pub trait TrackEnd {
    /// The loaded track has played to its end
    fn has_ended(&self) -> bool;
}

type OpenReply = oneshot::Sender<std::result::Result<Mixer, String>>;

struct OpenStream {
    /// `None` for the system default output
    device: Option<String>,
    reply: OpenReply,
}

/// Audio device backed by a rodio output stream
pub struct RodioDevice {
    streams: mpsc::Sender<OpenStream>,
    mixer: Mixer,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    load_error: Option<String>,
    volume: f32,
    muted: bool,
    speed: f32,
}

impl RodioDevice {
    /// Open the system default output
    pub async fn open() -> Result<Self> {
        let (streams, requests) = mpsc::channel();
        thread::Builder::new()
            .name("cadence-audio-output".to_string())
            .spawn(move || stream_thread(requests))?;

        let mixer = request_stream(&streams, None)
            .await
            .map_err(DesktopError::Audio)?;
        tracing::info!("Audio output opened on the default device");

        Ok(Self {
            streams,
            mixer,
            sink: None,
            path: None,
            load_error: None,
            volume: 1.0,
            muted: false,
            speed: 1.0,
        })
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Build a paused sink for `path` on the current mixer
    fn load(&mut self, path: PathBuf) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.load_error = None;

        let decoded = File::open(&path)
            .map_err(|e| format!("failed to open {}: {}", path.display(), e))
            .and_then(|file| {
                Decoder::new(BufReader::new(file))
                    .map_err(|e| format!("failed to decode {}: {}", path.display(), e))
            });

        match decoded {
            Ok(source) => {
                let sink = Sink::connect_new(&self.mixer);
                sink.pause();
                sink.set_volume(self.effective_volume());
                sink.set_speed(self.speed);
                sink.append(source);
                self.sink = Some(sink);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.load_error = Some(e);
            }
        }
        self.path = Some(path);
    }
}

impl TrackEnd for RodioDevice {
    fn has_ended(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }
}

#[async_trait::async_trait]
impl AudioDevice for RodioDevice {
    fn set_track(&mut self, track: &Track) {
        tracing::debug!("Loading {}", track.path.display());
        self.load(track.path.clone());
    }

    async fn play(&mut self) -> cadence_core::Result<()> {
        if let Some(e) = &self.load_error {
            return Err(CoreError::device(e.clone()));
        }
        match &self.sink {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(CoreError::device("no track loaded")),
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.path = None;
        self.load_error = None;
    }

    fn mute(&mut self) {
        self.muted = true;
        let volume = self.effective_volume();
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn unmute(&mut self) {
        self.muted = false;
        let volume = self.effective_volume();
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        let volume = self.effective_volume();
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.speed = rate as f32;
        if let Some(sink) = &self.sink {
            sink.set_speed(self.speed);
        }
    }

    async fn set_output_device(&mut self, device_id: &str) -> cadence_core::Result<()> {
        let device = (device_id != DEFAULT_OUTPUT_DEVICE).then(|| device_id.to_string());
        let mixer = request_stream(&self.streams, device)
            .await
            .map_err(CoreError::device)?;
        tracing::info!("Audio output switched to {}", device_id);

        // Sinks on the old mixer went silent with its stream; rebuild at the same spot
        let position = self.current_time();
        let was_playing = !self.is_paused();
        self.mixer = mixer;
        if let Some(path) = self.path.clone() {
            self.load(path);
            self.set_current_time(position);
            if was_playing {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
            }
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.sink
            .as_ref()
            .map_or(0.0, |sink| sink.get_pos().as_secs_f64())
    }

    fn set_current_time(&mut self, seconds: f64) {
        if let Some(sink) = &self.sink {
            let target = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default();
            if let Err(e) = sink.try_seek(target) {
                tracing::warn!("Seek to {:.1}s failed: {}", seconds, e);
            }
        }
    }

    fn is_paused(&self) -> bool {
        self.sink.as_ref().map_or(true, Sink::is_paused)
    }

    fn output_devices(&self) -> Vec<String> {
        let mut names: Vec<String> = rodio::cpal::default_host()
            .output_devices()
            .ok()
            .into_iter()
            .flatten()
            .filter_map(|device| device.name().ok())
            .collect();
        names.sort_by_cached_key(|name| name.to_lowercase());
        names.dedup();
        names.insert(0, DEFAULT_OUTPUT_DEVICE.to_string());
        names
    }
}

async fn request_stream(
    streams: &mpsc::Sender<OpenStream>,
    device: Option<String>,
) -> std::result::Result<Mixer, String> {
    let (reply, response) = oneshot::channel();
    streams
        .send(OpenStream { device, reply })
        .map_err(|_| "audio output thread is gone".to_string())?;
    response
        .await
        .map_err(|_| "audio output thread is gone".to_string())?
}

/// Owns the output stream; exits when the device is dropped
fn stream_thread(requests: mpsc::Receiver<OpenStream>) {
    let mut current: Option<OutputStream> = None;

    while let Ok(request) = requests.recv() {
        match open_stream(request.device.as_deref()) {
            Ok(stream) => {
                let mixer = stream.mixer().clone();
                current = Some(stream);
                let _ = request.reply.send(Ok(mixer));
            }
            Err(e) => {
                tracing::warn!("Failed to open audio output: {}", e);
                let _ = request.reply.send(Err(e));
            }
        }
    }

    drop(current);
    tracing::debug!("Audio output thread stopped");
}

fn open_stream(device: Option<&str>) -> std::result::Result<OutputStream, String> {
    let mut stream = match device {
        None => OutputStreamBuilder::open_default_stream().map_err(|e| e.to_string())?,
        Some(name) => {
            let device = rodio::cpal::default_host()
                .output_devices()
                .map_err(|e| e.to_string())?
                .find(|candidate| candidate.name().ok().as_deref() == Some(name))
                .ok_or_else(|| format!("audio output device not found: {name}"))?;
            OutputStreamBuilder::from_device(device)
                .map_err(|e| e.to_string())?
                .open_stream_or_fallback()
                .map_err(|e| e.to_string())?
        }
    };
    stream.log_on_drop(false);
    Ok(stream)
}
