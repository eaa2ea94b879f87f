//! In-memory collaborators for session tests
#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::{
    AudioDevice, ConfigStore, CoreError, DropPosition, Playlist, PlaylistId, PlaylistStore, Result,
    Track, TrackId, TrackRepository,
};
use cadence_desktop::{run_session, Library, ToastSink, TrackEnd};
use cadence_playback::{PlaybackController, PlayerConfig, PlayerServices};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct DeviceState {
    pub track: Option<TrackId>,
    pub playing: bool,
    pub ended: bool,
    pub fail_play: bool,
}

/// Device fake; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
    pub fn finish_track(&self) {
        self.state.lock().unwrap().ended = true;
    }

    pub fn fail_play(&self) {
        self.state.lock().unwrap().fail_play = true;
    }

    pub fn loaded(&self) -> Option<TrackId> {
        self.state.lock().unwrap().track.clone()
    }
}

impl TrackEnd for FakeDevice {
    fn has_ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }
}

#[async_trait]
impl AudioDevice for FakeDevice {
    fn set_track(&mut self, track: &Track) {
        let mut state = self.state.lock().unwrap();
        state.track = Some(track.id.clone());
        state.playing = false;
        state.ended = false;
    }

    async fn play(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_play {
            return Err(CoreError::device("cannot play"));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().playing = false;
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.track = None;
        state.playing = false;
    }

    fn mute(&mut self) {}

    fn unmute(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_playback_rate(&mut self, _rate: f64) {}

    async fn set_output_device(&mut self, _device_id: &str) -> Result<()> {
        Ok(())
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn set_current_time(&mut self, _seconds: f64) {}

    fn is_paused(&self) -> bool {
        !self.state.lock().unwrap().playing
    }

    fn output_devices(&self) -> Vec<String> {
        vec!["default".to_string(), "Speakers".to_string()]
    }
}

#[derive(Default)]
pub struct MemoryConfig {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryConfig {
    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfig {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

pub struct MemoryRepo {
    tracks: Vec<Track>,
}

#[async_trait]
impl TrackRepository for MemoryRepo {
    async fn find_by_id(&self, ids: &[TrackId]) -> Result<Vec<Track>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn search(&self, term: &str) -> Result<Vec<Track>> {
        Ok(self
            .tracks
            .iter()
            .filter(|t| t.matches(term))
            .cloned()
            .collect())
    }
}

/// Playlist fake; ids are `p1`, `p2`, ... in creation order
#[derive(Default)]
pub struct MemoryPlaylists {
    playlists: Mutex<Vec<Playlist>>,
}

impl MemoryPlaylists {
    fn edit(&self, id: &PlaylistId, change: impl FnOnce(&mut Playlist)) -> Result<Playlist> {
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = playlists
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CoreError::not_found("Playlist", id.as_str()))?;
        change(playlist);
        Ok(playlist.clone())
    }
}

#[async_trait]
impl PlaylistStore for MemoryPlaylists {
    async fn list(&self) -> Result<Vec<Playlist>> {
        Ok(self.playlists.lock().unwrap().clone())
    }

    async fn get(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn create(&self, name: &str, tracks: &[TrackId]) -> Result<Playlist> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_input("playlist name cannot be blank"));
        }
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = Playlist {
            id: PlaylistId::new(format!("p{}", playlists.len() + 1)),
            name: name.trim().to_string(),
            tracks: tracks.to_vec(),
            created_at: 0,
            updated_at: 0,
        };
        playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn rename(&self, id: &PlaylistId, name: &str) -> Result<Playlist> {
        self.edit(id, |p| p.name = name.to_string())
    }

    async fn delete(&self, id: &PlaylistId) -> Result<()> {
        let mut playlists = self.playlists.lock().unwrap();
        let before = playlists.len();
        playlists.retain(|p| &p.id != id);
        if playlists.len() == before {
            return Err(CoreError::not_found("Playlist", id.as_str()));
        }
        Ok(())
    }

    async fn add_tracks(&self, id: &PlaylistId, tracks: &[TrackId]) -> Result<Playlist> {
        self.edit(id, |p| p.add_tracks(tracks))
    }

    async fn remove_tracks(&self, id: &PlaylistId, tracks: &[TrackId]) -> Result<Playlist> {
        self.edit(id, |p| {
            p.remove_tracks(tracks);
        })
    }

    async fn reorder(
        &self,
        id: &PlaylistId,
        moved: &[TrackId],
        target: &TrackId,
        position: DropPosition,
    ) -> Result<Playlist> {
        self.edit(id, |p| {
            p.reorder(moved, target, position);
        })
    }
}

pub fn library(ids: &[&str]) -> Vec<Track> {
    ids.iter()
        .map(|id| {
            Track::new(
                *id,
                format!("Track {}", id.to_uppercase()),
                format!("/music/{id}.mp3"),
            )
        })
        .collect()
}

/// Session wiring around a fake device and in-memory stores
pub struct Session {
    pub device: FakeDevice,
    pub config: Arc<MemoryConfig>,
    pub playlists: Arc<MemoryPlaylists>,
    controller: PlaybackController<FakeDevice>,
    repository: Arc<MemoryRepo>,
    toasts: tokio::sync::mpsc::UnboundedReceiver<cadence_desktop::Toast>,
}

impl Session {
    pub fn new(ids: &[&str]) -> Self {
        let device = FakeDevice::default();
        let config = Arc::new(MemoryConfig::default());
        let repository = Arc::new(MemoryRepo {
            tracks: library(ids),
        });
        let (sink, toasts) = ToastSink::new();

        let services = PlayerServices {
            repository: repository.clone(),
            config: config.clone(),
            notifications: Arc::new(sink),
            state_store: None,
        };
        let controller = PlaybackController::new(device.clone(), services, PlayerConfig::default());

        Self {
            device,
            config,
            playlists: Arc::new(MemoryPlaylists::default()),
            controller,
            repository,
            toasts,
        }
    }

    /// Run the session over `input`, returning every output line as JSON
    pub async fn run<R>(self, input: R) -> Vec<serde_json::Value>
    where
        R: tokio::io::AsyncBufRead + Unpin,
    {
        let mut output = Vec::new();
        let library = Library {
            tracks: self.repository,
            playlists: self.playlists,
        };
        run_session(
            self.controller,
            library,
            self.toasts,
            input,
            &mut output,
        )
        .await
        .unwrap();

        parse_lines(&output)
    }
}

pub fn parse_lines(output: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

pub fn of_type<'a>(events: &'a [serde_json::Value], kind: &str) -> Vec<&'a serde_json::Value> {
    events.iter().filter(|e| e["type"] == kind).collect()
}

/// Latest snapshot written
pub fn last_snapshot(events: &[serde_json::Value]) -> &serde_json::Value {
    of_type(events, "snapshot")
        .pop()
        .expect("no snapshot written")
}

/// Id of the track at the snapshot's cursor
pub fn current_id(snapshot: &serde_json::Value) -> Option<String> {
    let cursor = snapshot["cursor"].as_u64()? as usize;
    snapshot["queue"][cursor]["id"].as_str().map(str::to_string)
}
