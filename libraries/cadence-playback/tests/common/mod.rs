//! In-memory collaborators for controller tests
#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::{
    AudioDevice, ConfigStore, CoreError, NotificationSink, PersistedPlayerState,
    PlayerStateStore, Result, Severity, Track, TrackId, TrackRepository,
};
use cadence_playback::{PlaybackController, PlayerConfig, PlayerServices};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ===== Audio device =====

#[derive(Debug, Clone)]
pub struct DeviceState {
    pub track: Option<TrackId>,
    pub playing: bool,
    pub volume: f32,
    pub muted: bool,
    pub rate: f64,
    pub time: f64,
    pub output: String,
    pub fail_play: bool,
    pub fail_output: bool,
    pub play_calls: usize,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            track: None,
            playing: false,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            time: 0.0,
            output: "default".to_string(),
            fail_play: false,
            fail_output: false,
            play_calls: 0,
        }
    }
}

/// Device fake; clones share state so tests can inspect and steer it
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
    pub fn state(&self) -> DeviceState {
        self.state.lock().unwrap().clone()
    }

    pub fn set_time(&self, seconds: f64) {
        self.state.lock().unwrap().time = seconds;
    }

    pub fn fail_play(&self, fail: bool) {
        self.state.lock().unwrap().fail_play = fail;
    }

    pub fn fail_output(&self, fail: bool) {
        self.state.lock().unwrap().fail_output = fail;
    }
}

#[async_trait]
impl AudioDevice for FakeDevice {
    fn set_track(&mut self, track: &Track) {
        let mut state = self.state.lock().unwrap();
        state.track = Some(track.id.clone());
        state.playing = false;
        state.time = 0.0;
    }

    async fn play(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.play_calls += 1;
        if state.fail_play || state.track.is_none() {
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
        state.time = 0.0;
    }

    fn mute(&mut self) {
        self.state.lock().unwrap().muted = true;
    }

    fn unmute(&mut self) {
        self.state.lock().unwrap().muted = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.state.lock().unwrap().rate = rate;
    }

    async fn set_output_device(&mut self, device_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_output {
            return Err(CoreError::device(format!("no such device: {device_id}")));
        }
        state.output = device_id.to_string();
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.state.lock().unwrap().time = seconds;
    }

    fn is_paused(&self) -> bool {
        !self.state.lock().unwrap().playing
    }

    fn output_devices(&self) -> Vec<String> {
        vec!["default".to_string(), "usb-dac".to_string()]
    }
}

// ===== Stores =====

#[derive(Default)]
pub struct MemoryConfig {
    values: Mutex<HashMap<String, serde_json::Value>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryConfig {
    pub fn with(values: &[(&str, serde_json::Value)]) -> Self {
        let config = Self::default();
        {
            let mut map = config.values.lock().unwrap();
            for (key, value) in values {
                map.insert((*key).to_string(), value.clone());
            }
        }
        config
    }

    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    /// Keys written, in order
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfig {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.writes.lock().unwrap().push(key.to_string());
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// Library fake; returns matches in reverse order to catch order assumptions
pub struct MemoryRepo {
    tracks: Vec<Track>,
}

impl MemoryRepo {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }
}

#[async_trait]
impl TrackRepository for MemoryRepo {
    async fn find_by_id(&self, ids: &[TrackId]) -> Result<Vec<Track>> {
        Ok(self
            .tracks
            .iter()
            .rev()
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

#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<PersistedPlayerState>>,
    saves: Mutex<usize>,
}

impl MemoryStateStore {
    pub fn with(state: PersistedPlayerState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: Mutex::new(0),
        }
    }

    pub fn saved(&self) -> Option<PersistedPlayerState> {
        self.state.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl PlayerStateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<PersistedPlayerState>> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn save(&self, state: &PersistedPlayerState) -> Result<()> {
        *self.saves.lock().unwrap() += 1;
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn add(&self, severity: Severity, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

// ===== Harness =====

pub fn track(id: &str) -> Track {
    Track::new(id, format!("Track {}", id.to_uppercase()), format!("/music/{id}.mp3"))
}

pub fn library(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn track_ids(ids: &[&str]) -> Vec<TrackId> {
    ids.iter().map(|id| TrackId::from(*id)).collect()
}

pub struct Harness {
    pub controller: PlaybackController<FakeDevice>,
    pub device: FakeDevice,
    pub config: Arc<MemoryConfig>,
    pub store: Arc<MemoryStateStore>,
    pub toasts: Arc<RecordingSink>,
    pub library: Vec<Track>,
}

impl Harness {
    pub fn new(ids: &[&str]) -> Self {
        Self::build(ids, MemoryConfig::default(), MemoryStateStore::default())
    }

    pub fn build(ids: &[&str], config: MemoryConfig, store: MemoryStateStore) -> Self {
        let library = library(ids);
        let device = FakeDevice::default();
        let config = Arc::new(config);
        let store = Arc::new(store);
        let toasts = Arc::new(RecordingSink::default());

        let services = PlayerServices {
            repository: Arc::new(MemoryRepo::new(library.clone())),
            config: config.clone(),
            notifications: toasts.clone(),
            state_store: Some(store.clone()),
        };
        let player_config = PlayerConfig {
            shuffle_seed: Some(1234),
            ..PlayerConfig::default()
        };

        Self {
            controller: PlaybackController::new(device.clone(), services, player_config),
            device,
            config,
            store,
            toasts,
            library,
        }
    }

    /// Start the whole library at `id`
    pub async fn start_at(&mut self, id: &str) {
        let id = TrackId::from(id);
        self.controller
            .start(self.library.clone(), Some(&id), Some("/library".to_string()))
            .await;
    }

    pub fn queue(&self) -> Vec<String> {
        self.controller
            .queue()
            .tracks()
            .iter()
            .map(|t| t.id.to_string())
            .collect()
    }

    pub fn current(&self) -> Option<String> {
        self.controller.current_track().map(|t| t.id.to_string())
    }
}
