//! Playback controller
//!
//! Drives the audio device from the queue engine and owns the player status.
//! Every command takes `&mut self`, so commands run one at a time and each one
//! completes (including awaited device calls) before the next begins.
//!
//! Commands never fail: bad input is a logged no-op, device failures are
//! reported through the notification sink, persistence failures are logged.

use crate::events::PlayerSnapshot;
use crate::persistence;
use crate::queue::{QueueEngine, Step};
use crate::types::{PlayerConfig, DEFAULT_ORIGIN};
use crate::volume::VolumeSaver;
use cadence_core::settings::{
    DEFAULT_OUTPUT_DEVICE, SETTING_MUTED, SETTING_OUTPUT_DEVICE, SETTING_PLAYBACK_RATE,
    SETTING_REPEAT, SETTING_SHUFFLE, SETTING_VOLUME,
};
use cadence_core::{
    AudioDevice, ConfigStore, NotificationSink, PersistedPlayerState, PlayerStateStore,
    PlayerStatus, RepeatMode, Severity, Track, TrackId, TrackRepository,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Message shown when switching the output device fails
pub const OUTPUT_DEVICE_ERROR: &str =
    "An error occured when trying to switch to the new output device";

/// Message shown when the device refuses to play
pub const PLAYBACK_ERROR: &str = "An error occured when trying to play the track";

/// Collaborators used by the controller
#[derive(Clone)]
pub struct PlayerServices {
    /// Library lookups
    pub repository: Arc<dyn TrackRepository>,

    /// Settings storage
    pub config: Arc<dyn ConfigStore>,

    /// User-facing notifications
    pub notifications: Arc<dyn NotificationSink>,

    /// Queue persistence across restarts (optional)
    pub state_store: Option<Arc<dyn PlayerStateStore>>,
}

/// Playback controller
pub struct PlaybackController<D: AudioDevice> {
    device: D,
    queue: QueueEngine,
    status: PlayerStatus,

    volume: f32,
    muted: bool,
    playback_rate: f64,
    output_device: String,

    services: PlayerServices,
    config: PlayerConfig,
    volume_saver: VolumeSaver,
    snapshots: watch::Sender<PlayerSnapshot>,
}

impl<D: AudioDevice> PlaybackController<D> {
    /// Create a controller with an empty queue
    ///
    /// Must be called from within a Tokio runtime (spawns the volume saver).
    pub fn new(device: D, services: PlayerServices, config: PlayerConfig) -> Self {
        let queue = match config.shuffle_seed {
            Some(seed) => QueueEngine::with_seed(seed),
            None => QueueEngine::default(),
        };
        let volume_saver = VolumeSaver::spawn(services.config.clone(), config.volume_debounce);
        let (snapshots, _) = watch::channel(PlayerSnapshot {
            volume: config.default_volume,
            ..PlayerSnapshot::default()
        });

        Self {
            device,
            queue,
            status: PlayerStatus::Stop,
            volume: config.default_volume,
            muted: false,
            playback_rate: 1.0,
            output_device: DEFAULT_OUTPUT_DEVICE.to_string(),
            services,
            config,
            volume_saver,
            snapshots,
        }
    }

    /// Flush pending writes and persist the final state
    pub async fn shutdown(self) {
        tracing::info!("Shutting down playback controller");
        self.persist_state().await;
        self.volume_saver.close().await;
    }

    // ===== State Queries =====

    /// Subscribe to state snapshots
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.subscribe()
    }

    /// Build a snapshot of the current state
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            status: self.status,
            queue: self.queue.tracks().to_vec(),
            cursor: self.queue.cursor(),
            origin: self.queue.origin().map(str::to_string),
            shuffle: self.queue.is_shuffled(),
            repeat: self.queue.repeat(),
            volume: self.volume,
            muted: self.muted,
            playback_rate: self.playback_rate,
            output_device: self.output_device.clone(),
        }
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn queue(&self) -> &QueueEngine {
        &self.queue
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn output_device(&self) -> &str {
        &self.output_device
    }

    /// Output devices that `set_output_device` accepts
    pub fn output_devices(&self) -> Vec<String> {
        self.device.output_devices()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Where the UI should navigate to show the playing track
    pub fn jump_to_playing_track(&self) -> String {
        self.queue.origin().unwrap_or(DEFAULT_ORIGIN).to_string()
    }

    // ===== Start-up =====

    /// Apply stored settings to the engine and the device
    ///
    /// Missing or malformed settings keep their defaults.
    pub async fn load_settings(&mut self) {
        if let Some(shuffle) = self.setting::<bool>(SETTING_SHUFFLE).await {
            self.queue.set_shuffle_flag(shuffle);
        }

        if let Some(repeat) = self.setting::<RepeatMode>(SETTING_REPEAT).await {
            self.queue.set_repeat(repeat);
        }

        if let Some(volume) = self
            .setting::<f32>(SETTING_VOLUME)
            .await
            .filter(|v| v.is_finite())
        {
            self.volume = volume.clamp(0.0, 1.0);
        }
        self.device.set_volume(self.volume);

        if let Some(muted) = self.setting::<bool>(SETTING_MUTED).await {
            self.muted = muted;
        }
        if self.muted {
            self.device.mute();
        } else {
            self.device.unmute();
        }

        if let Some(rate) = self
            .setting::<f64>(SETTING_PLAYBACK_RATE)
            .await
            .filter(|r| self.config.accepts_rate(*r))
        {
            self.playback_rate = rate;
        }
        self.device.set_playback_rate(self.playback_rate);

        if let Some(output) = self.setting::<String>(SETTING_OUTPUT_DEVICE).await {
            if output != DEFAULT_OUTPUT_DEVICE {
                match self.device.set_output_device(&output).await {
                    Ok(()) => self.output_device = output,
                    Err(e) => {
                        tracing::warn!("Stored output device {} unavailable: {}", output, e);
                    }
                }
            }
        }

        tracing::info!(
            "Settings loaded: shuffle={}, repeat={}, volume={}, muted={}, rate={}, output={}",
            self.queue.is_shuffled(),
            self.queue.repeat(),
            self.volume,
            self.muted,
            self.playback_rate,
            self.output_device
        );
        self.publish();
    }

    /// Restore the queue saved by the previous session
    ///
    /// Never resumes playback: the device is primed with the current track
    /// and the player is left paused.
    pub async fn rehydrate(&mut self) {
        let Some(store) = self.services.state_store.clone() else {
            return;
        };

        let persisted = match store.load().await {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::error!("Failed to load player state: {}", e);
                None
            }
        };
        let state = persistence::merge(persisted, PersistedPlayerState::default());

        let mut ids: Vec<TrackId> = state.queue.clone();
        ids.extend(state.old_queue.iter().cloned());
        ids.sort();
        ids.dedup();

        let tracks = if ids.is_empty() {
            Vec::new()
        } else {
            match self.services.repository.find_by_id(&ids).await {
                Ok(tracks) => tracks,
                Err(e) => {
                    tracing::error!("Failed to resolve persisted queue: {}", e);
                    return;
                }
            }
        };

        let restored = persistence::rehydrate(state, &tracks);
        tracing::info!(
            "Rehydrated queue: {} tracks, cursor {:?}, status {:?}",
            restored.queue.len(),
            restored.cursor,
            restored.status
        );

        self.queue.restore(
            restored.queue,
            restored.old_queue,
            restored.cursor,
            restored.origin,
        );
        self.status = if self.queue.cursor().is_some() {
            restored.status
        } else {
            PlayerStatus::Stop
        };

        if let Some(track) = self.queue.current() {
            self.device.set_track(track);
        }
        self.publish();
    }

    // ===== Playback Control =====

    /// Build a queue from `candidates` and play from `track_id` (or the first track)
    ///
    /// Empty candidates or an unknown `track_id` leave everything unchanged.
    pub async fn start(
        &mut self,
        candidates: Vec<Track>,
        track_id: Option<&TrackId>,
        origin: Option<String>,
    ) {
        let position = match QueueEngine::resolve_start(&candidates, track_id) {
            Ok(position) => position,
            Err(e) => {
                tracing::debug!("start ignored: {}", e);
                return;
            }
        };

        let resume_at = self.device.current_time();
        self.device.set_track(&candidates[position]);
        if !self.play_device().await {
            self.recover(resume_at).await;
            return;
        }

        match self.queue.start(candidates, position, origin) {
            Ok(cursor) => {
                self.status = PlayerStatus::Play;
                tracing::debug!("Queue started at cursor {}", cursor);
            }
            Err(e) => tracing::debug!("start ignored: {}", e),
        }
        self.commit().await;
    }

    /// Start or resume playback
    ///
    /// A queue without a cursor is armed at its first track first.
    pub async fn play(&mut self) {
        let arming = self.queue.cursor().is_none();
        if arming {
            if self.queue.set_cursor(0).is_err() {
                tracing::debug!("play ignored: queue is empty");
                return;
            }
            if let Some(track) = self.queue.current() {
                self.device.set_track(track);
            }
        }

        if self.play_device().await {
            self.status = PlayerStatus::Play;
        } else if arming {
            self.status = PlayerStatus::Pause;
        }
        self.commit().await;
    }

    /// Pause playback
    pub async fn pause(&mut self) {
        if self.queue.cursor().is_none() {
            return;
        }

        self.device.pause();
        self.status = PlayerStatus::Pause;
        self.commit().await;
    }

    /// Play when the device is paused and there is something to play, pause otherwise
    pub async fn play_pause(&mut self) {
        if self.device.is_paused() && !self.queue.is_empty() {
            self.play().await;
        } else {
            self.pause().await;
        }
    }

    /// Stop playback and drop the queue
    pub async fn stop(&mut self) {
        self.device.stop();
        self.queue.clear();
        self.status = PlayerStatus::Stop;
        self.commit().await;
    }

    /// Go to the next track according to the repeat mode
    ///
    /// Running past the end without repeat stops playback.
    pub async fn next(&mut self) {
        match self.queue.next_step() {
            Ok(step) => self.go_to(step).await,
            Err(e) => tracing::debug!("next ignored: {}", e),
        }
    }

    /// Go back a track, or restart the current one once past the threshold
    ///
    /// Going back from the first track stops playback.
    pub async fn previous(&mut self) {
        let elapsed = Duration::try_from_secs_f64(self.device.current_time()).unwrap_or_default();

        match self
            .queue
            .previous_step(elapsed, self.config.previous_threshold)
        {
            Ok(step) => self.go_to(step).await,
            Err(e) => tracing::debug!("previous ignored: {}", e),
        }
    }

    /// Play the track at an absolute queue index
    pub async fn start_from_queue(&mut self, index: usize) {
        if index >= self.queue.len() {
            tracing::debug!("start_from_queue ignored: index {} out of bounds", index);
            return;
        }
        self.go_to(Step::To(index)).await;
    }

    /// Seek within the current track
    pub fn jump_to(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            tracing::debug!("jump_to ignored: invalid time {}", seconds);
            return;
        }
        self.device.set_current_time(seconds);
    }

    async fn go_to(&mut self, step: Step) {
        let index = match step {
            Step::To(index) => index,
            Step::Stop => {
                tracing::debug!("Reached the end of the queue");
                self.stop().await;
                return;
            }
        };

        let Some(track) = self.queue.get(index) else {
            return;
        };
        let resume_at = self.device.current_time();
        self.device.set_track(track);
        if !self.play_device().await {
            self.recover(resume_at).await;
            return;
        }

        if self.queue.set_cursor(index).is_ok() {
            self.status = PlayerStatus::Play;
        }
        self.commit().await;
    }

    /// Put the current track back on the device after a failed switch
    ///
    /// The device dropped what it was playing when the new track was loaded,
    /// so playback resumes paused at `resume_at`.
    async fn recover(&mut self, resume_at: f64) {
        match self.queue.current() {
            Some(track) => {
                self.device.set_track(track);
                self.device.set_current_time(resume_at);
                if self.status == PlayerStatus::Play {
                    self.status = PlayerStatus::Pause;
                }
            }
            None => {
                self.device.stop();
                self.status = PlayerStatus::Stop;
            }
        }
        self.commit().await;
    }

    async fn play_device(&mut self) -> bool {
        match self.device.play().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Device failed to play: {}", e);
                self.services.notifications.add(Severity::Danger, PLAYBACK_ERROR);
                false
            }
        }
    }

    // ===== Shuffle & Repeat =====

    /// Flip shuffle, or set it to `value`
    pub async fn toggle_shuffle(&mut self, value: Option<bool>) {
        let shuffle = value.unwrap_or(!self.queue.is_shuffled());

        self.save_setting(SETTING_SHUFFLE, serde_json::json!(shuffle))
            .await;
        self.queue.set_shuffle(shuffle);
        self.settle();
        self.commit().await;
    }

    /// Cycle the repeat mode, or set it to `value`
    pub async fn toggle_repeat(&mut self, value: Option<RepeatMode>) {
        let repeat = value.unwrap_or_else(|| self.queue.repeat().next());

        self.save_setting(SETTING_REPEAT, serde_json::json!(repeat.as_str()))
            .await;
        self.queue.set_repeat(repeat);
        self.commit().await;
    }

    // ===== Audio Settings =====

    /// Set the volume (clamped to 0.0 - 1.0)
    ///
    /// The write to the config store is debounced.
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            tracing::debug!("set_volume ignored: {}", volume);
            return;
        }

        let volume = volume.clamp(0.0, 1.0);
        self.device.set_volume(volume);
        self.volume = volume;
        self.volume_saver.save(volume);
        self.publish();
    }

    /// Mute or unmute (volume is preserved)
    pub async fn set_muted(&mut self, muted: bool) {
        if muted {
            self.device.mute();
        } else {
            self.device.unmute();
        }
        self.muted = muted;

        self.save_setting(SETTING_MUTED, serde_json::json!(muted))
            .await;
        self.publish();
    }

    /// Set the playback rate; values outside the allowed range are ignored
    pub async fn set_playback_rate(&mut self, rate: f64) {
        if !self.config.accepts_rate(rate) {
            tracing::debug!("set_playback_rate ignored: {}", rate);
            return;
        }

        self.device.set_playback_rate(rate);
        self.playback_rate = rate;

        self.save_setting(SETTING_PLAYBACK_RATE, serde_json::json!(rate))
            .await;
        self.publish();
    }

    /// Switch the output device
    ///
    /// On failure the user is notified and the previous device stays active.
    pub async fn set_output_device(&mut self, device_id: &str) {
        if device_id.is_empty() {
            return;
        }

        match self.device.set_output_device(device_id).await {
            Ok(()) => {
                self.output_device = device_id.to_string();
                self.save_setting(SETTING_OUTPUT_DEVICE, serde_json::json!(device_id))
                    .await;
                self.publish();
            }
            Err(e) => {
                tracing::warn!("Failed to switch output device to {}: {}", device_id, e);
                self.services
                    .notifications
                    .add(Severity::Danger, OUTPUT_DEVICE_ERROR);
            }
        }
    }

    // ===== Queue Management =====

    /// Replace the queue (e.g. after reordering in the UI)
    pub async fn set_queue(&mut self, tracks: Vec<Track>) {
        self.queue.set_queue(tracks);
        self.settle();
        self.commit().await;
    }

    /// Drop every track after the current one
    pub async fn clear_queue(&mut self) {
        match self.queue.clear_queue() {
            Ok(removed) => tracing::debug!("Cleared {} upcoming tracks", removed),
            Err(e) => {
                tracing::debug!("clear_queue ignored: {}", e);
                return;
            }
        }
        self.commit().await;
    }

    /// Remove an upcoming track (`index` 0 is the next track)
    pub async fn remove_from_queue(&mut self, index: usize) {
        if let Err(e) = self.queue.remove_from_queue(index) {
            tracing::debug!("remove_from_queue ignored: {}", e);
            return;
        }
        self.commit().await;
    }

    /// Append library tracks to the end of the queue
    pub async fn add_in_queue(&mut self, ids: &[TrackId]) {
        let Some(tracks) = self.resolve(ids).await else {
            return;
        };

        let armed = self.queue.add_in_queue(tracks);
        self.after_add(armed).await;
    }

    /// Insert library tracks right after the current one
    pub async fn add_next_in_queue(&mut self, ids: &[TrackId]) {
        let Some(tracks) = self.resolve(ids).await else {
            return;
        };

        let armed = self.queue.add_next_in_queue(tracks);
        self.after_add(armed).await;
    }

    async fn after_add(&mut self, armed: bool) {
        if armed {
            // Arm without playing, so cursor and device agree
            if let Some(track) = self.queue.current() {
                self.device.set_track(track);
            }
            self.status = PlayerStatus::Pause;
        }
        self.commit().await;
    }

    /// Stop the device when an edit left the queue without a cursor
    fn settle(&mut self) {
        if self.queue.cursor().is_none() && self.status != PlayerStatus::Stop {
            self.device.stop();
            self.status = PlayerStatus::Stop;
        }
    }

    async fn resolve(&self, ids: &[TrackId]) -> Option<Vec<Track>> {
        if ids.is_empty() {
            return None;
        }

        match self.services.repository.find_by_id(ids).await {
            Ok(found) => {
                let tracks = persistence::resolve_in_order(ids, &found);
                if tracks.len() < ids.len() {
                    tracing::debug!(
                        "{} of {} tracks not found",
                        ids.len() - tracks.len(),
                        ids.len()
                    );
                }
                Some(tracks)
            }
            Err(e) => {
                tracing::warn!("Failed to resolve tracks: {}", e);
                None
            }
        }
    }

    // ===== Persistence =====

    async fn setting<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.services.config.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Ignoring malformed setting {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read setting {}: {}", key, e);
                None
            }
        }
    }

    async fn save_setting(&self, key: &str, value: serde_json::Value) {
        if let Err(e) = self.services.config.set(key, value).await {
            tracing::warn!("Failed to save setting {}: {}", key, e);
        }
    }

    async fn persist_state(&self) {
        let Some(store) = &self.services.state_store else {
            return;
        };

        let state = self.queue.to_persisted(self.status);
        if let Err(e) = store.save(&state).await {
            tracing::warn!("Failed to persist player state: {}", e);
        }
    }

    /// Publish a snapshot and persist the queue
    async fn commit(&mut self) {
        self.publish();
        self.persist_state().await;
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
