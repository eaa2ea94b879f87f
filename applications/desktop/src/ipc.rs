//! JSON-lines control channel
//!
//! One command per input line, for example:
//!
//! ```text
//! {"command":"start","query":"radiohead","track_id":"4f1c..."}
//! {"command":"next"}
//! {"command":"set_volume","volume":0.4}
//! ```
//!
//! Output lines are tagged by `type`: `snapshot` after every state change,
//! `toast` for notifications, and direct replies such as `search_results`
//! or `playlist`. Failed queries reply with `error`.
//! Commands are handled strictly one after another on the calling task.

use crate::device::TrackEnd;
use crate::toast::Toast;
use cadence_core::{
    AudioDevice, DropPosition, Playlist, PlaylistId, PlaylistStore, RepeatMode, Track, TrackId,
    TrackRepository,
};
use cadence_playback::{persistence, PlaybackController, PlayerSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// How often the session checks whether the current track finished
pub const END_OF_TRACK_POLL: Duration = Duration::from_millis(250);

/// Command sent by the UI process
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Queue the library search results for `query` and play `track_id`
    Start {
        #[serde(default)]
        query: String,
        #[serde(default)]
        track_id: Option<TrackId>,
        #[serde(default)]
        origin: Option<String>,
    },
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
    StartFromQueue {
        index: usize,
    },
    JumpTo {
        seconds: f64,
    },
    ToggleShuffle {
        #[serde(default)]
        value: Option<bool>,
    },
    ToggleRepeat {
        #[serde(default)]
        value: Option<RepeatMode>,
    },
    SetVolume {
        volume: f32,
    },
    SetMuted {
        muted: bool,
    },
    SetPlaybackRate {
        rate: f64,
    },
    SetOutputDevice {
        device_id: String,
    },
    SetQueue {
        ids: Vec<TrackId>,
    },
    ClearQueue,
    RemoveFromQueue {
        index: usize,
    },
    AddInQueue {
        ids: Vec<TrackId>,
    },
    AddNextInQueue {
        ids: Vec<TrackId>,
    },
    JumpToPlayingTrack,
    Search {
        #[serde(default)]
        query: String,
    },
    ListOutputDevices,
    ListPlaylists,
    CreatePlaylist {
        name: String,
        #[serde(default)]
        ids: Vec<TrackId>,
    },
    RenamePlaylist {
        playlist_id: PlaylistId,
        name: String,
    },
    DeletePlaylist {
        playlist_id: PlaylistId,
    },
    AddToPlaylist {
        playlist_id: PlaylistId,
        ids: Vec<TrackId>,
    },
    RemoveFromPlaylist {
        playlist_id: PlaylistId,
        ids: Vec<TrackId>,
    },
    ReorderPlaylist {
        playlist_id: PlaylistId,
        ids: Vec<TrackId>,
        target_id: TrackId,
        position: DropPosition,
    },
    /// Queue a playlist and play `track_id` (or its first track)
    StartPlaylist {
        playlist_id: PlaylistId,
        #[serde(default)]
        track_id: Option<TrackId>,
    },
    Snapshot,
    Quit,
}

/// Line written to the UI process
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Snapshot(PlayerSnapshot),
    Toast(Toast),
    SearchResults { tracks: Vec<Track> },
    OutputDevices { devices: Vec<String>, current: String },
    Playlists { playlists: Vec<Playlist> },
    Playlist { playlist: Playlist },
    PlaylistDeleted { playlist_id: PlaylistId },
    Navigate { path: String },
    Error { message: String },
}

/// Library collaborators the session queries on behalf of the UI
#[derive(Clone)]
pub struct Library {
    pub tracks: Arc<dyn TrackRepository>,
    pub playlists: Arc<dyn PlaylistStore>,
}

/// Run the control session until `quit` or end of input
///
/// The controller is shut down before returning, which flushes the pending
/// volume write and persists the final queue state.
pub async fn run_session<D, R, W>(
    mut controller: PlaybackController<D>,
    library: Library,
    mut toasts: mpsc::UnboundedReceiver<Toast>,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    D: AudioDevice + TrackEnd,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut snapshots = controller.subscribe();
    let mut ticker = tokio::time::interval(END_OF_TRACK_POLL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    write_event(&mut output, &Event::Snapshot(controller.snapshot())).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<Command>(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Some(reply) = handle(&mut controller, &library, command).await {
                            write_event(&mut output, &reply).await?;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Rejected command {:?}: {}", line, e);
                        let message = format!("invalid command: {e}");
                        write_event(&mut output, &Event::Error { message }).await?;
                    }
                }
            }
            Some(toast) = toasts.recv() => {
                write_event(&mut output, &Event::Toast(toast)).await?;
            }
            Ok(()) = snapshots.changed() => {
                let snapshot = snapshots.borrow_and_update().clone();
                write_event(&mut output, &Event::Snapshot(snapshot)).await?;
            }
            _ = ticker.tick() => {
                if controller.status() == cadence_core::PlayerStatus::Play
                    && controller.device().has_ended()
                {
                    tracing::debug!("Track ended");
                    controller.next().await;
                }
            }
        }
    }

    if snapshots.has_changed().unwrap_or(false) {
        let snapshot = snapshots.borrow_and_update().clone();
        write_event(&mut output, &Event::Snapshot(snapshot)).await?;
    }
    controller.shutdown().await;

    // Toasts raised by the last command
    while let Ok(toast) = toasts.try_recv() {
        write_event(&mut output, &Event::Toast(toast)).await?;
    }
    output.flush().await
}

/// Execute one command; returns a direct reply for queries
pub async fn handle<D: AudioDevice>(
    controller: &mut PlaybackController<D>,
    library: &Library,
    command: Command,
) -> Option<Event> {
    tracing::debug!("Command: {:?}", command);
    let repository = library.tracks.as_ref();
    let playlists = library.playlists.as_ref();

    match command {
        Command::Start {
            query,
            track_id,
            origin,
        } => match repository.search(&query).await {
            Ok(candidates) => {
                controller
                    .start(candidates, track_id.as_ref(), origin)
                    .await;
            }
            Err(e) => tracing::warn!("Search failed: {}", e),
        },
        Command::Play => controller.play().await,
        Command::Pause => controller.pause().await,
        Command::PlayPause => controller.play_pause().await,
        Command::Stop => controller.stop().await,
        Command::Next => controller.next().await,
        Command::Previous => controller.previous().await,
        Command::StartFromQueue { index } => controller.start_from_queue(index).await,
        Command::JumpTo { seconds } => controller.jump_to(seconds),
        Command::ToggleShuffle { value } => controller.toggle_shuffle(value).await,
        Command::ToggleRepeat { value } => controller.toggle_repeat(value).await,
        Command::SetVolume { volume } => controller.set_volume(volume),
        Command::SetMuted { muted } => controller.set_muted(muted).await,
        Command::SetPlaybackRate { rate } => controller.set_playback_rate(rate).await,
        Command::SetOutputDevice { device_id } => {
            controller.set_output_device(&device_id).await;
        }
        Command::SetQueue { ids } => match repository.find_by_id(&ids).await {
            Ok(found) => {
                let tracks = persistence::resolve_in_order(&ids, &found);
                controller.set_queue(tracks).await;
            }
            Err(e) => tracing::warn!("Failed to resolve queue: {}", e),
        },
        Command::ClearQueue => controller.clear_queue().await,
        Command::RemoveFromQueue { index } => controller.remove_from_queue(index).await,
        Command::AddInQueue { ids } => controller.add_in_queue(&ids).await,
        Command::AddNextInQueue { ids } => controller.add_next_in_queue(&ids).await,
        Command::JumpToPlayingTrack => {
            return Some(Event::Navigate {
                path: controller.jump_to_playing_track(),
            });
        }
        Command::Search { query } => {
            return Some(match repository.search(&query).await {
                Ok(tracks) => Event::SearchResults { tracks },
                Err(e) => error(&e),
            });
        }
        Command::ListOutputDevices => {
            return Some(Event::OutputDevices {
                devices: controller.output_devices(),
                current: controller.output_device().to_string(),
            });
        }
        Command::ListPlaylists => {
            return Some(match playlists.list().await {
                Ok(playlists) => Event::Playlists { playlists },
                Err(e) => error(&e),
            });
        }
        Command::CreatePlaylist { name, ids } => {
            return Some(playlist_reply(playlists.create(&name, &ids).await));
        }
        Command::RenamePlaylist { playlist_id, name } => {
            return Some(playlist_reply(playlists.rename(&playlist_id, &name).await));
        }
        Command::DeletePlaylist { playlist_id } => {
            return Some(match playlists.delete(&playlist_id).await {
                Ok(()) => Event::PlaylistDeleted { playlist_id },
                Err(e) => error(&e),
            });
        }
        Command::AddToPlaylist { playlist_id, ids } => {
            return Some(playlist_reply(playlists.add_tracks(&playlist_id, &ids).await));
        }
        Command::RemoveFromPlaylist { playlist_id, ids } => {
            return Some(playlist_reply(
                playlists.remove_tracks(&playlist_id, &ids).await,
            ));
        }
        Command::ReorderPlaylist {
            playlist_id,
            ids,
            target_id,
            position,
        } => {
            let reordered = playlists
                .reorder(&playlist_id, &ids, &target_id, position)
                .await;
            return Some(playlist_reply(reordered));
        }
        Command::StartPlaylist {
            playlist_id,
            track_id,
        } => return start_playlist(controller, library, &playlist_id, track_id.as_ref()).await,
        Command::Snapshot => return Some(Event::Snapshot(controller.snapshot())),
        Command::Quit => {}
    }

    None
}

/// Queue a playlist's tracks, with the playlist view as origin
///
/// Replies only on failure.
async fn start_playlist<D: AudioDevice>(
    controller: &mut PlaybackController<D>,
    library: &Library,
    playlist_id: &PlaylistId,
    track_id: Option<&TrackId>,
) -> Option<Event> {
    let playlist = match library.playlists.get(playlist_id).await {
        Ok(Some(playlist)) => playlist,
        Ok(None) => {
            return Some(Event::Error {
                message: format!("Playlist not found: {playlist_id}"),
            })
        }
        Err(e) => return Some(error(&e)),
    };

    let found = match library.tracks.find_by_id(&playlist.tracks).await {
        Ok(found) => found,
        Err(e) => return Some(error(&e)),
    };
    let tracks = persistence::resolve_in_order(&playlist.tracks, &found);

    controller
        .start(tracks, track_id, Some(playlist.view_path()))
        .await;
    None
}

fn playlist_reply(result: cadence_core::Result<Playlist>) -> Event {
    match result {
        Ok(playlist) => Event::Playlist { playlist },
        Err(e) => error(&e),
    }
}

fn error(e: &cadence_core::CoreError) -> Event {
    tracing::warn!("Command failed: {}", e);
    Event::Error {
        message: e.to_string(),
    }
}

async fn write_event<W: AsyncWrite + Unpin>(
    output: &mut W,
    event: &Event,
) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(event).map_err(std::io::Error::other)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await
}
