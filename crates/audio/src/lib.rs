//! Music playback for BeatBounce.
//!
//! Uses cpal for audio output. A single pre-rendered track is held in shared
//! state and consumed by the cpal output stream callback; the game thread
//! only flips playback flags and the cursor. The playback clock is the
//! device's own; the simulation never reads it.

pub mod track;

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Shared state between the game thread (transport control) and the audio
/// thread (sample output).
struct PlayerState {
    /// Mono track samples at `sample_rate`.
    track: Vec<f32>,
    /// Fractional read position into `track`.
    cursor: f64,
    playing: bool,
    volume: f32,
    sample_rate: f32,
}

/// Single-track music player: seek, play, pause, stop.
pub struct MusicPlayer {
    state: Arc<Mutex<PlayerState>>,
    _stream: Option<cpal::Stream>,
    enabled: bool,
}

impl MusicPlayer {
    /// Create and start the output stream.
    /// Returns a disabled player if audio initialization fails (no crash).
    pub fn new() -> Self {
        match Self::try_init() {
            Ok(player) => player,
            Err(e) => {
                log::warn!("audio init failed: {e}; running without music");
                Self {
                    state: Arc::new(Mutex::new(PlayerState {
                        track: Vec::new(),
                        cursor: 0.0,
                        playing: false,
                        volume: 0.8,
                        sample_rate: 44100.0,
                    })),
                    _stream: None,
                    enabled: false,
                }
            }
        }
    }

    fn try_init() -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("No audio output device found")?;

        let config = device
            .default_output_config()
            .map_err(|e| format!("No default output config: {e}"))?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let state = Arc::new(Mutex::new(PlayerState {
            track: Vec::new(),
            cursor: 0.0,
            playing: false,
            volume: 0.8,
            sample_rate,
        }));

        let state_clone = Arc::clone(&state);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        fill_buffer_f32(data, channels, &state_clone);
                    },
                    |err| log::warn!("audio stream error: {err}"),
                    None,
                )
                .map_err(|e| format!("Failed to build f32 stream: {e}"))?,
            cpal::SampleFormat::I16 => device
                .build_output_stream(
                    &config.into(),
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        fill_buffer_i16(data, channels, &state_clone);
                    },
                    |err| log::warn!("audio stream error: {err}"),
                    None,
                )
                .map_err(|e| format!("Failed to build i16 stream: {e}"))?,
            format => return Err(format!("Unsupported sample format: {format:?}")),
        };

        stream
            .play()
            .map_err(|e| format!("Failed to start stream: {e}"))?;

        Ok(Self {
            state,
            _stream: Some(stream),
            enabled: true,
        })
    }

    /// Whether an output stream is running.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Output sample rate, for rendering the track.
    pub fn sample_rate(&self) -> f32 {
        if let Ok(state) = self.state.lock() {
            state.sample_rate
        } else {
            44100.0
        }
    }

    /// Replace the track. Stops playback and rewinds.
    pub fn set_track(&self, samples: Vec<f32>) {
        if let Ok(mut state) = self.state.lock() {
            state.track = samples;
            state.cursor = 0.0;
            state.playing = false;
        }
    }

    /// Seek to `offset` seconds and start playing.
    pub fn play(&self, offset: f64) {
        if !self.enabled {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.cursor = offset.max(0.0) * state.sample_rate as f64;
            state.playing = true;
        }
    }

    /// Continue from the paused position.
    pub fn resume(&self) {
        if !self.enabled {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.playing = true;
        }
    }

    /// Halt output, keeping the position for `resume`.
    pub fn pause(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.playing = false;
        }
    }

    /// Halt output and rewind to the start.
    pub fn stop(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.playing = false;
            state.cursor = 0.0;
        }
    }

    pub fn set_volume(&self, volume: f32) {
        if let Ok(mut state) = self.state.lock() {
            state.volume = volume.clamp(0.0, 1.0);
        }
    }
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill an f32 output buffer from the track. Silence when paused, past the
/// end of the track, or when the lock is contended.
fn fill_buffer_f32(data: &mut [f32], channels: usize, state: &Arc<Mutex<PlayerState>>) {
    for s in data.iter_mut() {
        *s = 0.0;
    }

    let Ok(mut state) = state.lock() else {
        return;
    };
    if !state.playing || state.track.is_empty() {
        return;
    }

    let volume = state.volume;
    let num_frames = data.len() / channels;

    for frame in 0..num_frames {
        let idx = state.cursor as usize;
        if idx >= state.track.len() {
            state.playing = false;
            break;
        }
        let sample = soft_clip(state.track[idx] * volume);
        let base = frame * channels;
        for ch in 0..channels {
            data[base + ch] = sample;
        }
        state.cursor += 1.0;
    }
}

/// Fill an i16 output buffer via an f32 intermediary.
fn fill_buffer_i16(data: &mut [i16], channels: usize, state: &Arc<Mutex<PlayerState>>) {
    let mut f32_buf = vec![0.0f32; data.len()];
    fill_buffer_f32(&mut f32_buf, channels, state);

    for (out, &sample) in data.iter_mut().zip(f32_buf.iter()) {
        *out = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
    }
}

/// Soft clipping (tanh-like) to prevent harsh distortion.
fn soft_clip(x: f32) -> f32 {
    if x.abs() < 0.5 {
        x
    } else {
        x.signum() * (1.0 - (-2.0 * (x.abs() - 0.5)).exp() * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state(track: Vec<f32>) -> Arc<Mutex<PlayerState>> {
        Arc::new(Mutex::new(PlayerState {
            track,
            cursor: 0.0,
            playing: false,
            volume: 1.0,
            sample_rate: 4.0,
        }))
    }

    #[test]
    fn test_paused_player_outputs_silence() {
        let state = test_state(vec![0.25; 16]);
        let mut buf = vec![1.0f32; 8];
        fill_buffer_f32(&mut buf, 2, &state);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_playback_consumes_from_cursor() {
        let state = test_state((0..8).map(|i| i as f32 * 0.01).collect());
        {
            let mut s = state.lock().unwrap();
            s.playing = true;
            s.cursor = 2.0;
        }
        let mut buf = vec![0.0f32; 4];
        fill_buffer_f32(&mut buf, 2, &state);
        // Two stereo frames from samples 2 and 3, duplicated per channel.
        assert!((buf[0] - 0.02).abs() < 1e-6);
        assert!((buf[1] - 0.02).abs() < 1e-6);
        assert!((buf[2] - 0.03).abs() < 1e-6);
        assert!((buf[3] - 0.03).abs() < 1e-6);
        assert_eq!(state.lock().unwrap().cursor, 4.0);
    }

    #[test]
    fn test_playback_stops_at_track_end() {
        let state = test_state(vec![0.5; 2]);
        state.lock().unwrap().playing = true;
        let mut buf = vec![0.0f32; 8];
        fill_buffer_f32(&mut buf, 2, &state);
        assert!(!state.lock().unwrap().playing);
        assert_eq!(buf[4], 0.0);
    }

    #[test]
    fn test_soft_clip_bounds() {
        assert!(soft_clip(10.0) <= 1.0);
        assert!(soft_clip(-10.0) >= -1.0);
        assert_eq!(soft_clip(0.25), 0.25);
    }
}
