//! Offline track synthesis: render a list of beat hits into a PCM buffer.
//!
//! Each hit is a damped sine with a short noise transient, mixed into a mono
//! buffer the [`MusicPlayer`](crate::MusicPlayer) streams.

/// One synthesized hit in the track.
#[derive(Debug, Clone, Copy)]
pub struct BeatHit {
    /// Onset time (seconds).
    pub time: f64,
    /// Fundamental frequency (Hz).
    pub frequency: f32,
    /// Peak amplitude (0..1).
    pub volume: f32,
}

/// Hit tail length (seconds). Decay constants below are well inside this.
const HIT_DURATION: f64 = 0.35;

/// Render the hits into a mono sample buffer at `sample_rate`.
/// The buffer extends to the last hit plus its tail.
pub fn render_track(hits: &[BeatHit], sample_rate: f32) -> Vec<f32> {
    let end = hits
        .iter()
        .map(|h| h.time + HIT_DURATION)
        .fold(0.0f64, f64::max);
    let num_samples = (end * sample_rate as f64).ceil() as usize;
    let mut buffer = vec![0.0f32; num_samples];

    for hit in hits {
        mix_hit(&mut buffer, hit, sample_rate);
    }
    buffer
}

fn mix_hit(buffer: &mut [f32], hit: &BeatHit, sample_rate: f32) {
    let start = (hit.time * sample_rate as f64) as usize;
    let len = (HIT_DURATION * sample_rate as f64) as usize;
    let dt = 1.0 / sample_rate;
    let mut noise_state: u32 = 0x9e3779b9 ^ (hit.frequency as u32);

    for i in 0..len {
        let Some(slot) = buffer.get_mut(start + i) else {
            break;
        };
        let t = i as f32 * dt;

        // Fundamental plus one octave, both decaying.
        let body = (t * hit.frequency * std::f32::consts::TAU).sin() * (-t / 0.12).exp();
        let octave =
            (t * hit.frequency * 2.0 * std::f32::consts::TAU).sin() * 0.3 * (-t / 0.05).exp();

        // Short noise transient gives the attack its click.
        noise_state = noise_state.wrapping_mul(1103515245).wrapping_add(12345);
        let noise = (((noise_state >> 16) as f32 / 32768.0) - 1.0) * 0.15 * (-t / 0.004).exp();

        *slot += (body + octave + noise) * hit.volume;
    }
}
