/// Sound engine: procedural chiptune effects and music via rodio.
///
/// Every clip and track is synthesised into an in-memory WAV buffer at
/// init time. One-shots are fire-and-forget; music owns a single sink that
/// is replaced on every track change.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine accepts every call and does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::warn;

    use clockrunner::sim::ports::{AudioSink, Clip, MusicTrack};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    struct Buffers {
        jump: Vec<u8>,
        attack: Vec<u8>,
        enemy_down: Vec<u8>,
        pickup: Vec<u8>,
        hurt: Vec<u8>,
        player_down: Vec<u8>,
        background: Vec<u8>,
        game_over: Vec<u8>,
        victory: Vec<u8>,
    }

    struct Engine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Buffers,
        music: RefCell<Option<Sink>>,
    }

    /// Cheap to clone; every clone drives the same output stream.
    #[derive(Clone)]
    pub struct SoundEngine {
        engine: Rc<Engine>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };

            let buffers = Buffers {
                jump: make_wav(&sweep(330.0, 660.0, 0.09, 0.25)),
                attack: make_wav(&noise_burst(0.08, 0.3)),
                enemy_down: make_wav(&arpeggio(&[784.0, 587.0, 392.0], 0.05, 0.3)),
                pickup: make_wav(&arpeggio(&[1047.0, 1319.0, 1568.0], 0.045, 0.25)),
                hurt: make_wav(&sweep(440.0, 180.0, 0.15, 0.3)),
                player_down: make_wav(&arpeggio(&[440.0, 370.0, 311.0, 261.0], 0.12, 0.3)),
                background: make_wav(&melody(&[262.0, 330.0, 392.0, 330.0, 294.0, 349.0, 440.0, 349.0], 0.22, 0.12)),
                game_over: make_wav(&melody(&[392.0, 330.0, 262.0, 196.0], 0.35, 0.2)),
                victory: make_wav(&melody(&[523.0, 659.0, 784.0, 1047.0, 784.0, 1047.0], 0.15, 0.2)),
            };

            Some(SoundEngine {
                engine: Rc::new(Engine {
                    _stream: stream,
                    handle,
                    buffers,
                    music: RefCell::new(None),
                }),
            })
        }

        fn buffer(&self, clip: Clip) -> &[u8] {
            let b = &self.engine.buffers;
            match clip {
                Clip::Jump => &b.jump,
                Clip::Attack => &b.attack,
                Clip::EnemyDown => &b.enemy_down,
                Clip::Pickup => &b.pickup,
                Clip::Hurt => &b.hurt,
                Clip::PlayerDown => &b.player_down,
            }
        }

        fn track(&self, track: MusicTrack) -> &[u8] {
            let b = &self.engine.buffers;
            match track {
                MusicTrack::Background => &b.background,
                MusicTrack::GameOver => &b.game_over,
                MusicTrack::Victory => &b.victory,
            }
        }
    }

    impl AudioSink for SoundEngine {
        fn play_one_shot(&mut self, clip: Clip) {
            let Ok(sink) = Sink::try_new(&self.engine.handle) else { return };
            if let Ok(src) = rodio::Decoder::new(Cursor::new(self.buffer(clip).to_vec())) {
                sink.append(src);
                sink.detach();
            }
        }

        fn play_music(&mut self, track: MusicTrack, looping: bool) {
            self.stop_music();
            let Ok(sink) = Sink::try_new(&self.engine.handle) else { return };
            let Ok(src) = rodio::Decoder::new(Cursor::new(self.track(track).to_vec())) else { return };
            if looping {
                sink.append(src.repeat_infinite());
            } else {
                sink.append(src);
            }
            *self.engine.music.borrow_mut() = Some(sink);
        }

        fn stop_music(&mut self) {
            if let Some(old) = self.engine.music.borrow_mut().take() {
                old.stop();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Pitch glide from `from` to `to` Hz with a linear fade.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * volume
            })
            .collect()
    }

    /// Short LCG noise burst, for the swing.
    fn noise_burst(duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - i as f32 / n as f32).powf(1.5);
                noise * env * volume
            })
            .collect()
    }

    /// Quick square-ish arpeggio (sine + 3rd harmonic).
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = samples_for(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Plain sine melody with a soft attack per note, for the music tracks.
    fn melody(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = samples_for(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let pos = i as f32 / n as f32;
                let env = (pos * 20.0).min(1.0) * (1.0 - pos * 0.4);
                let wave = (t * freq * TAU).sin() * 0.8 + (t * freq * 2.0 * TAU).sin() * 0.2;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
#[derive(Clone)]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
}

#[cfg(not(feature = "sound"))]
impl clockrunner::sim::ports::AudioSink for SoundEngine {
    fn play_one_shot(&mut self, _clip: clockrunner::sim::ports::Clip) {}
    fn play_music(&mut self, _track: clockrunner::sim::ports::MusicTrack, _looping: bool) {}
    fn stop_music(&mut self) {}
}
