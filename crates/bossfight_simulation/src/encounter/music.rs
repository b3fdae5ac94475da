//! Encounter music sequencing: intro → phase one, crossfade to phase two.
//!
//! Playback itself is the host's job; the switcher only tracks which cue
//! should be audible and at what volume.

use bevy::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub struct MusicTrack {
    pub name: String,
    /// Seconds; used to schedule phase one after the intro.
    pub length: f64,
}

impl MusicTrack {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Every slot is optional: a missing track turns its cue into a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusicTracks {
    pub intro: Option<MusicTrack>,
    pub phase_one: Option<MusicTrack>,
    pub phase_two: Option<MusicTrack>,
}

#[derive(Debug, Clone, PartialEq)]
enum Fade {
    Out { elapsed: f64, from: f32, next: MusicTrack },
    In { elapsed: f64 },
}

#[derive(Debug, Clone)]
pub struct MusicSwitcher {
    tracks: MusicTracks,
    crossfade: f64,
    now_playing: Option<MusicTrack>,
    looping: bool,
    volume: f32,
    phase_one_in: Option<f64>,
    fade: Option<Fade>,
}

impl Default for MusicSwitcher {
    fn default() -> Self {
        Self::new(MusicTracks::default(), 0.8)
    }
}

impl MusicSwitcher {
    pub fn new(tracks: MusicTracks, crossfade: f64) -> Self {
        Self {
            tracks,
            crossfade: crossfade.max(0.0),
            now_playing: None,
            looping: false,
            volume: 1.0,
            phase_one_in: None,
            fade: None,
        }
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.now_playing.as_ref().map(|track| track.name.as_str())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn phase_one_pending(&self) -> bool {
        self.phase_one_in.is_some()
    }

    /// Intro once, then phase one after the intro length.
    /// Without an intro, phase one starts right away.
    pub fn play_intro_then_phase1(&mut self) {
        let Some(intro) = self.tracks.intro.clone() else {
            self.play_phase1();
            return;
        };

        crate::logger::log(&format!("🎵 Music: intro '{}' ({:.1}s)", intro.name, intro.length));
        self.phase_one_in = Some(intro.length.max(0.0));
        self.fade = None;
        self.volume = 1.0;
        self.looping = false;
        self.now_playing = Some(intro);
    }

    pub fn play_phase1(&mut self) {
        self.phase_one_in = None;
        if let Some(track) = self.tracks.phase_one.clone() {
            self.crossfade_to(track);
        }
    }

    /// Also cancels a pending phase-one cue, so a late intro timer
    /// can't override phase two.
    pub fn play_phase2(&mut self) {
        self.phase_one_in = None;
        if let Some(track) = self.tracks.phase_two.clone() {
            self.crossfade_to(track);
        }
    }

    fn crossfade_to(&mut self, next: MusicTrack) {
        crate::logger::log(&format!("🎵 Music: crossfade → '{}'", next.name));
        // тишина → сразу fade in, без fade out
        if self.crossfade <= 0.0 || (self.now_playing.is_none() && self.fade.is_none()) {
            self.switch_to(next);
            self.fade = (self.crossfade > 0.0).then_some(Fade::In { elapsed: 0.0 });
            self.volume = if self.fade.is_some() { 0.0 } else { 1.0 };
            return;
        }
        self.fade = Some(Fade::Out {
            elapsed: 0.0,
            from: self.volume,
            next,
        });
    }

    fn switch_to(&mut self, track: MusicTrack) {
        self.now_playing = Some(track);
        self.looping = true;
    }

    /// Advance timers by unscaled time.
    pub fn tick(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }

        if let Some(remaining) = self.phase_one_in {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.play_phase1();
            } else {
                self.phase_one_in = Some(remaining);
            }
        }

        match self.fade.take() {
            Some(Fade::Out { elapsed, from, next }) => {
                let elapsed = elapsed + dt;
                if elapsed >= self.crossfade {
                    self.switch_to(next);
                    self.volume = 0.0;
                    self.fade = Some(Fade::In { elapsed: 0.0 });
                } else {
                    self.volume = from * (1.0 - (elapsed / self.crossfade) as f32);
                    self.fade = Some(Fade::Out { elapsed, from, next });
                }
            }
            Some(Fade::In { elapsed }) => {
                let elapsed = elapsed + dt;
                if elapsed >= self.crossfade {
                    self.volume = 1.0;
                } else {
                    self.volume = (elapsed / self.crossfade) as f32;
                    self.fade = Some(Fade::In { elapsed });
                }
            }
            None => {}
        }
    }
}

/// Resource: music switcher shared by the trigger and its phase-two cue.
#[derive(Resource, Debug, Clone, Default)]
pub struct MusicHandle(Arc<Mutex<MusicSwitcher>>);

impl MusicHandle {
    pub fn new(switcher: MusicSwitcher) -> Self {
        Self(Arc::new(Mutex::new(switcher)))
    }

    pub fn lock(&self) -> MutexGuard<'_, MusicSwitcher> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
