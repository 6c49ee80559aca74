//! Audio using the Web Audio API
//!
//! Procedurally generated blips, no external files. Anywhere audio is
//! unavailable (native builds, insecure contexts, blocked autoplay) every
//! call is a silent no-op and gameplay carries on.

#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Body jumped
    Jump,
    /// Run ended
    GameOver,
}

/// Audio manager for the game
pub struct AudioManager {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<AudioContext>,
    master_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("available", &self.is_available())
            .field("master_volume", &self.master_volume)
            .field("muted", &self.muted)
            .finish()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                muted: false,
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self {
                master_volume: 0.8,
                muted: false,
            }
        }
    }

    /// Pick up volume and mute from the player's settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_muted(settings.muted);
    }

    pub fn is_available(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            self.ctx.is_some()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        #[cfg(target_arch = "wasm32")]
        {
            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Jump => self.play_jump(ctx, vol),
                SoundEffect::GameOver => self.play_game_over(ctx, vol),
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        log::trace!("(silent) {:?}", effect);
    }

    /// Create an oscillator routed through a gain node
    #[cfg(target_arch = "wasm32")]
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Jump - short rising chirp
    #[cfg(target_arch = "wasm32")]
    fn play_jump(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 400.0, OscillatorType::Sine) else {
            return;
        };
        let now = ctx.current_time();
        let _ = osc.frequency().exponential_ramp_to_value_at_time(800.0, now + 0.1);
        gain.gain().set_value(0.25 * vol);
        let _ = gain.gain().exponential_ramp_to_value_at_time(0.001, now + 0.12);
        let _ = osc.start_with_when(now);
        let _ = osc.stop_with_when(now + 0.12);
    }

    /// Game over - falling square tone
    #[cfg(target_arch = "wasm32")]
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Square) else {
            return;
        };
        let now = ctx.current_time();
        let _ = osc.frequency().exponential_ramp_to_value_at_time(80.0, now + 0.5);
        gain.gain().set_value(0.2 * vol);
        let _ = gain.gain().exponential_ramp_to_value_at_time(0.001, now + 0.5);
        let _ = osc.start_with_when(now);
        let _ = osc.stop_with_when(now + 0.5);
    }
}
