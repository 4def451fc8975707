//! Effect requests: the boundary between gameplay and presentation.
//!
//! Gameplay never touches audio clips or particle systems. It writes
//! `EffectRequest` messages (fire-and-forget) and whatever presentation is
//! installed consumes them:
//! - `log_effect_requests` (always on) traces every request,
//! - `visuals` turns visual requests into short-lived sprites and smoke puffs,
//! - the lighting plugin flashes the muzzle light (render-only).
//!
//! Delayed and looping cues are not coroutines: they are `ScheduledEffects`
//! entries with a due timestamp, released by the fixed tick.

use bevy::prelude::*;

use crate::common::state::{GameState, SimSet};
use crate::common::tunables::Tunables;
use crate::plugins::damage::smoke::SmokeTier;

pub mod visuals;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    GunShot,
    ShellClink,
    BombRelease,
    MissileLaunch,
    Explosion,
    Impact,
    RadioChatter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisualKind {
    Impact,
    Explosion,
    SelfDestruct,
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum EffectRequest {
    MuzzleFlash {
        position: Vec2,
        direction: Vec2,
    },
    ShellEject {
        position: Vec2,
        direction: Vec2,
        speed: f32,
        torque: f32,
    },
    Audio(AudioCue),
    SpawnVisual {
        kind: VisualKind,
        position: Vec2,
        rotation: f32,
    },
    /// Stop the `from` smoke effect on `entity` and start the `to` one.
    Smoke {
        entity: Entity,
        from: SmokeTier,
        to: SmokeTier,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEffect {
    pub due: f64,
    pub request: EffectRequest,
    pub repeat: Option<f64>,
}

/// Pending effects keyed by due time (simulation seconds).
#[derive(Resource, Debug, Default)]
pub struct ScheduledEffects {
    entries: Vec<ScheduledEffect>,
}

impl ScheduledEffects {
    pub fn schedule(&mut self, due: f64, request: EffectRequest) {
        self.entries.push(ScheduledEffect { due, request, repeat: None });
    }

    /// Emit `request` at `first_due` and then every `interval` seconds.
    pub fn schedule_repeating(&mut self, first_due: f64, interval: f64, request: EffectRequest) {
        if !(interval > 0.0 && interval.is_finite()) {
            warn!("repeating effect {request:?} has invalid interval {interval}s; firing once");
            self.schedule(first_due, request);
            return;
        }
        self.entries.push(ScheduledEffect {
            due: first_due,
            request,
            repeat: Some(interval),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emit every entry due at `now`.
    ///
    /// A repeating entry fires at most once per call; if the clock jumped over
    /// several intervals it is rescheduled past `now` without replaying the gap.
    /// The next due time is computed in one step, so a tiny interval or a large
    /// clock jump costs the same as a single interval.
    pub fn release_due(&mut self, now: f64, mut emit: impl FnMut(EffectRequest)) {
        self.entries.retain_mut(|entry| {
            if entry.due > now {
                return true;
            }
            emit(entry.request);
            match entry.repeat {
                Some(interval) => {
                    let skipped = ((now - entry.due) / interval).floor() + 1.0;
                    entry.due += interval * skipped;
                    // Interval below the clock's resolution at `now`.
                    if entry.due <= now {
                        entry.due = now + interval;
                    }
                    true
                }
                None => false,
            }
        });
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<EffectRequest>()
        .init_resource::<ScheduledEffects>()
        .add_systems(OnEnter(GameState::InGame), schedule_radio_chatter)
        .add_systems(FixedUpdate, dispatch_scheduled_effects.in_set(SimSet::Schedule))
        .add_systems(PostUpdate, log_effect_requests);

    visuals::plugin(app);
}

fn schedule_radio_chatter(
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut scheduled: ResMut<ScheduledEffects>,
) {
    let Some(interval) = tunables.radio_interval else {
        return;
    };
    let now = time.elapsed_secs_f64();
    scheduled.schedule_repeating(now + interval, interval, EffectRequest::Audio(AudioCue::RadioChatter));
}

pub fn dispatch_scheduled_effects(
    time: Res<Time>,
    mut scheduled: ResMut<ScheduledEffects>,
    mut writer: MessageWriter<EffectRequest>,
) {
    let now = time.elapsed_secs_f64();
    scheduled.release_due(now, |request| {
        writer.write(request);
    });
}

/// The always-installed sink: trace every request.
pub fn log_effect_requests(mut reader: MessageReader<EffectRequest>) {
    for request in reader.read() {
        debug!("effect: {request:?}");
    }
}
