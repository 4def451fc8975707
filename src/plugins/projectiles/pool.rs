//! Fixed-capacity entity pools.
//!
//! Every pooled entity is spawned once at startup with its full component set and
//! is never despawned. Activation and deactivation only rewrite component values,
//! which keeps entities in one archetype for their whole life.
//!
//! The pool itself is plain bookkeeping over `Entity` handles; it never touches
//! transforms, physics or visibility. That is the job of the fire control
//! (activation) and the return commit (deactivation).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::error::ConfigurationError;
use crate::common::layers::Layer;
use crate::common::tunables::Tunables;

use super::components::{Payload, PoolKind, Pooled, ProjectileState};
use super::guidance::Guidance;
use super::lifecycle::Lifetime;

/// Creates one pooled entity. Used once per slot at warm-up.
pub trait EntityFactory {
    fn create(&mut self) -> Entity;
}

impl<F> EntityFactory for F
where
    F: FnMut() -> Entity,
{
    #[inline]
    fn create(&mut self) -> Entity {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolEntry {
    pub handle: Entity,
    pub active: bool,
}

#[derive(Debug)]
pub struct ObjectPool {
    kind: PoolKind,
    entries: Vec<PoolEntry>,
}

impl ObjectPool {
    /// Create exactly `capacity` inactive entities up front.
    pub fn initialize(
        kind: PoolKind,
        capacity: usize,
        factory: Option<&mut dyn EntityFactory>,
    ) -> Result<Self, ConfigurationError> {
        if capacity == 0 {
            return Err(ConfigurationError::ZeroCapacity { kind });
        }
        let Some(factory) = factory else {
            return Err(ConfigurationError::MissingFactory { kind });
        };

        let entries = (0..capacity)
            .map(|_| PoolEntry { handle: factory.create(), active: false })
            .collect();

        Ok(Self { kind, entries })
    }

    /// Lend the first inactive entry in creation order.
    ///
    /// `None` means every slot is in use. That is a capacity decision, not a fault.
    pub fn acquire(&mut self) -> Option<Entity> {
        let entry = self.entries.iter_mut().find(|e| !e.active)?;
        entry.active = true;
        Some(entry.handle)
    }

    /// Mark `handle` inactive. Releasing an inactive handle is a no-op.
    ///
    /// Returns `true` if the entry actually transitioned.
    pub fn release(&mut self, handle: Entity) -> bool {
        match self.entries.iter_mut().find(|e| e.handle == handle) {
            Some(entry) if entry.active => {
                entry.active = false;
                true
            }
            Some(_) => false,
            None => {
                warn!("{} pool asked to release foreign entity {handle:?}", self.kind.name());
                false
            }
        }
    }

    #[inline]
    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.active).count()
    }

    pub fn available(&self) -> usize {
        self.capacity() - self.active_count()
    }

    pub fn is_active(&self, handle: Entity) -> bool {
        self.entries.iter().any(|e| e.handle == handle && e.active)
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }
}

/// All pools, one per kind. Inserted by `init_pools` at startup.
#[derive(Resource, Debug)]
pub struct Pools {
    pub bullets: ObjectPool,
    pub shells: ObjectPool,
    pub bombs: ObjectPool,
    pub missiles: ObjectPool,
}

impl Pools {
    pub fn get(&self, kind: PoolKind) -> &ObjectPool {
        match kind {
            PoolKind::Bullet => &self.bullets,
            PoolKind::Shell => &self.shells,
            PoolKind::Bomb => &self.bombs,
            PoolKind::Missile => &self.missiles,
        }
    }

    pub fn get_mut(&mut self, kind: PoolKind) -> &mut ObjectPool {
        match kind {
            PoolKind::Bullet => &mut self.bullets,
            PoolKind::Shell => &mut self.shells,
            PoolKind::Bomb => &mut self.bombs,
            PoolKind::Missile => &mut self.missiles,
        }
    }
}

#[inline]
fn membership(kind: PoolKind) -> Layer {
    match kind {
        PoolKind::Shell => Layer::Debris,
        _ => Layer::PlayerProjectile,
    }
}

/// Layers of a live entity of `kind`.
#[inline]
pub fn active_layers(kind: PoolKind) -> CollisionLayers {
    match kind {
        PoolKind::Shell => CollisionLayers::new(Layer::Debris, [Layer::World]),
        _ => CollisionLayers::new(Layer::PlayerProjectile, [Layer::World, Layer::Enemy]),
    }
}

/// "Disabled" without structural changes: empty filters means we collide with nothing.
#[inline]
pub fn inactive_layers(kind: PoolKind) -> CollisionLayers {
    CollisionLayers::new(membership(kind), [] as [Layer; 0])
}

fn appearance(kind: PoolKind) -> (Color, Vec2, f32) {
    match kind {
        PoolKind::Bullet => (Color::srgb(1.0, 0.85, 0.3), Vec2::splat(6.0), 3.0),
        PoolKind::Shell => (Color::srgb(0.8, 0.6, 0.2), Vec2::new(3.0, 6.0), 2.0),
        PoolKind::Bomb => (Color::srgb(0.3, 0.3, 0.3), Vec2::splat(14.0), 7.0),
        PoolKind::Missile => (Color::srgb(0.95, 0.95, 1.0), Vec2::new(14.0, 5.0), 4.0),
    }
}

fn pooled_bundle(kind: PoolKind) -> impl Bundle {
    let (color, size, radius) = appearance(kind);
    (
        Name::new(format!("{}(Pooled)", kind.name())),
        Pooled { kind },
        ProjectileState::Inactive,
        Payload::default(),
        Lifetime::default(),
        Sprite {
            color,
            custom_size: Some(size),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 2.0),
        Visibility::Hidden,
        RigidBody::Dynamic,
        Collider::circle(radius),
        inactive_layers(kind),
        (LinearVelocity::ZERO, AngularVelocity(0.0)),
        // Always present; inactive entities never collide because their filters are empty.
        CollisionEventsEnabled,
    )
}

fn build_pool(
    commands: &mut Commands,
    kind: PoolKind,
    capacity: usize,
) -> Result<ObjectPool, ConfigurationError> {
    let mut spawn = || {
        let mut e = commands.spawn(pooled_bundle(kind));
        match kind {
            PoolKind::Missile => {
                e.insert(Guidance::default());
            }
            PoolKind::Shell => {
                e.insert((Restitution::new(0.4), LinearDamping(2.5), AngularDamping(1.5)));
            }
            PoolKind::Bullet | PoolKind::Bomb => {}
        }
        e.id()
    };
    let factory: &mut dyn EntityFactory = &mut spawn;
    ObjectPool::initialize(kind, capacity, Some(factory))
}

/// Validate configuration and pre-spawn every pool (inactive).
pub fn init_pools(mut commands: Commands, tunables: Res<Tunables>) -> Result {
    tunables.validate()?;

    let caps = tunables.pools;
    let pools = Pools {
        bullets: build_pool(&mut commands, PoolKind::Bullet, caps.bullets)?,
        shells: build_pool(&mut commands, PoolKind::Shell, caps.shells)?,
        bombs: build_pool(&mut commands, PoolKind::Bomb, caps.bombs)?,
        missiles: build_pool(&mut commands, PoolKind::Missile, caps.missiles)?,
    };

    for kind in PoolKind::ALL {
        info!("{} pool warmed up with {} slots", kind.name(), pools.get(kind).capacity());
    }

    commands.insert_resource(pools);
    Ok(())
}
