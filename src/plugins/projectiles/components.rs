use bevy::prelude::*;

/// Which pool an entity belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Bullet,
    Shell,
    Bomb,
    Missile,
}

impl PoolKind {
    pub const ALL: [PoolKind; 4] = [Self::Bullet, Self::Shell, Self::Bomb, Self::Missile];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bullet => "bullet",
            Self::Shell => "shell",
            Self::Bomb => "bomb",
            Self::Missile => "missile",
        }
    }

    /// Kinds that detonate (explosion visual + audio) when they stop.
    #[inline]
    pub fn explodes(self) -> bool {
        matches!(self, Self::Bomb | Self::Missile)
    }

    /// Shell casings are cosmetic debris and never resolve impacts.
    #[inline]
    pub fn is_projectile(self) -> bool {
        !matches!(self, Self::Shell)
    }
}

/// Marker + kind for every pre-spawned pooled entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooled {
    pub kind: PoolKind,
}

/// Gameplay state of a pooled entity.
///
/// `PendingReturn` is written by whoever decides the entity is done (impact,
/// expiry, self-destruct); only the return commit moves it back to `Inactive`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

/// Damage dealt on impact. Rewritten on every shot.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Payload {
    pub damage: f32,
    pub owner: Option<Entity>,
}

impl Payload {
    #[inline]
    pub fn reset_for_fire(&mut self, damage: f32, owner: Entity) {
        self.damage = damage;
        self.owner = Some(owner);
    }
}
