use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// World-space coordinate (authoritative or display).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, to: Vec3, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        self + (to - self) * t
    }

    pub fn component(self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn with_component(mut self, axis: Axis, value: f32) -> Vec3 {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
        self
    }
}

impl From<(f32, f32, f32)> for Vec3 {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Vec3 { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Screen-space pointer position in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: ScreenPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// An entity position kept as the pair the rest of the core works with:
/// `original` is simulated, `display` is derived from it every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacedPosition {
    pub original: Vec3,
    pub display: Vec3,
}

impl PlacedPosition {
    pub fn unmirrored(original: Vec3) -> Self {
        Self { original, display: original }
    }
}

/// Network-wide entity identity, minted by the spawning peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        EntityId(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First block is enough to follow an entity through the logs.
        let text = self.0.simple().to_string();
        write!(f, "e-{}", &text[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        PeerId(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0.simple().to_string();
        write!(f, "p-{}", &text[..8])
    }
}

pub type SlotIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterName {
    ElfApprenticeArcher,
    ElfArcher,
    ElfSharpshooter,
    DemonApprenticeMage,
    DemonAdeptMage,
    DemonWizard,
    SkeletonMage,
    SkeletonAssassin,
    SkeletonBerserker,
    Adventurer,
    Knight,
    Swordmaster,
    Shieldman,
    Shieldwarden,
    Guardian,
}

impl CharacterName {
    pub const ALL: [CharacterName; 15] = [
        CharacterName::ElfApprenticeArcher,
        CharacterName::ElfArcher,
        CharacterName::ElfSharpshooter,
        CharacterName::DemonApprenticeMage,
        CharacterName::DemonAdeptMage,
        CharacterName::DemonWizard,
        CharacterName::SkeletonMage,
        CharacterName::SkeletonAssassin,
        CharacterName::SkeletonBerserker,
        CharacterName::Adventurer,
        CharacterName::Knight,
        CharacterName::Swordmaster,
        CharacterName::Shieldman,
        CharacterName::Shieldwarden,
        CharacterName::Guardian,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterName {
    Bird1,
}

impl MonsterName {
    pub const ALL: [MonsterName; 1] = [MonsterName::Bird1];
}

/// The pool key of an entity: what it is, independent of which instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "name")]
pub enum EntityKind {
    Character(CharacterName),
    Monster(MonsterName),
}

impl EntityKind {
    pub fn is_monster(self) -> bool {
        matches!(self, EntityKind::Monster(_))
    }

    /// Every kind the game knows, in a stable order (used for pool warm-up).
    pub fn all() -> impl Iterator<Item = EntityKind> {
        CharacterName::ALL
            .into_iter()
            .map(EntityKind::Character)
            .chain(MonsterName::ALL.into_iter().map(EntityKind::Monster))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Character(name) => write!(f, "{:?}", name),
            EntityKind::Monster(name) => write!(f, "{:?}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    Idle,
    Move,
    Attack,
    Damaged,
    Debuff,
    Death,
    Other,
}
