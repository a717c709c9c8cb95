/// Spawn record kinds. Only the player and enemy kinds are instantiated;
/// the rest are reserved by the level editor and skipped on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnKind {
    Player,
    Enemy,
    Decoration,
    Pickup,
    Currency,
    Hazard,
    Unknown(i32),
}

impl SpawnKind {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Player,
            1 => Self::Enemy,
            2 => Self::Decoration,
            3 => Self::Pickup,
            4 => Self::Currency,
            5 => Self::Hazard,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
            Self::Decoration => 2,
            Self::Pickup => 3,
            Self::Currency => 4,
            Self::Hazard => 5,
            Self::Unknown(other) => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Decoration => "decoration",
            Self::Pickup => "pickup",
            Self::Currency => "currency",
            Self::Hazard => "hazard",
            Self::Unknown(_) => "unknown",
        }
    }
}
