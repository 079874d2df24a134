use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{CheckersResult, GameError};

pub const MIN_DIMENSION: u8 = 4;

static PRESETS: Lazy<HashMap<&'static str, Ruleset>> = Lazy::new(|| {
    let classic = Ruleset::unchecked(8, 8);
    HashMap::from([
        ("classic", classic),
        (
            "international",
            Ruleset {
                black_moves_first: false,
                can_capture_backwards: true,
                can_capture_backwards_during_multi_capture: true,
                flying_kings: true,
                ..Ruleset::unchecked(10, 10)
            },
        ),
        (
            "russian",
            Ruleset {
                black_moves_first: false,
                can_capture_backwards: true,
                can_capture_backwards_during_multi_capture: true,
                flying_kings: true,
                ..classic
            },
        ),
        // Majority capture is not modelled, so this matches russian.
        (
            "brazilian",
            Ruleset {
                black_moves_first: false,
                can_capture_backwards: true,
                can_capture_backwards_during_multi_capture: true,
                flying_kings: true,
                ..classic
            },
        ),
        ("small", Ruleset::unchecked(6, 6)),
    ])
});

/// Immutable rule toggles of one game.
///
/// Construction validates the board dimensions; deserialization goes through
/// the same check so a stored ruleset can never produce an invalid game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RulesetFields")]
pub struct Ruleset {
    width: u8,
    height: u8,
    black_moves_first: bool,
    must_capture: bool,
    can_capture_backwards: bool,
    can_capture_backwards_during_multi_capture: bool,
    flying_kings: bool,
}

#[derive(Deserialize)]
struct RulesetFields {
    width: u8,
    height: u8,
    black_moves_first: bool,
    must_capture: bool,
    can_capture_backwards: bool,
    can_capture_backwards_during_multi_capture: bool,
    flying_kings: bool,
}

impl TryFrom<RulesetFields> for Ruleset {
    type Error = GameError;

    fn try_from(fields: RulesetFields) -> Result<Self, Self::Error> {
        Ok(Ruleset::new(fields.width, fields.height)?
            .with_black_moves_first(fields.black_moves_first)
            .with_must_capture(fields.must_capture)
            .with_can_capture_backwards(fields.can_capture_backwards)
            .with_can_capture_backwards_during_multi_capture(
                fields.can_capture_backwards_during_multi_capture,
            )
            .with_flying_kings(fields.flying_kings))
    }
}

impl Ruleset {
    /// Creates a ruleset with classic rule flags: black moves first, captures
    /// are mandatory, men never capture backwards and kings move one square.
    pub fn new(width: u8, height: u8) -> CheckersResult<Self> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(GameError::configuration(format!(
                "board must be at least {MIN_DIMENSION}x{MIN_DIMENSION}, got {width}x{height}"
            )));
        }
        Ok(Self::unchecked(width, height))
    }

    const fn unchecked(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            black_moves_first: true,
            must_capture: true,
            can_capture_backwards: false,
            can_capture_backwards_during_multi_capture: false,
            flying_kings: false,
        }
    }

    /// The classic 8x8 ruleset.
    pub fn classic() -> Self {
        Self::unchecked(8, 8)
    }

    /// Looks up a named preset such as `"classic"` or `"international"`.
    pub fn preset(name: &str) -> Option<Self> {
        PRESETS.get(name).copied()
    }

    /// Names of all presets, sorted.
    pub fn preset_names() -> Vec<&'static str> {
        let mut names: Vec<_> = PRESETS.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn with_black_moves_first(mut self, value: bool) -> Self {
        self.black_moves_first = value;
        self
    }

    pub fn with_must_capture(mut self, value: bool) -> Self {
        self.must_capture = value;
        self
    }

    pub fn with_can_capture_backwards(mut self, value: bool) -> Self {
        self.can_capture_backwards = value;
        self
    }

    pub fn with_can_capture_backwards_during_multi_capture(mut self, value: bool) -> Self {
        self.can_capture_backwards_during_multi_capture = value;
        self
    }

    pub fn with_flying_kings(mut self, value: bool) -> Self {
        self.flying_kings = value;
        self
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn black_moves_first(&self) -> bool {
        self.black_moves_first
    }

    pub fn must_capture(&self) -> bool {
        self.must_capture
    }

    pub fn can_capture_backwards(&self) -> bool {
        self.can_capture_backwards
    }

    pub fn can_capture_backwards_during_multi_capture(&self) -> bool {
        self.can_capture_backwards_during_multi_capture
    }

    pub fn flying_kings(&self) -> bool {
        self.flying_kings
    }

    /// Rows initially filled for each side.
    pub fn rows_per_player(&self) -> u8 {
        self.height.saturating_sub(2) / 2
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::classic()
    }
}
