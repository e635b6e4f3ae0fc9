//! Block behaviour attached to each runtime ID.
//!
//! Only the fallback is known to this crate: every registered state resolves to
//! [`Block::Unknown`], which carries its record and behaves like a full cube.

use crate::property::Properties;
use crate::state::BlockStateRecord;

/// Axis-aligned box in block-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    /// The unit cube `[0, 1]³`.
    pub const UNIT: Aabb = Aabb {
        min: [0.0, 0.0, 0.0],
        max: [1.0, 1.0, 1.0],
    };
}

/// One of the six block faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

/// Collision model of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    /// Fills the whole cell.
    Solid,
}

impl Model {
    /// Collision boxes of the model.
    pub fn aabbs(self) -> &'static [Aabb] {
        match self {
            Model::Solid => &[Aabb::UNIT],
        }
    }

    /// Whether `face` fully covers the neighbouring cell.
    pub fn face_solid(self, _face: Face) -> bool {
        match self {
            Model::Solid => true,
        }
    }
}

/// Behaviour bound to a runtime ID.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Block {
    /// A state registered without a concrete implementation.
    Unknown(BlockStateRecord),
}

impl Block {
    /// Name and properties this block encodes to.
    pub fn encode(&self) -> (&str, &Properties) {
        match self {
            Block::Unknown(state) => (&state.name, &state.properties),
        }
    }

    /// The underlying state record.
    pub fn state(&self) -> &BlockStateRecord {
        match self {
            Block::Unknown(state) => state,
        }
    }

    pub fn model(&self) -> Model {
        match self {
            Block::Unknown(_) => Model::Solid,
        }
    }

    /// Behaviour hash; `u64::MAX` marks a block without one.
    pub fn hash(&self) -> u64 {
        match self {
            Block::Unknown(_) => u64::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyValue, properties};

    #[test]
    fn test_unknown_block_is_full_cube() {
        let block = Block::Unknown(BlockStateRecord::new(
            "minecraft:observer",
            properties([("facing_direction", PropertyValue::Int(2))]),
            1,
        ));
        assert_eq!(block.model().aabbs(), &[Aabb::UNIT]);
        for face in [
            Face::Down,
            Face::Up,
            Face::North,
            Face::South,
            Face::West,
            Face::East,
        ] {
            assert!(block.model().face_solid(face));
        }
        assert_eq!(block.hash(), u64::MAX);
    }

    #[test]
    fn test_unknown_block_encodes_to_its_record() {
        let props = properties([("facing_direction", PropertyValue::Int(2))]);
        let block = Block::Unknown(BlockStateRecord::new("minecraft:observer", props.clone(), 1));
        let (name, encoded) = block.encode();
        assert_eq!(name, "minecraft:observer");
        assert_eq!(encoded, &props);
    }
}
