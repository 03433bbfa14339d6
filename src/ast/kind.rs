//! Node kind tags and their hierarchy.
//!
//! Dispatch rules are keyed by kind. Abstract kinds (`Node`, `Value`,
//! `Vector`, `Nbt`) never appear on a node but let a rule match a whole
//! family at once.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    // Abstract kinds
    Node,
    Value,
    Vector,
    Nbt,

    Root,
    Command,
    Comment,
    Bool,
    Number,
    Word,
    String,
    Greedy,
    Time,
    ResourceLocation,
    Coordinate,
    Vector2,
    Vector3,
    Range,
    Selector,
    SelectorArgument,
    SelectorScores,
    SelectorScoreMatch,
    SelectorAdvancements,
    SelectorAdvancementMatch,
    SelectorCriteria,
    SelectorCriteriaMatch,
    Message,
    MessageText,
    Json,
    NbtCompound,
    NbtCompoundEntry,
    NbtList,
    NbtArray,
    NbtValue,
    BlockState,
    BlockProperty,
    ItemStack,
}

impl NodeKind {
    /// Returns the direct parent kind, `None` for the base `Node` kind.
    pub fn parent(&self) -> Option<NodeKind> {
        match self {
            NodeKind::Node => None,
            NodeKind::Bool
            | NodeKind::Number
            | NodeKind::Word
            | NodeKind::String
            | NodeKind::Greedy
            | NodeKind::Time => Some(NodeKind::Value),
            NodeKind::Vector2 | NodeKind::Vector3 => Some(NodeKind::Vector),
            NodeKind::NbtCompound | NodeKind::NbtList | NodeKind::NbtArray | NodeKind::NbtValue => {
                Some(NodeKind::Nbt)
            }
            _ => Some(NodeKind::Node),
        }
    }

    /// Walks the hierarchy from this kind up to `Node`, most derived first.
    pub fn ancestors(self) -> impl Iterator<Item = NodeKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            NodeKind::Node | NodeKind::Value | NodeKind::Vector | NodeKind::Nbt
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ast{self:?}")
    }
}
