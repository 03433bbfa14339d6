//! AST module for mecha
//!
//! This module provides the core Abstract Syntax Tree types for representing
//! parsed commands with source location tracking.
//!
//! Nodes are immutable. A node is a `Spanned<Arc<Ast>>`: the span lives
//! outside the shared payload, structural equality ignores it, and rewriting
//! passes share every subtree they do not touch.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod builder;
pub mod kind;

pub use kind::NodeKind;

// ============================================================================
// SOURCE LOCATIONS
// ============================================================================

/// A position in the source text.
///
/// `pos` is a byte offset, `lineno` and `colno` are 1-based. The default
/// location (all zeros) marks synthesized nodes that have no source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    pub pos: usize,
    pub lineno: usize,
    pub colno: usize,
}

impl SourceLocation {
    pub fn new(pos: usize, lineno: usize, colno: usize) -> Self {
        Self { pos, lineno, colno }
    }

    /// Returns true if this location points into real source text.
    pub fn is_known(&self) -> bool {
        self.lineno > 0
    }
}

/// Represents a span in the source code.
///
/// # Examples
///
/// ```rust
/// use mecha::ast::{SourceLocation, Span};
/// let span = Span::new(SourceLocation::new(0, 1, 1), SourceLocation::new(3, 1, 4));
/// assert_eq!(span.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.pos.saturating_sub(self.start.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wrapper for carrying source span information with any value.
///
/// Equality only looks at the value: two trees parsed from differently
/// formatted text compare equal if they have the same structure.
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Canonical AST node type with shared ownership.
pub type AstNode = Spanned<Arc<Ast>>;

// ============================================================================
// VALUE TYPES
// ============================================================================

/// A numeric literal, keeping track of whether it was written as an integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Float(n) => *n,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            // Display for f64 never uses exponent notation, which the game rejects.
            // A whole float keeps its `.0`: `1.0` and `1` are different positions.
            Number::Float(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{n:.1}"),
            Number::Float(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateKind {
    Absolute,
    Relative,
    Local,
}

impl CoordinateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateKind::Absolute => "absolute",
            CoordinateKind::Relative => "relative",
            CoordinateKind::Local => "local",
        }
    }
}

/// A namespaced identifier such as `minecraft:stone` or `#demo:tag`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocation {
    pub is_tag: bool,
    pub namespace: Option<String>,
    pub path: String,
}

impl ResourceLocation {
    /// Returns the `namespace:path` form, defaulting the namespace to `minecraft`.
    pub fn full_name(&self) -> String {
        let namespace = self.namespace.as_deref().unwrap_or("minecraft");
        format!("{}:{}", namespace, self.path)
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tag {
            write!(f, "#")?;
        }
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}:")?;
        }
        write!(f, "{}", self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NbtArrayKind {
    Byte,
    Int,
    Long,
}

impl NbtArrayKind {
    pub fn prefix(&self) -> char {
        match self {
            NbtArrayKind::Byte => 'B',
            NbtArrayKind::Int => 'I',
            NbtArrayKind::Long => 'L',
        }
    }
}

/// Scalar SNBT values.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtScalar {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// The closed set of node kinds.
///
/// Child fields hold `AstNode`s; everything else is plain data that takes
/// part in structural equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Root {
        commands: Vec<AstNode>,
    },
    Command {
        identifier: String,
        arguments: Vec<AstNode>,
    },
    Comment(String),

    Bool(bool),
    Number(Number),
    Word(String),
    String(String),
    Greedy(String),
    Time {
        value: Number,
        unit: Option<char>,
    },
    ResourceLocation(ResourceLocation),

    Coordinate {
        kind: CoordinateKind,
        value: Number,
    },
    Vector2 {
        x: AstNode,
        y: AstNode,
    },
    Vector3 {
        x: AstNode,
        y: AstNode,
        z: AstNode,
    },
    Range {
        min: Option<Number>,
        max: Option<Number>,
    },

    Selector {
        variable: String,
        arguments: Vec<AstNode>,
    },
    SelectorArgument {
        inverted: bool,
        key: String,
        value: Option<AstNode>,
    },
    SelectorScores {
        scores: Vec<AstNode>,
    },
    SelectorScoreMatch {
        key: String,
        value: AstNode,
    },
    SelectorAdvancements {
        advancements: Vec<AstNode>,
    },
    SelectorAdvancementMatch {
        key: AstNode,
        value: AstNode,
    },
    SelectorCriteria {
        criteria: Vec<AstNode>,
    },
    SelectorCriteriaMatch {
        key: String,
        value: bool,
    },

    Message {
        fragments: Vec<AstNode>,
    },
    MessageText(String),
    Json(serde_json::Value),

    NbtCompound {
        entries: Vec<AstNode>,
    },
    NbtCompoundEntry {
        key: String,
        value: AstNode,
    },
    NbtList {
        elements: Vec<AstNode>,
    },
    NbtArray {
        kind: NbtArrayKind,
        elements: Vec<AstNode>,
    },
    NbtValue(NbtScalar),

    BlockState {
        identifier: AstNode,
        properties: Vec<AstNode>,
        data_tags: Option<AstNode>,
    },
    BlockProperty {
        key: String,
        value: String,
    },
    ItemStack {
        identifier: AstNode,
        data_tags: Option<AstNode>,
    },
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Ast {
    /// Returns the kind tag used by the dispatch engine.
    pub fn kind(&self) -> NodeKind {
        match self {
            Ast::Root { .. } => NodeKind::Root,
            Ast::Command { .. } => NodeKind::Command,
            Ast::Comment(_) => NodeKind::Comment,
            Ast::Bool(_) => NodeKind::Bool,
            Ast::Number(_) => NodeKind::Number,
            Ast::Word(_) => NodeKind::Word,
            Ast::String(_) => NodeKind::String,
            Ast::Greedy(_) => NodeKind::Greedy,
            Ast::Time { .. } => NodeKind::Time,
            Ast::ResourceLocation(_) => NodeKind::ResourceLocation,
            Ast::Coordinate { .. } => NodeKind::Coordinate,
            Ast::Vector2 { .. } => NodeKind::Vector2,
            Ast::Vector3 { .. } => NodeKind::Vector3,
            Ast::Range { .. } => NodeKind::Range,
            Ast::Selector { .. } => NodeKind::Selector,
            Ast::SelectorArgument { .. } => NodeKind::SelectorArgument,
            Ast::SelectorScores { .. } => NodeKind::SelectorScores,
            Ast::SelectorScoreMatch { .. } => NodeKind::SelectorScoreMatch,
            Ast::SelectorAdvancements { .. } => NodeKind::SelectorAdvancements,
            Ast::SelectorAdvancementMatch { .. } => NodeKind::SelectorAdvancementMatch,
            Ast::SelectorCriteria { .. } => NodeKind::SelectorCriteria,
            Ast::SelectorCriteriaMatch { .. } => NodeKind::SelectorCriteriaMatch,
            Ast::Message { .. } => NodeKind::Message,
            Ast::MessageText(_) => NodeKind::MessageText,
            Ast::Json(_) => NodeKind::Json,
            Ast::NbtCompound { .. } => NodeKind::NbtCompound,
            Ast::NbtCompoundEntry { .. } => NodeKind::NbtCompoundEntry,
            Ast::NbtList { .. } => NodeKind::NbtList,
            Ast::NbtArray { .. } => NodeKind::NbtArray,
            Ast::NbtValue(_) => NodeKind::NbtValue,
            Ast::BlockState { .. } => NodeKind::BlockState,
            Ast::BlockProperty { .. } => NodeKind::BlockProperty,
            Ast::ItemStack { .. } => NodeKind::ItemStack,
        }
    }

    /// Enumerates the child nodes in field order.
    ///
    /// This is the only place that knows which fields hold children; every
    /// generic traversal goes through it together with [`Ast::with_children`].
    pub fn children(&self) -> Vec<&AstNode> {
        match self {
            Ast::Root { commands } => commands.iter().collect(),
            Ast::Command { arguments, .. } => arguments.iter().collect(),
            Ast::Vector2 { x, y } => vec![x, y],
            Ast::Vector3 { x, y, z } => vec![x, y, z],
            Ast::Selector { arguments, .. } => arguments.iter().collect(),
            Ast::SelectorArgument { value, .. } => value.iter().collect(),
            Ast::SelectorScores { scores } => scores.iter().collect(),
            Ast::SelectorScoreMatch { value, .. } => vec![value],
            Ast::SelectorAdvancements { advancements } => advancements.iter().collect(),
            Ast::SelectorAdvancementMatch { key, value } => vec![key, value],
            Ast::SelectorCriteria { criteria } => criteria.iter().collect(),
            Ast::Message { fragments } => fragments.iter().collect(),
            Ast::NbtCompound { entries } => entries.iter().collect(),
            Ast::NbtCompoundEntry { value, .. } => vec![value],
            Ast::NbtList { elements } | Ast::NbtArray { elements, .. } => {
                elements.iter().collect()
            }
            Ast::BlockState {
                identifier,
                properties,
                data_tags,
            } => std::iter::once(identifier)
                .chain(properties.iter())
                .chain(data_tags.iter())
                .collect(),
            Ast::ItemStack {
                identifier,
                data_tags,
            } => std::iter::once(identifier).chain(data_tags.iter()).collect(),
            _ => Vec::new(),
        }
    }

    /// Rebuilds this node with new children, given in the order produced by
    /// [`Ast::children`].
    ///
    /// # Panics
    ///
    /// Panics if fewer children are given than the node has.
    pub fn with_children(&self, children: Vec<AstNode>) -> Ast {
        let mut children = children.into_iter();
        let mut next = || children.next().expect("child count must match Ast::children");
        match self {
            Ast::Root { commands } => Ast::Root {
                commands: commands.iter().map(|_| next()).collect(),
            },
            Ast::Command { identifier, arguments } => Ast::Command {
                identifier: identifier.clone(),
                arguments: arguments.iter().map(|_| next()).collect(),
            },
            Ast::Vector2 { .. } => Ast::Vector2 { x: next(), y: next() },
            Ast::Vector3 { .. } => Ast::Vector3 {
                x: next(),
                y: next(),
                z: next(),
            },
            Ast::Selector { variable, arguments } => Ast::Selector {
                variable: variable.clone(),
                arguments: arguments.iter().map(|_| next()).collect(),
            },
            Ast::SelectorArgument { inverted, key, value } => Ast::SelectorArgument {
                inverted: *inverted,
                key: key.clone(),
                value: value.as_ref().map(|_| next()),
            },
            Ast::SelectorScores { scores } => Ast::SelectorScores {
                scores: scores.iter().map(|_| next()).collect(),
            },
            Ast::SelectorScoreMatch { key, .. } => Ast::SelectorScoreMatch {
                key: key.clone(),
                value: next(),
            },
            Ast::SelectorAdvancements { advancements } => Ast::SelectorAdvancements {
                advancements: advancements.iter().map(|_| next()).collect(),
            },
            Ast::SelectorAdvancementMatch { .. } => Ast::SelectorAdvancementMatch {
                key: next(),
                value: next(),
            },
            Ast::SelectorCriteria { criteria } => Ast::SelectorCriteria {
                criteria: criteria.iter().map(|_| next()).collect(),
            },
            Ast::Message { fragments } => Ast::Message {
                fragments: fragments.iter().map(|_| next()).collect(),
            },
            Ast::NbtCompound { entries } => Ast::NbtCompound {
                entries: entries.iter().map(|_| next()).collect(),
            },
            Ast::NbtCompoundEntry { key, .. } => Ast::NbtCompoundEntry {
                key: key.clone(),
                value: next(),
            },
            Ast::NbtList { elements } => Ast::NbtList {
                elements: elements.iter().map(|_| next()).collect(),
            },
            Ast::NbtArray { kind, elements } => Ast::NbtArray {
                kind: *kind,
                elements: elements.iter().map(|_| next()).collect(),
            },
            Ast::BlockState {
                properties,
                data_tags,
                ..
            } => Ast::BlockState {
                identifier: next(),
                properties: properties.iter().map(|_| next()).collect(),
                data_tags: data_tags.as_ref().map(|_| next()),
            },
            Ast::ItemStack { data_tags, .. } => Ast::ItemStack {
                identifier: next(),
                data_tags: data_tags.as_ref().map(|_| next()),
            },
            leaf => leaf.clone(),
        }
    }

    /// Returns the textual value of a named data field, used by rule predicates.
    pub fn field(&self, name: &str) -> Option<String> {
        match (self, name) {
            (Ast::Command { identifier, .. }, "identifier") => Some(identifier.clone()),
            (Ast::Selector { variable, .. }, "variable") => Some(variable.clone()),
            (Ast::SelectorArgument { key, .. }, "key")
            | (Ast::SelectorScoreMatch { key, .. }, "key")
            | (Ast::SelectorCriteriaMatch { key, .. }, "key")
            | (Ast::NbtCompoundEntry { key, .. }, "key")
            | (Ast::BlockProperty { key, .. }, "key") => Some(key.clone()),
            (Ast::SelectorArgument { inverted, .. }, "inverted") => Some(inverted.to_string()),
            (Ast::Coordinate { kind, .. }, "kind") => Some(kind.as_str().to_string()),
            (Ast::ResourceLocation(location), "namespace") => location.namespace.clone(),
            (Ast::ResourceLocation(location), "path") => Some(location.path.clone()),
            (Ast::ResourceLocation(location), "is_tag") => Some(location.is_tag.to_string()),
            (Ast::Comment(value), "value")
            | (Ast::Word(value), "value")
            | (Ast::String(value), "value")
            | (Ast::Greedy(value), "value")
            | (Ast::MessageText(value), "value") => Some(value.clone()),
            (Ast::Bool(value), "value") => Some(value.to_string()),
            (Ast::Number(value), "value") => Some(value.to_string()),
            _ => None,
        }
    }
}

impl Spanned<Arc<Ast>> {
    /// Wraps an `Ast` value into a new shared node.
    pub fn new(ast: Ast, span: Span) -> Self {
        Spanned {
            value: Arc::new(ast),
            span,
        }
    }

    /// Creates a node without source location.
    pub fn synthetic(ast: Ast) -> Self {
        Self::new(ast, Span::default())
    }

    pub fn ast(&self) -> &Ast {
        &self.value
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    pub fn location(&self) -> SourceLocation {
        self.span.start
    }

    pub fn end_location(&self) -> SourceLocation {
        self.span.end
    }

    /// Identity comparison: true if both handles share the same payload.
    pub fn ptr_eq(&self, other: &AstNode) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Returns the command identifier if this node is a command.
    pub fn identifier(&self) -> Option<&str> {
        match self.ast() {
            Ast::Command { identifier, .. } => Some(identifier),
            _ => None,
        }
    }

    /// Returns a copy of this node pointing at a different span.
    pub fn with_span(&self, span: Span) -> AstNode {
        Spanned {
            value: Arc::clone(&self.value),
            span,
        }
    }

    /// Visits this node and every descendant, parents first.
    pub fn walk(&self) -> Vec<&AstNode> {
        let mut nodes = vec![self];
        let mut index = 0;
        while index < nodes.len() {
            let children = nodes[index].ast().children();
            nodes.extend(children);
            index += 1;
        }
        nodes
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::builder::*;
    use super::*;

    #[test]
    fn whole_floats_print_with_decimal_point() {
        assert_eq!(Number::Float(1.0).to_string(), "1.0");
        assert_eq!(Number::Float(0.0).to_string(), "0.0");
        assert_eq!(Number::Float(-2.0).to_string(), "-2.0");
        assert_eq!(Number::Float(0.5).to_string(), "0.5");
        assert_eq!(Number::Float(1e21).to_string(), "1000000000000000000000.0");
        assert_eq!(Number::Int(1).to_string(), "1");
    }

    #[test]
    fn equality_ignores_location() {
        let a = word("hello").with_span(Span::new(
            SourceLocation::new(0, 1, 1),
            SourceLocation::new(5, 1, 6),
        ));
        let b = word("hello");
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn with_children_preserves_optional_fields() {
        let argument = AstNode::synthetic(Ast::SelectorArgument {
            inverted: true,
            key: "tag".into(),
            value: Some(word("a")),
        });
        let rebuilt = argument.ast().with_children(vec![word("b")]);
        assert_eq!(
            rebuilt,
            Ast::SelectorArgument {
                inverted: true,
                key: "tag".into(),
                value: Some(word("b")),
            }
        );
    }

    #[test]
    fn walk_visits_nested_nodes() {
        let node = command("say:message", vec![message(vec![message_text("hi")])]);
        let kinds: Vec<_> = node.walk().iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Command, NodeKind::Message, NodeKind::MessageText]
        );
    }

    #[test]
    fn field_exposes_predicate_values() {
        let node = command("say:message", vec![]);
        assert_eq!(node.ast().field("identifier").as_deref(), Some("say:message"));
        assert_eq!(node.ast().field("variable"), None);
    }
}
