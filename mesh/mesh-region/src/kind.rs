//! Entity kinds and set operators.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of mesh entity a region is made of.
///
/// # Example
///
/// ```
/// use mesh_region::EntityKind;
///
/// assert_eq!("facet".parse::<EntityKind>().ok(), Some(EntityKind::Facet));
/// assert_eq!(EntityKind::from_code('c'), Some(EntityKind::Cell));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntityKind {
    /// Mesh vertices.
    Vertex,
    /// Cell edges.
    Edge,
    /// Cell faces (3D only).
    Face,
    /// Codimension-1 entities: edges in 2D, faces in 3D.
    Facet,
    /// Cells.
    #[default]
    Cell,
}

impl EntityKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 5] = [Self::Vertex, Self::Edge, Self::Face, Self::Facet, Self::Cell];

    /// Kind for a one-letter operator suffix (`v`, `e`, `f`, `s`, `c`).
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'v' => Some(Self::Vertex),
            'e' => Some(Self::Edge),
            'f' => Some(Self::Face),
            's' => Some(Self::Facet),
            'c' => Some(Self::Cell),
            _ => None,
        }
    }

    /// One-letter operator suffix of the kind.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Vertex => 'v',
            Self::Edge => 'e',
            Self::Face => 'f',
            Self::Facet => 's',
            Self::Cell => 'c',
        }
    }

    /// Lower-case name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
            Self::Face => "face",
            Self::Facet => "facet",
            Self::Cell => "cell",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown entity kind '{s}'"))
    }
}

/// A binary set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// Difference, left minus right.
    Subtract,
    /// Union.
    Add,
    /// Intersection.
    Intersect,
}

impl SetOp {
    /// Operation for a `+`, `-` or `*` sign.
    #[must_use]
    pub const fn from_sign(sign: char) -> Option<Self> {
        match sign {
            '-' => Some(Self::Subtract),
            '+' => Some(Self::Add),
            '*' => Some(Self::Intersect),
            _ => None,
        }
    }

    /// The sign of the operation.
    #[must_use]
    pub const fn sign(self) -> char {
        match self {
            Self::Subtract => '-',
            Self::Add => '+',
            Self::Intersect => '*',
        }
    }
}

/// A set operation applied to one entity kind, e.g. `+v` or `*c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetOperator {
    /// The set operation.
    pub op: SetOp,
    /// Entity kind the operation is applied to.
    pub target: EntityKind,
}

impl SetOperator {
    /// Create an operator.
    #[must_use]
    pub const fn new(op: SetOp, target: EntityKind) -> Self {
        Self { op, target }
    }

    /// Parse the textual form: a sign with an optional kind suffix.
    ///
    /// A bare sign targets vertices. Returns `None` for anything else.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_region::{EntityKind, SetOp, SetOperator};
    ///
    /// let op = SetOperator::parse("*c").unwrap();
    /// assert_eq!(op, SetOperator::new(SetOp::Intersect, EntityKind::Cell));
    /// assert_eq!(SetOperator::parse("-").unwrap().target, EntityKind::Vertex);
    /// assert!(SetOperator::parse("+x").is_none());
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        let op = SetOp::from_sign(chars.next()?)?;
        let target = match chars.next() {
            None => EntityKind::Vertex,
            Some(code) => EntityKind::from_code(code)?,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self { op, target })
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.sign(), self.target.code())
    }
}
