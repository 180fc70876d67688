//! Error types for region selection.

use thiserror::Error;

use crate::kind::EntityKind;

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

/// Errors that can occur while parsing, resolving or evaluating regions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegionError {
    /// Malformed selection text.
    #[error("syntax error at position {position} near '{fragment}': {message} (in \"{text}\")")]
    Syntax {
        /// What the parser expected or found.
        message: String,
        /// The offending substring.
        fragment: String,
        /// Byte offset of the fragment in `text`.
        position: usize,
        /// The full selection text.
        text: String,
    },

    /// A region with this name already exists.
    #[error("region '{name}' already exists")]
    DuplicateRegion {
        /// The duplicate region name.
        name: String,
    },

    /// The specified region was not found.
    #[error("region '{name}' not found")]
    RegionNotFound {
        /// The missing region name.
        name: String,
    },

    /// Region definitions reference names that are neither pending nor materialized.
    #[error("undefined parent regions: {}", .references.join(", "))]
    UndefinedParents {
        /// Every dangling reference as `region -> missing`.
        references: Vec<String>,
    },

    /// Region definitions reference each other in a cycle.
    #[error("cyclic region dependency between: {}", .regions.join(", "))]
    DependencyCycle {
        /// Regions that could not be ordered.
        regions: Vec<String>,
    },

    /// The mesh declares no vertex set of this name.
    #[error("undefined vertex set '{name}'")]
    UndefinedVertexSet {
        /// The missing set name.
        name: String,
    },

    /// The mesh declares no cell set of this name.
    #[error("undefined cell set '{name}'")]
    UndefinedCellSet {
        /// The missing set name.
        name: String,
    },

    /// No user function is registered under this name.
    #[error("undefined function '{name}'")]
    UndefinedFunction {
        /// The missing function name.
        name: String,
    },

    /// No element group has this material id.
    #[error("no element group with material id {mat_id}")]
    UndefinedGroup {
        /// The requested material id.
        mat_id: i64,
    },

    /// A vertex index is outside the mesh.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidVertexIndex {
        /// The invalid index.
        index: i64,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A cell index is outside the mesh or its group.
    #[error("invalid cell index {index} (range has {cell_count} cells)")]
    InvalidCellIndex {
        /// The invalid index.
        index: i64,
        /// Number of cells in the addressed range.
        cell_count: usize,
    },

    /// An edge, face or facet index is outside its group's entity table.
    #[error("invalid {kind} index {index} in group {group} (group has {count})")]
    InvalidEntityIndex {
        /// Entity kind.
        kind: EntityKind,
        /// Group index.
        group: usize,
        /// The invalid index.
        index: u32,
        /// Number of entities of that kind in the group.
        count: usize,
    },

    /// A group index is outside the mesh.
    #[error("invalid group index {index} (mesh has {group_count} groups)")]
    InvalidGroupIndex {
        /// The invalid index.
        index: i64,
        /// Number of element groups in the mesh.
        group_count: usize,
    },

    /// A coordinate predicate could not be evaluated.
    #[error("cannot evaluate '{expression}': {reason}")]
    Predicate {
        /// Source text of the predicate.
        expression: String,
        /// What went wrong.
        reason: String,
    },

    /// The selection is valid but the domain cannot provide it.
    #[error("'{token}' is not supported: {reason}")]
    Unsupported {
        /// The offending token.
        token: String,
        /// Why the domain cannot provide it.
        reason: String,
    },

    /// A region has no entities of a kind an operation needs.
    #[error("region '{name}' has no {kind} data")]
    MissingEntities {
        /// Region name.
        name: String,
        /// The missing entity kind.
        kind: EntityKind,
    },

    /// The postfix stack did not reduce to exactly one region.
    #[error("malformed region expression: {remaining} items left on the stack")]
    MalformedExpression {
        /// Stack depth at the end of evaluation.
        remaining: usize,
    },

    /// An error raised while creating a named region.
    #[error("region '{name}': {source}")]
    InRegion {
        /// Name of the failing region.
        name: String,
        /// The underlying error.
        #[source]
        source: Box<RegionError>,
    },
}

impl RegionError {
    /// Attach the name of the region being created.
    #[must_use]
    pub fn in_region(self, name: impl Into<String>) -> Self {
        match self {
            Self::InRegion { .. } => self,
            other => Self::InRegion {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping region context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::InRegion { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_once() {
        let err = RegionError::RegionNotFound {
            name: "Gamma".to_string(),
        }
        .in_region("Omega")
        .in_region("Other");

        assert_eq!(err.to_string(), "region 'Omega': region 'Gamma' not found");
        assert!(matches!(err.root(), RegionError::RegionNotFound { .. }));
    }

    #[test]
    fn test_list_messages() {
        let err = RegionError::DependencyCycle {
            regions: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "cyclic region dependency between: A, B");
    }
}
