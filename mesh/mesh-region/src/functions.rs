//! User selection functions.
//!
//! `vertices by <name>` and `cells by <name>` call a function registered here
//! with the vertex coordinates or the cell centroids, respectively. The
//! function returns the selected indices: vertex indices for the first form,
//! global cell indices for the second.

use std::fmt;

use hashbrown::HashMap;
use mesh_types::MeshTopology;
use nalgebra::Point3;

use crate::error::{RegionError, RegionResult};

/// Signature of a selection function.
pub type SelectFn = dyn Fn(&[Point3<f64>], &dyn MeshTopology) -> Vec<u32> + Send + Sync;

/// Named selection functions.
///
/// # Example
///
/// ```
/// use mesh_region::Functions;
///
/// let mut functions = Functions::new();
/// functions.register("left", |coors, _mesh| {
///     (0u32..).zip(coors).filter(|(_, p)| p.x < 0.5).map(|(i, _)| i).collect()
/// });
/// assert!(functions.contains("left"));
/// assert!(functions.get("right").is_err());
/// ```
#[derive(Default)]
pub struct Functions {
    functions: HashMap<String, Box<SelectFn>>,
}

impl Functions {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing one of the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Point3<f64>], &dyn MeshTopology) -> Vec<u32> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(function));
    }

    /// Builder form of [`Functions::register`].
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Point3<f64>], &dyn MeshTopology) -> Vec<u32> + Send + Sync + 'static,
    {
        self.register(name, function);
        self
    }

    /// Look up a function.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UndefinedFunction`] if no function has this name.
    pub fn get(&self, name: &str) -> RegionResult<&SelectFn> {
        self.functions
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| RegionError::UndefinedFunction {
                name: name.to_string(),
            })
    }

    /// Check if a function is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_types::unit_square;

    #[test]
    fn test_register_and_call() {
        let functions = Functions::new().with("first", |_coors, _mesh| vec![0]);
        let mesh = unit_square(1, 1);

        let f = functions.get("first").unwrap();
        assert_eq!(f(mesh.coors(), &mesh), vec![0]);
        assert_eq!(functions.len(), 1);
    }

    #[test]
    fn test_undefined_function() {
        let functions = Functions::new();
        assert!(functions.is_empty());
        assert!(matches!(
            functions.get("missing"),
            Err(RegionError::UndefinedFunction { .. })
        ));
    }

    #[test]
    fn test_debug_lists_names() {
        let functions = Functions::new()
            .with("b", |_, _| Vec::new())
            .with("a", |_, _| Vec::new());
        assert_eq!(format!("{functions:?}"), r#"Functions { names: ["a", "b"] }"#);
    }
}
