//! Algebra configuration and blade name tables.

use versor_core::blade::for_bitmap;

/// Configuration for an [`Algebra`](crate::Algebra).
#[derive(Clone, Debug, PartialEq)]
pub struct AlgebraConfig {
    /// When set, results that operations mark as unit are checked against
    /// this tolerance whenever their norm folds to a plain number.
    pub verify_known_unit: Option<f64>,
    /// Floor negative squared norms at zero in `norm`. When false the
    /// absolute value is used instead.
    pub clamp_negative_norm: bool,
    /// Annotate the back end with the name of each operation.
    pub comments: bool,
}

impl Default for AlgebraConfig {
    fn default() -> Self {
        Self {
            verify_known_unit: None,
            clamp_negative_norm: true,
            comments: false,
        }
    }
}

impl AlgebraConfig {
    /// Enables verification of unit hints with the given tolerance.
    #[must_use]
    pub fn with_unit_verification(mut self, tolerance: f64) -> Self {
        self.verify_known_unit = Some(tolerance);
        self
    }

    /// Enables operation comments.
    #[must_use]
    pub fn with_comments(mut self) -> Self {
        self.comments = true;
        self
    }
}

/// Builds the `2^n` blade names from basis vector names.
///
/// The scalar is named `"1"`; other blades concatenate the names of their
/// basis vectors in ascending order, so `["x", "y", "z"]` yields
/// `1, x, y, xy, z, xz, yz, xyz`.
#[must_use]
pub fn blade_names<S: AsRef<str>>(basis: &[S]) -> Vec<String> {
    let count = 1usize << basis.len();
    (0..count)
        .map(|bm| {
            if bm == 0 {
                return "1".to_string();
            }
            let mut name = String::new();
            #[allow(clippy::cast_possible_truncation)]
            for_bitmap(bm as u32, |i| name.push_str(basis[i as usize].as_ref()));
            name
        })
        .collect()
}

/// Blade names for `e1..en`: `1, e1, e2, e12, e3, ...`.
#[must_use]
pub fn default_blade_names(n: usize) -> Vec<String> {
    let count = 1usize << n;
    (0..count)
        .map(|bm| {
            if bm == 0 {
                return "1".to_string();
            }
            let mut name = String::from("e");
            #[allow(clippy::cast_possible_truncation)]
            for_bitmap(bm as u32, |i| name.push_str(&(i + 1).to_string()));
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blade_names() {
        assert_eq!(
            blade_names(&["x", "y", "z"]),
            vec!["1", "x", "y", "xy", "z", "xz", "yz", "xyz"]
        );
    }

    #[test]
    fn test_default_blade_names() {
        assert_eq!(default_blade_names(2), vec!["1", "e1", "e2", "e12"]);
        assert_eq!(default_blade_names(0), vec!["1"]);
    }

    #[test]
    fn test_config_defaults() {
        let config = AlgebraConfig::default();
        assert!(config.clamp_negative_norm);
        assert_eq!(config.verify_known_unit, None);
        assert_eq!(config.with_unit_verification(1e-9).verify_known_unit, Some(1e-9));
    }
}
