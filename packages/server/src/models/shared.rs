use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::error::AppError;

/// Largest number of IDs accepted by a single lookup.
pub const MAX_LOOKUP_IDS: usize = 500;

/// Validate an ordered ID list for reorder operations (no duplicates).
///
/// An empty list is valid: it is the order of a hunt with no clues.
pub fn validate_reorder_ids<T>(ids: &[T], name: &str) -> Result<(), AppError>
where
    T: Copy + Eq + Hash + Display,
{
    let mut seen = HashSet::new();
    for &id in ids {
        if !seen.insert(id) {
            return Err(AppError::Validation(format!(
                "Duplicate {name} {id} in reorder list"
            )));
        }
    }
    Ok(())
}

/// Validate an ID list for bulk reads (bounded length).
pub fn validate_bulk_ids<T>(ids: &[T], name: &str, max: usize) -> Result<(), AppError> {
    if ids.len() > max {
        return Err(AppError::Validation(format!("Too many {name}: max {max}")));
    }
    Ok(())
}
