//! Request query parameters as dimensions.
//!
//! Drains are configured with a URL such as
//! `https://collector.example.com/?app_name=shop&team=payments`; every
//! parameter is attached to all series from that drain.

use crate::error::{DrainError, Result};
use crate::series::Dimensions;

/// Query parameter naming the reporting app. Required.
pub const APP_NAME_PARAM: &str = "app_name";

/// Build dimensions from decoded query pairs (in request order).
///
/// A parameter given several times is dimensionalized with its first value,
/// and only if that value is non-empty. `app_name` must appear exactly once
/// with a non-empty value.
pub fn dimensions_from_params(pairs: &[(String, String)]) -> Result<Dimensions> {
    let app_names: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == APP_NAME_PARAM)
        .map(|(_, v)| v.as_str())
        .collect();

    match app_names.as_slice() {
        [name] if !name.is_empty() => {}
        other => {
            return Err(DrainError::MissingParameter(format!(
                "{APP_NAME_PARAM} parameter takes exactly one value, got {other:?}"
            )));
        }
    }

    let mut dims = Dimensions::new();
    let mut seen: Vec<&str> = Vec::with_capacity(pairs.len());
    for (k, v) in pairs {
        if seen.contains(&k.as_str()) {
            continue;
        }
        seen.push(k);
        if !v.is_empty() {
            dims.insert(k.as_str(), v.as_str());
        }
    }
    Ok(dims)
}
