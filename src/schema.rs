//! Canonical schema: column standardization and variable classification.
//!
//! Maps the column names of each source format into the canonical
//! vocabulary and assigns every canonical name the variable class that
//! decides how its gaps are filled.

use crate::constants::{
    METEOBLUE_LOCATION_PREFIX, METEOBLUE_QUALIFIERS, PRECIP_TOTAL_TOKENS, SNOW_AMOUNT_TOKENS,
    SNOW_RATE_TOKENS, SYNOPTIC_COLUMN_MAP, VARIABLE_CLASSES,
};
use crate::models::VariableClass;
use std::collections::HashSet;
use tracing::warn;

/// Standardize a Meteoblue column name.
///
/// `Moab Temperature [2 m elevation corrected]` becomes `Temperature_2m`,
/// `Moab Precipitation Total [sfc]` becomes `Precipitation_Total`.
pub fn standardize_meteoblue_name(name: &str) -> String {
    let mut standardized = name
        .strip_prefix(METEOBLUE_LOCATION_PREFIX)
        .unwrap_or(name)
        .to_string();

    if let Some((pattern, replacement)) = METEOBLUE_QUALIFIERS
        .iter()
        .find(|(pattern, _)| standardized.contains(pattern.trim_start()))
    {
        standardized = standardized.replace(pattern, replacement);
    }

    if let Some(bracket) = standardized.find('[') {
        standardized = standardized[..bracket].trim().to_string();
    }

    standardized.replace(' ', "_")
}

/// Canonical name for a Synoptic column, if it is one we rename
pub fn standardize_synoptic_name(name: &str) -> Option<&'static str> {
    SYNOPTIC_COLUMN_MAP
        .iter()
        .find(|(source, _)| *source == name)
        .map(|(_, canonical)| *canonical)
}

/// Variable class of a canonical column name
pub fn classify(name: &str) -> VariableClass {
    VARIABLE_CLASSES
        .iter()
        .find(|(_, members)| members.contains(&name))
        .map(|(class, _)| *class)
        .unwrap_or(VariableClass::Unclassified)
}

/// Whether a canonical name is a measured variable and must be numeric.
///
/// Covers every classified name, every Synoptic rename target and the
/// precipitation and snowfall columns the derived fields read.
pub fn is_numeric_variable(name: &str) -> bool {
    let has = |tokens: (&str, &str)| name.contains(tokens.0) && name.contains(tokens.1);

    classify(name) != VariableClass::Unclassified
        || SYNOPTIC_COLUMN_MAP
            .iter()
            .any(|(_, canonical)| *canonical == name)
        || has(PRECIP_TOTAL_TOKENS)
        || has(SNOW_RATE_TOKENS)
        || has(SNOW_AMOUNT_TOKENS)
}

/// Last column whose name contains both tokens
pub fn find_column<'a, I>(names: I, tokens: (&str, &str)) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| name.contains(tokens.0) && name.contains(tokens.1))
        .last()
        .map(str::to_string)
}

/// Make standardized names unique, suffixing repeats with `_dup{n}`
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut n = 1;
            let mut candidate = format!("{}_dup{}", name, n);
            while !seen.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{}_dup{}", name, n);
            }
            warn!(
                "Column '{}' appears more than once after standardization; renamed to '{}'",
                name, candidate
            );
            candidate
        })
        .collect()
}
