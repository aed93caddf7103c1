//! Application constants for the precipitation processor
//!
//! Detection heuristics, column standardization tables, variable class
//! membership and default values used throughout the pipeline.

use crate::models::VariableClass;

// =============================================================================
// Format Detection
// =============================================================================

/// Number of physical lines read for format detection
pub const DETECTION_LINE_COUNT: usize = 15;

/// Number of leading lines searched for Synoptic station markers
pub const SYNOPTIC_MARKER_LINE_COUNT: usize = 10;

/// Literal marker written by Synoptic exports (case-sensitive)
pub const SYNOPTIC_STATION_MARKER: &str = "STATION:";

/// Vendor token searched case-insensitively
pub const SYNOPTIC_VENDOR_TOKEN: &str = "synoptic";

/// Token searched case-insensitively above a Meteoblue header row
pub const METEOBLUE_LOCATION_TOKEN: &str = "moab";

/// Header row used when no rule matches (legacy Meteoblue layout)
pub const FALLBACK_HEADER_ROW: usize = 9;

// =============================================================================
// Timestamps
// =============================================================================

/// Canonical timestamp column
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Synoptic timestamp column
pub const SYNOPTIC_TIME_COLUMN: &str = "Date_Time";

/// Meteoblue timestamp pattern, e.g. `20200101T0000`
pub const METEOBLUE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M";

/// Synoptic timestamp pattern, e.g. `2020-09-30T02:40:00-0600`
pub const SYNOPTIC_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Granularity assumed when fewer than two timestamps are available
pub const DEFAULT_GRANULARITY_MINUTES: f64 = 60.0;

// =============================================================================
// Column Standardization
// =============================================================================

/// Location prefix stripped from Meteoblue column names
pub const METEOBLUE_LOCATION_PREFIX: &str = "Moab ";

/// Bracketed Meteoblue qualifiers, tried in order; the first match wins
pub const METEOBLUE_QUALIFIERS: &[(&str, &str)] = &[
    (" [2 m elevation corrected]", "_2m"),
    (" [850 mb]", "_850mb"),
    (" [700 mb]", "_700mb"),
    (" [10 m]", "_10m"),
    (" [2 m]", "_2m"),
    (" [sfc]", ""),
    (" [MSL]", ""),
];

/// Synoptic column renames into the canonical schema
pub const SYNOPTIC_COLUMN_MAP: &[(&str, &str)] = &[
    ("air_temp_set_1", "Temperature_2m"),
    ("relative_humidity_set_1", "Relative_Humidity_2m"),
    ("wind_speed_set_1", "Wind_Speed_10m"),
    ("wind_direction_set_1", "Wind_Direction_10m"),
    ("wind_gust_set_1", "Wind_Gust"),
    ("snow_depth_set_1", "Snow_Depth"),
    ("precip_accum_ten_minute_set_1", "Precipitation_Total"),
    ("estimated_snowfall_rate_set_1", "Snowfall_Rate"),
];

/// Name fragments identifying the total precipitation column
pub const PRECIP_TOTAL_TOKENS: (&str, &str) = ("Precipitation", "Total");

/// Name fragments identifying a snowfall rate column (mm/hour)
pub const SNOW_RATE_TOKENS: (&str, &str) = ("Snowfall", "Rate");

/// Name fragments identifying a snowfall amount column
pub const SNOW_AMOUNT_TOKENS: (&str, &str) = ("Snowfall", "Amount");

/// Meteoblue reports snowfall amounts in centimetres
pub const CM_TO_MM: f64 = 10.0;

// =============================================================================
// Variable Classes
// =============================================================================

/// Canonical name membership for each variable class
pub const VARIABLE_CLASSES: &[(VariableClass, &[&str])] = &[
    (
        VariableClass::Accumulation,
        &["Precipitation_Total", "Snowfall_Amount", "Snow_Depth"],
    ),
    (
        VariableClass::Temperature,
        &["Temperature_2m", "Temperature_850mb", "Temperature_700mb"],
    ),
    (
        VariableClass::WindSpeed,
        &[
            "Wind_Speed_10m",
            "Wind_Speed_850mb",
            "Wind_Speed_700mb",
            "Wind_Gust",
        ],
    ),
    (
        VariableClass::WindDirection,
        &[
            "Wind_Direction_10m",
            "Wind_Direction_850mb",
            "Wind_Direction_700mb",
        ],
    ),
    (VariableClass::Humidity, &["Relative_Humidity_2m"]),
    (
        VariableClass::PressureHeight,
        &[
            "Mean_Sea_Level_Pressure",
            "Geopotential_Height_850mb",
            "Geopotential_Height_700mb",
            "PBL_Height",
        ],
    ),
    (
        VariableClass::Cloud,
        &[
            "Cloud_Cover_Total",
            "Cloud_Cover_High",
            "Cloud_Cover_Medium",
            "Cloud_Cover_Low",
        ],
    ),
    (VariableClass::Radiation, &["Shortwave_Radiation", "CAPE"]),
];

/// Maximum run of consecutive missing samples filled by interpolation or forward fill
pub const DEFAULT_INTERPOLATION_LIMIT: usize = 6;

// =============================================================================
// Derived Fields
// =============================================================================

pub mod derived_columns {
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const DAY: &str = "Day";
    pub const SEASON: &str = "Season";
    pub const WARM_COLD: &str = "WarmCold";
    pub const SEASON_YEAR: &str = "SeasonYear";
    pub const RAIN: &str = "Rain_mm";
    pub const SNOW: &str = "Snow_mm";
    pub const RESIDUAL: &str = "Precip_Residual_mm";
}

/// Months (1-12) labelled as the warm half-year
pub const WARM_MONTHS: &[u32] = &[4, 5, 6, 7, 8, 9, 10];

pub const WARM_LABEL: &str = "Warm";
pub const COLD_LABEL: &str = "Cold";

// =============================================================================
// Processing Defaults
// =============================================================================

/// Largest `n * m` for which the exact two-sample KS distribution is computed
pub const KS_EXACT_MAX_CELLS: usize = 1_000_000;

/// Largest per-sample size for the exact Mann-Whitney U distribution
pub const MANNWHITNEY_EXACT_MAX_N: usize = 8;

/// File extension picked up when walking input directories
pub const CSV_EXTENSION: &str = "csv";
