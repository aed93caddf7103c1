//! Pipeline tests for the processor module
//!
//! Runs small Meteoblue and Synoptic exports through the full pipeline.


use std::fs;
use std::path::{Path, PathBuf};

/// Meteoblue export: 4 hourly rows with a snowfall amount in cm and one
/// missing temperature
pub const METEOBLUE_EXPORT: &str = "\
location,Moab,Moab,Moab
lat,38.57,38.57,38.57
lon,-109.55,-109.55,-109.55
asl,1232.0,1232.0,1232.0
variable,Precipitation Total,Snowfall Amount,Temperature
unit,mm,cm,°C
level,sfc,sfc,2 m elevation corrected
resolution,hourly,hourly,hourly
aggregation,Summation,Summation,None
timestamp,Moab Precipitation Total [sfc],Moab Snowfall Amount [sfc],Moab Temperature [2 m elevation corrected]
20200101T0000,0.0,0.0,-3.0
20200101T0100,2.0,1.0,
20200101T0200,0.0,0.0,-1.0
20200101T0300,1.0,0.0,0.5
";

/// Synoptic export: 10-minute rows with a snowfall rate in mm/h and one
/// unparsable timestamp
pub const SYNOPTIC_EXPORT: &str = "\
# STATION: MOAB1
# STATION NAME: Moab Canyonlands Field
# LATITUDE: 38.58
# LONGITUDE: -109.54
# ELEVATION [ft]: 4557
# STATE: UT
Station_ID,Date_Time,air_temp_set_1,wind_direction_set_1,precip_accum_ten_minute_set_1,estimated_snowfall_rate_set_1
,,Celsius,Degrees,Millimeters,Millimeters/hour
MOAB1,2020-01-01T00:00:00Z,-2.0,180,1.5,6.0
MOAB1,2020-01-01T00:10:00Z,-2.5,,0.0,0.0
MOAB1,not a timestamp,-2.5,200,0.3,0.0
MOAB1,2020-01-01T00:20:00Z,,190,0.2,
MOAB1,2020-01-01T00:30:00Z,-3.0,,,0.0
";

pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
