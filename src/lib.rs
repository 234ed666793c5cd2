//! platypus-analytics - Converts Platypus vehicle telemetry logs for search indexing
//!
//! This library turns the vehicle server's tab-separated `millis / level / JSON`
//! logs into flattened, timestamped, geo-tagged line-delimited JSON records.
//!
//! ## Module Structure
//!
//! - [`parsers`] - Log line parsing and the streaming record transform
//! - [`sensors`] - Sensor type dispatch table (labels, arity, field names)
//! - [`coords`] - UTM zone parsing and UTM to latitude/longitude conversion
//! - [`filename`] - Start date extraction from log file names
//! - [`convert`] - File-level conversion, gzip input, batch runs
//! - [`settings`] - Conversion settings persistence

pub mod convert;
pub mod coords;
pub mod filename;
pub mod parsers;
pub mod sensors;
pub mod settings;
