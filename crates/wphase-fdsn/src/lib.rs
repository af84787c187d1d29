//! W-phase FDSN - Adapters for FDSN web services and formats
//!
//! StationXML inventories, the bulk dataselect service and the miniSEED
//! records it returns.

pub mod dataselect;
pub mod mseed;
pub mod stationxml;

pub use dataselect::{format_bulk_body, FdsnDataselectClient};
pub use mseed::decode_records;
pub use stationxml::{parse_station_xml, read_inventory};
