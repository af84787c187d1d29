pub mod channel;
pub mod distance;
pub mod event;
pub mod inventory;
pub mod waveform;

pub use channel::{
    Catalog, ChannelId, ChannelMetadata, ResponseDescriptor, Root, StationKey, TransferFunction,
};
pub use distance::DistanceModel;
pub use event::{duration_from_secs, EarthquakeInfo, TimeWindow, TimeWindows};
pub use inventory::Inventory;
pub use waveform::{Trace, WaveformBuffer};
