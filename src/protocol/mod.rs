pub mod format;
pub mod tracks;

pub use tracks::{SourceId, StreamLocator, StreamProtocol, TrackRecord};
