pub mod detector;
pub mod fetcher;
pub mod sources;

pub use detector::AtsDetector;
pub use fetcher::ReqwestFetcher;
pub use sources::{PRESETS, Preset, Source};
