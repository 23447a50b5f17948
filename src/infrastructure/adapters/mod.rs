//! 适配器实现

pub mod decode;
pub mod fetch;

pub use decode::{FakePcmDecoder, SymphoniaDecoder};
pub use fetch::{FakeAudioFetcher, HttpAudioFetcher, HttpAudioFetcherConfig};
