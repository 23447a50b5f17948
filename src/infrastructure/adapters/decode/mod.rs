//! Decode 适配器

mod fake_decoder;
mod symphonia_decoder;

pub use fake_decoder::FakePcmDecoder;
pub use symphonia_decoder::SymphoniaDecoder;
