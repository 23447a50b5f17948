//! Fetch 适配器

mod fake_fetcher;
mod http_fetcher;

pub use fake_fetcher::FakeAudioFetcher;
pub use http_fetcher::{HttpAudioFetcher, HttpAudioFetcherConfig};
