//! Symphonia Decoder - 基于 Symphonia 的音频解码
//!
//! 对内存中的编码字节做容器探测，逐包解码，
//! 拷贝为交错 f32 PCM。解码是 CPU 密集操作，
//! 放到 blocking 线程池执行，不占用异步线程

use async_trait::async_trait;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioDecoderPort, DecodeError};
use crate::domain::audio::AudioBuffer;

/// Symphonia 解码器
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioDecoderPort for SymphoniaDecoder {
    async fn decode(&self, bytes: Vec<u8>) -> Result<AudioBuffer, DecodeError> {
        tokio::task::spawn_blocking(move || decode_bytes(bytes))
            .await
            .map_err(|e| DecodeError::DecodeFailed(format!("decoder task failed: {}", e)))?
    }
}

/// 同步解码整段字节
fn decode_bytes(bytes: Vec<u8>) -> Result<AudioBuffer, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut channels: u16 = 0;
    let mut sample_rate: u32 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(DecodeError::DecodeFailed(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let needed = decoded.capacity() * spec.channels.count();
                let recreate = sample_buf
                    .as_ref()
                    .map(|buf| buf.capacity() < needed)
                    .unwrap_or(true);
                if recreate {
                    sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
                }

                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // 跳过单个损坏的包，继续解码
                tracing::debug!(error = %e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(DecodeError::DecodeFailed(e.to_string())),
        }
    }

    if samples.is_empty() || channels == 0 || sample_rate == 0 {
        return Err(DecodeError::Empty);
    }

    Ok(AudioBuffer::new(samples, channels, sample_rate))
}
