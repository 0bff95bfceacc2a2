use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::error::Verify;

use crate::models::config::AudioFormat;
use crate::models::error::RecorderError;

/// Capability interface for compressed-bitstream encoders.
///
/// The exporter feeds PCM in capture order through `accept` and calls
/// `finish` exactly once. `finish` flushes the codec's internal state
/// (lookahead, padding, stream trailers) and yields the complete
/// bitstream, so the exporter stays agnostic to the concrete codec.
pub trait BitstreamEncoder {
    fn accept(&mut self, samples: &[i16]) -> Result<(), RecorderError>;

    fn finish(&mut self) -> Result<Vec<u8>, RecorderError>;
}

/// FLAC encoder backed by `flacenc`.
///
/// Accepted samples are buffered and encoded in one pass at `finish`; the
/// exporter always hands over a frozen, fully-known recording, so there is
/// nothing to gain from incremental framing here.
pub struct FlacBitstream {
    format: AudioFormat,
    buffered: Vec<i32>,
    finished: bool,
}

impl FlacBitstream {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            buffered: Vec::new(),
            finished: false,
        }
    }
}

impl BitstreamEncoder for FlacBitstream {
    fn accept(&mut self, samples: &[i16]) -> Result<(), RecorderError> {
        if self.finished {
            return Err(RecorderError::EncodingFailed(
                "encoder already finished".into(),
            ));
        }
        self.buffered.extend(samples.iter().map(|&s| i32::from(s)));
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>, RecorderError> {
        if self.finished {
            return Err(RecorderError::EncodingFailed(
                "encoder already finished".into(),
            ));
        }
        self.finished = true;

        let config = flacenc::config::Encoder::default()
            .into_verified()
            .map_err(|(_, err)| {
                RecorderError::EncodingFailed(format!("flac configuration: {err:?}"))
            })?;
        let source = flacenc::source::MemSource::from_samples(
            &self.buffered,
            self.format.channels as usize,
            self.format.bit_depth as usize,
            self.format.sample_rate as usize,
        );
        let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
            .map_err(|err| RecorderError::EncodingFailed(format!("flac encode: {err:?}")))?;

        let mut sink = ByteSink::new();
        stream
            .write(&mut sink)
            .map_err(|err| RecorderError::EncodingFailed(format!("flac serialize: {err:?}")))?;
        Ok(sink.as_slice().to_vec())
    }
}
