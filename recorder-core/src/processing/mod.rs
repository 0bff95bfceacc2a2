pub mod level_meter;
pub mod pcm;
pub mod ring_buffer;
pub mod waveform_feed;
