// Pulse segmentation, timing classification and Morse decoding for lumorse.

pub mod calibration;
pub mod classifier;
pub mod decoder;
pub mod error;
pub mod segmenter;
pub mod session;
pub mod stream;

pub use decoder::{DecoderState, Flush, MorseDecoder};
pub use error::DecodeError;
pub use session::{Decoded, Session, SessionEvent, decode_ticks};
pub use stream::TickStream;
