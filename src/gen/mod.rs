pub mod melody;
pub mod tone;
pub mod waveform;

pub use self::melody::*;
pub use self::tone::*;
pub use self::waveform::*;
