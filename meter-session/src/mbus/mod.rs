//! M-Bus long frame pair handling

pub mod frame;
pub mod reader;

pub use frame::{FrameLayout, RawFrame, FRAME_END, FRAME_START, DEFAULT_FRAME_LENGTH};
pub use reader::FrameReader;
