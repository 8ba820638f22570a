pub mod agent;
pub mod board;
pub mod codec;
pub mod column;
pub mod error;
pub mod keygen;
pub mod opponent;
pub mod puzzle;
pub mod round_timer;
pub mod serde_duration;
pub mod session;
pub mod settings;
pub mod vector_math;
