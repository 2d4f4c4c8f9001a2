pub mod collector;
pub mod lifecycle;
pub mod percentiles;
pub mod sample;
pub mod sampler;
pub mod stream;

pub use collector::{SampleReader, ThroughputCollector};
pub use lifecycle::{ListenerId, StepListener, StepListeners, StepSource};
pub use percentiles::PercentileSet;
pub use sample::Sample;
pub use sampler::{RateSampler, DEFAULT_INTERVAL_MILLIS};
