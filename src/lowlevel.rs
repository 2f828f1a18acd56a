//! Low-level building blocks for custom filtering pipelines.
//!
//! These expose the pieces needed to plug in a custom waveform generator or
//! weight a filter outside a bank. Most users should prefer
//! [`FilterBank`](crate::FilterBank) and
//! [`CachedFilterBank`](crate::CachedFilterBank).

pub use crate::kernel::{band_indices, sigmasq, Kernel};
pub use crate::series::fft::real_to_frequency;
pub use crate::waveform::{GeneratedFilter, GenerationRequest, OptionKey, MAX_PHASE_ORDER};
