//! Core normalization building blocks: the resample policy, per-band
//! resampling, stack assembly, angle grid reconciliation, run artifacts and the
//! pipeline that sequences them. Consumed by the high-level `api` module.
pub mod angles;
pub mod artifacts;
pub mod bands;
pub mod detect;
pub mod params;
pub mod pipeline;
pub mod policy;
pub mod stack;

#[cfg(test)]
pub(crate) mod test_support;
