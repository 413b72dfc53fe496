//! fmradio-test-harness: Simulated tuner and RDS group builders for fmradio.
//!
//! This crate provides [`SimulatedTuner`] for deterministic testing of the
//! session protocol and server without real hardware, and builders in
//! [`rds_groups`] for producing well-formed RDS block quartets.

pub mod rds_groups;
pub mod simulated_tuner;

pub use rds_groups::{
    PI_CODE, ps_group, ps_sequence, radio_text_group_a, radio_text_group_b, radio_text_sequence,
};
pub use simulated_tuner::{SimulatedTuner, Station, TunerOp};
