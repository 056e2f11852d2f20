//! Foreground presentation module

pub mod adapter;

pub use adapter::{
    NoEffects, PresentationAdapter, Reconciliation, TransitionEffects, DRIFT_TOLERANCE_SECS,
};
