//! Provider allocation: the multi-stage ranking/tie-break engine that turns
//! (location, eligible-provider set, current load) into a single chosen
//! provider plus contract terms.

mod engine;

pub use engine::{
    AllocateOptions, AllocationEngine, AllocationSettings, Decision, Terms,
};
