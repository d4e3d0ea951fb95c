//! Concrete storage backends.

pub mod postgres;
