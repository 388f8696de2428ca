//! Shared test utilities for integration tests.
//! Not compiled as a test binary; included by test files.
#![allow(dead_code)]

pub mod fixtures;
pub mod mock;
