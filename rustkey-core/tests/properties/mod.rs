//! Property-based tests for the RustKey core library

mod decode_tests;
mod selection_tests;
