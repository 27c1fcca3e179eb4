//! Test modules for the Reef library.
//!
//! Per-container unit and property tests live next to their containers;
//! this module holds the cross-cutting concurrency suites that hammer the
//! concurrent containers from many threads at once.

pub mod lockfree_list_tests;
