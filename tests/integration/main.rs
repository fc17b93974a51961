//! Integration tests: scripted sources, HTTP end-to-end, overlapping lookups.

mod race;
mod resolution;
