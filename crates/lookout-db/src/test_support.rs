//! Shared test utilities for lookout-db unit tests.
