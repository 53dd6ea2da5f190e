//! End-to-end tests of the assembled gallery live under `tests/`.
