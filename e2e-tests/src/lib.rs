//! Chain tests for the Mawar Finance contracts live under `tests/` and run
//! with `--features e2e` against a Nitro dev node.
