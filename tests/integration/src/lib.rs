//! Workspace-level integration tests live in `tests/`; nothing is exported.
