//! End-to-end tests against mocked directories.

mod fallback;
mod forms;
mod sources;
