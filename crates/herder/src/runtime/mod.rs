//! Runtime module — process lifecycle: boot, CLI, run.

pub mod boot;
pub mod run;
