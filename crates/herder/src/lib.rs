// Domain-driven module structure for the herder CLI.

// Core engine
pub mod parser;

// Peripheral glue
pub mod conf;
pub mod runtime;
pub mod submit;
