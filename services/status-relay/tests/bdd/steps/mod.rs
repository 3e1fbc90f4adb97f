//! BDD step definitions for the status relay

pub mod transition_steps;
