//! Command modules for the push-guard CLI.
//!
//! - `pre_receive`: evaluate a push read from git's pre-receive protocol
//! - `validate`: check a configuration file without evaluating anything

pub mod pre_receive;
pub mod validate;
