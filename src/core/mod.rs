//! Core Module
//!
//! Infraestrutura central compartilhada pelo subsistema tmem:
//! logging zero-overhead e parser da linha de comando do kernel.

pub mod cmdline;
pub mod logging;
