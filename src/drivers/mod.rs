//! # Driver Layer
//!
//! Apenas o driver serial é necessário aqui: ele é o sink dos macros de log.
//!
//! | Driver   | Arquivo      | Status |
//! |----------|--------------|--------|
//! | Serial   | `serial.rs`  | COM1 em bare-metal, descarte em builds hosted |

pub mod serial; // UART 16550 - Logs
