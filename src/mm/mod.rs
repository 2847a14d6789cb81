//! # Memory Management Subsystem (MM)
//!
//! Recorte do MM do Forge necessário ao cliente de Transcendent Memory.
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | `config` | Constantes de página. |
//! | `addr`   | `PhysAddr` e `PageFrame` (frames por PFN). |
//! | `hhdm`   | Higher Half Direct Map: físico <-> virtual. |
//! | `tmem`   | Transcendent Memory: protocolo, pools, cleancache, frontswap. |
//!
//! ```text
//! cleancache / frontswap ──▶ TmemClient ──▶ proto (RawTmemOp) ──▶ TmemTransport
//!                                                                   │
//!                                              KvmHypercall (vmcall) │ LocalStore
//! ```

pub mod addr;
pub mod config;
pub mod hhdm;
pub mod tmem;

// Re-exports para conveniência
pub use addr::{PageFrame, PhysAddr};
