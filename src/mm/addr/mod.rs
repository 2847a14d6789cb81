//! # Addr - Wrappers Type-Safe para Endereços
//!
//! `PhysAddr` para endereços físicos e `PageFrame` para frames referenciados
//! por número (PFN), que é como o tmem endereça páginas do guest.

mod phys;

pub use phys::{PageFrame, PhysAddr};
