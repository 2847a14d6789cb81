//! Forge TMEM Library.
//!
//! Cliente guest de Transcendent Memory para o kernel Forge.
//! Define a mesma hierarquia de módulos do kernel, restrita ao que o
//! subsistema tmem precisa.

#![no_std]

// Habilitar alocação dinâmica (BTreeMap/Arc/Box)
extern crate alloc;

// Testes unitários rodam no host com o harness padrão
#[cfg(test)]
extern crate std;

// --- Módulos de Baixo Nível (Hardware) ---
pub mod drivers; // Serial (sink dos logs)

// --- Módulos Centrais ---
pub mod core; // Logging, linha de comando
pub mod klib; // Framework de testes de boot
pub mod mm; // Endereços, HHDM e o subsistema tmem

pub use crate::mm::tmem::{
    CleancacheOps, FrontswapOps, PoolId, TmemBackends, TmemCleancache, TmemConfig, TmemError,
    TmemFrontswap, TmemOid, TmemResult, TmemTransport,
};
