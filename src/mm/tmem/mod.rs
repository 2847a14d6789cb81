//! # Transcendent Memory (tmem)
//!
//! Cliente guest para o page cache best-effort residente no host. O guest
//! guarda páginas limpas de arquivos (cleancache) e páginas de swap
//! (frontswap) no host e tenta recuperá-las depois; o host pode descartar
//! qualquer coisa a qualquer momento, sem aviso.
//!
//! ## Camadas
//!
//! | Módulo       | Responsabilidade |
//! |--------------|------------------|
//! | `proto`      | Registro de comando de wire, flags de pool, normalização de status. |
//! | `transport`  | Trait `TmemTransport`: uma chamada síncrona, status bruto. |
//! | `hypercall`  | `KvmHypercall`: transporte real via `vmcall`. |
//! | `local`      | `LocalStore`: host emulado (self-test e testes). |
//! | `pool`       | Criação/destruição de pools. |
//! | `client`     | put/get/flush de páginas, flush de objetos. |
//! | `cleancache` | Adaptador do page cache de filesystems. |
//! | `frontswap`  | Adaptador do swap (pool único, swizzling). |
//! | `config`     | Constantes de protocolo e toggles de boot. |
//! | `stats`      | Contadores por adaptador. |
//!
//! ## Convenções
//!
//! - Um `get` com sucesso remove a entrada (move, não copy).
//! - Miss e despejo são indistinguíveis: ambos viram `Miss`.
//! - Índices/offsets acima de 32 bits nunca chegam ao host.
//! - Nenhum retry em lugar nenhum.

pub mod cleancache;
pub mod client;
pub mod config;
pub mod error;
pub mod frontswap;
pub mod hypercall;
pub mod local;
pub mod pool;
pub mod proto;
pub mod stats;
pub mod transport;


#[cfg(test)]
mod tests;

pub use cleancache::{CleancacheOps, FileKey, TmemCleancache};
pub use client::{quiesce, TmemClient};
pub use config::TmemConfig;
pub use error::{TmemError, TmemResult};
pub use frontswap::{swizzle_index, swizzle_oid, swizzle_type, FrontswapOps, TmemFrontswap};
pub use hypercall::KvmHypercall;
pub use local::{DirectMap, FrameAccess, FrameArena, LocalStore};
pub use pool::PoolId;
pub use proto::{PoolFlags, TmemOid};
pub use stats::TmemStatsSnapshot;
pub use transport::TmemTransport;

use alloc::sync::Arc;

// =============================================================================
// CONVENÇÃO DOS ADAPTADORES
// =============================================================================

/// A página não está no cache (nunca esteve, foi despejada, pool inválido ou
/// índice largo demais).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Miss;

/// Resultado de put/get dos adaptadores
pub type CacheResult = Result<(), Miss>;

/// Código de retorno na fronteira com os frameworks de cache: 0 ou -1.
#[inline]
pub fn ret_code(res: &CacheResult) -> i32 {
    match res {
        Ok(()) => 0,
        Err(Miss) => -1,
    }
}

/// Índice de página no campo de 32 bits, ou `None` se não cabe.
#[inline]
pub fn wire_index(index: u64) -> Option<u32> {
    u32::try_from(index).ok()
}

// =============================================================================
// REGISTRO
// =============================================================================

/// Adaptadores habilitados no boot.
pub struct TmemBackends<T: TmemTransport> {
    pub cleancache: Option<TmemCleancache<T>>,
    pub frontswap: Option<TmemFrontswap<T>>,
}

impl<T: TmemTransport> TmemBackends<T> {
    /// Callbacks para o page cache de filesystems
    pub fn cleancache_ops(&self) -> Option<&dyn CleancacheOps> {
        self.cleancache.as_ref().map(|cc| cc as &dyn CleancacheOps)
    }

    /// Callbacks para o subsistema de swap
    pub fn frontswap_ops(&self) -> Option<&dyn FrontswapOps> {
        self.frontswap.as_ref().map(|fs| fs as &dyn FrontswapOps)
    }
}

/// Constrói os adaptadores habilitados em `config`, todos sobre o mesmo
/// transporte.
///
/// # Panics
///
/// Se `FileKey` e `TmemOid` tiverem layouts incompatíveis: o cleancache
/// reinterpretaria chaves de forma errada.
pub fn init<T: TmemTransport>(config: &TmemConfig, transport: Arc<T>) -> TmemBackends<Arc<T>> {
    if !cleancache::key_layout_matches() {
        crate::kerror!("(TMEM) FileKey incompatível com TmemOid");
        panic!("tmem: {}", TmemError::KeyLayoutMismatch);
    }

    if !config.enabled {
        crate::kinfo!("(TMEM) Desabilitado (sem 'tmem' na linha de comando)");
        return TmemBackends {
            cleancache: None,
            frontswap: None,
        };
    }

    let frontswap = config.use_frontswap().then(|| {
        crate::kok!("(TMEM) frontswap habilitado, RAM fornecida pelo host");
        TmemFrontswap::new(transport.clone())
    });

    let cleancache = config.use_cleancache().then(|| {
        crate::kok!("(TMEM) cleancache habilitado, RAM fornecida pelo host");
        TmemCleancache::new(transport.clone())
    });

    TmemBackends {
        cleancache,
        frontswap,
    }
}

/// Toggles lidos da linha de comando de boot (desabilitado se ainda não
/// foi registrada).
pub fn config_from_boot() -> TmemConfig {
    crate::core::cmdline::get()
        .map(TmemConfig::from_cmdline)
        .unwrap_or_default()
}
