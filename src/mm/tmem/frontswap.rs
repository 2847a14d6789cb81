//! # Frontswap (páginas de swap)
//!
//! Adaptador entre o subsistema de swap e o tmem. Um único pool PERSIST é
//! compartilhado por todos os dispositivos de swap; o tipo do dispositivo
//! vai dentro do oid ("swizzling"):
//!
//! ```text
//! offset (32 bits)
//! ┌──────────────────────────────┬──────┐
//! │          offset >> 4         │ low4 │
//! └──────────────┬───────────────┴───┬──┘
//!                │                   │
//!             índice      oid[0] = (type << 4) | low4
//! ```
//!
//! Cada dispositivo vira 16 objetos no host, o que reduz a contenção num
//! objeto único sob swap pesado. O custo: descartar um dispositivo exige
//! percorrer os 16 objetos.
//!
//! `invalidate_area` destrói o pool compartilhado, então todos os
//! dispositivos deixam de funcionar até o próximo `init`.

use super::client::{quiesce, TmemClient};
use super::config::{SWIZ_BITS, SWIZ_MASK};
use super::pool::PoolId;
use super::proto::{PoolFlags, TmemOid};
use super::stats::{TmemStats, TmemStatsSnapshot};
use super::transport::TmemTransport;
use super::{wire_index, CacheResult, Miss};
use crate::mm::addr::PageFrame;
use crate::mm::config::PAGE_SIZE;
use core::sync::atomic::{AtomicI32, Ordering};

// =============================================================================
// SWIZZLING
// =============================================================================

/// Oid do sub-objeto de `ind` no dispositivo `swap_type`
#[inline]
pub const fn swizzle_oid(swap_type: u32, ind: u32) -> TmemOid {
    let word = ((swap_type as u64) << SWIZ_BITS) | (ind & SWIZ_MASK) as u64;
    TmemOid::new([word, 0, 0])
}

/// Índice dentro do sub-objeto
#[inline]
pub const fn swizzle_index(ind: u32) -> u32 {
    ind >> SWIZ_BITS
}

/// Tipo de dispositivo codificado num oid de swap
#[inline]
pub const fn swizzle_type(oid: &TmemOid) -> u32 {
    (oid.oid[0] >> SWIZ_BITS) as u32
}

// =============================================================================
// OPERAÇÕES
// =============================================================================

/// Callbacks que o subsistema de swap invoca.
pub trait FrontswapOps: Send + Sync {
    /// Ativação de um dispositivo. Cria o pool compartilhado se ainda não existe.
    fn init(&self, swap_type: u32);

    fn put_page(&self, swap_type: u32, offset: u64, frame: PageFrame) -> CacheResult;

    fn get_page(&self, swap_type: u32, offset: u64, frame: PageFrame) -> CacheResult;

    fn invalidate_page(&self, swap_type: u32, offset: u64);

    /// Descarta o dispositivo e o pool compartilhado
    fn invalidate_area(&self, swap_type: u32);
}

/// Frontswap sobre tmem
pub struct TmemFrontswap<T: TmemTransport> {
    client: TmemClient<T>,
    pool: AtomicI32,
    stats: TmemStats,
}

impl<T: TmemTransport> TmemFrontswap<T> {
    /// Sem pool até o primeiro `init`
    pub const fn new(transport: T) -> Self {
        Self {
            client: TmemClient::new(transport),
            pool: AtomicI32::new(PoolId::INVALID.as_i32()),
            stats: TmemStats::new(),
        }
    }

    pub fn client(&self) -> &TmemClient<T> {
        &self.client
    }

    /// Handle atual do pool compartilhado
    pub fn pool(&self) -> PoolId {
        PoolId::new(self.pool.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> TmemStatsSnapshot {
        self.stats.snapshot()
    }

    /// (pool, oid, índice) de uma página de swap, se endereçável
    fn key(&self, swap_type: u32, offset: u64) -> Option<(PoolId, TmemOid, u32)> {
        let pool = self.pool();
        if !pool.is_valid() {
            self.stats.record_bypass();
            return None;
        }
        let Some(ind) = wire_index(offset) else {
            crate::ktrace!("(TMEM/FS) Offset fora de 32 bits: ", offset);
            self.stats.record_bypass();
            return None;
        };
        Some((pool, swizzle_oid(swap_type, ind), swizzle_index(ind)))
    }
}

impl<T: TmemTransport> FrontswapOps for TmemFrontswap<T> {
    fn init(&self, _swap_type: u32) {
        if self.pool().is_valid() {
            return;
        }

        let pool = match self.client.new_pool(PoolFlags::PERSIST, PAGE_SIZE) {
            Ok(pool) => pool,
            Err(_e) => {
                crate::kwarn!("(TMEM/FS) Falha ao criar pool de swap");
                crate::kdebug!(_e.as_str());
                return;
            }
        };
        self.stats.record_pool_create();

        // Outro init concorrente pode ter ganho: o pool extra é devolvido
        if self
            .pool
            .compare_exchange(
                PoolId::INVALID.as_i32(),
                pool.as_i32(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            let _ = self.client.destroy_pool(pool);
        }
    }

    fn put_page(&self, swap_type: u32, offset: u64, frame: PageFrame) -> CacheResult {
        let (pool, oid, index) = self.key(swap_type, offset).ok_or(Miss)?;
        quiesce();
        let ok = self.client.put_page(pool, oid, index, frame).is_ok();
        self.stats.record_put(ok);
        if ok {
            Ok(())
        } else {
            Err(Miss)
        }
    }

    fn get_page(&self, swap_type: u32, offset: u64, frame: PageFrame) -> CacheResult {
        let (pool, oid, index) = self.key(swap_type, offset).ok_or(Miss)?;
        let hit = self.client.get_page(pool, oid, index, frame).is_ok();
        self.stats.record_get(hit);
        if hit {
            Ok(())
        } else {
            Err(Miss)
        }
    }

    fn invalidate_page(&self, swap_type: u32, offset: u64) {
        if let Some((pool, oid, index)) = self.key(swap_type, offset) {
            if self.client.flush_page(pool, oid, index).is_ok() {
                self.stats.record_flush();
            }
        }
    }

    fn invalidate_area(&self, swap_type: u32) {
        let pool = self.pool();
        if !pool.is_valid() {
            self.stats.record_bypass();
            return;
        }

        for ind in (0..=SWIZ_MASK).rev() {
            if self.client.flush_object(pool, swizzle_oid(swap_type, ind)).is_ok() {
                self.stats.record_flush();
            }
        }

        if self.client.destroy_pool(pool).is_ok() {
            self.stats.record_pool_destroy();
        }
        // O handle não é reaproveitado mesmo se o host recusar o destroy
        let _ = self.pool.compare_exchange(
            pool.as_i32(),
            PoolId::INVALID.as_i32(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        crate::kinfo!("(TMEM/FS) Área descartada, pool de swap inválido. tipo=", swap_type);
    }
}
