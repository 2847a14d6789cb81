//! # Cleancache (páginas limpas de arquivos)
//!
//! Adaptador entre o page cache de filesystems e o tmem. Cada mount recebe
//! um pool próprio (`init_fs`); a chave por arquivo do filesystem é
//! reinterpretada bit a bit como oid e o índice da página no arquivo vira o
//! índice tmem.
//!
//! Páginas limpas podem ser perdidas sem prejuízo: toda falha vira "miss" ou
//! no-op. Índices que não cabem em 32 bits não são cacheáveis e nunca chegam
//! ao transporte.

use super::client::{quiesce, TmemClient};
use super::pool::PoolId;
use super::proto::{PoolFlags, TmemOid};
use super::stats::{TmemStats, TmemStatsSnapshot};
use super::transport::TmemTransport;
use super::{wire_index, CacheResult, Miss};
use crate::mm::addr::PageFrame;

// =============================================================================
// CHAVE DE ARQUIVO
// =============================================================================

/// Chave por arquivo fornecida pelo filesystem (inode ou file handle).
///
/// Mesmo tamanho de `TmemOid`: os 24 bytes são usados como oid sem
/// transformação.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub fh: [u32; 6],
}

const _: () = assert!(core::mem::size_of::<FileKey>() == core::mem::size_of::<TmemOid>());

impl FileKey {
    /// Chave a partir do número do inode (bytes nativos no início da chave)
    pub fn from_ino(ino: u64) -> Self {
        let b = ino.to_ne_bytes();
        let mut fh = [0u32; 6];
        fh[0] = u32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
        fh[1] = u32::from_ne_bytes([b[4], b[5], b[6], b[7]]);
        Self { fh }
    }

    /// Chave a partir de um file handle exportável
    pub const fn from_fh(fh: [u32; 6]) -> Self {
        Self { fh }
    }

    /// Mesmos 24 bytes, vistos como oid.
    pub fn as_oid(&self) -> TmemOid {
        let mut oid = [0u64; 3];
        for (word, pair) in oid.iter_mut().zip(self.fh.chunks_exact(2)) {
            let lo = pair[0].to_ne_bytes();
            let hi = pair[1].to_ne_bytes();
            *word = u64::from_ne_bytes([lo[0], lo[1], lo[2], lo[3], hi[0], hi[1], hi[2], hi[3]]);
        }
        TmemOid::new(oid)
    }
}

/// Confere em runtime que as duas representações da chave são compatíveis.
pub fn key_layout_matches() -> bool {
    core::mem::size_of::<FileKey>() == core::mem::size_of::<TmemOid>()
        && core::mem::align_of::<FileKey>() <= core::mem::align_of::<TmemOid>()
}

// =============================================================================
// OPERAÇÕES
// =============================================================================

/// Callbacks que o page cache de filesystems invoca.
pub trait CleancacheOps: Send + Sync {
    /// Pool privado para um mount. `PoolId::INVALID` se o host recusar.
    fn init_fs(&self, page_size: usize) -> PoolId;

    /// Pool compartilhável (filesystem montado igual em vários guests).
    /// O uuid não participa do endereçamento.
    fn init_shared_fs(&self, uuid: &[u8; 16], page_size: usize) -> PoolId;

    /// Oferece uma página limpa ao cache. Sem canal de erro.
    fn put_page(&self, pool: PoolId, key: FileKey, index: u64, frame: PageFrame);

    /// Tenta trazer a página de volta para `frame`.
    fn get_page(&self, pool: PoolId, key: FileKey, index: u64, frame: PageFrame) -> CacheResult;

    fn invalidate_page(&self, pool: PoolId, key: FileKey, index: u64);

    /// Descarta todas as páginas do arquivo
    fn invalidate_inode(&self, pool: PoolId, key: FileKey);

    /// Descarta o pool do mount inteiro
    fn invalidate_fs(&self, pool: PoolId);
}

/// Cleancache sobre tmem
pub struct TmemCleancache<T: TmemTransport> {
    client: TmemClient<T>,
    stats: TmemStats,
}

impl<T: TmemTransport> TmemCleancache<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            client: TmemClient::new(transport),
            stats: TmemStats::new(),
        }
    }

    pub fn client(&self) -> &TmemClient<T> {
        &self.client
    }

    pub fn stats(&self) -> TmemStatsSnapshot {
        self.stats.snapshot()
    }

    fn create_pool(&self, flags: PoolFlags, page_size: usize) -> PoolId {
        match self.client.new_pool(flags, page_size) {
            Ok(pool) => {
                self.stats.record_pool_create();
                pool
            }
            Err(_e) => {
                crate::kwarn!("(TMEM/CC) Falha ao criar pool de filesystem");
                crate::kdebug!(_e.as_str());
                PoolId::INVALID
            }
        }
    }

    /// (oid, índice) de uma página, se cacheável
    fn key(&self, pool: PoolId, key: FileKey, index: u64) -> Option<(TmemOid, u32)> {
        if !pool.is_valid() {
            self.stats.record_bypass();
            return None;
        }
        let Some(index) = wire_index(index) else {
            crate::ktrace!("(TMEM/CC) Índice fora de 32 bits: ", index);
            self.stats.record_bypass();
            return None;
        };
        Some((key.as_oid(), index))
    }
}

impl<T: TmemTransport> CleancacheOps for TmemCleancache<T> {
    fn init_fs(&self, page_size: usize) -> PoolId {
        self.create_pool(PoolFlags::empty(), page_size)
    }

    fn init_shared_fs(&self, _uuid: &[u8; 16], page_size: usize) -> PoolId {
        self.create_pool(PoolFlags::SHARED, page_size)
    }

    fn put_page(&self, pool: PoolId, key: FileKey, index: u64, frame: PageFrame) {
        let Some((oid, index)) = self.key(pool, key, index) else {
            return;
        };
        quiesce();
        let res = self.client.put_page(pool, oid, index, frame);
        self.stats.record_put(res.is_ok());
    }

    fn get_page(&self, pool: PoolId, key: FileKey, index: u64, frame: PageFrame) -> CacheResult {
        let (oid, index) = self.key(pool, key, index).ok_or(Miss)?;
        let hit = self.client.get_page(pool, oid, index, frame).is_ok();
        self.stats.record_get(hit);
        if hit {
            Ok(())
        } else {
            Err(Miss)
        }
    }

    fn invalidate_page(&self, pool: PoolId, key: FileKey, index: u64) {
        if let Some((oid, index)) = self.key(pool, key, index) {
            if self.client.flush_page(pool, oid, index).is_ok() {
                self.stats.record_flush();
            }
        }
    }

    fn invalidate_inode(&self, pool: PoolId, key: FileKey) {
        if !pool.is_valid() {
            self.stats.record_bypass();
            return;
        }
        if self.client.flush_object(pool, key.as_oid()).is_ok() {
            self.stats.record_flush();
        }
    }

    fn invalidate_fs(&self, pool: PoolId) {
        if !pool.is_valid() {
            self.stats.record_bypass();
            return;
        }
        if self.client.destroy_pool(pool).is_ok() {
            self.stats.record_pool_destroy();
        }
    }
}
