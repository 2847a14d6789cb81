//! # Pools tmem
//!
//! Um pool é um namespace independente no store do host, criado com um
//! tamanho de página declarado e flags de persistência/compartilhamento.
//! Destruir um pool invalida todos os objetos e páginas dele, sem condição.

use super::client::TmemClient;
use super::config::{TMEM_CLI, TMEM_MIN_PAGE_SHIFT, TMEM_POOL_PAGESIZE_MASK, TMEM_SPEC_VERSION};
use super::error::{TmemError, TmemResult};
use super::proto::{pack_pool_flags, GenericArgs, PoolFlags, TmemCmd, TmemOid, TmemOp};
use super::transport::TmemTransport;

/// Handle de pool.
///
/// Valores negativos significam "sem pool": o backend está desabilitado ou
/// o pool foi destruído.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolId(i32);

impl PoolId {
    /// Sentinela "sem pool"
    pub const INVALID: Self = Self(-1);

    #[inline]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Handle utilizável (não negativo)
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl From<i32> for PoolId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Código de tamanho de página do protocolo: log2(page_size) - 12.
///
/// O shift é obtido dividindo `page_size` por dois até chegar a 1; o caller
/// garante potência de dois (outro valor gera um código truncado, não um
/// erro). Tamanhos abaixo de 4 KiB, incluindo 0, e códigos que não cabem
/// nos 4 bits do campo são recusados.
pub fn page_shift_code(page_size: usize) -> TmemResult<u32> {
    if page_size < (1 << TMEM_MIN_PAGE_SHIFT) {
        return Err(TmemError::InvalidPageSize);
    }
    debug_assert!(
        crate::klib::is_power_of_two(page_size),
        "tmem: page_size precisa ser potência de dois"
    );

    let mut size = page_size;
    let mut shift = 0u32;
    while size != 1 {
        size >>= 1;
        shift += 1;
    }

    let code = shift - TMEM_MIN_PAGE_SHIFT;
    if code > TMEM_POOL_PAGESIZE_MASK {
        return Err(TmemError::InvalidPageSize);
    }
    Ok(code)
}

impl<T: TmemTransport> TmemClient<T> {
    /// Cria um pool no host.
    ///
    /// `flags` carrega apenas PERSIST/SHARED; código de página e versão do
    /// protocolo são empacotados aqui.
    pub fn new_pool(&self, flags: PoolFlags, page_size: usize) -> TmemResult<PoolId> {
        let code = page_shift_code(page_size)?;
        let raw_flags = pack_pool_flags(flags, code, TMEM_SPEC_VERSION);

        let pool = self.submit(&TmemOp::new_pool(TMEM_CLI, raw_flags)).into_pool()?;
        crate::kinfo!("(TMEM) Pool criado id=", pool.as_i32());
        Ok(pool)
    }

    /// Destrói um pool e tudo que há nele.
    ///
    /// Não verifica se o handle é válido: isso é papel do adaptador.
    pub fn destroy_pool(&self, pool: PoolId) -> TmemResult<()> {
        let op = TmemOp::generic(
            TmemCmd::DestroyPool,
            pool,
            GenericArgs::object(TmemOid::ZERO, 0),
        )?;
        self.submit(&op).into_result()?;
        crate::kinfo!("(TMEM) Pool destruído id=", pool.as_i32());
        Ok(())
    }
}
