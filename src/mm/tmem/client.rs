//! # Cliente do Page Store
//!
//! put/get/flush de páginas e flush de objetos, endereçados por
//! (pool, oid, índice). Cada operação vira exatamente um comando no
//! transporte; não há retry: o store é best-effort.
//!
//! Semântica do host:
//! - `put_page`: guarda o conteúdo do frame; pode ser descartado a qualquer
//!   momento antes de um `get`.
//! - `get_page`: em hit sobrescreve o frame e remove a entrada ("move", não
//!   "copy"); em miss o frame fica intacto.
//! - `flush_page` / `flush_object`: removem uma entrada / todas do objeto.

use super::error::{TmemError, TmemResult};
use super::pool::PoolId;
use super::proto::{GenericArgs, Status, TmemCmd, TmemOid, TmemOp};
use super::transport::TmemTransport;
use crate::mm::addr::PageFrame;
use core::sync::atomic::{fence, Ordering};

/// Cliente síncrono sobre um transporte.
pub struct TmemClient<T: TmemTransport> {
    transport: T,
}

impl<T: TmemTransport> TmemClient<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Transporte subjacente
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Codifica, envia e normaliza o status.
    pub(super) fn submit(&self, op: &TmemOp) -> Status {
        let raw = op.encode();
        Status::from_raw(self.transport.call(&raw))
    }

    fn page_op(
        &self,
        cmd: TmemCmd,
        pool: PoolId,
        oid: TmemOid,
        index: u32,
        frame: PageFrame,
    ) -> TmemResult<()> {
        let pfn = wire_pfn(frame)?;
        let op = TmemOp::generic(cmd, pool, GenericArgs::page(oid, index, pfn))?;
        self.submit(&op).into_result()
    }

    /// Guarda o conteúdo de `frame` em (pool, oid, index).
    ///
    /// O caller precisa ter chamado `quiesce` depois da última escrita no
    /// frame: o host pode ler a página física diretamente.
    pub fn put_page(
        &self,
        pool: PoolId,
        oid: TmemOid,
        index: u32,
        frame: PageFrame,
    ) -> TmemResult<()> {
        self.page_op(TmemCmd::PutPage, pool, oid, index, frame)
    }

    /// Traz a página de volta para `frame` e remove a entrada do host.
    pub fn get_page(
        &self,
        pool: PoolId,
        oid: TmemOid,
        index: u32,
        frame: PageFrame,
    ) -> TmemResult<()> {
        self.page_op(TmemCmd::GetPage, pool, oid, index, frame)
    }

    /// Remove uma página, se existir.
    pub fn flush_page(&self, pool: PoolId, oid: TmemOid, index: u32) -> TmemResult<()> {
        let op = TmemOp::generic(TmemCmd::FlushPage, pool, GenericArgs::object(oid, index))?;
        self.submit(&op).into_result()
    }

    /// Remove todas as páginas do objeto.
    pub fn flush_object(&self, pool: PoolId, oid: TmemOid) -> TmemResult<()> {
        let op = TmemOp::generic(TmemCmd::FlushObject, pool, GenericArgs::object(oid, 0))?;
        self.submit(&op).into_result()
    }
}

/// Barreira completa antes de um put: o conteúdo do frame precisa estar
/// visível em memória, pois o host pode endereçá-lo por um alias físico.
#[inline(always)]
pub fn quiesce() {
    fence(Ordering::SeqCst);
}

/// PFN no campo de 32 bits do registro
#[inline]
fn wire_pfn(frame: PageFrame) -> TmemResult<u32> {
    u32::try_from(frame.pfn()).map_err(|_| TmemError::FrameOutOfRange)
}
