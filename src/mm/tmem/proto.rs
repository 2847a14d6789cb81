//! # Protocolo tmem (guest <-> host)
//!
//! Registro de comando de layout fixo entregue ao host pelo endereço físico.
//!
//! ```text
//! RawTmemOp (56 bytes, repr(C))
//! ┌──────────┬──────────┬──────────────────────────────────────────────┐
//! │ cmd: u32 │ pool: i32│ u: union (48 bytes)                          │
//! └──────────┴──────────┤  new: { cli_id: u16, flags: u32 }            │
//!                       │  gen: { oid: [u64; 3], index, tmem_offset,   │
//!                       │         pfn_offset, pfn, len: u32,           │
//!                       │         cli_id: u16 }                        │
//!                       └──────────────────────────────────────────────┘
//!
//! flags de NEW_POOL
//!  31        24 23           8 7     4 3 2 1 0
//! ┌────────────┬──────────────┬───────┬───┬─┬─┐
//! │  versão    │  reservado   │ shift │   │S│P│   shift = log2(pagesize) - 12
//! └────────────┴──────────────┴───────┴───┴─┴─┘
//! ```
//!
//! Do lado Rust o comando é um `TmemOp` tipado (comando + payload coerente);
//! a union só existe no registro bruto. O codec não valida o conteúdo do
//! payload além do pareamento comando/payload.

use super::config::{
    TMEM_CLI, TMEM_POOL_PAGESIZE_MASK, TMEM_POOL_PAGESIZE_SHIFT, TMEM_POOL_PERSIST,
    TMEM_POOL_SHARED, TMEM_STATUS_BIAS, TMEM_VERSION_MASK, TMEM_VERSION_SHIFT,
};
use super::error::{TmemError, TmemResult};
use super::pool::PoolId;
use bitflags::bitflags;

// =============================================================================
// COMANDOS
// =============================================================================

/// Códigos de comando (constantes de wire)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TmemCmd {
    Control = 0,
    NewPool = 1,
    DestroyPool = 2,
    /// Reservado
    NewPage = 3,
    PutPage = 4,
    GetPage = 5,
    FlushPage = 6,
    FlushObject = 7,
    /// Reservado
    Read = 8,
    /// Reservado
    Write = 9,
    /// Reservado
    Xchg = 10,
}

impl TmemCmd {
    /// Converte o código de wire
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Control,
            1 => Self::NewPool,
            2 => Self::DestroyPool,
            3 => Self::NewPage,
            4 => Self::PutPage,
            5 => Self::GetPage,
            6 => Self::FlushPage,
            7 => Self::FlushObject,
            8 => Self::Read,
            9 => Self::Write,
            10 => Self::Xchg,
            _ => return None,
        })
    }

    /// Código de wire
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Comandos definidos no protocolo mas não usados pelos adaptadores
    pub const fn is_reserved(self) -> bool {
        matches!(self, Self::NewPage | Self::Read | Self::Write | Self::Xchg)
    }
}

// =============================================================================
// FLAGS DE POOL
// =============================================================================

bitflags! {
    /// Capacidades de um pool (bits baixos de `flags` em NEW_POOL)
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PoolFlags: u32 {
        /// Páginas não podem ser descartadas silenciosamente (frontswap)
        const PERSIST = TMEM_POOL_PERSIST;
        /// Pool compartilhável entre guests (filesystem em cluster)
        const SHARED  = TMEM_POOL_SHARED;
    }
}

/// Empacota flags, código de página e versão no formato de wire.
#[inline]
pub const fn pack_pool_flags(flags: PoolFlags, page_shift_code: u32, version: u32) -> u32 {
    flags.bits()
        | ((page_shift_code & TMEM_POOL_PAGESIZE_MASK) << TMEM_POOL_PAGESIZE_SHIFT)
        | ((version & TMEM_VERSION_MASK) << TMEM_VERSION_SHIFT)
}

/// Extrai o código de página (log2(pagesize) - 12)
#[inline]
pub const fn decode_pageshift(raw: u32) -> u32 {
    (raw >> TMEM_POOL_PAGESIZE_SHIFT) & TMEM_POOL_PAGESIZE_MASK
}

/// Extrai a versão do protocolo
#[inline]
pub const fn decode_version(raw: u32) -> u32 {
    (raw >> TMEM_VERSION_SHIFT) & TMEM_VERSION_MASK
}

/// Extrai as capacidades (PERSIST/SHARED)
#[inline]
pub const fn decode_flags(raw: u32) -> PoolFlags {
    PoolFlags::from_bits_truncate(raw)
}

// =============================================================================
// OBJECT ID
// =============================================================================

/// Identificador de objeto: três palavras de 64 bits, opacas para o host.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TmemOid {
    pub oid: [u64; 3],
}

impl TmemOid {
    /// Oid nulo (usado em DESTROY_POOL, ignorado pelo host)
    pub const ZERO: Self = Self { oid: [0; 3] };

    #[inline]
    pub const fn new(oid: [u64; 3]) -> Self {
        Self { oid }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Payload de NEW_POOL
///
/// Os dois structs de payload não têm padding implícito: todo byte que o
/// host lê foi escrito pelo guest.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewPoolArgs {
    pub cli_id: u16,
    _pad: u16,
    pub flags: u32,
}

impl NewPoolArgs {
    #[inline]
    pub const fn new(cli_id: u16, flags: u32) -> Self {
        Self {
            cli_id,
            _pad: 0,
            flags,
        }
    }
}

/// Payload genérico (página/objeto)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericArgs {
    pub oid: TmemOid,
    pub index: u32,
    /// Offset em bytes dentro da página tmem (READ/WRITE)
    pub tmem_offset: u32,
    /// Offset em bytes dentro do frame do guest (READ/WRITE)
    pub pfn_offset: u32,
    pub pfn: u32,
    pub len: u32,
    pub cli_id: u16,
    _pad: u16,
}

impl GenericArgs {
    /// Payload de operação de página inteira
    #[inline]
    pub const fn page(oid: TmemOid, index: u32, pfn: u32) -> Self {
        Self {
            oid,
            index,
            tmem_offset: 0,
            pfn_offset: 0,
            pfn,
            len: 0,
            cli_id: TMEM_CLI,
            _pad: 0,
        }
    }

    /// Payload de operação de objeto (ou pool) sem frame
    #[inline]
    pub const fn object(oid: TmemOid, index: u32) -> Self {
        Self::page(oid, index, 0)
    }
}

/// Payload tipado, selecionado pelo comando
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    NewPool(NewPoolArgs),
    Generic(GenericArgs),
}

// =============================================================================
// COMANDO TIPADO
// =============================================================================

/// Comando tmem validado na construção
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmemOp {
    cmd: TmemCmd,
    pool: PoolId,
    payload: Payload,
}

impl TmemOp {
    /// NEW_POOL: o host ignora o pool id deste comando
    pub const fn new_pool(cli_id: u16, flags: u32) -> Self {
        Self {
            cmd: TmemCmd::NewPool,
            pool: PoolId::INVALID,
            payload: Payload::NewPool(NewPoolArgs::new(cli_id, flags)),
        }
    }

    /// Qualquer comando com payload genérico
    pub fn generic(cmd: TmemCmd, pool: PoolId, args: GenericArgs) -> TmemResult<Self> {
        if cmd == TmemCmd::NewPool {
            return Err(TmemError::InvalidCommand);
        }
        Ok(Self {
            cmd,
            pool,
            payload: Payload::Generic(args),
        })
    }

    #[inline]
    pub fn cmd(&self) -> TmemCmd {
        self.cmd
    }

    #[inline]
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Monta o registro de wire
    pub fn encode(&self) -> RawTmemOp {
        // Union zerada; escrever `new` só toca os 8 primeiros bytes
        let mut u = RawPayload {
            gen: GenericArgs::default(),
        };
        match self.payload {
            Payload::NewPool(args) => u.new = args,
            Payload::Generic(args) => u.gen = args,
        }
        RawTmemOp {
            cmd: self.cmd.as_raw(),
            pool_id: self.pool.as_i32(),
            u,
        }
    }
}

// =============================================================================
// REGISTRO DE WIRE
// =============================================================================

/// Payload bruto (union C)
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawPayload {
    pub new: NewPoolArgs,
    pub gen: GenericArgs,
}

/// Registro de comando exatamente como o host o lê
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawTmemOp {
    pub cmd: u32,
    pub pool_id: i32,
    pub u: RawPayload,
}

const _: () = assert!(core::mem::size_of::<RawTmemOp>() == 56);
const _: () = assert!(core::mem::size_of::<TmemOid>() == 24);
const _: () = assert!(core::mem::size_of::<NewPoolArgs>() == 8);
const _: () = assert!(core::mem::size_of::<GenericArgs>() == 48);

impl RawTmemOp {
    /// Interpreta um registro recebido (lado host / testes)
    pub fn decode(&self) -> TmemResult<TmemOp> {
        let cmd = TmemCmd::from_raw(self.cmd).ok_or(TmemError::InvalidCommand)?;
        let payload = match cmd {
            // SAFETY: o comando seleciona o membro da union; `encode` sempre
            // escreve o membro correspondente ao comando.
            TmemCmd::NewPool => Payload::NewPool(unsafe { self.u.new }),
            _ => Payload::Generic(unsafe { self.u.gen }),
        };
        Ok(TmemOp {
            cmd,
            pool: PoolId::new(self.pool_id),
            payload,
        })
    }
}

impl core::fmt::Debug for RawTmemOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.decode() {
            Ok(op) => write!(f, "RawTmemOp({:?})", op),
            Err(_) => write!(f, "RawTmemOp(cmd={}, pool={})", self.cmd, self.pool_id),
        }
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Status normalizado de um comando.
///
/// O transporte devolve um código bruto definido pelo host; o cliente soma
/// `TMEM_STATUS_BIAS` antes de usá-lo. Contrato após a normalização:
/// - `0`: sucesso (página/objeto/DESTROY_POOL)
/// - `>= 0`: handle do pool criado (NEW_POOL)
/// - qualquer outro valor: falha do host
///
/// O bias fica restrito a este tipo; adaptadores nunca o enxergam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(i32);

impl Status {
    pub const SUCCESS: Self = Self(0);
    pub const FAILURE: Self = Self(-1);

    /// Normaliza o retorno bruto do transporte (truncado para 32 bits).
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self((raw as i32).wrapping_add(TMEM_STATUS_BIAS as i32))
    }

    /// Inverso de `from_raw`: código bruto que um host devolveria.
    #[inline]
    pub const fn to_raw(self) -> i64 {
        self.0.wrapping_sub(TMEM_STATUS_BIAS as i32) as i64
    }

    /// Status de um NEW_POOL bem-sucedido
    #[inline]
    pub const fn pool(pool: PoolId) -> Self {
        Self(pool.as_i32())
    }

    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Resultado de operação de página/objeto/destroy
    #[inline]
    pub fn into_result(self) -> TmemResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(TmemError::Host(self.0))
        }
    }

    /// Resultado de NEW_POOL
    #[inline]
    pub fn into_pool(self) -> TmemResult<PoolId> {
        if self.0 >= 0 {
            Ok(PoolId::new(self.0))
        } else {
            Err(TmemError::Host(self.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_command_codes() {
        assert_eq!(TmemCmd::Control.as_raw(), 0);
        assert_eq!(TmemCmd::NewPool.as_raw(), 1);
        assert_eq!(TmemCmd::DestroyPool.as_raw(), 2);
        assert_eq!(TmemCmd::PutPage.as_raw(), 4);
        assert_eq!(TmemCmd::GetPage.as_raw(), 5);
        assert_eq!(TmemCmd::FlushPage.as_raw(), 6);
        assert_eq!(TmemCmd::FlushObject.as_raw(), 7);
        assert_eq!(TmemCmd::Xchg.as_raw(), 10);
        for raw in 0..=10 {
            assert_eq!(TmemCmd::from_raw(raw).map(TmemCmd::as_raw), Some(raw));
        }
        assert_eq!(TmemCmd::from_raw(11), None);
        assert!(TmemCmd::Read.is_reserved());
        assert!(!TmemCmd::GetPage.is_reserved());
    }

    #[test]
    fn test_flags_bit_layout() {
        let raw = pack_pool_flags(PoolFlags::PERSIST | PoolFlags::SHARED, 3, 1);
        assert_eq!(raw & 0b11, 0b11);
        assert_eq!(raw, 0b11 | (3 << 4) | (1 << 24));
        assert_eq!(decode_pageshift(raw), 3);
        assert_eq!(decode_version(raw), 1);
        assert_eq!(decode_flags(raw), PoolFlags::PERSIST | PoolFlags::SHARED);
    }

    #[test]
    fn test_generic_rejects_new_pool() {
        let args = GenericArgs::object(TmemOid::ZERO, 0);
        assert_eq!(
            TmemOp::generic(TmemCmd::NewPool, PoolId::new(1), args),
            Err(TmemError::InvalidCommand)
        );
    }

    #[test]
    fn test_encode_decode_page_op() {
        let oid = TmemOid::new([0xAA, 0xBB, 0xCC]);
        let op = TmemOp::generic(TmemCmd::PutPage, PoolId::new(7), GenericArgs::page(oid, 9, 0x1234))
            .unwrap();
        let raw = op.encode();
        assert_eq!(raw.cmd, 4);
        assert_eq!(raw.pool_id, 7);
        let gen = unsafe { raw.u.gen };
        assert_eq!(gen.oid, oid);
        assert_eq!(gen.index, 9);
        assert_eq!(gen.pfn, 0x1234);
        assert_eq!(gen.cli_id, TMEM_CLI);
        assert_eq!(raw.decode(), Ok(op));
    }

    #[test]
    fn test_encode_new_pool() {
        let op = TmemOp::new_pool(TMEM_CLI, 0x0100_0020);
        let raw = op.encode();
        assert_eq!(raw.cmd, 1);
        let new = unsafe { raw.u.new };
        assert_eq!(new.cli_id, TMEM_CLI);
        assert_eq!(new.flags, 0x0100_0020);
        assert_eq!(raw.decode(), Ok(op));
    }

    #[test]
    fn test_decode_unknown_command() {
        let mut raw = TmemOp::new_pool(TMEM_CLI, 0).encode();
        raw.cmd = 42;
        assert_eq!(raw.decode(), Err(TmemError::InvalidCommand));
    }

    #[test]
    fn test_status_normalization() {
        // O host devolve códigos deslocados de -1000
        assert_eq!(Status::from_raw(-1000), Status::SUCCESS);
        assert_eq!(Status::from_raw(-1001), Status::FAILURE);
        assert_eq!(Status::from_raw(-995).into_pool(), Ok(PoolId::new(5)));
        assert_eq!(Status::from_raw(0).into_result(), Err(TmemError::Host(1000)));
        assert_eq!(Status::FAILURE.into_pool(), Err(TmemError::Host(-1)));

        for code in [-7, -1, 0, 1, 5, 999] {
            let status = Status::from_raw(Status(code).to_raw());
            assert_eq!(status.code(), code);
        }
    }
}
