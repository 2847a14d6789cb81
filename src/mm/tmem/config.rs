//! # Configuração do tmem
//!
//! Constantes de protocolo (compartilhadas com o host) e os toggles de boot.

use crate::core::cmdline::CommandLine;

// =============================================================================
// CONSTANTES DE PROTOCOLO
// =============================================================================

/// Versão do protocolo anunciada na criação de pools
pub const TMEM_SPEC_VERSION: u32 = 1;

/// Client id do guest (sempre 1 do lado do guest)
pub const TMEM_CLI: u16 = 1;

/// Número do hypercall KVM que transporta comandos tmem
pub const KVM_HC_TMEM: u64 = 10;

/// Bit de persistência em `flags` (pools de swap)
pub const TMEM_POOL_PERSIST: u32 = 1;

/// Bit de compartilhamento em `flags` (filesystems montados por vários guests)
pub const TMEM_POOL_SHARED: u32 = 2;

/// Posição do código de tamanho de página em `flags`
pub const TMEM_POOL_PAGESIZE_SHIFT: u32 = 4;

/// Largura do código de tamanho de página (4 bits)
pub const TMEM_POOL_PAGESIZE_MASK: u32 = 0xF;

/// Posição da versão do protocolo em `flags`
pub const TMEM_VERSION_SHIFT: u32 = 24;

/// Largura da versão do protocolo (8 bits)
pub const TMEM_VERSION_MASK: u32 = 0xFF;

/// Menor página aceita pelo protocolo (código 0 = 4 KiB)
pub const TMEM_MIN_PAGE_SHIFT: u32 = 12;

/// Offset somado ao status bruto do transporte (ver `proto::Status`)
pub const TMEM_STATUS_BIAS: i64 = 1000;

// =============================================================================
// SWIZZLING (FRONTSWAP)
// =============================================================================

/// Bits do offset de swap levados para o oid.
/// Mais bits => mais objetos por tipo => mais concorrência no host.
pub const SWIZ_BITS: u32 = 4;

/// Máscara dos bits de swizzle
pub const SWIZ_MASK: u32 = (1 << SWIZ_BITS) - 1;

// =============================================================================
// TOGGLES DE BOOT
// =============================================================================

/// Quais backends do tmem são registrados.
///
/// | Parâmetro      | Efeito                            | Padrão |
/// |----------------|-----------------------------------|--------|
/// | `tmem`         | Habilita o subsistema             | off    |
/// | `nocleancache` | Não registra o backend cleancache | on     |
/// | `nofrontswap`  | Não registra o backend frontswap  | on     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmemConfig {
    pub enabled: bool,
    pub cleancache: bool,
    pub frontswap: bool,
}

impl TmemConfig {
    /// Subsistema desligado (padrão sem `tmem` na linha de comando)
    pub const DISABLED: Self = Self {
        enabled: false,
        cleancache: true,
        frontswap: true,
    };

    /// Tudo ligado
    pub const ALL: Self = Self {
        enabled: true,
        cleancache: true,
        frontswap: true,
    };

    /// Lê os toggles da linha de comando do kernel.
    pub fn from_cmdline(cmdline: &CommandLine) -> Self {
        Self {
            enabled: cmdline.has("tmem"),
            cleancache: !cmdline.has("nocleancache"),
            frontswap: !cmdline.has("nofrontswap"),
        }
    }

    /// Cleancache deve ser registrado?
    pub fn use_cleancache(&self) -> bool {
        self.enabled && self.cleancache
    }

    /// Frontswap deve ser registrado?
    pub fn use_frontswap(&self) -> bool {
        self.enabled && self.frontswap
    }
}

impl Default for TmemConfig {
    fn default() -> Self {
        Self::DISABLED
    }
}
