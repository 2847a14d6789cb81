//! # Configuração do Módulo de Memória
//!
//! Constantes de página compartilhadas pelo MM e pelo tmem.

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Bits de offset dentro de uma página
pub const PAGE_SHIFT: u32 = 12;

/// Máscara para alinhar endereços a página
pub const PAGE_MASK: u64 = !(PAGE_SIZE as u64 - 1);

/// Verifica se valor está alinhado
#[inline(always)]
pub const fn is_aligned(val: u64, align: u64) -> bool {
    val & (align - 1) == 0
}
