//! # Higher Half Direct Map (HHDM)
//!
//! Toda a RAM física do guest mapeada em uma região fixa do kernel space:
//! `virt = HHDM_OFFSET + phys`.
//!
//! O tmem usa o HHDM nos dois sentidos:
//! - `KvmHypercall` escreve o registro de comando na sua página dedicada
//!   pelo alias HHDM e entrega ao host o endereço físico;
//! - `LocalStore` (host emulado) acessa o conteúdo de um frame pelo PFN.
//!
//! ```text
//! 0xFFFF_8000_0000_0000 ─┬─────────────────────────
//!                        │ HHDM (Direct Map RAM)
//!                        │ phys_to_virt(p) = HHDM + p
//! 0xFFFF_9000_0000_0000 ─┴─────────────────────────
//! ```

use crate::mm::addr::{PageFrame, PhysAddr};
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Base do Higher Half Direct Map
pub const HHDM_BASE: u64 = 0xFFFF_8000_0000_0000;

/// Fim da região HHDM (16TB de RAM máximo suportado)
pub const HHDM_END: u64 = 0xFFFF_9000_0000_0000;

/// Tamanho máximo de RAM suportada (16TB)
pub const HHDM_MAX_SIZE: u64 = HHDM_END - HHDM_BASE;

// =============================================================================
// STATE
// =============================================================================

static HHDM_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Offset aplicado pelo bootloader (se diferente de HHDM_BASE)
static HHDM_OFFSET: AtomicU64 = AtomicU64::new(HHDM_BASE);

/// Inicializa o HHDM com o offset informado pelo bootloader
///
/// # Safety
///
/// Deve ser chamado durante early boot, antes de qualquer tradução.
/// Todo o intervalo `[offset, offset + RAM)` precisa estar mapeado.
pub unsafe fn init(offset: u64) {
    HHDM_OFFSET.store(offset, Ordering::Release);
    HHDM_INITIALIZED.store(true, Ordering::Release);
}

/// Verifica se o HHDM está inicializado
#[inline]
pub fn is_initialized() -> bool {
    HHDM_INITIALIZED.load(Ordering::Acquire)
}

/// O endereço físico está dentro da janela mapeada pelo HHDM?
///
/// Falso enquanto o HHDM não foi inicializado.
#[inline]
pub fn covers(phys: PhysAddr) -> bool {
    is_initialized() && phys.as_u64() < HHDM_MAX_SIZE
}

// =============================================================================
// ADDRESS CONVERSION
// =============================================================================

/// Converte endereço físico para virtual (HHDM)
#[inline(always)]
pub fn phys_to_virt<T>(phys: PhysAddr) -> *mut T {
    let offset = HHDM_OFFSET.load(Ordering::Relaxed);
    offset.wrapping_add(phys.as_u64()) as *mut T
}

/// Ponteiro para o primeiro byte do frame
#[inline(always)]
pub fn frame_ptr(frame: PageFrame) -> *mut u8 {
    phys_to_virt(frame.start_address())
}

// =============================================================================
// TESTS
// =============================================================================
