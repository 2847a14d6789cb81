use crate::mm::config::{is_aligned, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE};
use core::fmt;

/// Endereço físico (wrapper type-safe)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    /// Cria novo endereço físico
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Retorna o valor interno como u64
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Alinha para baixo ao início da página
    #[inline]
    pub const fn page_align_down(self) -> Self {
        Self(self.0 & PAGE_MASK)
    }

    /// Verifica alinhamento de página
    #[inline]
    pub const fn is_page_aligned(self) -> bool {
        is_aligned(self.0, PAGE_SIZE as u64)
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

/// Frame físico de página referenciado pelo PFN.
///
/// O conteúdo do frame é o buffer transferido de/para o host. O endereço
/// precisa permanecer estável durante toda a chamada ao tmem.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PageFrame(u64);

impl PageFrame {
    /// Frame a partir do número do frame (PFN)
    #[inline]
    pub const fn from_pfn(pfn: u64) -> Self {
        Self(pfn)
    }

    /// Frame que contém o endereço (alinhado para baixo)
    #[inline]
    pub const fn containing(addr: PhysAddr) -> Self {
        Self(addr.as_u64() >> PAGE_SHIFT)
    }

    /// Número do frame
    #[inline]
    pub const fn pfn(self) -> u64 {
        self.0
    }

    /// Endereço físico do início do frame
    #[inline]
    pub const fn start_address(self) -> PhysAddr {
        PhysAddr::new(self.0 << PAGE_SHIFT)
    }
}

impl fmt::Debug for PageFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageFrame(pfn={:#x})", self.0)
    }
}
