//! # Transporte KVM (hypercall)
//!
//! O registro de comando é escrito numa página física dedicada e o endereço
//! físico dela vai para o host em `rbx`; o número do hypercall vai em `rax`
//! e o status bruto volta em `rax`.
//!
//! ```text
//! rax = KVM_HC_TMEM
//! rbx = phys(registro)
//! vmcall
//! rax -> status bruto (com bias)
//! ```
//!
//! Stack e heap do kernel não estão no HHDM, então não dá para entregar o
//! endereço de um `RawTmemOp` local: ele é copiado para a página de comando,
//! protegida por lock (um comando em voo por vez).

use super::config::KVM_HC_TMEM;
use super::proto::{RawTmemOp, Status};
use super::transport::TmemTransport;
use crate::mm::addr::PageFrame;
use crate::mm::hhdm;
use core::ptr::NonNull;
use core::sync::atomic::{fence, Ordering};
use spin::Mutex;
use volatile::VolatileRef;

/// Transporte real para guests KVM.
pub struct KvmHypercall {
    nr: u64,
    page: Mutex<PageFrame>,
}

impl KvmHypercall {
    /// # Safety
    ///
    /// `page` precisa ser um frame de RAM exclusivo deste transporte,
    /// mapeado no HHDM, e o HHDM já deve estar inicializado.
    pub unsafe fn new(page: PageFrame) -> Self {
        Self {
            nr: KVM_HC_TMEM,
            page: Mutex::new(page),
        }
    }

    /// Número de hypercall alternativo (hosts com numeração própria)
    pub fn with_nr(mut self, nr: u64) -> Self {
        self.nr = nr;
        self
    }

    /// Número de hypercall em uso
    pub fn nr(&self) -> u64 {
        self.nr
    }
}

impl TmemTransport for KvmHypercall {
    fn call(&self, op: &RawTmemOp) -> i64 {
        let page = self.page.lock();

        if !hhdm::covers(page.start_address()) {
            crate::kerror!("(TMEM) Página de comando fora do HHDM");
            return Status::FAILURE.to_raw();
        }
        let Some(slot) = NonNull::new(hhdm::frame_ptr(*page).cast::<RawTmemOp>()) else {
            crate::kerror!("(TMEM) Página de comando sem mapeamento");
            return Status::FAILURE.to_raw();
        };

        // SAFETY: o frame é exclusivo deste transporte (contrato de `new`),
        // alinhado a página e o lock garante um único escritor.
        let mut record = unsafe { VolatileRef::new(slot) };
        record.as_mut_ptr().write(*op);

        // O host lê a página física assim que o vmcall trapa
        fence(Ordering::SeqCst);

        let phys = page.start_address().as_u64();
        // SAFETY: a página contém um registro completo; o host só lê o
        // registro e o frame indicado nele.
        unsafe { vmcall(self.nr, phys) }
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn vmcall(nr: u64, param: u64) -> i64 {
    let ret: u64;
    // rbx é reservado pelo LLVM: troca manual antes e depois
    core::arch::asm!(
        "xchg {param}, rbx",
        "vmcall",
        "xchg {param}, rbx",
        param = inout(reg) param => _,
        inout("rax") nr => ret,
        options(nostack)
    );
    ret as i64
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
unsafe fn vmcall(_nr: u64, _param: u64) -> i64 {
    Status::FAILURE.to_raw()
}
