//! # Transporte tmem
//!
//! Primitiva única e síncrona que entrega um registro de comando ao host e
//! devolve o código de status bruto. Sem fila, sem conclusão assíncrona.
//!
//! ```text
//! TmemClient ──encode──▶ RawTmemOp ──call()──▶ host ──▶ i64 (bruto)
//! ```
//!
//! Implementações:
//! - `KvmHypercall`: `vmcall` com o endereço físico do registro.
//! - `LocalStore`: host emulado dentro do guest (self-test e testes).

use super::proto::RawTmemOp;
use alloc::sync::Arc;

/// Canal guest -> host.
pub trait TmemTransport: Send + Sync {
    /// Entrega o comando e devolve o status bruto definido pelo host.
    ///
    /// O valor ainda não passou pela normalização de `proto::Status`.
    fn call(&self, op: &RawTmemOp) -> i64;
}

impl<T: TmemTransport + ?Sized> TmemTransport for &T {
    #[inline]
    fn call(&self, op: &RawTmemOp) -> i64 {
        (**self).call(op)
    }
}

impl<T: TmemTransport + ?Sized> TmemTransport for Arc<T> {
    #[inline]
    fn call(&self, op: &RawTmemOp) -> i64 {
        (**self).call(op)
    }
}
