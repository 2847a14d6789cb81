//! Kernel Library (KLib).
//!
//! Utilitários agnósticos de hardware para uso interno.

pub mod test_framework;

/// Verifica se um valor é potência de dois (zero não é).
#[inline]
pub const fn is_power_of_two(val: usize) -> bool {
    val != 0 && (val & (val - 1)) == 0
}
