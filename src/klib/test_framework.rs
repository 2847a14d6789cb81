//! Framework de testes de boot
//!
//! Suites de `TestCase` executadas no próprio kernel (feature `self_test`),
//! com resultado enviado para a serial.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skip,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Contagem de uma suite executada
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Executa suite de testes
pub fn run_test_suite(_name: &str, tests: &[TestCase]) -> SuiteReport {
    crate::klog!("=== Executando suite: ");
    crate::klog!(_name);
    crate::knl!();

    let mut report = SuiteReport::default();

    for test in tests {
        match (test.func)() {
            TestResult::Pass => {
                crate::klog!("\x1b[32m[PASS]\x1b[0m ");
                report.passed += 1;
            }
            TestResult::Fail => {
                crate::klog!("\x1b[1;31m[FAIL]\x1b[0m ");
                report.failed += 1;
            }
            TestResult::Skip => {
                crate::klog!("\x1b[1;33m[SKIP]\x1b[0m ");
                report.skipped += 1;
            }
        }
        crate::klog!(test.name);
        crate::knl!();
    }

    crate::kinfo!("Resultados: passed=", report.passed);
    if report.failed > 0 {
        crate::kerror!("Resultados: failed=", report.failed);
    }
    report
}
