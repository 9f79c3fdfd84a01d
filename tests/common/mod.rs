//! Common test utilities
#![allow(dead_code)]

use ndexec::ops::OpRegistry;
use ndexec::runtime::cpu::{CpuClient, ParallelismConfig};

/// Create a CPU client using every available hardware thread
pub fn create_cpu_client() -> CpuClient {
    CpuClient::new(ParallelismConfig::default()).unwrap()
}

/// Create a CPU client that never splits work below `min_elements` per task
pub fn create_cpu_client_with(max_threads: usize, min_elements: usize) -> CpuClient {
    CpuClient::new(ParallelismConfig::new(Some(max_threads), Some(min_elements))).unwrap()
}

/// Registry holding every built-in op
pub fn default_registry() -> OpRegistry {
    OpRegistry::with_defaults()
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert two f32 slices are close within tolerance
pub fn assert_allclose_f32(a: &[f32], b: &[f32], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}
