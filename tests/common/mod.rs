//! Shared test helpers: a small epsilon-comparison free function so
//! every integration test file can import it.

pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}
