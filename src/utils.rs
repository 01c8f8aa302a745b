//! Small helpers used across tests.
use crate::types::FloatNum;
use ndarray::{ArrayBase, Data, Dimension};

/// Panic if two arrays differ by more than a small tolerance
pub fn approx_eq<S, D, A>(result: &ArrayBase<S, D>, expected: &ArrayBase<S, D>)
where
    S: Data<Elem = A>,
    D: Dimension,
    A: FloatNum,
{
    let tol = A::from_f64(1e-6).unwrap();
    for (r, e) in result.iter().zip(expected.iter()) {
        if (*r - *e).abs() > tol {
            panic!("Large difference of values, got {} expected {}.", r, e);
        }
    }
}
