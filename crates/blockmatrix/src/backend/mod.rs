//! Dense linear algebra backend.
//!
//! Leaves share faer's column-major layout, so products on leaves are
//! delegated to faer through zero-copy matrix views.

mod faer_interop;
mod gemm;

pub use faer_interop::AsFaerMat;
pub(crate) use gemm::gemm;
