pub mod error;
pub mod games;
pub mod process;

pub use error::{ArithmeticError, Error, Result, ShapeError};

#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;
