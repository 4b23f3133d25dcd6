use std::{
    io::{Error, ErrorKind},
    sync::{LockResult, PoisonError},
};

pub fn io_error(reason: &str) -> Error { Error::new(ErrorKind::Other, reason) }

/// Lock guards stay usable after a writer panicked; every structure behind them is valid
/// between individual operations.
pub fn recover<G>(result: LockResult<G>) -> G { result.unwrap_or_else(PoisonError::into_inner) }
