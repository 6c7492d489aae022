use thiserror::Error;

/// Errors surfaced at the matching engine's API boundary.
///
/// Invariant violations (a resting order with `remaining_qty == 0`, an
/// `id_index` entry with no matching queue slot, ...) are programming bugs,
/// not runtime conditions, and are not represented here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
