//! Message validation at the pool boundary.

use crate::{PoolError, PoolResult};
use trellis_primitives::SignedMessage;

/// Admission check run before a message enters the pool.
///
/// Validation here is *local*: it may only consult the message itself, never
/// chain state. State-dependent acceptability (nonce gaps, balances) is the
/// block validator's concern and changes with every head, whereas a failed
/// local check holds forever.
pub trait MessageValidator: Send + Sync {
    /// Validates a candidate message; an error keeps it out of the pool.
    fn validate(&self, message: &SignedMessage) -> PoolResult<()>;
}

/// The default validator: the signature must verify against the stated
/// sender.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct SignatureValidator;

impl MessageValidator for SignatureValidator {
    fn validate(&self, message: &SignedMessage) -> PoolResult<()> {
        if message.verify_signature() {
            Ok(())
        } else {
            Err(PoolError::InvalidSignature)
        }
    }
}
