mod secret;
mod signing;

pub use secret::Secret;
pub use signing::{MissingSecretError, Signer, Tag, Verification, DELIMITER, TAG_LEN};
