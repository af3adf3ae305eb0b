mod public;
mod secret;

pub use self::public::{PubKeyInner, PublicKey, PublicSubkey};
pub use self::secret::{SecretKey, SecretSubkey};
