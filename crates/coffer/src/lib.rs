//! Coffer: a local persistent object store.
//!
//! Typed values are saved under string keys in named [`Chest`]es, with
//! optional encryption, an LRU cache of decoded values in front of the
//! files, and listeners notified whenever a matching key or type is
//! written.
//!
//! ```no_run
//! use coffer::{Coffer, CofferConfig, Registration, keyed_fn};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Clone, Serialize, Deserialize)]
//! #[serde(default)]
//! struct User {
//!     name: String,
//! }
//!
//! # fn main() -> coffer::ChestResult<()> {
//! let coffer = Coffer::new(CofferConfig::at("/tmp/app"));
//! let chest = coffer.default_chest()?;
//!
//! chest.subscribe(
//!     Registration::new(keyed_fn(|key: &str, user: &User| println!("{key}: {user:?}")))
//!         .key("user"),
//! );
//! chest.write("user", User { name: "Ada".into() })?;
//! let user = chest.read::<User>("user")?;
//! # Ok(())
//! # }
//! ```

pub mod chest;
pub mod coffer;
pub mod config;
pub mod error;
pub mod loader;
pub mod task;

pub use chest::{Chest, Persist};
pub use coffer::Coffer;
pub use config::CofferConfig;
pub use error::{ChestError, ChestResult};
pub use loader::Loader;

// Re-export the types applications touch directly.
pub use coffer_notify::{
    keyed_fn, value_fn, DataChangeListener, KeyFilter, ListenerId, Registration, Subscription,
    TypeTag,
};
pub use coffer_store::{Encryption, NoEncryption, StoreError, SyncMode, XChaChaEncryption};
