use std::any::Any;

use crate::chest::Chest;
use crate::error::ChestResult;

/// Fills a chest from an external source.
///
/// `request` is whatever the application hands to [`Chest::load`], for
/// example a prepared HTTP call; the loader downcasts it, fetches, and writes
/// the result into `chest` under `key`, which notifies listeners as any other
/// write does.
pub trait Loader: Send + Sync {
    fn load(&self, chest: &Chest, request: &dyn Any, key: &str) -> ChestResult<()>;
}
