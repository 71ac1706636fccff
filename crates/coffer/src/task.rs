//! Async adapters: each runs the matching [`Chest`] operation on tokio's
//! blocking pool. Dropping a returned future abandons the result; the
//! operation itself still completes.

use std::sync::Arc;

use serde::Serialize;

use crate::chest::{Chest, Persist};
use crate::error::{ChestError, ChestResult};

async fn blocking<R, F>(f: F) -> ChestResult<R>
where
    R: Send + 'static,
    F: FnOnce() -> ChestResult<R> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ChestError::Task(e.to_string()))?
}

impl Chest {
    pub async fn put_async<T>(self: &Arc<Self>, key: impl Into<String>, value: T) -> ChestResult<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let chest = Arc::clone(self);
        let key = key.into();
        blocking(move || chest.write(&key, value)).await
    }

    pub async fn get_async<T: Persist>(
        self: &Arc<Self>,
        key: impl Into<String>,
    ) -> ChestResult<Option<Arc<T>>> {
        let chest = Arc::clone(self);
        let key = key.into();
        blocking(move || chest.read::<T>(&key)).await
    }

    pub async fn get_or_async<T: Persist>(
        self: &Arc<Self>,
        key: impl Into<String>,
        default: T,
    ) -> ChestResult<Arc<T>> {
        let chest = Arc::clone(self);
        let key = key.into();
        blocking(move || chest.read_or(&key, default)).await
    }

    pub async fn remove_async(self: &Arc<Self>, key: impl Into<String>) -> ChestResult<bool> {
        let chest = Arc::clone(self);
        let key = key.into();
        blocking(move || chest.delete(&key)).await
    }

    pub async fn remove_all_async(self: &Arc<Self>) -> ChestResult<usize> {
        let chest = Arc::clone(self);
        blocking(move || chest.delete_all()).await
    }

    pub async fn execute_async<T, F>(
        self: &Arc<Self>,
        key: impl Into<String>,
        default: T,
        f: F,
    ) -> ChestResult<Arc<T>>
    where
        T: Persist + Clone,
        F: FnOnce(&mut T) + Send + 'static,
    {
        let chest = Arc::clone(self);
        let key = key.into();
        blocking(move || chest.execute(&key, default, f)).await
    }
}
