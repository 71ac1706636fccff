use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use coffer_store::{Encryption, NoEncryption};
use tracing::info;

use crate::chest::Chest;
use crate::config::CofferConfig;
use crate::error::ChestResult;
use crate::loader::Loader;

/// Opens named chests under one root directory.
///
/// Chests are opened once and shared: asking for the same name twice
/// returns the same [`Chest`], so listeners registered through one handle
/// see writes made through the other. Encryption and loader apply to
/// chests opened after they are set.
pub struct Coffer {
    config: CofferConfig,
    encryption: Arc<dyn Encryption>,
    loader: Option<Arc<dyn Loader>>,
    chests: Mutex<HashMap<String, Arc<Chest>>>,
}

impl Coffer {
    pub const DEFAULT_CHEST: &'static str = "default";

    pub fn new(config: CofferConfig) -> Self {
        Self {
            config,
            encryption: Arc::new(NoEncryption),
            loader: None,
            chests: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_encryption(mut self, encryption: Arc<dyn Encryption>) -> Self {
        self.encryption = encryption;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn config(&self) -> &CofferConfig {
        &self.config
    }

    /// The chest called `name`, opening it on first use.
    pub fn chest(&self, name: &str) -> ChestResult<Arc<Chest>> {
        let mut chests = self.chests.lock().expect("lock poisoned");
        if let Some(chest) = chests.get(name) {
            return Ok(Arc::clone(chest));
        }

        let mut chest = Chest::open(&self.config, name, Arc::clone(&self.encryption))?;
        if let Some(loader) = &self.loader {
            chest = chest.with_loader(Arc::clone(loader));
        }
        let chest = Arc::new(chest);
        chests.insert(name.to_string(), Arc::clone(&chest));
        info!(name, root = %self.config.root.display(), "chest opened");
        Ok(chest)
    }

    pub fn default_chest(&self) -> ChestResult<Arc<Chest>> {
        self.chest(Self::DEFAULT_CHEST)
    }

    /// Names of the chests opened so far, sorted.
    pub fn open_chests(&self) -> Vec<String> {
        let chests = self.chests.lock().expect("lock poisoned");
        let mut names: Vec<_> = chests.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for Coffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coffer")
            .field("config", &self.config)
            .field("open_chests", &self.open_chests())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use coffer_notify::{value_fn, Registration};
    use coffer_store::XChaChaEncryption;

    use super::*;
    use crate::error::ChestError;

    fn coffer(dir: &tempfile::TempDir) -> Coffer {
        Coffer::new(CofferConfig::at(dir.path()))
    }

    #[test]
    fn same_name_same_chest() {
        let dir = tempfile::tempdir().unwrap();
        let coffer = coffer(&dir);
        let a = coffer.chest("notes").unwrap();
        let b = coffer.chest("notes").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(coffer.open_chests(), vec!["notes"]);
    }

    #[test]
    fn listeners_are_shared_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let coffer = coffer(&dir);
        let seen = Arc::new(std::sync::Mutex::new(0));
        let sink = Arc::clone(&seen);
        coffer
            .default_chest()
            .unwrap()
            .subscribe(Registration::new(value_fn(move |_: &u8| {
                *sink.lock().unwrap() += 1;
            })));
        coffer.default_chest().unwrap().write("k", 1u8).unwrap();
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn chests_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let coffer = coffer(&dir);
        coffer.chest("a").unwrap().write("k", 1u8).unwrap();
        assert!(!coffer.chest("b").unwrap().exist("k").unwrap());
        assert!(dir.path().join("a").is_dir());
    }

    #[test]
    fn encryption_applies_to_opened_chests() {
        let dir = tempfile::tempdir().unwrap();
        let key = [7u8; 32];
        Coffer::new(CofferConfig::at(dir.path()))
            .with_encryption(Arc::new(XChaChaEncryption::new(key)))
            .default_chest()
            .unwrap()
            .write("k", "secret".to_string())
            .unwrap();

        let plain = coffer(&dir).default_chest().unwrap();
        assert!(plain.read::<String>("k").is_err());

        let keyed = Coffer::new(CofferConfig::at(dir.path()))
            .with_encryption(Arc::new(XChaChaEncryption::new(key)));
        let value = keyed.default_chest().unwrap().read::<String>("k").unwrap();
        assert_eq!(value.as_deref().map(String::as_str), Some("secret"));
    }

    struct Fixed;

    impl Loader for Fixed {
        fn load(&self, chest: &Chest, _request: &dyn Any, key: &str) -> ChestResult<()> {
            chest.write(key, 42u32)
        }
    }

    #[test]
    fn loader_is_handed_to_chests() {
        let dir = tempfile::tempdir().unwrap();
        let without = coffer(&dir).default_chest().unwrap();
        assert!(matches!(
            without.load(&(), "k").unwrap_err(),
            ChestError::MissingLoader
        ));

        let with = Coffer::new(CofferConfig::at(dir.path()))
            .with_loader(Arc::new(Fixed))
            .default_chest()
            .unwrap();
        with.load(&(), "k").unwrap();
        assert_eq!(*with.read::<u32>("k").unwrap().unwrap(), 42);
    }

    #[test]
    fn invalid_chest_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(coffer(&dir).chest("").is_err());
    }
}
