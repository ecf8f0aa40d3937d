use crate::ml::TrainedModel;
use std::{
	collections::BTreeMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, RwLock,
	},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelVersion(pub u64);

impl std::fmt::Display for ModelVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::str::FromStr for ModelVersion {
	type Err = std::num::ParseIntError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse().map(ModelVersion)
	}
}

/// Every trained model is stored as a new immutable version. Readers clone the `Arc` and release the lock before using the model.
#[derive(Debug)]
pub struct ModelRegistry {
	models: RwLock<BTreeMap<ModelVersion, Arc<TrainedModel>>>,
	next_version: AtomicU64,
}

impl Default for ModelRegistry {
	fn default() -> Self {
		ModelRegistry {
			models: RwLock::new(BTreeMap::new()),
			next_version: AtomicU64::new(1),
		}
	}
}

impl ModelRegistry {
	pub fn insert(&self, model: TrainedModel) -> ModelVersion {
		let version = ModelVersion(self.next_version.fetch_add(1, Ordering::SeqCst));
		let mut models = self
			.models
			.write()
			.unwrap_or_else(|error| error.into_inner());
		models.insert(version, Arc::new(model));
		version
	}

	pub fn get(&self, version: ModelVersion) -> Option<Arc<TrainedModel>> {
		let models = self.models.read().unwrap_or_else(|error| error.into_inner());
		models.get(&version).cloned()
	}

	pub fn latest(&self) -> Option<(ModelVersion, Arc<TrainedModel>)> {
		let models = self.models.read().unwrap_or_else(|error| error.into_inner());
		models
			.iter()
			.next_back()
			.map(|(version, model)| (*version, model.clone()))
	}

	pub fn versions(&self) -> Vec<ModelVersion> {
		let models = self.models.read().unwrap_or_else(|error| error.into_inner());
		models.keys().copied().collect()
	}
}

#[test]
fn test_registry_versions_are_immutable() {
	let registry = ModelRegistry::default();
	assert!(registry.latest().is_none());
	let first = crate::ml::train_model(b"x,y\n1,2\n2,4\n3,6\n", "y").unwrap();
	let second = crate::ml::train_model(b"x,z,y\n1,0,1\n2,1,1\n3,0,2\n4,1,3\n", "y").unwrap();
	let v1 = registry.insert(first);
	let held = registry.get(v1).unwrap();
	let v2 = registry.insert(second);
	assert_eq!(v1, ModelVersion(1));
	assert_eq!(v2, ModelVersion(2));
	assert_eq!(registry.versions(), vec![v1, v2]);
	assert_eq!(held.feature_names, vec!["x"]);
	assert_eq!(registry.get(v1).unwrap().feature_names, vec!["x"]);
	let (latest, model) = registry.latest().unwrap();
	assert_eq!(latest, v2);
	assert_eq!(model.feature_names, vec!["x", "z"]);
	assert_eq!("2".parse::<ModelVersion>().unwrap(), v2);
}
