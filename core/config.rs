/*!
This module defines the `Config` struct, which is used to configure training with [`train`](../train/fn.train.html). Every field is optional. The defaults reproduce the reference pipeline: two interaction features, the `num_leaves` × `max_depth` grid `[31, 50, 70]` × `[10, 20, 30]`, five stratified folds without shuffling, and LightGBM's default tree options.
*/

use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	pub n_interaction_features: Option<usize>,
	pub grid: Option<GridConfig>,
	pub n_folds: Option<usize>,
	pub shuffle: Option<Shuffle>,
	pub tree: Option<TreeConfig>,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
	pub num_leaves: Option<Vec<usize>>,
	pub max_depth: Option<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Shuffle {
	Enabled(bool),
	Options { seed: u64 },
}

#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeConfig {
	pub learning_rate: Option<f32>,
	pub max_rounds: Option<usize>,
	pub min_examples_per_child: Option<usize>,
	pub min_sum_hessians_per_child: Option<f32>,
	pub min_gain_to_split: Option<f32>,
	pub l2_regularization: Option<f32>,
	pub max_valid_bins_for_number_features: Option<u8>,
	pub max_examples_for_computing_bin_thresholds: Option<usize>,
}

const DEFAULT_SEED: u64 = 42;

impl Config {
	/// Read a config file. Files ending in `.json` are parsed as json and everything else as yaml.
	pub fn from_path(config_path: &Path) -> Result<Config> {
		let config = std::fs::read_to_string(config_path)
			.with_context(|| format!("failed to read config file {}", config_path.display()))?;
		let is_json = config_path
			.extension()
			.map(|extension| extension == "json")
			.unwrap_or(false);
		let config = if is_json {
			serde_json::from_str(&config)
				.with_context(|| format!("failed to parse config file {}", config_path.display()))?
		} else {
			serde_yaml::from_str(&config)
				.with_context(|| format!("failed to parse config file {}", config_path.display()))?
		};
		Ok(config)
	}

	pub fn n_interaction_features(&self) -> usize {
		self.n_interaction_features.unwrap_or(2)
	}

	pub fn n_folds(&self) -> usize {
		self.n_folds.unwrap_or(5)
	}

	/// The seed for shuffling the fold assignment, or `None` when folds follow row order.
	pub fn shuffle_seed(&self) -> Option<u64> {
		match self.shuffle {
			None | Some(Shuffle::Enabled(false)) => None,
			Some(Shuffle::Enabled(true)) => Some(DEFAULT_SEED),
			Some(Shuffle::Options { seed }) => Some(seed),
		}
	}

	/// The base tree options that every grid item starts from.
	pub fn tree_options(&self) -> datadee_tree::TrainOptions {
		let defaults = datadee_tree::TrainOptions::default();
		let tree = self.tree.clone().unwrap_or_default();
		datadee_tree::TrainOptions {
			learning_rate: tree.learning_rate.unwrap_or(defaults.learning_rate),
			max_rounds: tree.max_rounds.unwrap_or(defaults.max_rounds),
			min_examples_per_child: tree
				.min_examples_per_child
				.unwrap_or(defaults.min_examples_per_child),
			min_sum_hessians_per_child: tree
				.min_sum_hessians_per_child
				.unwrap_or(defaults.min_sum_hessians_per_child),
			min_gain_to_split: tree.min_gain_to_split.unwrap_or(defaults.min_gain_to_split),
			l2_regularization: tree.l2_regularization.unwrap_or(defaults.l2_regularization),
			max_valid_bins_for_number_features: tree
				.max_valid_bins_for_number_features
				.unwrap_or(defaults.max_valid_bins_for_number_features),
			max_examples_for_computing_bin_thresholds: tree
				.max_examples_for_computing_bin_thresholds
				.unwrap_or(defaults.max_examples_for_computing_bin_thresholds),
			..defaults
		}
	}
}

#[test]
fn test_parse_yaml_config() {
	let config: Config = serde_yaml::from_str(
		"
n_folds: 3
shuffle:
  seed: 7
grid:
  num_leaves: [8]
tree:
  max_rounds: 10
",
	)
	.unwrap();
	insta::assert_debug_snapshot!(config, @r###"
Config {
    n_interaction_features: None,
    grid: Some(
        GridConfig {
            num_leaves: Some(
                [
                    8,
                ],
            ),
            max_depth: None,
        },
    ),
    n_folds: Some(
        3,
    ),
    shuffle: Some(
        Options {
            seed: 7,
        },
    ),
    tree: Some(
        TreeConfig {
            learning_rate: None,
            max_rounds: Some(
                10,
            ),
            min_examples_per_child: None,
            min_sum_hessians_per_child: None,
            min_gain_to_split: None,
            l2_regularization: None,
            max_valid_bins_for_number_features: None,
            max_examples_for_computing_bin_thresholds: None,
        },
    ),
}
"###);
	assert_eq!(config.shuffle_seed(), Some(7));
	assert_eq!(config.tree_options().max_rounds, 10);
	assert_eq!(config.n_interaction_features(), 2);
}

#[test]
fn test_parse_json_config_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("config.json");
	std::fs::write(&path, r#"{"shuffle": true, "n_interaction_features": 3}"#).unwrap();
	let config = Config::from_path(&path).unwrap();
	assert_eq!(config.shuffle_seed(), Some(DEFAULT_SEED));
	assert_eq!(config.n_interaction_features(), 3);
	assert_eq!(Config::default().shuffle_seed(), None);
}
