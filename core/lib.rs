/*!
This crate implements the datadee training pipeline for binary classification on tabular data. Call [`train`](train/fn.train.html) with a train csv and a test csv. It cross validates a small hyperparameter grid of gradient boosted trees, refits the best grid item on all the training rows, and writes the positive class probability for every test row.

The preprocessing is fit inside each fold, so the held out rows never influence the statistics they are transformed with.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod config;
pub mod cross_validation;
pub mod grid;
pub mod pipeline;
pub mod progress;
pub mod search;
pub mod submission;
pub mod train;

pub use self::{
	config::Config,
	pipeline::FittedPipeline,
	progress::{Progress, ProgressCounter, TrainProgress},
	train::{train, TrainArgs, TrainOutput},
};
