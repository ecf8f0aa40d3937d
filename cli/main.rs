//! This module contains the main entrypoint to the datadee cli.

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[cfg(feature = "app")]
mod app;
mod logging;
#[cfg(feature = "train")]
mod train;

#[derive(Parser)]
#[clap(about = "Train a loan default classifier and serve the datadee demo app.")]
enum Options {
	#[cfg(feature = "train")]
	#[clap(name = "train")]
	Train(Box<TrainOptions>),
	#[cfg(feature = "app")]
	#[clap(name = "app")]
	App(Box<AppOptions>),
}

#[derive(Parser, Debug)]
#[clap(about = "train a model and write a submission")]
#[clap(
	long_about = "cross validate a grid of gradient boosted tree classifiers on the train file, refit the best one, and write its predictions for the test file"
)]
pub struct TrainOptions {
	#[clap(
		long,
		default_value = "playground-series-s4e10",
		help = "the directory holding train.csv and test.csv"
	)]
	data_dir: PathBuf,
	#[clap(long, help = "the path to the .csv file used for training, instead of <data-dir>/train.csv")]
	file_train: Option<PathBuf>,
	#[clap(long, help = "the path to the .csv file to predict, instead of <data-dir>/test.csv")]
	file_test: Option<PathBuf>,
	#[clap(short, long, default_value = "loan_status", help = "the name of the column to predict")]
	target: String,
	#[clap(long, default_value = "id", help = "the name of the id column")]
	id_column: String,
	#[clap(short, long, default_value = "submission.csv", help = "the path to write the submission to")]
	output: PathBuf,
	#[clap(short, long, help = "the path to a .json or .yaml config file")]
	config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[clap(about = "run the app")]
#[clap(long_about = "run the demo web app with the linear regression and tappd tabs")]
pub struct AppOptions {
	#[clap(long, default_value = "0.0.0.0")]
	host: std::net::IpAddr,
	#[clap(long, env = "PORT", default_value = "8000")]
	port: u16,
	#[clap(long, env = "DSTACK_SIMULATOR_ENDPOINT")]
	tappd_endpoint: Option<String>,
	#[clap(long, default_value = "10")]
	tappd_timeout_secs: u64,
}

fn main() {
	logging::init();
	let options = Options::parse();
	let result = match options {
		#[cfg(feature = "train")]
		Options::Train(options) => self::train::train(*options),
		#[cfg(feature = "app")]
		Options::App(options) => self::app::app(*options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}
