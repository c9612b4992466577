//! Token-stream linter that enforces a blank line before `return` and `continue` statements.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

mod cli;
mod lint;

mod prelude {
	pub use color_eyre::{Result, eyre};
}

use std::{env, io, process::ExitCode};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

/// Installs a stderr subscriber when `RUST_LOG` is set; otherwise logging stays off.
fn init_tracing() {
	if env::var_os("RUST_LOG").is_none() {
		return;
	}

	let _ = tracing_subscriber::registry()
		.with(fmt::layer().with_writer(io::stderr).with_target(true))
		.with(EnvFilter::from_default_env())
		.try_init();
}

fn main() -> ExitCode {
	if let Err(err) = color_eyre::install() {
		eprintln!("Failed to initialize error reporter: {err}.");

		return ExitCode::FAILURE;
	}

	init_tracing();

	match Cli::parse().run() {
		Ok(code) => code,
		Err(err) => {
			eprintln!("{err:?}");

			ExitCode::FAILURE
		},
	}
}
