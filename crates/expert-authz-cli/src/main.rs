// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator tool for the Expert Agent Platform authorization engine.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use expert_server_audit::{AuditedPolicyEngine, DecisionLogContext, DecisionLogger};
use expert_server_authz::{PolicyEngine, SharedPolicyEngine};
use expert_server_config::{
	load_from_sources, ConfigSource, DefaultsSource, EnvSource, LogFormat, LoggingConfig,
	OverrideSource, ServerConfig, TomlSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Evaluate authorization requests against the platform policy set.
#[derive(Parser, Debug)]
#[command(name = "expert-authz", about = "Expert Agent Platform authorization tool", version)]
struct Args {
	/// Config file to load instead of /etc/expert/server.toml
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Deployment environment (development, beta, gamma, production)
	#[arg(long, global = true)]
	environment: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Evaluate a request and print the decision. Exits 2 on deny.
	Check {
		/// Request JSON file, or `-` for stdin
		request: PathBuf,

		/// Org recorded in the decision log
		#[arg(long)]
		org: Option<String>,

		/// Agent recorded in the decision log
		#[arg(long)]
		agent: Option<String>,
	},
	/// Evaluate every policy against a request and print the trace
	Explain {
		/// Request JSON file, or `-` for stdin
		request: PathBuf,
	},
	/// List the policy set in evaluation order
	Policies,
}

fn load_config(args: &Args) -> anyhow::Result<ServerConfig> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(EnvSource)];

	match &args.config {
		Some(path) => sources.push(Box::new(TomlSource::new(path.clone()))),
		None => sources.push(Box::new(TomlSource::system())),
	}

	if let Some(environment) = &args.environment {
		sources.push(Box::new(OverrideSource::environment(environment.clone())));
	}

	load_from_sources(sources).context("failed to load configuration")
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

/// Flushes queued decision records before the process exits.
async fn shutdown(engine: AuditedPolicyEngine) {
	let logger = Arc::clone(engine.logger());
	drop(engine);
	match Arc::try_unwrap(logger) {
		Ok(logger) => logger.shutdown().await,
		Err(_) => tracing::warn!("decision logger still in use at exit; queued records may be lost"),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	let config = load_config(&args)?;
	init_tracing(&config.logging);

	tracing::debug!(environment = %config.authz.environment, "starting expert-authz");

	let engine = SharedPolicyEngine::new(PolicyEngine::new(config.authz.environment));

	let code = match args.command {
		Command::Policies => {
			print!("{}", commands::render_policies(engine.snapshot().policies()));
			ExitCode::SUCCESS
		}
		Command::Explain { request } => {
			let request = commands::read_request(&request)?;
			let audited = AuditedPolicyEngine::new(engine, Arc::new(DecisionLogger::disabled()));
			println!("{}", commands::explain(&audited, &request)?);
			ExitCode::SUCCESS
		}
		Command::Check {
			request,
			org,
			agent,
		} => {
			let request = commands::read_request(&request)?;
			let logger = DecisionLogger::from_config(&config.audit)?;
			let audited = AuditedPolicyEngine::new(engine, Arc::new(logger));

			let mut context = DecisionLogContext::new();
			if let Some(org) = org {
				context = context.org(org);
			}
			if let Some(agent) = agent {
				context = context.agent(agent);
			}

			let (json, decision) = commands::check(&audited, &request, &context)?;
			println!("{json}");
			shutdown(audited).await;
			commands::exit_code(&decision)
		}
	};

	Ok(code)
}
