// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the subcommands.

use std::fmt::Write;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use base64::Engine;
use env_logger::Env;
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use dnsfuzz::message::writer::{self, to_wire_with, CompressionMode};
use dnsfuzz::message::Message;
use dnsfuzz::mutator::{Mutator, Seed};
use dnsfuzz::registry::Registry;
use dnsfuzz::scenario::{ScenarioCatalog, ScenarioParams};

use crate::args::{Args, Command, Format, ListArgs, MutateArgs, ScenarioArgs};
use crate::config::{self, Config, ConfigClass, ConfigType};

pub fn run(args: Args) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
}

fn try_running(args: Args) -> Result<()> {
    info!(
        "dnsfuzz v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );
    match args.command {
        Command::List(list_args) => list(list_args),
        Command::Mutate(mutate_args) => mutate(mutate_args),
        Command::Scenario(scenario_args) => scenario(scenario_args),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading the configuration from {}.", path.display());
            config::load_from_path(path).context("failed to load the configuration")
        }
        None => Ok(Config::default()),
    }
}

fn make_mutator(config: &Config, seed: Seed) -> Result<Mutator> {
    if config.strategies.is_empty() {
        Ok(Mutator::with_default_strategies(seed))
    } else {
        let registry = Registry::from_descriptors(&config.descriptors())
            .context("failed to set up the strategies")?;
        Ok(Mutator::with_registry(seed, registry))
    }
}

////////////////////////////////////////////////////////////////////////
// SUBCOMMANDS                                                        //
////////////////////////////////////////////////////////////////////////

fn list(args: ListArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mutator = make_mutator(&config, Seed::default())?;
    for info in mutator.list() {
        println!("{}", info);
    }
    Ok(())
}

fn mutate(args: MutateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Command-line arguments override the configuration file.
    if let Some(name) = args.name {
        config.query.name = name;
    }
    if let Some(ref qtype) = args.qtype {
        config.query.qtype = ConfigType(
            qtype
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid query type {}", qtype))?,
        );
    }
    if let Some(ref qclass) = args.qclass {
        config.query.qclass = ConfigClass(
            qclass
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid query class {}", qclass))?,
        );
    }
    if let Some(id) = args.id {
        config.query.id = Some(id);
    }
    if args.response {
        config.query.response = true;
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    let seed = match args.seed {
        Some(seed) => seed,
        None => config.seed.clone().map(Seed::from).unwrap_or_default(),
    };

    let mut mutator = make_mutator(&config, seed)?;
    let base = config.query.build();
    let chain = if args.chain.is_empty() {
        None
    } else {
        let names: Vec<&str> = args.chain.iter().map(|name| name.as_str()).collect();
        Some(
            mutator
                .create_chain(&names)
                .context("failed to create the strategy chain")?,
        )
    };
    let mode = if args.no_compression {
        CompressionMode::Disabled
    } else {
        CompressionMode::Enabled
    };

    for i in 0..args.count {
        let mutated = match chain {
            Some(ref chain) => mutator.run_chain(chain, &base),
            None => mutator
                .mutate(
                    &base,
                    args.strategy.as_ref().map(|name| name.as_str()),
                    config.rounds,
                )
                .context("failed to mutate the base message")?,
        };
        if args.history {
            // The record for this message is the most recent one.
            let strategies = mutator
                .history()
                .pop()
                .map(|record| record.strategies.join(", "))
                .unwrap_or_default();
            println!(";; message {}: {}", i + 1, strategies);
        }
        // Mutated messages often have no wire form; skip those rather
        // than ending the run.
        match render_message(&mutated, args.format, mode) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => warn!("Skipping message {}: {}.", i + 1, e),
        }
    }
    Ok(())
}

fn render_message(
    message: &Message,
    format: Format,
    mode: CompressionMode,
) -> Result<String, writer::Error> {
    match format {
        Format::Text => Ok(message.to_string()),
        Format::Hex => {
            let wire = to_wire_with(message, mode)?;
            let mut hex = String::with_capacity(wire.len() * 2);
            for octet in wire {
                write!(hex, "{:02x}", octet).unwrap();
            }
            Ok(hex)
        }
        Format::Base64 => {
            let wire = to_wire_with(message, mode)?;
            Ok(base64::engine::general_purpose::STANDARD.encode(wire))
        }
    }
}

fn scenario(args: ScenarioArgs) -> Result<()> {
    let seed = args.seed.unwrap_or_default();
    let mut rng = StdRng::seed_from_u64(seed.value());
    let params = ScenarioParams {
        zone: args.zone,
        query_name: args.query_name,
        chain_length: args.chain_length,
    };
    let catalog = ScenarioCatalog::new();
    info!(
        "Generating {} ({}).",
        args.scenario_type,
        catalog.describe(args.scenario_type)
    );
    for record in catalog.generate(&mut rng, args.scenario_type, &params) {
        println!("{}", record);
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use dnsfuzz::message::MessageBuilder;

    #[test]
    fn unserializable_messages_fail_only_in_wire_formats() {
        let blank = MessageBuilder::new()
            .question("example.com.", "", "IN")
            .build();
        assert!(render_message(&blank, Format::Hex, CompressionMode::Enabled).is_err());
        assert!(render_message(&blank, Format::Base64, CompressionMode::Enabled).is_err());
        assert!(render_message(&blank, Format::Text, CompressionMode::Enabled).is_ok());

        let query = Message::query("example.com.", "A");
        let hex = render_message(&query, Format::Hex, CompressionMode::Enabled).unwrap();
        assert_eq!(hex.len(), 2 * to_wire_with(&query, CompressionMode::Enabled).unwrap().len());
    }

    #[test]
    fn mutated_messages_render_or_fail_cleanly() {
        let base = Message::query("example.com.", "A");
        for seed in 0..100u64 {
            let mut mutator = Mutator::with_default_strategies(seed);
            for _ in 0..5 {
                let mutated = mutator.mutate(&base, None, 3).unwrap();
                let mode = CompressionMode::Disabled;
                if let Ok(hex) = render_message(&mutated, Format::Hex, mode) {
                    assert_eq!(hex.len() % 2, 0);
                    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
                }
                assert!(render_message(&mutated, Format::Text, mode).is_ok());
            }
        }
    }
}
