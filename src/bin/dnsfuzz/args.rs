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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use dnsfuzz::mutator::Seed;
use dnsfuzz::registry::StrategyName;
use dnsfuzz::scenario::ScenarioType;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// A DNS message mutation engine for fuzzing
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the registered strategies
    List(ListArgs),

    /// Mutate a base message and print the results
    Mutate(MutateArgs),

    /// Print the records of a generated scenario
    Scenario(ScenarioArgs),
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Set the configuration file to use
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct MutateArgs {
    /// Set the configuration file to use
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Set the RNG seed (an integer, or text to hash)
    #[clap(long, value_name = "SEED")]
    pub seed: Option<Seed>,

    /// Set the query name of the base message
    #[clap(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Set the query type of the base message
    #[clap(long = "type", value_name = "TYPE")]
    pub qtype: Option<String>,

    /// Set the query class of the base message
    #[clap(long = "class", value_name = "CLASS")]
    pub qclass: Option<String>,

    /// Set the message ID of the base message
    #[clap(long, value_name = "ID")]
    pub id: Option<u16>,

    /// Make the base message a response
    #[clap(long)]
    pub response: bool,

    /// Set the number of messages to produce
    #[clap(long, default_value_t = 1, value_name = "N")]
    pub count: usize,

    /// Set the number of mutation rounds per message
    #[clap(long, value_name = "N")]
    pub rounds: Option<usize>,

    /// Apply only this strategy in every round
    #[clap(long, conflicts_with = "chain", value_name = "NAME")]
    pub strategy: Option<StrategyName>,

    /// Apply this comma-separated chain of strategies
    #[clap(long, value_delimiter = ',', value_name = "NAME,...")]
    pub chain: Vec<StrategyName>,

    /// Set the output format
    #[clap(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Serialize without name compression
    #[clap(long)]
    pub no_compression: bool,

    /// Print the strategies applied to each message
    #[clap(long)]
    pub history: bool,
}

#[derive(Debug, Parser)]
pub struct ScenarioArgs {
    /// The scenario to generate
    #[clap(value_name = "TYPE")]
    pub scenario_type: ScenarioType,

    /// Set the RNG seed (an integer, or text to hash)
    #[clap(long, value_name = "SEED")]
    pub seed: Option<Seed>,

    /// Set the zone (or parent zone, for delegations)
    #[clap(long, value_name = "NAME")]
    pub zone: Option<String>,

    /// Set the query name for authority/additional scenarios
    #[clap(long, value_name = "NAME")]
    pub query_name: Option<String>,

    /// Set the length of CNAME chains and loops
    #[clap(long, value_name = "N")]
    pub chain_length: Option<usize>,
}

/// How `mutate` prints messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    /// Presentation format
    Text,

    /// Hexadecimal wire format
    Hex,

    /// Base64 wire format
    Base64,
}
