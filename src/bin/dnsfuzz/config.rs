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

//! Implements configuration loading.

use std::collections::HashSet;
use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use dnsfuzz::message::{Message, MessageBuilder, Qclass, Qtype};
use dnsfuzz::mutator::Seed;
use dnsfuzz::registry::{StrategyDescriptor, StrategyName};

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let config: Config =
        toml::from_slice(&raw_config).context("failed to parse the configuration file")?;
    config.validate()?;
    log_config_summary(&config);
    Ok(config)
}

fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let seed = match config.seed {
        Some(ref seed) => Seed::from(seed.clone()).to_string(),
        None => String::from("default"),
    };
    let mut message = format!(
        "Configuration loaded:\n\
         Seed:       {}\n\
         Rounds:     {}\n\
         Query:      {} {} {}{}\n\
         Strategies: ",
        seed,
        config.rounds,
        config.query.name,
        config.query.qclass.0,
        config.query.qtype.0,
        if config.query.response {
            " (response)"
        } else {
            ""
        },
    );
    if config.strategies.is_empty() {
        message.push_str("all built-in");
    } else {
        write!(message, "{} configured", config.strategies.len()).unwrap();
        for strategy in config.descriptors() {
            write!(message, "\n  {}", strategy.name).unwrap();
            if !strategy.enabled {
                message.push_str(" (disabled)");
            } else if let Some(weight) = strategy.weight {
                write!(message, " (weight {})", weight).unwrap();
            }
        }
    }
    debug!("{}", message);
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION STRUCTURES                                           //
////////////////////////////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub seed: Option<ConfigSeed>,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

fn default_rounds() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            rounds: default_rounds(),
            query: QueryConfig::default(),
            strategies: Vec::new(),
        }
    }
}

impl Config {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for strategy in &self.strategies {
            let name = strategy.name();
            if !seen.insert(name) {
                return Err(anyhow!("strategy {} is configured more than once", name));
            }
        }
        Ok(())
    }

    /// Returns the configured strategies as library descriptors. An
    /// empty list means that every built-in strategy should be used.
    pub fn descriptors(&self) -> Vec<StrategyDescriptor> {
        self.strategies.iter().map(Into::into).collect()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ConfigSeed {
    Int(u64),
    Text(String),
}

impl From<ConfigSeed> for Seed {
    fn from(seed: ConfigSeed) -> Self {
        match seed {
            ConfigSeed::Int(value) => Seed::Int(value),
            ConfigSeed::Text(text) => Seed::Text(text),
        }
    }
}

/// The base message that mutations start from.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    #[serde(default = "default_query_name")]
    pub name: String,
    #[serde(rename = "type", default = "default_query_type")]
    pub qtype: ConfigType,
    #[serde(rename = "class", default = "default_query_class")]
    pub qclass: ConfigClass,
    #[serde(default)]
    pub response: bool,
    pub id: Option<u16>,
}

fn default_query_name() -> String {
    String::from("example.com.")
}

fn default_query_type() -> ConfigType {
    ConfigType(Qtype::from(dnsfuzz::rr::Type::A))
}

fn default_query_class() -> ConfigClass {
    ConfigClass(Qclass::from(dnsfuzz::class::Class::IN))
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            name: default_query_name(),
            qtype: default_query_type(),
            qclass: default_query_class(),
            response: false,
            id: None,
        }
    }
}

impl QueryConfig {
    /// Builds the base message. A response carries one answer record
    /// for the question.
    pub fn build(&self) -> Message {
        let qtype = self.qtype.0.to_string();
        let qclass = self.qclass.0.to_string();
        let mut builder = MessageBuilder::new()
            .question(self.name.clone(), qtype.clone(), qclass.clone())
            .recursion_desired(!self.response);
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        if self.response {
            builder = builder.response(true).authoritative(true).answer(
                dnsfuzz::rr::Record::new(
                    self.name.clone(),
                    qtype,
                    qclass,
                    300,
                    default_rdata(self.qtype.0),
                ),
            );
        }
        builder.build()
    }
}

fn default_rdata(qtype: Qtype) -> &'static str {
    match qtype.to_string().as_str() {
        "AAAA" => "2001:db8::1",
        "NS" | "CNAME" | "PTR" => "ns1.example.com.",
        "MX" => "10 mail.example.com.",
        "TXT" => "\"dnsfuzz\"",
        _ => "192.0.2.1",
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StrategyConfig {
    Name(ConfigStrategyName),
    Entry(StrategyEntryConfig),
}

impl StrategyConfig {
    fn name(&self) -> &str {
        match self {
            Self::Name(name) => name.0.as_str(),
            Self::Entry(entry) => entry.name.0.as_str(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyEntryConfig {
    pub name: ConfigStrategyName,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub weight: Option<f64>,
}

fn default_enabled() -> bool {
    true
}

impl From<&StrategyConfig> for StrategyDescriptor {
    fn from(config: &StrategyConfig) -> Self {
        match config {
            StrategyConfig::Name(name) => StrategyDescriptor::enabled(name.0.clone()),
            StrategyConfig::Entry(entry) => StrategyDescriptor {
                name: entry.name.0.clone(),
                enabled: entry.enabled,
                weight: entry.weight,
            },
        }
    }
}

////////////////////////////////////////////////////////////////////////
// DESERIALIZABLE WRAPPERS OVER LIBRARY TYPES                         //
////////////////////////////////////////////////////////////////////////

/// Creates a deserializable wrapper over a type `$over` from
/// [`dnsfuzz`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`dnsfuzz`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigStrategyName, StrategyName, "strategy name");
make_serde_wrapper!(ConfigType, Qtype, "query type");
make_serde_wrapper!(ConfigClass, Qclass, "query class");

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
