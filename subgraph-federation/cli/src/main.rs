use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context as _;
use apollo_compiler::Schema;
use clap::Parser;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;
use subgraph_federation::Configuration;
use subgraph_federation::Context;
use subgraph_federation::Federation;
use subgraph_federation::Object;
use subgraph_federation::ResolveInfo;
use subgraph_federation::RootValue;
use subgraph_federation::subgraph::entities;
use subgraph_federation::subgraph::spec::ENTITIES_QUERY;
use tracing_subscriber::EnvFilter;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
struct Args {
    /// The path to a YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Prints a schema extended with the federation definitions
    Extend {
        /// The path to the schema file, or `-` for stdin
        schema: PathBuf,
    },
    /// Lists the entity types of a schema, one per line
    Entities {
        /// The path to the schema file, or `-` for stdin
        schema: PathBuf,
    },
    /// Resolves `_entities` for a JSON list of representations
    Resolve {
        /// The path to the schema file, or `-` for stdin
        schema: PathBuf,
        /// The path to a JSON file holding the representations, or `-` for stdin.
        /// At most one of the two inputs can come from stdin.
        representations: PathBuf,
    },
    /// Prints the JSON schema of the configuration file
    ConfigSchema,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let federation = Federation::new(load_config(args.config.as_deref())?);
    let output = match args.command {
        Command::Extend { schema } => extend(&federation, &schema)?,
        Command::Entities { schema } => list_entities(&federation, &schema)?,
        Command::Resolve {
            schema,
            representations,
        } => resolve(&federation, &schema, &representations)?,
        Command::ConfigSchema => config_schema()?,
    };
    println!("{output}");
    Ok(())
}

fn is_stdin(input_path: &Path) -> bool {
    input_path == Path::new("-")
}

fn read_input(input_path: &Path) -> anyhow::Result<String> {
    if is_stdin(input_path) {
        io::read_to_string(io::stdin()).context("reading stdin")
    } else {
        fs::read_to_string(input_path)
            .with_context(|| format!("reading {}", input_path.display()))
    }
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<Configuration> {
    let Some(config_path) = config_path else {
        return Ok(Configuration::default());
    };
    let config = serde_yaml::from_str(&read_input(config_path)?)
        .with_context(|| format!("invalid configuration in {}", config_path.display()))?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn parse_schema(schema_path: &Path) -> anyhow::Result<Schema> {
    let input = read_input(schema_path)?;
    Schema::builder()
        .adopt_orphan_extensions()
        .parse(input, schema_path)
        .build()
        .map_err(|errors| anyhow::anyhow!("{}", errors.errors))
}

fn extend(federation: &Federation, schema_path: &Path) -> anyhow::Result<String> {
    let schema = parse_schema(schema_path)?;
    Ok(federation.extend_schema(&schema)?.to_string())
}

fn list_entities(federation: &Federation, schema_path: &Path) -> anyhow::Result<String> {
    let schema = federation.extend_schema(&parse_schema(schema_path)?)?;
    Ok(entities(&schema)
        .type_names()
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn resolve(
    federation: &Federation,
    schema_path: &Path,
    representations_path: &Path,
) -> anyhow::Result<String> {
    anyhow::ensure!(
        !(is_stdin(schema_path) && is_stdin(representations_path)),
        "the schema and the representations cannot both be read from stdin"
    );
    let subgraph = federation.build_subgraph(&parse_schema(schema_path)?)?;
    let representations: Value = serde_json::from_str(&read_input(representations_path)?)
        .context("representations must be JSON")?;

    let root_value = federation.add_resolvers_to_root_value(RootValue::new());
    let resolver = root_value
        .get(ENTITIES_QUERY.as_str())
        .context("the _entities resolver is registered")?;
    let args = Object::from_iter([(ByteString::from("representations"), representations)]);
    let info = ResolveInfo::for_root_field(&subgraph, ENTITIES_QUERY);
    let entities = resolver(&Value::Null, &args, &Context::new(), &info)?;

    Ok(serde_json::to_string_pretty(&entities)?)
}

fn config_schema() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&schemars::schema_for!(
        Configuration
    ))?)
}
