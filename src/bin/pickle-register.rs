use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use text_pipeliner::registry::parse_id_subset;
use text_pipeliner::{EntryPayload, ModelLoader, PickleRegister};

#[derive(Parser, Debug)]
#[clap(
    name = "pickle-register",
    about = "Maintain the pipeline register used by text-pipeliner"
)]
struct Args {
    /// Register JSON document
    #[clap(short, long, default_value = "./pipeliner/register.json")]
    register: PathBuf,

    /// Directory holding the pipeline artifacts
    #[clap(short, long, default_value = "./pipeliner/store")]
    store: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[clap(long, default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an empty register, replacing any existing one
    Init,

    /// Register a payload file
    Add {
        /// Payload JSON (name, answer_key, components, ...)
        payload: PathBuf,

        #[clap(short, long, default_value = "pipeline")]
        pickletype: String,

        /// Register under this id instead of the payload name
        #[clap(long)]
        id: Option<String>,
    },

    /// Replace an entry with a full entry file (id, pickletype, payload)
    Update { entry: PathBuf },

    /// Remove an entry
    Delete {
        id: String,

        /// Fail if the id is not registered
        #[clap(long)]
        strict: bool,
    },

    /// Print the register, optionally only one pickletype
    List {
        #[clap(short, long)]
        pickletype: Option<String>,
    },

    /// Load artifacts to check they decode
    Check {
        /// JSON array of ids to load instead of the whole register; an empty
        /// array loads the whole register
        #[clap(long)]
        subset: Option<String>,
    },

    /// Write a payload describing an artifact in the store
    Describe {
        /// Artifact id (file name inside the store)
        artifact: String,

        /// Labels in class index order, comma separated
        #[clap(short, long, value_delimiter = ',', required = true)]
        categories: Vec<String>,

        #[clap(long)]
        score: Option<f64>,

        /// JSON file with the search parameters used for tuning
        #[clap(long)]
        search_params: Option<PathBuf>,

        #[clap(short, long, default_value = "")]
        description: String,

        /// Where to write the payload (stdout if omitted)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Init => {
            PickleRegister::load(&args.register, &args.store, true)?;
            eprintln!("Created empty register at {:?}", args.register);
        }
        Command::Add {
            payload,
            pickletype,
            id,
        } => {
            let mut register = open(&args.register, &args.store)?;
            let entry = register
                .new_entry_from_path(&payload, &pickletype, id.as_deref())
                .with_context(|| format!("Failed to register {:?}", payload))?;
            eprintln!("Registered '{}' as {}", entry.id, entry.pickletype);
        }
        Command::Update { entry } => {
            let mut register = open(&args.register, &args.store)?;
            register
                .update_entry_from_path(&entry)
                .with_context(|| format!("Failed to update from {:?}", entry))?;
            eprintln!("Updated entry from {:?}", entry);
        }
        Command::Delete { id, strict } => {
            let mut register = open(&args.register, &args.store)?;
            register.delete_entry(&id, strict)?;
            eprintln!("Deleted '{}'", id);
        }
        Command::List { pickletype } => {
            let register = open(&args.register, &args.store)?;
            let listing = match pickletype {
                None => serde_json::to_value(register.document())?,
                Some(pickletype) => {
                    let ids = register
                        .ids_by_type(&pickletype)
                        .with_context(|| format!("No entries of pickletype '{}'", pickletype))?;
                    let entries: Vec<_> = ids.iter().filter_map(|id| register.get(id)).collect();
                    serde_json::to_value(entries)?
                }
            };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Check { subset } => {
            let register = open(&args.register, &args.store)?;
            let subset = subset
                .map(|raw| -> Result<Vec<String>> {
                    let value: Value =
                        serde_json::from_str(&raw).context("--subset is not valid JSON")?;
                    Ok(parse_id_subset(&value)?)
                })
                .transpose()?;

            let models = register.load_pickles(subset.as_deref())?;
            let mut ids: Vec<_> = models.keys().collect();
            ids.sort();
            for id in ids {
                println!("{}", id);
            }
            eprintln!("{} artifact(s) loaded", models.len());
        }
        Command::Describe {
            artifact,
            categories,
            score,
            search_params,
            description,
            output,
        } => {
            let pipeline = ModelLoader::new(&args.store)
                .load_pipeline(&artifact)
                .with_context(|| format!("Failed to load artifact '{}'", artifact))?;

            if categories.len() != pipeline.classes().len() {
                anyhow::bail!(
                    "Artifact '{}' predicts {} classes but {} categories were given",
                    artifact,
                    pipeline.classes().len(),
                    categories.len()
                );
            }

            let search_params = match search_params {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {:?}", path))?;
                    serde_json::from_str::<Value>(&content)
                        .with_context(|| format!("Failed to parse {:?}", path))?
                }
                None => Value::Null,
            };

            let payload = EntryPayload::from_pipeline(
                artifact,
                &pipeline,
                &categories,
                score,
                search_params,
                description,
            );
            let json = serde_json::to_string_pretty(&payload)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    eprintln!("Payload written to {:?}", path);
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

fn open(register: &Path, store: &Path) -> Result<PickleRegister> {
    PickleRegister::load(register, store, false)
        .with_context(|| format!("Failed to open register {:?}", register))
}
