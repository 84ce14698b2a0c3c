//! SoundKV CLI
//!
//! Command-line interface for a soundboard stored in a local data directory.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use soundkv::{Config, Result, SoundBoard};
use tracing_subscriber::{fmt, EnvFilter};

/// SoundKV CLI
#[derive(Parser, Debug)]
#[command(name = "soundkv-cli")]
#[command(about = "CLI for the SoundKV soundboard database")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./soundkv_data")]
    data_dir: String,

    /// Connection name used in log output
    #[arg(short, long, default_value = "soundkv-cli")]
    name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the id counters if they are missing
    Init,

    /// Create a sound
    CreateSound {
        name: String,

        /// Duration in seconds
        length: f64,

        /// Audio file reference
        file: String,

        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Create an empty category
    CreateCategory { name: String },

    /// Add a sound to a category
    Add { sound_id: u64, category_id: u64 },

    /// Remove a sound from a category
    Remove { category_id: u64, sound_id: u64 },

    /// Delete a sound and its references
    DeleteSound { id: u64 },

    /// Delete a category
    DeleteCategory { id: u64 },

    /// Rename a sound
    Rename { id: u64, name: String },

    /// List all sounds by name
    Sounds,

    /// List all categories by name
    Categories,

    /// List the sounds in a category
    CategorySounds { category_id: u64 },

    /// List the categories containing a sound
    SoundCategories { sound_id: u64 },

    /// Show one sound
    Sound { id: u64 },

    /// Case-insensitive substring search
    Search { query: String },

    /// Number of sounds
    Count,

    /// Map a user to a join sound
    SetJoin { user: String, sound_id: u64 },

    /// Show a user's join sound
    GetJoin { user: String },

    /// Remove a user's join sound
    RemoveJoin { user: String },

    /// Write a snapshot and truncate the WAL
    Checkpoint,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,soundkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .connection_name(args.name.clone())
        .build();

    let board = match SoundBoard::open(config) {
        Ok(board) => board,
        Err(e) => {
            tracing::error!("Failed to open store at {}: {}", args.data_dir, e);
            std::process::exit(1);
        }
    };

    let outcome = run(&board, args.command);
    if let Err(e) = board.close() {
        tracing::error!("Failed to close store: {}", e);
        std::process::exit(1);
    }

    match outcome {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                tracing::error!("Failed to encode output: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(board: &SoundBoard, command: Commands) -> Result<Value> {
    let value = match command {
        Commands::Init => {
            board.initialize()?;
            json!({ "initialized": true })
        }
        Commands::CreateSound { name, length, file, owner } => {
            serde_json::to_value(board.create_sound(&name, length, &file, owner.as_deref())?)?
        }
        Commands::CreateCategory { name } => serde_json::to_value(board.create_category(&name)?)?,
        Commands::Add { sound_id, category_id } => {
            board.add_sound_to_category(sound_id, category_id)?;
            json!({ "added": true })
        }
        Commands::Remove { category_id, sound_id } => {
            let outcome = board.remove_sound_from_category(category_id, sound_id)?;
            json!({
                "removed": outcome.removed,
                "category_deleted": outcome.category_deleted,
            })
        }
        Commands::DeleteSound { id } => {
            board.delete_sound(id)?;
            json!({ "deleted": id })
        }
        Commands::DeleteCategory { id } => {
            board.delete_category(id)?;
            json!({ "deleted": id })
        }
        Commands::Rename { id, name } => serde_json::to_value(board.rename_sound(id, &name)?)?,
        Commands::Sounds => serde_json::to_value(board.get_sounds()?)?,
        Commands::Categories => serde_json::to_value(board.get_categories()?)?,
        Commands::CategorySounds { category_id } => {
            serde_json::to_value(board.get_sounds_in_category(category_id)?)?
        }
        Commands::SoundCategories { sound_id } => {
            serde_json::to_value(board.get_categories_for_sound(sound_id)?)?
        }
        Commands::Sound { id } => serde_json::to_value(board.get_sound_by_id(id)?)?,
        Commands::Search { query } => serde_json::to_value(board.search_sounds(&query)?)?,
        Commands::Count => json!(board.get_sounds_number()?),
        Commands::SetJoin { user, sound_id } => {
            board.set_joinsound(&user, sound_id)?;
            json!({ "user": user, "sound_id": sound_id })
        }
        Commands::GetJoin { user } => serde_json::to_value(board.get_joinsound(&user)?)?,
        Commands::RemoveJoin { user } => json!({ "removed": board.remove_joinsound(&user)? }),
        Commands::Checkpoint => {
            board.checkpoint()?;
            json!({ "checkpoint": true })
        }
    };
    Ok(value)
}
