//! Citekit CLI - Command-line interface for citekey-driven note management
//!
//! Plays the host-editor role around `citekit-core`: every command calls one
//! core operation and renders the plain values it returns. Prompting for
//! rename conflicts happens here, on stdin.

use citekit_core::{
    config, load_documents, resolve, search, CitekeyIndex, Config, RenameDecision,
};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "citekit")]
#[command(about = "Citekey tools for research notes", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, env = "CITEKIT_CONFIG", default_value = "citekit.toml")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default citekit.toml
    Init,

    /// Validate a token against the configured citekey format
    Check {
        /// Candidate citekey
        token: String,
    },

    /// List citekeys across the note collection
    Keys {
        /// Only citekeys bound to a heading
        #[arg(long)]
        headings: bool,

        /// Citekeys read off content-directory file names instead
        #[arg(long)]
        files: bool,
    },

    /// Report citekeys cited in prose with no heading anywhere
    Orphans,

    /// List content files for a citekey
    Find {
        /// Citekey to look up
        citekey: String,

        /// Fail instead of listing when multiple files match
        #[arg(long)]
        one: bool,
    },

    /// List files waiting in the staging directory
    Stage,

    /// Rename a staged file to its canonical citekey name
    Rename {
        /// File in the staging directory
        staged: PathBuf,

        /// Citekey the file belongs to
        citekey: String,

        /// Take the proposed fallback name on conflict without prompting
        #[arg(long)]
        accept: bool,
    },

    /// Print the web search URL for a citekey
    Search {
        /// Citekey to search for
        citekey: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => cmd_init(&cli.config),
        Commands::Check { ref token } => cmd_check(&cli.config, token, cli.json),
        Commands::Keys { headings, files } => cmd_keys(&cli.config, headings, files, cli.json),
        Commands::Orphans => cmd_orphans(&cli.config, cli.json),
        Commands::Find { ref citekey, one } => cmd_find(&cli.config, citekey, one, cli.json),
        Commands::Stage => cmd_stage(&cli.config, cli.json),
        Commands::Rename {
            ref staged,
            ref citekey,
            accept,
        } => cmd_rename(&cli.config, staged, citekey, accept, cli.json),
        Commands::Search { ref citekey } => cmd_search(&cli.config, citekey),
    };

    if let Err(e) = result {
        if cli.json {
            let envelope = serde_json::json!({
                "code": error_code(&e),
                "message": e.to_string(),
            });
            eprintln!("{}", serde_json::to_string_pretty(&envelope).unwrap());
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

/// Stable error code for JSON output
fn error_code(e: &citekit_core::CitekitError) -> &'static str {
    use citekit_core::CitekitError::*;
    match e {
        NotFound { .. } => "not_found",
        AmbiguousSelection { .. } => "ambiguous_selection",
        InvalidCitekey(_) => "invalid_citekey",
        RenameConflict { .. } => "rename_conflict",
        MissingConfiguration(_) => "missing_configuration",
        Pattern(_) => "pattern",
        ConfigParse(_) => "config_parse",
        ConfigExists(_) => "config_exists",
        NotADirectory(_) => "not_a_directory",
        Io(_) => "io",
    }
}

/// Load the config file, falling back to defaults when it does not exist
fn load_config(path: &PathBuf) -> citekit_core::Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        tracing::debug!("no config at {}, using defaults", path.display());
        Ok(Config::default())
    }
}

fn load_notes(config: &Config) -> citekit_core::Result<Vec<citekit_core::Document>> {
    load_documents(config.notes_dir()?, &config.files.note_extension)
}

fn cmd_init(path: &PathBuf) -> citekit_core::Result<()> {
    use colored::Colorize;

    if path.exists() {
        return Err(citekit_core::CitekitError::ConfigExists(path.clone()));
    }
    std::fs::write(path, config::DEFAULT_CONFIG)?;
    println!("{} {}", "Created".green(), path.display());
    Ok(())
}

fn cmd_check(config_path: &PathBuf, token: &str, json: bool) -> citekit_core::Result<()> {
    use colored::Colorize;

    let config = load_config(config_path)?;
    let format = config.format()?;
    let valid = format.is_citekey(token);

    if json {
        println!(
            "{}",
            serde_json::json!({ "token": token, "valid": valid })
        );
    } else if valid {
        println!("{}: {}", "Valid".green(), token);
    } else {
        println!("{}: {}", "Invalid".red(), token);
    }
    if !valid {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_keys(
    config_path: &PathBuf,
    headings: bool,
    files: bool,
    json: bool,
) -> citekit_core::Result<()> {
    let config = load_config(config_path)?;

    let keys = if files {
        let format = config.format()?;
        resolve::all_file_citekeys(config.content_dir()?, &format)?
    } else {
        let mut index = CitekeyIndex::from_config(&config)?;
        let docs = load_notes(&config)?;
        if headings {
            index.heading_citekeys(&docs)
        } else {
            index.all_citekeys(&docs)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&keys).unwrap());
    } else {
        for key in &keys {
            println!("{}", key);
        }
        println!("({} citekeys)", keys.len());
    }
    Ok(())
}

fn cmd_orphans(config_path: &PathBuf, json: bool) -> citekit_core::Result<()> {
    use colored::Colorize;

    let config = load_config(config_path)?;
    let mut index = CitekeyIndex::from_config(&config)?;
    let docs = load_notes(&config)?;
    let report = index.orphan_report(&docs);

    if json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else if report.entries.is_empty() {
        println!("No orphan citekeys.");
    } else {
        for entry in &report.entries {
            println!("{}", entry.path.display().to_string().cyan());
            for key in &entry.citekeys {
                println!("  {}", key);
            }
        }
        let total: usize = report.entries.iter().map(|e| e.citekeys.len()).sum();
        println!("({} orphans)", total);
    }
    Ok(())
}

fn cmd_find(
    config_path: &PathBuf,
    citekey: &str,
    one: bool,
    json: bool,
) -> citekit_core::Result<()> {
    use colored::Colorize;

    let config = load_config(config_path)?;
    let key = config.format()?.parse(citekey)?;
    let content_dir = config.content_dir()?;
    let separators = &config.files.separators;
    let files = if one {
        vec![resolve::single_file_for_citekey(&key, content_dir, separators)?]
    } else {
        resolve::files_for_citekey(&key, content_dir, separators)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&files).unwrap());
    } else {
        for file in &files {
            println!("{}", file.display());
        }
        if files.len() > 1 {
            println!(
                "{}: {} candidates for {}, pick one",
                "Ambiguous".yellow(),
                files.len(),
                key
            );
        }
    }
    Ok(())
}

fn cmd_stage(config_path: &PathBuf, json: bool) -> citekit_core::Result<()> {
    let config = load_config(config_path)?;
    let files = resolve::stage_files(config.stage_dir()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files).unwrap());
    } else {
        for file in &files {
            println!("{}", file.display());
        }
        println!("({} staged files)", files.len());
    }
    Ok(())
}

fn cmd_rename(
    config_path: &PathBuf,
    staged: &PathBuf,
    citekey: &str,
    accept: bool,
    json: bool,
) -> citekit_core::Result<()> {
    use colored::Colorize;

    let config = load_config(config_path)?;
    let key = config.format()?.parse(citekey)?;

    let confirm = |proposed: &std::path::Path| {
        if accept {
            return RenameDecision::Accept;
        }
        eprintln!(
            "{}: target exists, proposed fallback: {}",
            "Conflict".yellow(),
            proposed.display()
        );
        eprint!("Enter to accept, new name to edit, 'q' to cancel: ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return RenameDecision::Cancel;
        }
        match line.trim() {
            "" => RenameDecision::Accept,
            "q" => RenameDecision::Cancel,
            edited => RenameDecision::Rename(edited.to_string()),
        }
    };

    let final_path = resolve::rename_staged_file(
        staged,
        &key,
        config.content_dir()?,
        &config.files.secondary_suffix,
        confirm,
    )?;

    if json {
        println!("{}", serde_json::json!({ "renamed_to": final_path }));
    } else {
        println!("{} {}", "Renamed to".green(), final_path.display());
    }
    Ok(())
}

fn cmd_search(config_path: &PathBuf, citekey: &str) -> citekit_core::Result<()> {
    let config = load_config(config_path)?;
    let format = config.format()?;
    let url = search::search_url(
        &format,
        citekey,
        &config.search.url,
        &config.search.groups,
        &config.search.delimiter,
    )?;
    println!("{}", url);
    Ok(())
}
