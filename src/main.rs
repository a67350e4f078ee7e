// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Storyboard: build film storyboards from the command line.
//!
//! Every command opens a project directory, applies one change and saves it
//! again. Panel positions on the command line are one-based.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

use storyboard::config::AppConfig;
use storyboard::export::shot_list::{self, ShotFilter, ShotListExporter};
use storyboard::export::Exporter;
use storyboard::panel::{Panel, PanelData};
use storyboard::project::{Project, PROJECT_FILE};
use storyboard::{Result, StoryboardError};

/// Storyboard CLI - film storyboards with PDF export
#[derive(Parser, Debug)]
#[command(name = "storyboard")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Assemble film storyboards and export them to PDF", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "storyboard.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty project directory
    New {
        /// Project directory
        dir: PathBuf,

        /// Project name (default: directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing project file
        #[arg(long)]
        force: bool,
    },

    /// List the panels of a project
    Show {
        /// Project directory or its data.json
        dir: PathBuf,
    },

    /// Add a panel
    Add {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Insert at this position instead of appending
        #[arg(long, value_parser = parse_position)]
        at: Option<usize>,

        #[command(flatten)]
        fields: PanelFields,
    },

    /// Add one panel per image matching the glob patterns
    Import {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Glob patterns, e.g. "boards/*.png"
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Change fields of an existing panel
    Edit {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Panel position
        #[arg(value_parser = parse_position)]
        position: usize,

        #[command(flatten)]
        fields: PanelFields,

        /// Remove the panel's image
        #[arg(long, conflicts_with = "image")]
        clear_image: bool,
    },

    /// Insert a copy of a panel right after it
    Duplicate {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Panel position
        #[arg(value_parser = parse_position)]
        position: usize,
    },

    /// Delete a panel
    Remove {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Panel position
        #[arg(value_parser = parse_position)]
        position: usize,
    },

    /// Move a panel to another position
    Move {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Current position
        #[arg(value_parser = parse_position)]
        from: usize,

        /// New position
        #[arg(value_parser = parse_position)]
        to: usize,
    },

    /// Move a panel one place earlier
    Up {
        /// Project directory or its data.json
        dir: PathBuf,

        #[arg(value_parser = parse_position)]
        position: usize,
    },

    /// Move a panel one place later
    Down {
        /// Project directory or its data.json
        dir: PathBuf,

        #[arg(value_parser = parse_position)]
        position: usize,
    },

    /// Export the storyboard as PDF
    Export {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Output PDF file
        output: PathBuf,

        /// Panels per row (overrides config)
        #[arg(long)]
        columns: Option<usize>,

        /// Rows per page (overrides config)
        #[arg(long)]
        rows: Option<usize>,

        /// Open the PDF afterwards
        #[arg(long)]
        open: bool,
    },

    /// List shots in shooting order, or export them as a PDF or XML shot list
    Shots {
        /// Project directory or its data.json
        dir: PathBuf,

        /// Only shots from this camera
        #[arg(long, conflicts_with_all = ["scene", "setup"])]
        camera: Option<String>,

        /// Only shots from this scene
        #[arg(long, conflicts_with = "setup")]
        scene: Option<String>,

        /// Only shots from this setup
        #[arg(long)]
        setup: Option<String>,

        /// Write the shot list here; `.xml` writes XML, anything else PDF
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the written file afterwards
        #[arg(long, requires = "output")]
        open: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "storyboard.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

/// Panel fields shared by `add` and `edit`
#[derive(Args, Debug, Default)]
struct PanelFields {
    /// Image file for the panel
    #[arg(long)]
    image: Option<PathBuf>,

    /// Shot number, e.g. 12A
    #[arg(long)]
    shot: Option<String>,

    /// Scene number
    #[arg(long)]
    scene: Option<String>,

    /// Camera setup
    #[arg(long)]
    camera: Option<String>,

    /// Lens, e.g. 85mm
    #[arg(long)]
    lens: Option<String>,

    /// Shot size: CLOSE UP, WIDE, MEDIUM, ...
    #[arg(long)]
    size: Option<String>,

    /// Shot type: OTS, BAR LVL, EYE LVL, ...
    #[arg(long = "type")]
    shot_type: Option<String>,

    /// Camera movement: STATIC, PUSH, ...
    #[arg(long = "move")]
    movement: Option<String>,

    /// Equipment: STICKS, GIMBAL, ...
    #[arg(long = "equip")]
    equipment: Option<String>,

    /// Action or dialogue
    #[arg(long)]
    action: Option<String>,

    /// Background action present
    #[arg(long, value_parser = ["yes", "no"])]
    bgd: Option<String>,

    /// Description printed under the panel
    #[arg(long)]
    description: Option<String>,

    /// Technical notes
    #[arg(long)]
    notes: Option<String>,

    /// Background action notes
    #[arg(long)]
    bgd_notes: Option<String>,

    /// Hair, makeup and wardrobe notes
    #[arg(long)]
    hair_makeup: Option<String>,

    /// Props notes
    #[arg(long)]
    props: Option<String>,

    /// VFX notes
    #[arg(long)]
    vfx: Option<String>,

    /// Setup number, groups shots for the shot list
    #[arg(long)]
    setup: Option<String>,

    /// Camera body or operator, e.g. fx30
    #[arg(long)]
    camera_name: Option<String>,

    /// Time to shoot, e.g. 20m
    #[arg(long)]
    time: Option<String>,

    /// Audio notes
    #[arg(long)]
    audio: Option<String>,

    /// Who is on screen
    #[arg(long)]
    subject: Option<String>,
}

impl PanelFields {
    fn into_data(self) -> PanelData {
        PanelData {
            shot_number: self.shot,
            scene_number: self.scene,
            camera: self.camera,
            lens: self.lens,
            size: self.size,
            shot_type: self.shot_type,
            movement: self.movement,
            equipment: self.equipment,
            action: self.action,
            background: self.bgd.map(|b| b == "yes"),
            description: self.description,
            notes: self.notes,
            bgd_notes: self.bgd_notes,
            hair_makeup: self.hair_makeup,
            props: self.props,
            vfx: self.vfx,
            setup_number: self.setup,
            camera_name: self.camera_name,
            shot_time: self.time,
            audio_notes: self.audio,
            subject: self.subject,
            image: self.image,
            clear_image: false,
        }
    }
}

/// One-based on the command line, zero-based inside
fn parse_position(raw: &str) -> std::result::Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("positions start at 1".to_string()),
        Ok(n) => Ok(n - 1),
        Err(e) => Err(format!("not a position: {}", e)),
    }
}

/// Report position errors with the numbers the user typed
fn one_based(err: StoryboardError) -> StoryboardError {
    match err {
        StoryboardError::NotFound { position, len } => StoryboardError::NotFound { position: position + 1, len },
        StoryboardError::Range { from, to, len } => StoryboardError::Range { from: from + 1, to: to + 1, len },
        other => other,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::New { dir, name, force } => run_new(&config, &dir, name, force),
        Commands::Show { dir } => run_show(&config, &dir, json),
        Commands::Add { dir, at, fields } => {
            edit_project(&config, &dir, json, |project| {
                let position = at.unwrap_or(project.len());
                project.insert_panel(position, fields.into_data()).map(Panel::clone)
            })
        }
        Commands::Import { dir, patterns } => run_import(&config, &dir, &patterns, json),
        Commands::Edit { dir, position, fields, clear_image } => {
            let mut data = fields.into_data();
            if clear_image {
                data = data.without_image();
            }
            edit_project(&config, &dir, json, |project| {
                project.update_panel(position, data).map(Panel::clone)
            })
        }
        Commands::Duplicate { dir, position } => {
            edit_project(&config, &dir, json, |project| project.duplicate_panel(position).map(Panel::clone))
        }
        Commands::Remove { dir, position } => {
            edit_project(&config, &dir, json, |project| project.remove_panel(position))
        }
        Commands::Move { dir, from, to } => {
            edit_project(&config, &dir, json, |project| {
                project.move_panel(from, to)?;
                Ok(project.panels()[to].clone())
            })
        }
        Commands::Up { dir, position } => {
            edit_project(&config, &dir, json, |project| {
                project.move_up(position)?;
                Ok(project.panels()[position - 1].clone())
            })
        }
        Commands::Down { dir, position } => {
            edit_project(&config, &dir, json, |project| {
                project.move_down(position)?;
                Ok(project.panels()[position + 1].clone())
            })
        }
        Commands::Export { dir, output, columns, rows, open } => {
            run_export(config, &dir, &output, columns, rows, open, json)
        }
        Commands::Shots { dir, camera, scene, setup, output, open } => {
            let filter = match (camera, scene, setup) {
                (Some(camera), _, _) => ShotFilter::Camera(camera),
                (_, Some(scene), _) => ShotFilter::Scene(scene),
                (_, _, Some(setup)) => ShotFilter::Setup(setup),
                _ => ShotFilter::All,
            };
            run_shots(&config, &dir, &filter, output.as_deref(), open, json)
        }
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

/// Load, apply one change, save, and report the affected panel
fn edit_project<F>(config: &AppConfig, dir: &Path, json: bool, change: F) -> Result<()>
where
    F: FnOnce(&mut Project) -> Result<Panel>,
{
    let mut project = Project::load_with_config(dir, config)?;
    let panel = change(&mut project).map_err(one_based)?;
    project.save(dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&panel)?);
    } else {
        println!("{} ({} panels in '{}')", describe(&panel), project.len(), project.name());
    }
    Ok(())
}

fn run_new(config: &AppConfig, dir: &Path, name: Option<String>, force: bool) -> Result<()> {
    if dir.join(PROJECT_FILE).exists() && !force {
        return Err(StoryboardError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already holds a project. Use --force to overwrite", dir.display()),
        )));
    }

    let mut project = Project::with_config(name.unwrap_or_default(), config);
    let file = project.save(dir)?;
    println!("Created project '{}' at {:?}", project.name(), file);
    Ok(())
}

fn run_show(config: &AppConfig, dir: &Path, json: bool) -> Result<()> {
    let project = Project::load_with_config(dir, config)?;

    if json {
        println!("{}", project.to_json()?);
        return Ok(());
    }

    println!("{} ({} panels)", project.name(), project.len());
    for panel in project.panels() {
        println!("  {:3}. {}", panel.order + 1, describe(panel));
        if !panel.action.is_empty() {
            println!("       ACTION: {}", panel.action);
        }
        if !panel.notes.is_empty() {
            println!("       NOTES: {}", panel.notes);
        }
    }
    Ok(())
}

fn run_import(config: &AppConfig, dir: &Path, patterns: &[String], json: bool) -> Result<()> {
    let mut project = Project::load_with_config(dir, config)?;

    let mut files = Vec::new();
    for pattern in patterns {
        let paths = glob::glob(pattern)
            .map_err(|e| StoryboardError::validation(format!("bad pattern {:?}: {}", pattern, e)))?;
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() && config.images.accepts(&path) => files.push(path),
                Ok(path) => debug!("Skipping {:?}", path),
                Err(e) => warn!("Cannot read {:?}: {}", e.path(), e.error()),
            }
        }
    }
    files.sort();
    files.dedup();

    if files.is_empty() {
        warn!("No images matched {:?}", patterns);
        return Ok(());
    }

    let mut added = Vec::with_capacity(files.len());
    for file in &files {
        let panel = project.add_panel(PanelData::new().with_image(file))?;
        added.push(panel.clone());
    }
    project.save(dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&added)?);
    } else {
        for panel in &added {
            println!("{}", describe(panel));
        }
        println!("Imported {} images ({} panels in '{}')", added.len(), project.len(), project.name());
    }
    Ok(())
}

fn run_export(
    mut config: AppConfig,
    dir: &Path,
    output: &Path,
    columns: Option<usize>,
    rows: Option<usize>,
    open: bool,
    json: bool,
) -> Result<()> {
    if let Some(columns) = columns {
        config.export.columns = columns;
    }
    if let Some(rows) = rows {
        config.export.rows = rows;
    }
    config.validate()?;

    let project = Project::load_with_config(dir, &config)?;
    let summary = Exporter::new(config.export.clone()).export(&project, output)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Exported {} panels on {} pages to {}",
            summary.panels,
            summary.pages,
            summary.path.display()
        );
    }

    if open {
        if let Err(e) = open_file(output) {
            error!("Failed to open {:?}: {}", output, e);
        }
    }
    Ok(())
}

fn run_shots(
    config: &AppConfig,
    dir: &Path,
    filter: &ShotFilter,
    output: Option<&Path>,
    open: bool,
    json: bool,
) -> Result<()> {
    let project = Project::load_with_config(dir, config)?;

    let Some(output) = output else {
        let shots = shot_list::select(&project, filter);
        if json {
            println!("{}", serde_json::to_string_pretty(&shots)?);
        } else {
            println!("{} ({} shots)", shot_list::shot_list_title(&project), shots.len());
            for panel in &shots {
                println!(
                    "  {:>6}  setup {:<3} {:<22} {}",
                    panel.full_shot_number(),
                    panel.setup_number,
                    panel.camera_label(),
                    panel.subject
                );
            }
        }
        return Ok(());
    };

    let exporter = ShotListExporter::new(config.export.clone());
    let is_xml = output
        .extension()
        .map(|e| e.eq_ignore_ascii_case("xml"))
        .unwrap_or(false);
    let summary = if is_xml {
        exporter.export_xml(&project, filter, output, Utc::now())?
    } else {
        exporter.export_pdf(&project, filter, output, Utc::now())?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Wrote {} shots to {}", summary.panels, summary.path.display());
    }

    if open {
        if let Err(e) = open_file(output) {
            error!("Failed to open {:?}: {}", output, e);
        }
    }
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!(
                "  Layout: {} x {} panels per page, {:?} {:?}",
                config.export.columns, config.export.rows, config.export.page_size, config.export.orientation
            );
            println!("  Image types: {}", config.images.extensions.join(", "));
        }
    }
    Ok(())
}

fn describe(panel: &Panel) -> String {
    let mut parts = vec![format!("{} - {}", panel.display_name(), panel.camera_label())];
    if !panel.scene_number.is_empty() {
        parts.push(format!("scene {} setup {}", panel.scene_number, panel.setup_number));
    }
    for value in [&panel.lens, &panel.size, &panel.shot_type, &panel.movement, &panel.equipment] {
        if !value.is_empty() {
            parts.push(value.clone());
        }
    }
    match panel.image_path {
        Some(ref image) => parts.push(format!("[{}]", image.display())),
        None => parts.push("[no image]".to_string()),
    }
    parts.join("  ")
}

fn open_file(path: &Path) -> std::io::Result<()> {
    info!("Opening {:?}", path);
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .arg("/c")
            .arg("start")
            .arg("")
            .arg(path)
            .spawn()?;
    }
    Ok(())
}
