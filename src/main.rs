// SPDX-License-Identifier: GPL-3.0-only

use checkin_scanner::Config;
use checkin_scanner::api::Role;
use checkin_scanner::api::types::NewUser;
use checkin_scanner::backends::camera::CameraBackendType;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "checkin-scanner")]
#[command(about = "Scan and verify event tickets at the entrance")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// API root URL (overrides config and CHECKIN_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token for staff endpoints (overrides CHECKIN_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Use image files in this directory as cameras instead of V4L2 devices
    #[arg(long, global = true)]
    source_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    Cameras,

    /// List events
    Events,

    /// Show one event by its registration slug
    Event {
        #[arg(long)]
        slug: String,
    },

    /// Run the scan console in the terminal
    Scan {
        /// Event id to check tickets for (default: last used)
        #[arg(short, long)]
        event: Option<String>,

        /// Camera id from 'checkin-scanner cameras' (default: last used)
        #[arg(short, long)]
        camera: Option<String>,
    },

    /// Verify one ticket without a camera
    Verify {
        #[arg(long)]
        customer: String,

        #[arg(long)]
        event: String,
    },

    /// Decode ticket QR codes from an image file
    Decode { image: PathBuf },

    /// Register a participant for an event
    Register {
        /// Registration slug of the event
        #[arg(long)]
        slug: String,

        #[arg(long)]
        nama: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        no_hp: String,

        #[arg(long)]
        alamat: String,

        /// Custom field answer as FIELD_ID=VALUE; repeat for checkbox options
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// Log in and remember the session token
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Manage events, participants and staff accounts (admin role)
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Create an event
    CreateEvent {
        #[arg(long)]
        nama: String,

        /// Event date as YYYY-MM-DD or RFC 3339
        #[arg(long)]
        date: String,

        #[arg(long)]
        lokasi: Option<String>,

        #[arg(long)]
        deskripsi: Option<String>,

        /// Card colour, e.g. #ffffff
        #[arg(long)]
        color: Option<String>,

        /// Registration question as KIND[*]:LABEL[:OPTION,...]; `*` marks it required
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// Delete an event
    DeleteEvent {
        #[arg(long)]
        id: String,
    },

    /// Remove a registered participant
    DeleteCustomer {
        #[arg(long)]
        id: String,
    },

    /// Create a staff account
    AddUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        nama: Option<String>,

        /// admin, petugas or viewer
        #[arg(long, default_value = "petugas")]
        role: Role,
    },

    /// Delete a staff account
    DeleteUser {
        #[arg(long)]
        id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=checkin_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // File < environment < flags
    let mut config = Config::load();
    config.apply_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(token) = cli.token {
        config.session_token = Some(token);
    }
    if let Some(dir) = cli.source_dir {
        config.backend = CameraBackendType::Files;
        config.image_dir = Some(dir);
    }

    match cli.command {
        Some(Commands::Cameras) => cli::list_cameras(&config),
        Some(Commands::Events) => cli::list_events(&config),
        Some(Commands::Event { slug }) => cli::show_event(&config, &slug),
        Some(Commands::Scan { event, camera }) => cli::scan(&config, event, camera),
        Some(Commands::Verify { customer, event }) => cli::verify(&config, &customer, &event),
        Some(Commands::Decode { image }) => cli::decode(&config, &image),
        Some(Commands::Register {
            slug,
            nama,
            email,
            no_hp,
            alamat,
            fields,
        }) => cli::register(
            &config,
            &slug,
            cli::Participant {
                nama,
                email,
                no_hp,
                alamat,
                fields,
            },
        ),
        Some(Commands::Login { email, password }) => cli::login(&config, &email, &password),
        Some(Commands::Admin { action }) => match action {
            AdminCommand::CreateEvent {
                nama,
                date,
                lokasi,
                deskripsi,
                color,
                fields,
            } => cli::create_event(
                &config,
                cli::EventDraft {
                    nama,
                    date,
                    lokasi,
                    deskripsi,
                    color,
                    fields,
                },
            ),
            AdminCommand::DeleteEvent { id } => cli::delete_event(&config, &id),
            AdminCommand::DeleteCustomer { id } => cli::delete_customer(&config, &id),
            AdminCommand::AddUser {
                email,
                password,
                nama,
                role,
            } => cli::add_user(
                &config,
                NewUser {
                    nama,
                    email,
                    password,
                    role,
                },
            ),
            AdminCommand::DeleteUser { id } => cli::delete_user(&config, &id),
        },
        None if config.last_event_id.is_some() => cli::scan(&config, None, None),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
