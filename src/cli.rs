// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the check-in scanner
//!
//! This module provides command-line functionality for:
//! - Listing cameras and events
//! - Running the terminal scan console
//! - One-off ticket verification and QR decoding
//! - Participant registration and staff login
//! - Event, participant and staff administration

use checkin_scanner::api::types::{NewEvent, NewUser, Role};
use checkin_scanner::api::{ApiClient, Session};
use checkin_scanner::backends::camera::file_source::load_image_as_frame;
use checkin_scanner::backends::camera::{
    BackendError, CameraSessionManager, get_backend_for_type,
};
use checkin_scanner::checkin::{CheckInVerifier, DecodedTicket};
use checkin_scanner::frame_processor::{PayloadDecoder, QrDetector};
use checkin_scanner::registration::{CustomField, FieldValue, RegistrationForm};
use checkin_scanner::{Config, ScanError, terminal};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Participant details given on the command line
pub struct Participant {
    pub nama: String,
    pub email: String,
    pub no_hp: String,
    pub alamat: String,
    pub fields: Vec<String>,
}

/// Event details given on the command line
pub struct EventDraft {
    pub nama: String,
    pub date: String,
    pub lokasi: Option<String>,
    pub deskripsi: Option<String>,
    pub color: Option<String>,
    pub fields: Vec<String>,
}

fn api_client(config: &Config) -> Result<ApiClient, Box<dyn std::error::Error>> {
    let client = ApiClient::new(&config.api_base_url, config.request_timeout())?;
    let Some(token) = &config.session_token else {
        return Ok(client);
    };

    let session = match Session::from_token(token.clone()) {
        Ok(session) => {
            if session.is_expired(Utc::now()) {
                warn!("Saved session has expired, run 'checkin-scanner login' again");
            }
            session
        }
        Err(e) => {
            warn!(error = %e, "Could not read session token, sending it as-is");
            Session::with_role(token.clone(), "", Role::default())
        }
    };
    Ok(client.with_session(session))
}

fn camera_manager(config: &Config) -> CameraSessionManager {
    let backend = get_backend_for_type(config.backend, Some(config.image_dir_or_default()));
    CameraSessionManager::new(backend, config.capture_settings())
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> CliResult {
    let manager = camera_manager(config);

    let cameras = match manager.list_cameras() {
        Ok(cameras) => cameras,
        Err(BackendError::NoCameraFound) => {
            println!("No cameras found.");
            return Ok(());
        }
        Err(e) => return Err(Box::new(ScanError::from(e))),
    };

    println!("Available cameras ({}):", manager.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.label);
        println!("      Id: {}", camera.id);
    }

    Ok(())
}

/// List events with their registration counts
pub fn list_events(config: &Config) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(print_events(&client))
}

async fn print_events(client: &ApiClient) -> CliResult {
    let events = client.list_events().await?;
    if events.is_empty() {
        println!("No events.");
        return Ok(());
    }

    let now = Utc::now();
    for event in &events {
        let count = match client.event_count(&event.id).await {
            Ok(count) => count.count.to_string(),
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Failed to fetch registration count");
                "?".to_string()
            }
        };
        let state = if event.registration_open(now) {
            "open"
        } else {
            "closed"
        };
        println!(
            "{}  {}  {}  ({} registered, {})",
            event.id,
            event.tanggal.format("%Y-%m-%d"),
            event.nama,
            count,
            state
        );
    }
    Ok(())
}

/// Show one event and its registration form
pub fn show_event(config: &Config, slug: &str) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let event = rt.block_on(client.event_by_slug(slug))?;

    println!("{}", event.nama);
    println!("  Id:       {}", event.id);
    println!("  Date:     {}", event.tanggal.format("%Y-%m-%d %H:%M UTC"));
    if let Some(lokasi) = &event.lokasi {
        println!("  Location: {}", lokasi);
    }
    if let Some(path) = event.registration_path() {
        println!("  Register: {}", path);
    }
    println!(
        "  Registration is {}",
        if event.registration_open(Utc::now()) {
            "open"
        } else {
            "closed"
        }
    );

    if !event.custom_fields.is_empty() {
        println!();
        println!("  Extra fields:");
        for field in &event.custom_fields {
            let required = if field.required { " (required)" } else { "" };
            print!("    {} [{}] {}{}", field.field_id, field.kind.name(), field.label, required);
            if let Some(options) = field.kind.options() {
                print!(": {}", options.join(" / "));
            }
            println!();
        }
    }

    Ok(())
}

/// Run the terminal scan console
pub fn scan(config: &Config, event: Option<String>, camera: Option<String>) -> CliResult {
    let client = api_client(config)?;
    if let Some(session) = client.session()
        && !session.role.can_scan()
    {
        return Err(format!("Role '{}' may not check in tickets", session.role).into());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let events = match rt.block_on(client.list_events()) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "Failed to load events");
            Vec::new()
        }
    };

    // Verification tasks are spawned from the console loop
    let _guard = rt.enter();
    let mut verifier = CheckInVerifier::new(camera_manager(config), client);

    verifier.refresh_cameras();
    let wanted_camera = camera
        .or_else(|| config.last_camera_path.clone())
        .filter(|id| verifier.cameras().iter().any(|c| &c.id == id));
    if let Some(id) = wanted_camera {
        verifier.select_camera(id);
    }
    if let Some(id) = event.or_else(|| config.last_event_id.clone()) {
        verifier.select_event(Some(id));
    }

    info!("Starting scan console");
    let selection = terminal::run(&mut verifier, &events)?;
    drop(verifier);

    let saved = Config::update(|stored| {
        stored.last_event_id = selection.event_id;
        if selection.camera_id.is_some() {
            stored.last_camera_path = selection.camera_id;
        }
    });
    if let Err(e) = saved {
        warn!(error = %e, "Failed to remember scanner selection");
    }

    Ok(())
}

/// Verify one ticket and print the verdict
pub fn verify(config: &Config, customer_id: &str, event_id: &str) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;

    match rt.block_on(client.verify_ticket(customer_id, event_id)).map_err(ScanError::from) {
        Ok(result) if result.success => {
            println!("Accepted: {}", result.message);
            if let Some(customer) = result.customer {
                println!("  Name:  {}", customer.nama);
                println!("  Email: {}", customer.email);
                println!("  Phone: {}", customer.no_hp);
            }
            Ok(())
        }
        Ok(result) => {
            println!("Refused: {}", result.message);
            Ok(())
        }
        Err(ScanError::ServerRejected { message, .. }) => {
            println!("Refused: {}", message);
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Decode QR codes in an image file and show what a scan would read
pub fn decode(config: &Config, image: &Path) -> CliResult {
    let frame = load_image_as_frame(image)?;
    let mut payloads = QrDetector::full_frame().decode(&frame);
    if payloads.is_empty() && config.detection_window > 0 {
        payloads = QrDetector::with_window(config.detection_window).decode(&frame);
    }

    if payloads.is_empty() {
        println!("No QR code found in {}", image.display());
        return Ok(());
    }

    for payload in payloads {
        println!("{}", payload);
        match DecodedTicket::parse(&payload) {
            Ok(ticket) => println!("  -> ticket for customer {}", ticket.customer_id),
            Err(e) => println!("  -> {}", e),
        }
    }
    Ok(())
}

/// Register a participant via the public registration endpoint
pub fn register(config: &Config, slug: &str, participant: Participant) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let event = rt.block_on(client.event_by_slug(slug))?;

    if !event.registration_open(Utc::now()) {
        return Err(format!("Registration for '{}' has closed", event.nama).into());
    }

    let mut answers: BTreeMap<String, FieldValue> = BTreeMap::new();
    for raw in &participant.fields {
        let (id, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("Expected FIELD_ID=VALUE, got '{}'", raw))?;
        let is_multi = event
            .custom_fields
            .iter()
            .find(|f| f.field_id == id)
            .is_some_and(|f| f.kind.is_multi());

        if is_multi {
            match answers
                .entry(id.to_string())
                .or_insert_with(|| FieldValue::Many(Vec::new()))
            {
                FieldValue::Many(items) => items.push(value.to_string()),
                FieldValue::Text(_) => {}
            }
        } else {
            answers.insert(id.to_string(), FieldValue::Text(value.to_string()));
        }
    }

    let form = RegistrationForm {
        nama: participant.nama,
        email: participant.email,
        no_hp: participant.no_hp,
        alamat: participant.alamat,
        answers,
    };
    let customer = form.into_new_customer(&event.id, &event.custom_fields)?;
    let created = rt.block_on(client.register_customer(&customer))?;

    println!("Registered {} for {} (id {})", created.nama, event.nama, created.id);
    println!("The ticket is sent to {}", created.email);
    Ok(())
}

/// Log in and store the token in the config file
pub fn login(config: &Config, email: &str, password: &str) -> CliResult {
    let client = ApiClient::new(&config.api_base_url, config.request_timeout())?;
    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(client.login(email, password))?;

    Config::update(|stored| stored.session_token = Some(response.token))?;

    println!(
        "Logged in to {} as {} ({})",
        client.base_url(),
        email,
        response.role
    );
    if !response.role.can_scan() {
        println!("Note: this role cannot check in tickets");
    }
    Ok(())
}

/// Create an event with optional registration questions
pub fn create_event(config: &Config, draft: EventDraft) -> CliResult {
    let tanggal = NewEvent::parse_date(&draft.date)?;
    let custom_fields = draft
        .fields
        .iter()
        .map(|spec| CustomField::from_spec(spec))
        .collect::<Result<Vec<_>, _>>()?;
    if tanggal <= Utc::now() {
        warn!(date = %tanggal, "Event date has passed, registration will be closed");
    }

    let event = NewEvent {
        nama: draft.nama,
        tanggal,
        lokasi: draft.lokasi,
        deskripsi: draft.deskripsi,
        background_color: draft.color,
        custom_fields,
    };

    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let created = rt.block_on(client.create_event(&event))?;

    println!("Created {} (id {})", created.nama, created.id);
    if let Some(path) = created.registration_path() {
        println!("  Register: {}", path);
    }
    for field in &created.custom_fields {
        println!("  Field {}: {}", field.field_id, field.label);
    }
    Ok(())
}

/// Delete an event
pub fn delete_event(config: &Config, event_id: &str) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.delete_event(event_id))?;
    println!("Deleted event {}", event_id);
    Ok(())
}

/// Remove a registered participant
pub fn delete_customer(config: &Config, customer_id: &str) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.delete_customer(customer_id))?;
    println!("Deleted participant {}", customer_id);
    Ok(())
}

/// Create a staff account
pub fn add_user(config: &Config, user: NewUser) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.register_user(&user))?;
    println!("Created {} account for {}", user.role, user.email);
    Ok(())
}

/// Delete a staff account
pub fn delete_user(config: &Config, user_id: &str) -> CliResult {
    let client = api_client(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.delete_user(user_id))?;
    println!("Deleted user {}", user_id);
    Ok(())
}
