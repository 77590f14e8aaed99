//! Thin handlers: build the controllers, run one operation, print the
//! outcome.

use std::path::Path;

use anyhow::{bail, Context};
use api::{Credentials, HttpBackend, RegisterProfile};
use store::{ClientConfig, Contact, ContactFields, ContactId, SortKey};
use ui::{DirectoryController, LogLevel, SessionManager};

use crate::{Cli, Command};

type Manager = SessionManager<HttpBackend>;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(ui::config_path);
    let mut config = ClientConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?
        .apply_env();
    if let Some(url) = cli.server {
        config = config.with_base_url(url);
    }
    let backend = HttpBackend::new(&config.server.base_url)?;
    tracing::debug!(server = %backend.base(), "using server");
    let manager = SessionManager::new(backend, ui::make_token_store(), &config);

    let result = dispatch(&manager, &config, cli.command).await;
    print_notifications(&manager);
    result
}

async fn dispatch(manager: &Manager, config: &ClientConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            manager.login(&Credentials::new(email, password)).await?;
        }
        Command::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let mut profile = RegisterProfile::new(name, email, password);
            if let Some(confirm) = confirm {
                profile = profile.with_confirmation(confirm);
            }
            manager.register(&profile).await?;
        }
        Command::Logout => manager.logout(),
        Command::Whoami => {
            authenticate(manager).await?;
            if let Some(greeting) = manager.greeting() {
                println!("{greeting}");
            }
        }
        Command::List { search, sort } => {
            let directory = open_directory(manager).await?;
            let records = arrange(&directory, search.as_deref(), &sort);
            print_table(&records);
            if directory.is_empty() {
                println!("No contacts created yet");
            } else {
                println!("Your Total Contacts: {}", directory.visible_count());
            }
        }
        Command::Add {
            name,
            address,
            email,
            phone,
        } => {
            let directory = open_directory(manager).await?;
            let record = directory
                .create(ContactFields::new(name, address, email, phone))
                .await?;
            print_table(&[record]);
        }
        Command::Edit {
            id,
            name,
            address,
            email,
            phone,
        } => {
            let directory = open_directory(manager).await?;
            let id = ContactId::new(id);
            let Some(current) = directory.get(&id) else {
                bail!("no contact with id {id}");
            };
            let mut fields = current.fields();
            fields.name = name.unwrap_or(fields.name);
            fields.address = address.unwrap_or(fields.address);
            fields.email = email.unwrap_or(fields.email);
            fields.phone = phone.unwrap_or(fields.phone);
            let record = directory.update(&id, fields).await?;
            print_table(&[record]);
        }
        Command::Delete { id } => {
            let directory = open_directory(manager).await?;
            directory.delete(&ContactId::new(id)).await?;
        }
        Command::Import { file, create } => {
            let directory = open_directory(manager).await?;
            directory.import_file(&file)?;
            if create {
                let created = directory.publish_local().await?;
                println!("Created {created} contacts on the server");
            }
            print_table(&directory.visible());
        }
        Command::Export { file, search, sort } => {
            let directory = open_directory(manager).await?;
            arrange(&directory, search.as_deref(), &sort);
            let path = file.unwrap_or_else(|| config.export.filename.clone().into());
            export(&directory, &path)?;
        }
    }
    Ok(())
}

async fn authenticate(manager: &Manager) -> anyhow::Result<()> {
    let state = manager.start("/mycontacts").await;
    if !state.is_authenticated() {
        bail!("not logged in; run `contacts login` first");
    }
    Ok(())
}

async fn open_directory(manager: &Manager) -> anyhow::Result<DirectoryController<HttpBackend>> {
    authenticate(manager).await?;
    let directory = DirectoryController::new(manager.clone());
    directory.load().await?;
    Ok(directory)
}

fn arrange(
    directory: &DirectoryController<HttpBackend>,
    search: Option<&str>,
    sort: &[SortKey],
) -> Vec<Contact> {
    for key in sort {
        directory.sort(*key);
    }
    match search {
        Some(query) => directory.search(query),
        None => directory.visible(),
    }
}

fn export(directory: &DirectoryController<HttpBackend>, path: &Path) -> anyhow::Result<()> {
    directory.export_to(path)?;
    Ok(())
}

fn print_table(records: &[Contact]) {
    if records.is_empty() {
        return;
    }
    let id_width = records
        .iter()
        .map(|c| c.id.as_ref().map_or(1, |id| id.as_str().len()))
        .max()
        .unwrap_or(1)
        .max(2);
    let width = |f: fn(&Contact) -> &str| records.iter().map(|c| f(c).chars().count()).max().unwrap_or(0);
    let name_w = width(|c| &c.name).max(4);
    let address_w = width(|c| &c.address).max(7);
    let email_w = width(|c| &c.email).max(5);

    println!(
        "{:id_width$}  {:name_w$}  {:address_w$}  {:email_w$}  phone",
        "id", "name", "address", "email"
    );
    for c in records {
        let id = c.id.as_ref().map_or("-", |id| id.as_str());
        println!(
            "{id:id_width$}  {:name_w$}  {:address_w$}  {:email_w$}  {}",
            c.name, c.address, c.email, c.phone
        );
    }
}

fn print_notifications(manager: &Manager) {
    for note in manager.notifications().take() {
        let tag = match note.level {
            LogLevel::Success => "ok",
            LogLevel::Error => "error",
        };
        eprintln!("[{}] {tag}: {}", note.timestamp, note.message);
    }
}
