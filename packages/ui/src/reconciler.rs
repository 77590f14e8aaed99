//! Import and export of the directory as CSV.
//!
//! Export writes the visible records (after search and sort) without ids.
//! Import replaces the whole snapshot with the parsed rows and never talks to
//! the server: imported rows stay local until they are published with
//! [`DirectoryController::publish_local`] or thrown away by the next load.

use std::path::Path;

use api::{ApiError, Backend};
use store::tabular;
use store::Contact;

use crate::directory::DirectoryController;
use crate::error::ReconcileError;

impl<B: Backend + Clone> DirectoryController<B> {
    /// Replace the snapshot with the records in `input`. Returns how many
    /// were imported.
    pub fn import_csv(&self, input: &[u8]) -> Result<usize, ReconcileError> {
        let notifications = self.manager().notifications();
        let (_, owner) = self.bearer()?;

        let records = match tabular::read_contacts(input) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "import rejected");
                notifications.error("Error importing contacts");
                return Err(err.into());
            }
        };
        let count = records.len();

        self.apply(&owner, |state| {
            state.snapshot.clear_search();
            state.snapshot.replace_base(records);
            state.close();
        })?;
        tracing::info!(count, "contacts imported");
        notifications.success(&format!(
            "Imported {count} contacts (replaced the current list; not saved to the server)"
        ));
        Ok(count)
    }

    /// Read a CSV file and import it.
    pub fn import_file(&self, path: &Path) -> Result<usize, ReconcileError> {
        match std::fs::read(path) {
            Ok(bytes) => self.import_csv(&bytes),
            Err(source) => {
                self.manager().notifications().error("Error importing contacts");
                Err(ReconcileError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Serialize the visible records, header first.
    pub fn export_csv(&self) -> Result<String, ReconcileError> {
        let visible = self.visible();
        tabular::write_contacts(&visible).map_err(|err| {
            self.manager().notifications().error("Error exporting contacts");
            err.into()
        })
    }

    /// Export the visible records to `path`. Returns how many were written.
    pub fn export_to(&self, path: &Path) -> Result<usize, ReconcileError> {
        let count = self.visible_count();
        let text = self.export_csv()?;
        if let Err(source) = std::fs::write(path, text) {
            self.manager().notifications().error("Error exporting contacts");
            return Err(ReconcileError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        self.manager()
            .notifications()
            .success(&format!("Exported {count} contacts to {}", path.display()));
        Ok(count)
    }

    /// Create every local-only record on the server, one at a time, then
    /// reload. Records that fail are reported and skipped. Returns how many
    /// were created.
    pub async fn publish_local(&self) -> Result<usize, ApiError> {
        let pending: Vec<Contact> = self.with_state(|state| {
            state
                .snapshot
                .base()
                .iter()
                .filter(|c| c.id.is_none())
                .cloned()
                .collect()
        });

        let mut created = 0;
        for record in pending {
            match self.create(record.fields()).await {
                Ok(_) => created += 1,
                Err(err) if err.is_auth() || err.is_network() => return Err(err),
                Err(_) => {}
            }
        }
        self.load().await?;
        Ok(created)
    }
}
