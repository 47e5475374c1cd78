//! Command implementations

pub mod config;
pub mod init;
pub mod pkg;
pub mod sheet;

use console::style;
use miette::{miette, Result};

use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::core::session::StaticSession;
use crate::service::{AuditOutcome, CutSheetService};
use crate::store::Store;
use crate::taxonomy::Taxonomy;

/// Everything a command needs: project, store, taxonomy, and identity
pub(crate) struct Context {
    pub store: Store,
    pub taxonomy: Taxonomy,
    pub session: StaticSession,
}

impl Context {
    pub fn load() -> Result<Self> {
        let project = Project::discover().map_err(|e| miette!("{}", e))?;
        let store = Store::open(&project.db_path()).map_err(|e| miette!("{}", e))?;
        let taxonomy = Taxonomy::load().map_err(|e| miette!("{}", e))?;
        let session = project.session().map_err(|e| miette!("{}", e))?;
        Ok(Self {
            store,
            taxonomy,
            session,
        })
    }

    pub fn service(&self) -> CutSheetService<'_> {
        CutSheetService::new(&self.store, &self.taxonomy, &self.session)
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<EntityId> {
    raw.parse().map_err(|e| miette!("{}", e))
}

/// Surface the audit outcome of a mutation to the operator
pub(crate) fn report_outcome(outcome: &AuditOutcome) {
    match outcome {
        AuditOutcome::Recorded => {}
        AuditOutcome::Unchanged => {
            println!("{}", style("No change.").dim());
        }
        AuditOutcome::Gap { error } => {
            eprintln!(
                "{} {}",
                style("Warning: change saved but not recorded in history:").yellow(),
                style(error).dim()
            );
        }
    }
}
