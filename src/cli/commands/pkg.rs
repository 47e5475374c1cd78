//! `cleaver pkg` - produced package recording

use console::style;
use miette::{miette, Result};
use tabled::{Table, Tabled};

use super::{parse_id, report_outcome, Context};
use crate::entities::package::NewPackage;

#[derive(clap::Subcommand, Debug)]
pub enum PkgCmd {
    /// Record a package cut and wrapped for a sheet
    Add {
        sheet_id: String,
        cut_id: String,

        /// Pieces in the package
        #[arg(long, default_value_t = 1)]
        qty: i64,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        thickness: Option<String>,

        /// Processing style (e.g. smoked, cured)
        #[arg(long)]
        style: Option<String>,

        /// The cut was a processor addition, not a producer pick
        #[arg(long)]
        added: bool,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        tracking: Option<String>,
    },

    /// Set a package's weighed-out weight
    Weigh { package_id: String, lbs: f64 },

    /// Delete a package
    Rm { package_id: String },

    /// List packages for a sheet
    List { sheet_id: String },
}

#[derive(Tabled)]
struct PackageRow {
    #[tabled(rename = "Package")]
    id: String,
    #[tabled(rename = "Cut")]
    cut: String,
    #[tabled(rename = "#")]
    number: i64,
    #[tabled(rename = "Qty")]
    qty: i64,
    #[tabled(rename = "Weight (lbs)")]
    weight: String,
    #[tabled(rename = "Style")]
    style: String,
}

pub fn run(cmd: PkgCmd) -> Result<()> {
    let ctx = Context::load()?;
    let service = ctx.service();

    match cmd {
        PkgCmd::Add {
            sheet_id,
            cut_id,
            qty,
            weight,
            thickness,
            style: processing_style,
            added,
            note,
            tracking,
        } => {
            let cut_name = ctx
                .taxonomy
                .find_cut(&cut_id)
                .map(|found| found.cut.name.clone())
                .unwrap_or_else(|| cut_id.clone());
            let (package_id, outcome) = service
                .create_package(
                    &parse_id(&sheet_id)?,
                    NewPackage {
                        cut_id,
                        cut_name,
                        primal_id: None,
                        quantity_in_package: qty,
                        actual_weight_lbs: weight,
                        thickness,
                        processing_style,
                        processor_added: added,
                        processor_notes: note,
                        livestock_tracking_id: tracking,
                    },
                )
                .map_err(|e| miette!("{}", e))?;
            println!(
                "{} {}",
                style("Recorded").green(),
                style(package_id.to_string()).bold()
            );
            report_outcome(&outcome);
        }

        PkgCmd::Weigh { package_id, lbs } => {
            let outcome = service
                .update_package_weight(&parse_id(&package_id)?, lbs)
                .map_err(|e| miette!("{}", e))?;
            report_outcome(&outcome);
        }

        PkgCmd::Rm { package_id } => {
            let outcome = service
                .delete_package(&parse_id(&package_id)?)
                .map_err(|e| miette!("{}", e))?;
            println!("{}", style("Deleted.").green());
            report_outcome(&outcome);
        }

        PkgCmd::List { sheet_id } => {
            let packages = service
                .list_packages(&parse_id(&sheet_id)?)
                .map_err(|e| miette!("{}", e))?;
            if packages.is_empty() {
                println!("{}", style("No packages recorded.").dim());
                return Ok(());
            }
            let rows: Vec<PackageRow> = packages
                .into_iter()
                .map(|p| PackageRow {
                    id: p.id.short(),
                    cut: p.cut_name,
                    number: p.package_number,
                    qty: p.quantity_in_package,
                    weight: p
                        .actual_weight_lbs
                        .map(|w| w.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    style: p.processing_style.unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
    }
    Ok(())
}
