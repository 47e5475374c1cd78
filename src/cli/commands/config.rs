//! `cleaver config` - processor cut configuration

use console::style;
use miette::{miette, Result};
use tabled::{Table, Tabled};

use super::Context;
use crate::entities::config::ConfigPatch;
use crate::taxonomy::AnimalType;

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCmd {
    /// Show the effective configuration
    Show {
        /// Processor organization to inspect (defaults to your own)
        #[arg(long)]
        processor: Option<String>,
    },

    /// Flip whether a cut is offered to producers
    ToggleCut { cut_id: String },

    /// Set producer-facing notes
    SetNotes { notes: String },

    /// Set the accepted hanging weight window
    SetWeights {
        #[arg(long)]
        min: Option<f64>,

        #[arg(long)]
        max: Option<f64>,
    },
}

#[derive(Tabled)]
struct AnimalRow {
    #[tabled(rename = "Animal")]
    animal: String,
    #[tabled(rename = "Cuts offered")]
    offered: String,
}

pub fn run(cmd: ConfigCmd) -> Result<()> {
    let ctx = Context::load()?;
    let service = ctx.service();

    match cmd {
        ConfigCmd::Show { processor } => {
            let lookup = service
                .get_config(processor.as_deref())
                .map_err(|e| miette!("{}", e))?;
            if lookup.is_default() {
                println!(
                    "{}",
                    style("No saved configuration; everything is offered by default.").dim()
                );
            }
            let config = service
                .effective_config(processor.as_deref())
                .map_err(|e| miette!("{}", e))?;

            let rows: Vec<AnimalRow> = AnimalType::ALL
                .into_iter()
                .map(|animal| {
                    let offered = if config.enabled_animals.contains(&animal) {
                        let counts = ctx.taxonomy.cut_counts(animal, &config.disabled_cuts);
                        format!("{}/{}", counts.enabled, counts.total)
                    } else {
                        "not accepted".to_string()
                    };
                    AnimalRow {
                        animal: animal.to_string(),
                        offered,
                    }
                })
                .collect();
            println!("{}", Table::new(rows));

            if !config.disabled_cuts.is_empty() {
                println!(
                    "{} {}",
                    style("Disabled cuts:").bold(),
                    config
                        .disabled_cuts
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            if !config.custom_cuts.is_empty() {
                println!(
                    "{} {}",
                    style("Custom cuts:").bold(),
                    config
                        .custom_cuts
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            match (config.min_hanging_weight_lbs, config.max_hanging_weight_lbs) {
                (None, None) => {}
                (min, max) => println!(
                    "{} {} - {} lbs",
                    style("Hanging weight window:").bold(),
                    min.map(|v| v.to_string()).unwrap_or_else(|| "any".to_string()),
                    max.map(|v| v.to_string()).unwrap_or_else(|| "any".to_string()),
                ),
            }
            if let Some(notes) = &config.producer_notes {
                println!("{} {}", style("Producer notes:").bold(), notes);
            }
        }

        ConfigCmd::ToggleCut { cut_id } => {
            let disabled = service.toggle_cut(&cut_id).map_err(|e| miette!("{}", e))?;
            if disabled {
                println!("{} {}", style(&cut_id).bold(), style("disabled").red());
            } else {
                println!("{} {}", style(&cut_id).bold(), style("enabled").green());
            }
        }

        ConfigCmd::SetNotes { notes } => {
            let patch = ConfigPatch {
                producer_notes: Some(Some(notes)),
                ..Default::default()
            };
            service.upsert_config(&patch).map_err(|e| miette!("{}", e))?;
            println!("{}", style("Producer notes updated.").green());
        }

        ConfigCmd::SetWeights { min, max } => {
            let patch = ConfigPatch {
                min_hanging_weight_lbs: min.map(Some),
                max_hanging_weight_lbs: max.map(Some),
                ..Default::default()
            };
            if patch.is_empty() {
                println!("{}", style("Nothing to set; pass --min and/or --max.").dim());
                return Ok(());
            }
            service.upsert_config(&patch).map_err(|e| miette!("{}", e))?;
            println!("{}", style("Hanging weight window updated.").green());
        }
    }
    Ok(())
}
