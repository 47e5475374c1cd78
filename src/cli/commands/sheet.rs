//! `cleaver sheet` - cut sheet operations and the audit timeline

use console::style;
use miette::{miette, Result};

use super::{parse_id, report_outcome, Context};
use crate::core::diff::diff_entry;
use crate::entities::history::ChangeCategory;
use crate::entities::sheet::{
    AddCutRequest, CutParamUpdates, CutSheet, CutSheetItem, CutSheetState, NewCutSheet,
};
use crate::taxonomy::Taxonomy;

#[derive(clap::Subcommand, Debug)]
pub enum SheetCmd {
    /// Create a draft cut sheet for a processing order
    New {
        /// Processing order the sheet belongs to
        #[arg(long)]
        order: String,

        /// Processor organization the sheet is addressed to
        #[arg(long)]
        processor: String,

        /// Species (beef, pork, lamb, goat); ignored with --template
        #[arg(long)]
        animal: Option<String>,

        /// Template ID to start from
        #[arg(long)]
        template: Option<String>,
    },

    /// Show a cut sheet
    Show { id: String },

    /// Add a producer-selected cut to a draft
    AddItem {
        id: String,
        cut_id: String,

        #[arg(long)]
        thickness: Option<String>,

        #[arg(long)]
        pieces: Option<i64>,
    },

    /// Submit a draft to the processor
    Submit { id: String },

    /// Adjust a cut's parameters (processor overlay)
    Modify {
        id: String,
        cut_id: String,

        #[arg(long)]
        thickness: Option<String>,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        pieces: Option<i64>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Strike a cut from the sheet
    RemoveCut {
        id: String,
        cut_id: String,

        #[arg(long)]
        reason: String,
    },

    /// Undo a removal
    RestoreCut { id: String, cut_id: String },

    /// Add a processor-side cut
    AddCut {
        id: String,
        cut_id: String,

        #[arg(long)]
        thickness: Option<String>,

        #[arg(long)]
        pieces: Option<i64>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Set processor notes
    Note { id: String, notes: String },

    /// Record the hanging weight
    Weight { id: String, lbs: f64 },

    /// Show the audit timeline with rendered diffs
    History {
        id: String,

        /// Filter by change category (e.g. cut_removed)
        #[arg(long)]
        category: Option<String>,
    },

    /// List your organization's templates
    Templates,

    /// Save an existing sheet's selections as a reusable template
    SaveTemplate {
        id: String,

        #[arg(long)]
        name: String,
    },
}

pub fn run(cmd: SheetCmd) -> Result<()> {
    let ctx = Context::load()?;
    let service = ctx.service();

    match cmd {
        SheetCmd::New {
            order,
            processor,
            animal,
            template,
        } => {
            let state = match template {
                Some(template_id) => service
                    .load_template(&parse_id(&template_id)?)
                    .map_err(|e| miette!("{}", e))?,
                None => {
                    let animal = animal
                        .ok_or_else(|| miette!("Pass --animal or --template"))?
                        .parse()
                        .map_err(|e: String| miette!("{}", e))?;
                    CutSheetState::new(animal)
                }
            };
            let (sheet_id, outcome) = service
                .create_cut_sheet(NewCutSheet {
                    processing_order_id: order,
                    processor_org_id: processor,
                    state,
                })
                .map_err(|e| miette!("{}", e))?;
            println!(
                "{} {}",
                style("Created").green(),
                style(sheet_id.to_string()).bold()
            );
            report_outcome(&outcome);
        }

        SheetCmd::Show { id } => {
            let sheet = service
                .get_sheet(&parse_id(&id)?)
                .map_err(|e| miette!("{}", e))?;
            print_sheet(&sheet);
        }

        SheetCmd::AddItem {
            id,
            cut_id,
            thickness,
            pieces,
        } => {
            let cut_name = cut_display_name(&ctx.taxonomy, &cut_id);
            let sheet_id = parse_id(&id)?;
            let sort_order = service
                .get_sheet(&sheet_id)
                .map_err(|e| miette!("{}", e))?
                .state
                .items
                .len() as i64;
            service
                .add_item(
                    &sheet_id,
                    CutSheetItem {
                        cut_id,
                        cut_name: cut_name.clone(),
                        thickness,
                        weight_lbs: None,
                        pieces_per_package: pieces,
                        sort_order,
                    },
                )
                .map_err(|e| miette!("{}", e))?;
            println!("{} {}", style("Added").green(), style(cut_name).bold());
        }

        SheetCmd::Submit { id } => {
            let outcome = service
                .submit(&parse_id(&id)?)
                .map_err(|e| miette!("{}", e))?;
            println!("{}", style("Submitted.").green());
            report_outcome(&outcome);
        }

        SheetCmd::Modify {
            id,
            cut_id,
            thickness,
            weight,
            pieces,
            note,
        } => {
            let outcome = service
                .update_cut_parameters(
                    &parse_id(&id)?,
                    &cut_id,
                    &CutParamUpdates {
                        thickness,
                        weight_lbs: weight,
                        pieces_per_package: pieces,
                        note,
                    },
                )
                .map_err(|e| miette!("{}", e))?;
            report_outcome(&outcome);
        }

        SheetCmd::RemoveCut { id, cut_id, reason } => {
            let cut_name = cut_display_name(&ctx.taxonomy, &cut_id);
            let outcome = service
                .remove_cut(&parse_id(&id)?, &cut_id, &cut_name, &reason)
                .map_err(|e| miette!("{}", e))?;
            println!("{} {}", style("Removed").red(), style(cut_name).bold());
            report_outcome(&outcome);
        }

        SheetCmd::RestoreCut { id, cut_id } => {
            let outcome = service
                .restore_cut(&parse_id(&id)?, &cut_id)
                .map_err(|e| miette!("{}", e))?;
            println!("{} {}", style("Restored").green(), style(cut_id).bold());
            report_outcome(&outcome);
        }

        SheetCmd::AddCut {
            id,
            cut_id,
            thickness,
            pieces,
            note,
        } => {
            let cut_name = cut_display_name(&ctx.taxonomy, &cut_id);
            let outcome = service
                .add_cut(
                    &parse_id(&id)?,
                    AddCutRequest {
                        cut_id,
                        cut_name: cut_name.clone(),
                        thickness,
                        pieces_per_package: pieces,
                        note,
                    },
                )
                .map_err(|e| miette!("{}", e))?;
            println!("{} {}", style("Added").green(), style(cut_name).bold());
            report_outcome(&outcome);
        }

        SheetCmd::Note { id, notes } => {
            let outcome = service
                .update_processor_notes(&parse_id(&id)?, Some(&notes))
                .map_err(|e| miette!("{}", e))?;
            report_outcome(&outcome);
        }

        SheetCmd::Weight { id, lbs } => {
            let outcome = service
                .update_hanging_weight(&parse_id(&id)?, lbs)
                .map_err(|e| miette!("{}", e))?;
            report_outcome(&outcome);
        }

        SheetCmd::History { id, category } => {
            let sheet_id = parse_id(&id)?;
            let entries = match category {
                Some(raw) => {
                    let category: ChangeCategory =
                        raw.parse().map_err(|e: String| miette!("{}", e))?;
                    service
                        .history_by_category(&sheet_id, category)
                        .map_err(|e| miette!("{}", e))?
                }
                None => service.history(&sheet_id).map_err(|e| miette!("{}", e))?,
            };
            print_history(&id, &entries);

            let summary = service
                .history_summary(&sheet_id)
                .map_err(|e| miette!("{}", e))?;
            println!();
            println!(
                "  {} {} total ({} producer, {} processor)",
                style("Changes:").bold(),
                summary.total_changes,
                summary.producer_changes,
                summary.processor_changes,
            );
        }

        SheetCmd::Templates => {
            let templates = service.templates_for_org().map_err(|e| miette!("{}", e))?;
            if templates.is_empty() {
                println!("{}", style("No templates saved.").dim());
            }
            for template in templates {
                println!(
                    "  {} {} ({})",
                    style(template.id.to_string()).cyan(),
                    style(&template.name).bold(),
                    template.animal_type,
                );
            }
        }

        SheetCmd::SaveTemplate { id, name } => {
            let sheet = service
                .get_sheet(&parse_id(&id)?)
                .map_err(|e| miette!("{}", e))?;
            let (template_id, outcome) = service
                .save_as_template(sheet.state, &name)
                .map_err(|e| miette!("{}", e))?;
            println!(
                "{} {}",
                style("Saved template").green(),
                style(template_id.to_string()).bold()
            );
            report_outcome(&outcome);
        }
    }
    Ok(())
}

fn cut_display_name(taxonomy: &Taxonomy, cut_id: &str) -> String {
    taxonomy
        .find_cut(cut_id)
        .map(|found| found.cut.name.clone())
        .unwrap_or_else(|| cut_id.to_string())
}

fn print_sheet(sheet: &CutSheet) {
    println!(
        "{} {} {}",
        style(sheet.id.to_string()).cyan().bold(),
        style(sheet.state.animal_type.to_string()).bold(),
        style(format!("[{}]", sheet.status)).yellow(),
    );
    if let Some(order) = &sheet.processing_order_id {
        println!("  {} {}", style("Order:").bold(), order);
    }
    if let Some(weight) = sheet.state.hanging_weight_lbs {
        println!("  {} {} lbs", style("Hanging weight:").bold(), weight);
    }
    for item in &sheet.state.items {
        let removed = sheet.is_cut_removed(&item.cut_id);
        let mut line = format!("  - {}", item.cut_name);
        if let Some(pieces) = item.pieces_per_package {
            line.push_str(&format!(" ({}/pkg)", pieces));
        }
        if removed {
            println!("{}", style(format!("{} [removed]", line)).strikethrough());
        } else if sheet.processor_modifications.contains_key(&item.cut_id) {
            println!("{} {}", line, style("[modified]").yellow());
        } else {
            println!("{}", line);
        }
    }
    for added in &sheet.added_cuts {
        println!(
            "  + {} {}",
            added.cut_name,
            style("[processor added]").green()
        );
    }
    if let Some(notes) = &sheet.processor_notes {
        println!("  {} {}", style("Processor notes:").bold(), notes);
    }
}

/// Render the audit timeline, oldest first, with field diffs under each entry
fn print_history(display_id: &str, entries: &[crate::entities::history::HistoryEntry]) {
    println!("{}", style(display_id).cyan().bold());
    println!();

    for entry in entries.iter().rev() {
        let date_str = entry.created_at.format("%Y-%m-%d %H:%M");
        let category = match entry.change_category {
            ChangeCategory::InitialCreation => style("created").blue(),
            ChangeCategory::CutRemoved => style("cut removed").red(),
            ChangeCategory::CutAdded => style("cut added").green(),
            ChangeCategory::CutModified => style("cut modified").yellow(),
            ChangeCategory::WeightEntered => style("weight").magenta(),
            ChangeCategory::PackageCreated => style("package").magenta(),
            ChangeCategory::NotesUpdated => style("notes").cyan(),
            ChangeCategory::General => style("change").white(),
        };
        println!(
            "  {} {:14} {} {}",
            style(date_str).dim(),
            category,
            style(format!(
                "{} ({})",
                entry.changed_by_user_id, entry.changed_by_role
            ))
            .cyan(),
            entry.change_summary,
        );

        for diff in diff_entry(entry) {
            let before = diff.before.unwrap_or_else(|| "-".to_string());
            let after = diff.after.unwrap_or_else(|| "-".to_string());
            println!(
                "      {} {} {} {}",
                style(&diff.label).bold(),
                style(before).dim(),
                style("->").dim(),
                after,
            );
        }
    }
}
