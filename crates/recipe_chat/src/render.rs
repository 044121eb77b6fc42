use sous::{Recipe, StepCatalog, StepEventStatus, StreamEvent, WorkflowView};

/// One-line progress echo for a stream event, or `None` when the final
/// block covers it.
pub fn event_line(catalog: &StepCatalog, event: &StreamEvent) -> Option<String> {
    match event {
        StreamEvent::Step { step, status, .. } => {
            let label = catalog
                .info(step)
                .map(|info| info.label)
                .unwrap_or(step.as_str());
            Some(match status {
                StepEventStatus::InProgress => {
                    let detail = catalog
                        .info(step)
                        .map(|info| info.in_progress_text)
                        .unwrap_or("working...");
                    format!("  … {label}: {detail}")
                }
                StepEventStatus::Complete => format!("  ✓ {label}"),
            })
        }
        StreamEvent::Error {
            step: Some(step), ..
        } => {
            let label = catalog
                .info(step)
                .map(|info| info.label)
                .unwrap_or(step.as_str());
            Some(format!("  ✗ {label}: error"))
        }
        StreamEvent::Complete { .. } | StreamEvent::Error { step: None, .. } => None,
    }
}

/// Final assistant block printed once the stream has ended.
pub fn final_block(view: &WorkflowView) -> String {
    let mut out = String::new();

    if let Some(error_text) = &view.error_text {
        out.push_str("sous> ");
        out.push_str(error_text);
        out.push('\n');
        return out;
    }

    if let Some(message) = &view.message {
        out.push_str("sous> ");
        out.push_str(message);
        out.push('\n');
    }

    for (index, recipe) in view.recipes.iter().enumerate() {
        out.push_str(&recipe_line(index + 1, recipe));
        out.push('\n');
    }

    if !view.recipes.is_empty() {
        out.push_str("      (save one with /save <number>)\n");
    }

    out
}

fn recipe_line(position: usize, recipe: &Recipe) -> String {
    let mut line = format!("  {position}. {}", recipe.title);
    if recipe.ready_in_minutes > 0 {
        line.push_str(&format!(" (ready in {} min)", recipe.ready_in_minutes));
    }
    if let Some(calories) = recipe.nutrition.calories {
        line.push_str(&format!(" [{calories:.0} kcal]"));
    }
    line
}
