use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use sdtm_core::{RunReport, RunStatus};
use sdtm_model::{
    ComparisonStatus, EntryKind, Phase, PipelineState, SpecStatus, StepStatus, ValidationStatus,
};

pub fn print_run_summary(report: &RunReport, max_iterations: u32) {
    print_state(&report.state, max_iterations);
    println!();
    match &report.status {
        RunStatus::Completed => println!("Pipeline complete for {}.", report.state.domain),
        RunStatus::StageFinished(phase) => {
            println!("Stage {phase} finished; next phase is {}.", report.state.current_phase);
        }
        RunStatus::Stopped { phase, error } => {
            eprintln!("Pipeline stopped in {phase}: {error}");
        }
    }
}

pub fn print_state(state: &PipelineState, max_iterations: u32) {
    println!("{}", state_table(state, max_iterations));
    if !state.human_decisions.is_empty() {
        println!();
        println!("Decisions:");
        println!("{}", decisions_table(state));
    }
    if !state.artifacts.is_empty() {
        println!();
        println!("Artifacts:");
        println!("{}", artifacts_table(state));
    }
    if !state.error_log.is_empty() {
        println!();
        println!("Log:");
        println!("{}", log_table(state));
    }
}

pub fn print_phases() {
    println!("{}", phases_table());
}

pub fn state_table(state: &PipelineState, max_iterations: u32) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_summary_table_style(&mut table);
    table.add_row(vec![Cell::new("Study"), Cell::new(&state.study_id)]);
    table.add_row(vec![Cell::new("Domain"), domain_cell(&state.domain)]);
    table.add_row(vec![Cell::new("Phase"), phase_cell(state.current_phase)]);
    table.add_row(vec![Cell::new("Spec"), spec_cell(state.spec_status)]);
    table.add_row(vec![
        Cell::new("Production"),
        step_cell(state.production_status),
    ]);
    table.add_row(vec![Cell::new("QC"), step_cell(state.qc_status)]);
    table.add_row(vec![
        Cell::new("Comparison"),
        comparison_cell(state.comparison_result),
    ]);
    table.add_row(vec![
        Cell::new("Iteration"),
        Cell::new(format!("{} of {}", state.comparison_iteration, max_iterations)),
    ]);
    table.add_row(vec![
        Cell::new("Validation"),
        validation_cell(state.validation_status),
    ]);
    table.add_row(vec![
        Cell::new("Updated"),
        dim_cell(state.updated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ]);
    table
}

fn decisions_table(state: &PipelineState) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Choice"),
        header_cell("Source"),
        header_cell("Rationale"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for (variable, decision) in &state.human_decisions {
        table.add_row(vec![
            Cell::new(variable).add_attribute(Attribute::Bold),
            Cell::new(&decision.choice),
            Cell::new(decision.source.as_str()),
            match &decision.rationale {
                Some(text) => Cell::new(text),
                None => dim_cell("-"),
            },
        ]);
    }
    table
}

fn artifacts_table(state: &PipelineState) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Artifact"), header_cell("Location")]);
    apply_table_style(&mut table);
    for (name, location) in state.artifacts.iter() {
        table.add_row(vec![Cell::new(name), Cell::new(location)]);
    }
    table
}

fn log_table(state: &PipelineState) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Phase"),
        header_cell("Kind"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for entry in &state.error_log {
        let kind = match entry.kind {
            EntryKind::Error => Cell::new("ERROR").fg(Color::Red),
            EntryKind::Warning => Cell::new("WARN").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(entry.phase.as_str()),
            kind,
            Cell::new(&entry.message),
        ]);
    }
    table
}

pub fn phases_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Phase"),
        header_cell("Next"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for phase in Phase::NOMINAL_ORDER {
        let next: Vec<&str> = phase.allowed_next().iter().map(|p| p.as_str()).collect();
        let next_cell = if next.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(next.join(", "))
        };
        table.add_row(vec![
            Cell::new(phase.ordinal() + 1),
            Cell::new(phase.as_str()).add_attribute(Attribute::Bold),
            next_cell,
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn domain_cell(code: &str) -> Cell {
    Cell::new(code)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn phase_cell(phase: Phase) -> Cell {
    if phase.is_terminal() {
        good_cell(phase.as_str())
    } else {
        Cell::new(phase.as_str()).add_attribute(Attribute::Bold)
    }
}

fn spec_cell(status: SpecStatus) -> Cell {
    match status {
        SpecStatus::Draft => dim_cell("draft"),
        SpecStatus::Reviewed => Cell::new("reviewed").fg(Color::Yellow),
        SpecStatus::Approved => good_cell("approved"),
    }
}

fn step_cell(status: StepStatus) -> Cell {
    match status {
        StepStatus::Pending => dim_cell("pending"),
        StepStatus::Completed => good_cell("completed"),
        StepStatus::Failed => bad_cell("failed"),
    }
}

fn comparison_cell(status: ComparisonStatus) -> Cell {
    match status {
        ComparisonStatus::Pending => dim_cell("pending"),
        ComparisonStatus::Match => good_cell("match"),
        ComparisonStatus::Mismatch => Cell::new("mismatch").fg(Color::Yellow),
    }
}

fn validation_cell(status: ValidationStatus) -> Cell {
    match status {
        ValidationStatus::Pending => dim_cell("pending"),
        ValidationStatus::Passed => good_cell("passed"),
        ValidationStatus::Failed => bad_cell("failed"),
    }
}

fn good_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Green)
        .add_attribute(Attribute::Bold)
}

fn bad_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Red)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_table_shows_iteration_bound() {
        let mut state = PipelineState::new("ABC-101", "DM");
        state.comparison_iteration = 2;
        state.comparison_result = ComparisonStatus::Mismatch;
        let rendered = state_table(&state, 5).to_string();
        assert!(rendered.contains("2 of 5"));
        assert!(rendered.contains("mismatch"));
        assert!(rendered.contains("spec_building"));
    }

    #[test]
    fn log_table_lists_errors_and_warnings() {
        let mut state = PipelineState::new("ABC-101", "DM");
        state.record_warning("forced past review");
        state.record_error("production program failed");
        let rendered = log_table(&state).to_string();
        assert!(rendered.contains("WARN"));
        assert!(rendered.contains("ERROR"));
        assert!(rendered.contains("production program failed"));
    }

    #[test]
    fn phases_table_shows_the_loop_back() {
        let rendered = phases_table().to_string();
        assert!(rendered.contains("production, validation"));
        assert!(rendered.contains("complete"));
    }
}
