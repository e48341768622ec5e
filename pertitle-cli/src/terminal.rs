// ============================================================================
// pertitle-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: Summary Tables and Styling
//
// This module renders analysis results and ladders on stdout with a small,
// consistent visual language: section headers, aligned status lines and a
// per-tier table. Styling comes from `console` and is switched off globally
// with --no-color.
//
// KEY COMPONENTS:
// - styling: symbols and layout constants
// - print_section / print_status / print_success / print_error
// - print_ladder / print_result: tables for ladders and analysis results
//
// AI-ASSISTANT-INFO: Terminal UI components and styling for the CLI

// ---- External crate imports ----
use console::style;
use pertitle_core::ladder::EncodingLadder;
use pertitle_core::reporting::{AnalysisParameters, AnalysisResult, TierPlan};
use pertitle_core::utils::{format_bitrate, format_bitrate_delta, savings_percent};

// ============================================================================
// STYLING CONSTANTS
// ============================================================================

/// Styling constants for terminal output
pub mod styling {
    pub const SUCCESS_SYMBOL: &str = "✓";
    pub const ERROR_SYMBOL: &str = "✗";

    pub const SECTION_PREFIX: &str = "===== ";
    pub const SECTION_SUFFIX: &str = " =====";

    pub const STATUS_INDENT: &str = "  ";
    pub const LABEL_WIDTH: usize = 15;
}

/// Enables or disables colors on stdout and stderr.
pub fn set_color(enable: bool) {
    console::set_colors_enabled(enable);
    console::set_colors_enabled_stderr(enable);
}

// ============================================================================
// TERMINAL COMPONENTS
// ============================================================================

/// Print a section header for major workflow phases
pub fn print_section(title: &str) {
    println!();
    println!(
        "{}{}{}",
        styling::SECTION_PREFIX,
        style(title.to_uppercase()).cyan().bold(),
        styling::SECTION_SUFFIX
    );
    println!();
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let label = format!("{label}:");
    let value = if highlight {
        style(value).bold().to_string()
    } else {
        value.to_string()
    };
    println!(
        "{}{:<width$} {}",
        styling::STATUS_INDENT,
        label,
        value,
        width = styling::LABEL_WIDTH + 1
    );
}

pub fn print_success(message: &str) {
    println!("{} {}", style(styling::SUCCESS_SYMBOL).green().bold(), message);
}

/// Print an error with its cause chain to stderr
pub fn print_error(message: &str) {
    eprintln!(
        "{} {} {}",
        style(styling::ERROR_SYMBOL).red().bold(),
        style("Error:").red().bold(),
        message
    );
}

// ============================================================================
// TABLES
// ============================================================================

/// Print the tiers of a template ladder.
pub fn print_ladder(ladder: &EncodingLadder) {
    println!(
        "{}",
        style(format!(
            "{:<11} {:>12} {:>12} {:>12} {:>7} {:>9} {:>12}",
            "Resolution", "Default", "Min", "Max", "Factor", "Required", "Step"
        ))
        .bold()
    );
    for profile in ladder.profiles() {
        println!(
            "{:<11} {:>12} {:>12} {:>12} {:>7.2} {:>9} {:>12}",
            profile.resolution().to_string(),
            format_bitrate(profile.bitrate_default()),
            format_bitrate(profile.bitrate_min()),
            format_bitrate(profile.bitrate_max()),
            profile.scale_factor().unwrap_or(1.0),
            if profile.required() { "yes" } else { "no" },
            profile.bitrate_step().map(format_bitrate).unwrap_or_else(|| "-".to_string()),
        );
    }
    println!();
    print_status("Overall", &format_bitrate(ladder.overall_bitrate()), true);
}

fn tier_row(plan: &TierPlan) -> String {
    let resolution = plan.resolution_label();
    if let Some(failure) = &plan.failure {
        return format!(
            "{:<11} {:>12} {}",
            resolution,
            format_bitrate(plan.bitrate_default),
            style(format!("failed: {failure}")).red()
        );
    }

    let bitrate = plan.bitrate.map(format_bitrate).unwrap_or_else(|| "-".to_string());
    let savings = plan.savings.map(format_bitrate_delta).unwrap_or_else(|| "-".to_string());
    let row = format!(
        "{:<11} {:>12} {:>12} {:>12}",
        resolution,
        format_bitrate(plan.bitrate_default),
        bitrate,
        savings
    );
    if plan.retained {
        row
    } else {
        format!("{} {}", style(row).dim(), style("(elided)").dim())
    }
}

/// Print the parameters, per-tier plan and totals of one analysis.
pub fn print_result(result: &AnalysisResult) {
    print_section(&format!("{} analysis", result.parameters.method()));

    match &result.parameters {
        AnalysisParameters::Crf(params) => {
            print_status("CRF", &params.crf_value.to_string(), false);
            print_status("Mode", &params.model.to_string(), false);
            if let (Some(width), Some(height)) = (params.width, params.height) {
                print_status("Reference", &format!("{width}x{height}"), false);
            }
            print_status("Segments", &params.number_of_parts.to_string(), false);
        }
        AnalysisParameters::Metric(params) => {
            print_status("Metric", &params.metric.to_string(), false);
            print_status("Threshold", &params.threshold.to_string(), false);
            print_status("Step", &format_bitrate(params.bitrate_steps), false);
        }
    }
    if let Some(stats) = &result.bitrate {
        print_status("Optimal", &format_bitrate(stats.optimal as u64), true);
        print_status("Average", &format_bitrate(stats.average as u64), false);
        print_status("Peak", &format_bitrate(stats.peak), false);
    }

    println!();
    println!(
        "{}",
        style(format!(
            "{:<11} {:>12} {:>12} {:>12}",
            "Resolution", "Default", "Optimized", "Savings"
        ))
        .bold()
    );
    for plan in &result.optimized_encoding_ladder.encoding_profiles {
        println!("{}", tier_row(plan));
    }

    let ladder = &result.optimized_encoding_ladder;
    let saved = ladder.overall_bitrate_default as i64 - ladder.overall_bitrate_optimized as i64;
    println!();
    print_status("Default total", &format_bitrate(ladder.overall_bitrate_default), false);
    print_status("Optimized total", &format_bitrate(ladder.overall_bitrate_optimized), true);
    print_status(
        "Savings",
        &format!(
            "{} ({:.1}%)",
            format_bitrate_delta(saved),
            savings_percent(ladder.overall_bitrate_default, saved)
        ),
        false,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_rows() {
        set_color(false);
        let kept = TierPlan::new(1920, 1080, 4_500_000).choose(3_000_000, true);
        let row = tier_row(&kept);
        assert!(row.starts_with("1920x1080"));
        assert!(row.contains("3.00 Mbps"));
        assert!(row.contains("1.50 Mbps"));

        let elided = TierPlan::new(480, 270, 750_000).choose(200_000, false);
        assert!(tier_row(&elided).ends_with("(elided)"));

        let failed = TierPlan::new(640, 360, 1_100_000).fail("Timeout");
        assert!(tier_row(&failed).contains("failed: Timeout"));
    }
}
