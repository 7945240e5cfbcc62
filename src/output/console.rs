use crate::analysis::{RiskLevel, RuleAnalysis};
use crate::convert::{BatchConversion, LogSeverity};

/// Render a batch conversion as plain console output: rules, then the
/// decision log in order, then any analysis.
pub fn render(batch: &BatchConversion, analysis: &[RuleAnalysis]) -> String {
    let mut output = String::new();

    if batch.outcomes.is_empty() {
        output.push_str("\n  No rules found in input.\n\n");
        return output;
    }

    output.push_str(&format!(
        "\n  {} rule(s) converted to {} (detected source: {})\n\n",
        batch.converted_count(),
        batch.target,
        batch.detected,
    ));

    for outcome in &batch.outcomes {
        output.push_str(&outcome.output_line());
        output.push('\n');
    }

    output.push_str("\n  Conversion log:\n");
    for entry in batch.log.entries() {
        let tag = match entry.severity {
            LogSeverity::Info => "[INFO]   ",
            LogSeverity::Success => "[OK]     ",
            LogSeverity::Warning => "[WARNING]",
            LogSeverity::Error => "[ERROR]  ",
        };
        output.push_str(&format!(
            "  {} {} {}\n",
            tag,
            entry.timestamp.format("%H:%M:%S"),
            entry.message
        ));
    }

    for rule in analysis {
        render_analysis(&mut output, rule);
    }

    // Verdict
    let status = if batch.failed_count() == 0 { "OK" } else { "PARTIAL" };
    output.push_str(&format!(
        "\n  Result: {} ({} converted, {} kept as-is)\n\n",
        status,
        batch.converted_count(),
        batch.failed_count(),
    ));

    output
}

fn render_analysis(output: &mut String, rule: &RuleAnalysis) {
    output.push_str(&format!(
        "\n  Analysis for sid:{}\n",
        rule.sid.as_deref().unwrap_or("-")
    ));

    for change in &rule.changes {
        output.push_str(&format!("    change: {}\n", change.description));
    }
    for opt in &rule.optimizations {
        output.push_str(&format!("    gain:   {}\n", opt.description));
    }
    for risk in &rule.risks {
        let tag = match risk.level {
            RiskLevel::High => "[HIGH]  ",
            RiskLevel::Medium => "[MEDIUM]",
            RiskLevel::Low => "[LOW]   ",
        };
        output.push_str(&format!("    risk:   {} {}\n", tag, risk.description));
        output.push_str(&format!("            fix: {}\n", risk.mitigation));
    }
    for rec in &rule.recommendations {
        output.push_str(&format!("    advice: {} ({})\n", rec.description, rec.priority));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Converter;
    use crate::ir::Dialect;

    #[test]
    fn empty_batch_message() {
        let batch = Converter::default().convert_text("", Dialect::Snort);
        assert!(render(&batch, &[]).contains("No rules found"));
    }

    #[test]
    fn failed_rules_marked_partial() {
        let batch = Converter::default().convert_text(
            "alert tcp any any -> any any (msg:\"x\"; sid:nope;)\n",
            Dialect::Snort,
        );
        let out = render(&batch, &[]);
        assert!(out.contains("[ERROR]"));
        assert!(out.contains("Result: PARTIAL (0 converted, 1 kept as-is)"));
    }
}
