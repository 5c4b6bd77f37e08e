//! Prompt text sent to the remote model, in JSON or labeled reply form.

use super::ReplyFormat;

const PREAMBLE: &str = "Analyze the following code for performance issues and provide metrics:";

const REQUESTS: &str = "Please provide:
1. Estimated load time impact (in seconds)
2. Database efficiency assessment (0-10 scale)
3. Network optimization opportunities (0-10 scale)
4. Overall potential improvement percentage
5. List of any additional performance issues found";

const JSON_INSTRUCTIONS: &str = r#"Return the response as **strictly valid JSON**. Ensure all property names are enclosed in double quotes.
Use exactly these keys: "loadTimeImpact", "databaseEfficiency", "networkOptimization", "potentialImprovement" (numbers) and "issues" (an array of objects with "severity" one of info|warning|critical, "title", "description", optional "line", optional "suggestion", optional "impact")."#;

const LABELED_INSTRUCTIONS: &str = "Answer in exactly this format, one value per line:
Load Time Impact: <seconds>
Database Efficiency: <0-10>
Network Optimization: <0-10>
Potential Improvement: <percent>
Issues:
1. [<info|warning|critical>] <title> - <description>";

/// Fixed instruction template wrapped around the source under analysis.
pub fn build_prompt(source: &str, format: ReplyFormat) -> String {
    let instructions = match format {
        ReplyFormat::Json => JSON_INSTRUCTIONS,
        ReplyFormat::Labeled => LABELED_INSTRUCTIONS,
    };
    format!("{PREAMBLE}\n\nCode:\n{source}\n\n{REQUESTS}\n\n{instructions}\n")
}
