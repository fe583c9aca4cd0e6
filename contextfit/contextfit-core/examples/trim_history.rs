//! Trim a chat history into a small token budget.
//!
//! Tool results render compactly as a one-line summary; plain chat turns are
//! kept verbatim. Run with `RUST_LOG=contextfit=debug` to watch the probing.

use contextfit::trimming::{
    BatchProbeTrimmer, HeuristicTokenCounter, Render, RenderMode, Segment, TrimError,
};
use futures::future::{self, BoxFuture};
use tracing_subscriber::EnvFilter;

struct ToolResult {
    tool: &'static str,
    output: String,
}

impl Render for ToolResult {
    fn render(&self, mode: RenderMode) -> BoxFuture<'_, Result<String, TrimError>> {
        let text = match mode {
            RenderMode::Full => format!("<tool name=\"{}\">\n{}\n</tool>", self.tool, self.output),
            RenderMode::Compact => format!(
                "<tool name=\"{}\">{} lines omitted</tool>",
                self.tool,
                self.output.lines().count()
            ),
        };
        Box::pin(future::ready(Ok(text)))
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let listing = (0..40)
        .map(|i| format!("src/module_{i}.rs"))
        .collect::<Vec<_>>()
        .join("\n");

    let history = vec![
        Segment::text("user: Which files are in the project?"),
        Segment::renderable(ToolResult {
            tool: "list_files",
            output: listing,
        }),
        Segment::text("assistant: There are forty modules under src/."),
        Segment::text("user: Great. Summarize what module_3 does."),
    ];

    for limit in [400, 60, 25, 8] {
        let trimmer = BatchProbeTrimmer::new(HeuristicTokenCounter)
            .with_token_limit(limit)
            .with_separator("\n\n");
        let context = trimmer.trim(history.clone()).await?;
        println!("--- limit {limit} ---\n{context}\n");
    }

    Ok(())
}
