use std::error::Error;

use crate::api::{BackendClient, ThreadSummary};

pub async fn list_threads(client: &BackendClient, token: &str) -> Result<(), Box<dyn Error>> {
    let threads = client.list_threads(token).await?;
    for line in format_thread_list(&threads) {
        println!("{line}");
    }
    Ok(())
}

fn format_thread_list(threads: &[ThreadSummary]) -> Vec<String> {
    if threads.is_empty() {
        return vec!["No threads yet. Run 'threadline' to start one.".to_string()];
    }
    let id_width = threads.iter().map(|t| t.id.len()).max().unwrap_or(0);
    let mut lines = vec![format!("{} thread(s):", threads.len())];
    lines.extend(threads.iter().map(|thread| {
        let title = if thread.title.is_empty() {
            "(untitled)"
        } else {
            thread.title.as_str()
        };
        format!("  {:<id_width$}  {title}", thread.id)
    }));
    lines
}
