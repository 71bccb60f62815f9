//! Headless mode for Literate.
//!
//! Reads narrative text from stdin line by line and prints orchestrator
//! events as they arrive. Designed for scripting and piping files through
//! the extractor without a TUI.

use literate_core::{
    CollectionStatistics, NarrativeObject, OrchestratorError, OrchestratorEvent, OrchestratorHandle,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::app::{event_message, resolve_target, Activity};

/// Run the line-oriented interface until `#quit` or end of input.
///
/// - Lines starting with `#` are commands
/// - All other lines are appended to the narrative text
///
/// At end of input, waits for outstanding extraction to finish and prints
/// the final object list.
pub async fn run_headless(
    handle: OrchestratorHandle,
    mut events: UnboundedReceiver<OrchestratorEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Literate Headless Mode ===");
    print_help();
    println!();

    let mut lines = spawn_stdin_reader();
    let mut input = PendingText::default();
    let mut activity = Activity::default();
    let mut input_open = true;

    loop {
        if !input_open && activity.is_idle() {
            break;
        }

        tokio::select! {
            biased;

            event = events.recv() => match event {
                Some(event) => report(&mut activity, &event),
                None => break,
            },
            line = lines.recv(), if input_open => match line {
                Some(line) => {
                    // Handle everything already buffered before notifying the
                    // orchestrator, so piped files produce one text change.
                    let mut batch = vec![line];
                    while let Ok(more) = lines.try_recv() {
                        batch.push(more);
                    }
                    for line in batch {
                        if !handle_line(&handle, &mut input, &line).await? {
                            handle.shutdown().await.ok();
                            return Ok(());
                        }
                    }
                    input.sync(&handle).await?;
                }
                None => {
                    input_open = false;
                    flush(&handle, &mut events, &mut activity).await?;
                }
            },
        }
    }

    print_objects(&handle.snapshot().await?);
    handle.shutdown().await.ok();
    Ok(())
}

/// Forward stdin lines over a channel until end of input.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    eprintln!("Error reading input: {e}");
                    break;
                }
            }
        }
    });
    rx
}

/// Accumulated narrative text not yet sent to the orchestrator
#[derive(Default)]
struct PendingText {
    text: String,
    dirty: bool,
}

impl PendingText {
    fn append(&mut self, line: &str) {
        if line.trim().is_empty() && self.text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.dirty = true;
    }

    async fn sync(&mut self, handle: &OrchestratorHandle) -> Result<(), OrchestratorError> {
        if std::mem::take(&mut self.dirty) {
            handle.text_changed(self.text.clone()).await?;
        }
        Ok(())
    }
}

fn report(activity: &mut Activity, event: &OrchestratorEvent) {
    activity.observe(event);
    if let Some(message) = event_message(event) {
        println!("[{}] {}", message.kind.tag(), message.text);
    }
}

/// Wait until the orchestrator has handled every command sent so far and
/// report the events those commands produced.
async fn flush(
    handle: &OrchestratorHandle,
    events: &mut UnboundedReceiver<OrchestratorEvent>,
    activity: &mut Activity,
) -> Result<(), OrchestratorError> {
    handle.snapshot().await?;
    while let Ok(event) = events.try_recv() {
        report(activity, &event);
    }
    Ok(())
}

/// Handle one input line. Returns false when the user asked to quit.
async fn handle_line(
    handle: &OrchestratorHandle,
    input: &mut PendingText,
    line: &str,
) -> Result<bool, OrchestratorError> {
    let Some(command) = line.trim().strip_prefix('#') else {
        input.append(line);
        return Ok(true);
    };

    // Commands see the text typed before them.
    input.sync(handle).await?;

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "quit" | "exit" => {
            println!("Goodbye!");
            return Ok(false);
        }
        "retry" if arg.is_empty() => println!("[ERROR] Usage: #retry <number|name>"),
        "retry" => {
            let objects = handle.snapshot().await?;
            match resolve_target(arg, &objects) {
                Some(target) => handle.retry(target).await?,
                None => println!("[ERROR] No object matches '{arg}'"),
            }
        }
        "remove" if arg.is_empty() => println!("[ERROR] Usage: #remove <name>"),
        "remove" => handle.remove(arg).await?,
        "clear" => handle.clear().await?,
        "objects" => print_objects(&handle.snapshot().await?),
        "stats" => print_statistics(&handle.statistics().await?),
        "help" => print_help(),
        _ => println!("[ERROR] Unknown command: #{name}. Type #help for commands."),
    }
    Ok(true)
}

fn print_help() {
    println!("Commands:");
    println!("  #retry <n|name> - Re-extract one object against the full text");
    println!("  #remove <name>  - Remove an object");
    println!("  #clear          - Remove all objects");
    println!("  #objects        - List the current objects");
    println!("  #stats          - Show collection statistics");
    println!("  #help           - Show this help");
    println!("  #quit           - Exit");
    println!();
    println!("Any other line is appended to the narrative text.");
}

fn print_objects(objects: &[NarrativeObject]) {
    if objects.is_empty() {
        println!("[OBJECTS] No narrative objects found.");
        return;
    }
    println!("[OBJECTS] Found {} narrative objects:", objects.len());
    for (i, object) in objects.iter().enumerate() {
        println!("{}. {}", i + 1, object.name);
        println!("   {}", object.description);
        for rel in &object.relationships {
            println!("   → {}: {}", rel.target, rel.description);
        }
    }
}

fn print_statistics(stats: &CollectionStatistics) {
    for line in format_statistics(stats) {
        println!("{line}");
    }
}

fn format_statistics(stats: &CollectionStatistics) -> Vec<String> {
    let mut lines = vec![format!(
        "[STATS] {} objects, {} relationships ({:.1} per object), {} with relationships",
        stats.total_objects,
        stats.total_relationships,
        stats.average_relationships,
        stats.objects_with_relationships
    )];
    if let (Some(oldest), Some(newest)) = (&stats.oldest, &stats.newest) {
        lines.push(format!("[STATS] Oldest object: {oldest}, newest object: {newest}"));
    }
    lines
}
