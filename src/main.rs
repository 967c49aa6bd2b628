// unbind - recover bind phrases from 6-byte binding UIDs
// Table lookup first, exhaustive parallel MD5 sweep second.

use std::io::{stdin, stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use clap::Parser;

use unbind::cli::{self, Args};
use unbind::digest::{phrase_uid, Uid};
use unbind::error::SearchError;
use unbind::index::PhraseIndex;
use unbind::search::{MatchOrigin, SearchConfig, SearchOutcome, Searcher};

fn main() {
    let args = Args::parse();

    println!("\n\x1b[1;36m╔═══════════════════════════════════════════════╗");
    println!("║    UNBIND  •  UID → bind phrase recovery      ║");
    println!("╚═══════════════════════════════════════════════╝\x1b[0m\n");

    let config = SearchConfig {
        max_len: args.max_len,
        batch_size: args.batch_size.max(1),
        threads: args.threads,
        progress: true,
        ..Default::default()
    };

    // Ctrl+C stops the running sweep, not the whole menu
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            println!("\n[!] Stopping...");
            stop.store(true, Ordering::SeqCst);
        })
        .ok();
    }

    let mut index = load_index(&args.table);

    if let Some(raw) = &args.uid {
        match Uid::parse(raw) {
            Ok(uid) => recover(uid, &index, &config, &stop),
            Err(e) => {
                eprintln!("[✗] {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    loop {
        println!();
        println!("[{}] Choose an option:", now());
        println!("    1. Convert text to UID");
        println!("    2. Recover text from UID (table + brute force)");
        println!("    3. Rebuild table from wordlist");
        println!("    4. Exit");

        match prompt("Enter your choice (1-4): ").as_str() {
            "1" => {
                let text = prompt("Enter the text: ");
                let uid = phrase_uid(&text);
                println!("[{}] UID: {}  (hex {})", now(), uid, uid.to_hex());
            }
            "2" => {
                if let Some(uid) = read_uid() {
                    recover(uid, &index, &config, &stop);
                }
            }
            "3" => {
                if let Some(rebuilt) = rebuild_table(&args.wordlist, &args.table) {
                    index = rebuilt;
                }
            }
            "4" => {
                println!("[{}] Bye.", now());
                break;
            }
            other => println!("[!] Invalid choice '{}', enter 1-4.", other),
        }
    }
}

fn now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn prompt(message: &str) -> String {
    print!("[{}] {}", now(), message);
    stdout().flush().ok();

    let mut line = String::new();
    if stdin().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

/// Keep asking until the UID parses; an empty line returns to the menu.
fn read_uid() -> Option<Uid> {
    loop {
        let input = prompt("Enter target UID (6 comma-separated bytes, empty to cancel): ");
        if input.is_empty() {
            return None;
        }
        match Uid::parse(&input) {
            Ok(uid) => return Some(uid),
            Err(e) => println!("[!] {}", e),
        }
    }
}

fn load_index(table: &str) -> PhraseIndex {
    match PhraseIndex::from_table(table) {
        Ok(index) => {
            if !index.is_empty() {
                println!("[✓] Loaded {} table entries from '{}'", index.len(), table);
            }
            index
        }
        Err(e) => {
            eprintln!("[✗] Could not read table '{}': {}", table, e);
            PhraseIndex::empty()
        }
    }
}

fn rebuild_table(wordlist: &str, table: &str) -> Option<PhraseIndex> {
    let index = match PhraseIndex::from_wordlist(wordlist) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("[✗] Could not read wordlist '{}': {}", wordlist, e);
            return None;
        }
    };

    match index.save_table(table) {
        Ok(()) => println!(
            "[✓] Wrote {} entries to '{}'",
            cli::format_num(index.len() as u64),
            table
        ),
        Err(e) => eprintln!("[✗] Could not write table '{}': {}", table, e),
    }

    Some(index)
}

fn recover(uid: Uid, index: &PhraseIndex, config: &SearchConfig, stop: &Arc<AtomicBool>) {
    stop.store(false, Ordering::SeqCst);

    println!("[{}] Checking precomputed table...", now());
    let searcher = Searcher::new(config.clone()).with_stop(stop.clone());

    match searcher.run(uid, index) {
        Ok(report) => {
            match &report.outcome {
                SearchOutcome::Found(m) => match m.origin {
                    MatchOrigin::Index => {
                        println!("[✓] Found in precomputed table: {:?}", m.phrase)
                    }
                    MatchOrigin::BruteForce { length, ordinal } => println!(
                        "[✓] Match found: {:?} (length {}, ordinal {})",
                        m.phrase, length, ordinal
                    ),
                },
                SearchOutcome::NotFound => println!(
                    "[✗] No match found after exhausting lengths 1-{}.",
                    config.max_len
                ),
            }
            if report.candidates_checked > 0 {
                println!(
                    "[{}] {} candidates in {} @ {}",
                    now(),
                    cli::format_num(report.candidates_checked),
                    cli::format_time(report.elapsed_secs),
                    cli::format_speed(report.rate())
                );
            }
        }
        Err(SearchError::Interrupted) => println!("[!] Search interrupted."),
        Err(e) => eprintln!("[✗] Search failed: {}", e),
    }
}
