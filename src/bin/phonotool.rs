use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use phonosearch::search::{format_text, underline};
use phonosearch::settings;
use phonosearch::transliterate::{self, Transliterator};
use phonosearch::{
    explain, search, search_corpus_with, search_fuzzy, transliterate as translit, CorpusOptions,
    Document, MatchRange,
};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Parser)]
#[command(name = "phonotool", about = "Pinyin fuzzy search diagnostics")]
struct Cli {
    /// Settings TOML to use instead of the embedded defaults
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Readings override TOML to use instead of the embedded defaults
    #[arg(long, global = true)]
    readings: Option<PathBuf>,
    /// Write JSON traces to this directory (needs the `trace` feature)
    #[arg(long, global = true)]
    trace_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the phonetic string and per-character boundaries of a text
    Translit {
        text: String,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Search one text and underline the matched characters
    Search {
        query: String,
        text: String,
        /// Restrict the fuzzy search to original characters START..=END
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        window: Option<Vec<usize>>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Search every file (one document per file) on the worker pool
    Corpus {
        query: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Worker threads (defaults to corpus.workers)
        #[arg(long)]
        workers: Option<usize>,
        /// Deadline in milliseconds (defaults to corpus.timeout_ms)
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Output as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Explain every step of a search
    Explain {
        query: String,
        text: String,
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        window: Option<Vec<usize>>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the embedded default settings TOML
    SettingsExport,
    /// Check a settings TOML file
    SettingsValidate { file: PathBuf },
    /// Print the embedded default readings TOML
    ReadingsExport,
    /// Check a readings TOML file
    ReadingsValidate { file: PathBuf },
}

fn to_window(window: Option<Vec<usize>>) -> Option<std::ops::RangeInclusive<usize>> {
    window.map(|w| w[0]..=w[1])
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    println!("{}", die!(out, "JSON serialization failed: {}"));
}

fn print_ranges(text: &str, ranges: &[MatchRange]) {
    println!("{text}");
    println!("{}", underline(text, ranges));
    let spans: Vec<String> = ranges
        .iter()
        .map(|r| format!("[{},{}] {}", r.start, r.end, r.slice(text).unwrap_or("")))
        .collect();
    println!("{}", spans.join("  "));
}

fn main() {
    let cli = Cli::parse();

    let _trace = cli
        .trace_dir
        .as_deref()
        .map(|dir| die!(phonosearch::init_tracing(dir), "Failed to open trace dir: {}"));
    if let Some(path) = &cli.settings {
        die!(
            settings::init_custom_from_file(path),
            "Failed to load settings from {}: {}",
            path.display()
        );
    }
    if let Some(path) = &cli.readings {
        die!(
            Transliterator::init_custom_from_file(path),
            "Failed to load readings from {}: {}",
            path.display()
        );
    }

    match cli.command {
        Command::Translit { text, json } => {
            let t = translit(&text);
            if json {
                let spans: Vec<(char, usize, usize)> = text
                    .chars()
                    .zip(t.map().spans())
                    .map(|(c, s)| (c, s.start, s.end))
                    .collect();
                print_json(
                    &serde_json::json!({ "phonetic": t.phonetic(), "spans": spans }),
                    false,
                );
            } else {
                println!("{}", t.phonetic());
                for (i, (c, s)) in text.chars().zip(t.map().spans()).enumerate() {
                    let letters: String = t.letters()[s.start..=s.end].iter().collect();
                    println!("  {i:>3} {c} [{:>3},{:>3}] {letters}", s.start, s.end);
                }
            }
        }

        Command::Search {
            query,
            text,
            window,
            json,
        } => {
            let ranges = match to_window(window) {
                None => search(&text, &query),
                Some(w) => search_fuzzy(&translit(&text), &query, Some(w)),
            };
            match (ranges, json) {
                (Some(ranges), true) => print_json(&ranges, false),
                (Some(ranges), false) => print_ranges(&text, &ranges),
                (None, true) => println!("null"),
                (None, false) => {
                    println!("No match.");
                    process::exit(1);
                }
            }
        }

        Command::Corpus {
            query,
            files,
            workers,
            timeout_ms,
            json,
        } => {
            let documents: Vec<Document> = files
                .iter()
                .map(|path| {
                    let text = die!(
                        fs::read_to_string(path),
                        "Failed to read {}: {}",
                        path.display()
                    );
                    Document::new(path.display().to_string(), text)
                })
                .collect();

            let mut options = CorpusOptions::default();
            if let Some(n) = workers {
                options.workers = n;
            }
            if let Some(ms) = timeout_ms {
                options.timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }

            let found = die!(
                search_corpus_with(&documents, &query, &options),
                "Corpus search failed: {}"
            );
            for doc in &found {
                if json {
                    print_json(doc, false);
                } else {
                    let ranges: Vec<String> = doc
                        .matches
                        .iter()
                        .map(|r| format!("[{},{}]", r.start, r.end))
                        .collect();
                    println!("{}: {}", doc.id, ranges.join(" "));
                }
            }
            if !json {
                eprintln!("{} of {} documents matched", found.len(), documents.len());
            }
        }

        Command::Explain {
            query,
            text,
            window,
            json,
        } => {
            let result = explain(&text, &query, to_window(window));
            if json {
                print_json(&result, true);
            } else {
                print!("{}", format_text(&result));
            }
        }

        Command::SettingsExport => print!("{}", settings::default_toml()),

        Command::SettingsValidate { file } => {
            let content = read_file(&file);
            let s = die!(settings::parse_settings_toml(&content), "Error: {}");
            println!(
                "OK: search.max_alignment_cells={}, search.max_query_letters={}, \
                 search.max_alignment_steps={}, corpus.workers={}, corpus.timeout_ms={}",
                s.search.max_alignment_cells,
                s.search.max_query_letters,
                s.search.max_alignment_steps,
                s.corpus.workers,
                s.corpus.timeout_ms
            );
        }

        Command::ReadingsExport => print!("{}", transliterate::DEFAULT_READINGS_TOML),

        Command::ReadingsValidate { file } => {
            let content = read_file(&file);
            let map = die!(transliterate::parse_readings_toml(&content), "Error: {}");
            println!("OK: {} readings", map.len());
        }
    }
}

fn read_file(path: &Path) -> String {
    die!(
        fs::read_to_string(path),
        "Error reading {}: {}",
        path.display()
    )
}
