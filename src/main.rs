use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dewiktionary::dump::{self, open_dump, ScanOptions};
use dewiktionary::{
    lookup_with_article, ApiFetcher, Article, Config, DefinitionKind, DumpFetcher, Fetcher,
    LookupError, Mode, Parser, WordEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One JSON object per word
    Json,
    /// Human-readable listing
    Text,
}

#[derive(ClapParser)]
#[command(name = "dewiktionary-rust")]
#[command(about = "German Wiktionary lookup - definitions and inflection tables per part of speech")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config YAML (default: dewiktionary.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail on unrecognized headings or parameters instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    /// Quiet mode - no progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Look up words online (or in a local dump) and print their entries
    Lookup {
        /// Words to look up; read one per line from stdin if none are given
        words: Vec<String>,

        /// Read pages from a dump file (.xml or .xml.bz2) instead of the API
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Save the wikitext of pages without an inflection table to this directory
        #[arg(long)]
        save_wikitext: Option<PathBuf>,
    },

    /// Parse a local wikitext file
    Parse {
        /// Wikitext file
        file: PathBuf,

        /// Headword of the page (default: file stem)
        #[arg(long)]
        word: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Parse every German page of a dump into a JSONL file
    Scan {
        /// Input XML file (.xml or .xml.bz2)
        input: PathBuf,

        /// Output JSONL file
        output: PathBuf,

        /// Limit number of entries to write (for testing)
        #[arg(long)]
        limit: Option<usize>,

        /// Limit number of pages to scan (for testing with raw dumps)
        #[arg(long)]
        page_limit: Option<usize>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match Config::resolve(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    if args.strict {
        config.parser.mode = Mode::Strict;
    }
    let parser = Parser::new(config.parser.clone());

    match args.command {
        Command::Lookup {
            words,
            dump,
            format,
            save_wikitext,
        } => {
            let fetcher: Box<dyn Fetcher> = match dump {
                Some(path) => Box::new(DumpFetcher::new(path, args.quiet)),
                None => match ApiFetcher::new(&config.fetch) {
                    Ok(fetcher) => Box::new(fetcher),
                    Err(e) => {
                        eprintln!("Error creating HTTP client: {}", e);
                        std::process::exit(1);
                    }
                },
            };
            let words = if words.is_empty() {
                read_words(io::stdin().lock())?
            } else {
                words
            };

            let mut failed = 0;
            for word in &words {
                if !run_lookup(fetcher.as_ref(), &parser, word, format, save_wikitext.as_deref())? {
                    failed += 1;
                }
            }
            if failed > 0 {
                std::process::exit(1);
            }
        }

        Command::Parse { file, word, format } => {
            let text = fs::read_to_string(&file)?;
            let word = word.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().trim_start_matches("wikitext_").to_string())
                    .unwrap_or_default()
            });
            match parser.parse(&Article::new(&word, text)) {
                Ok(entry) => print_entry(&entry, format)?,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", file.display(), e);
                    std::process::exit(1);
                }
            }
        }

        Command::Scan {
            input,
            output,
            limit,
            page_limit,
        } => {
            if !args.quiet {
                println!("Parsing: {}", input.display());
                println!("Output: {}", output.display());
                println!("Mode: {:?}", config.parser.mode);
                if let Some(limit) = limit {
                    println!("Limit: {} entries", limit);
                }
                if let Some(limit) = page_limit {
                    println!("Page limit: {}", limit);
                }
                println!();
            }

            let reader = open_dump(&input)?;
            let mut writer = BufWriter::with_capacity(256 * 1024, File::create(&output)?);
            let options = ScanOptions {
                limit,
                page_limit,
                quiet: args.quiet,
            };
            let stats = dump::run_scan(reader, &mut writer, &parser, &options)?;

            if !args.quiet {
                dump::print_stats(&stats);
            }
        }
    }

    Ok(())
}

/// Non-empty trimmed lines.
fn read_words(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut words = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            words.push(word.to_string());
        }
    }
    Ok(words)
}

/// Look up one word and print the result. Returns `false` if nothing was printed.
fn run_lookup(
    fetcher: &dyn Fetcher,
    parser: &Parser,
    word: &str,
    format: Format,
    save_dir: Option<&Path>,
) -> io::Result<bool> {
    let result = match lookup_with_article(fetcher, parser, word) {
        Ok(result) => result,
        Err(LookupError::NotFound { word }) => {
            eprintln!("Search term \"{}\" not found", word);
            return Ok(false);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(false);
        }
    };

    let parsed_table = matches!(&result.entry, Ok(entry) if entry.has_inflection());
    if let (Some(dir), false) = (save_dir, parsed_table) {
        let path = save_wikitext(dir, &result.article)?;
        eprintln!(
            "Wikitext for \"{}\" exists but has no parsed inflection table, saved in: {}",
            word,
            path.display()
        );
    }

    match result.entry {
        Ok(entry) => {
            print_entry(&entry, format)?;
            Ok(true)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(false)
        }
    }
}

fn save_wikitext(dir: &Path, article: &Article) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let name = article.headword().replace(['/', '\\'], "_");
    let path = dir.join(format!("wikitext_{}.txt", name));
    fs::write(&path, article.wikitext())?;
    Ok(path)
}

fn print_entry(entry: &WordEntry, format: Format) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        Format::Json => {
            let json = serde_json::to_string(entry).map_err(io::Error::other)?;
            writeln!(out, "{}", json)?;
        }
        Format::Text => write_text(&mut out, entry)?,
    }
    Ok(())
}

fn write_text(out: &mut impl Write, entry: &WordEntry) -> io::Result<()> {
    writeln!(out, "{}", entry.headword)?;
    if let Some(lemma) = entry.lemma.as_deref().filter(|l| *l != entry.headword) {
        writeln!(out, "Lemma: {}", lemma)?;
    }

    for block in &entry.blocks {
        writeln!(out)?;
        let genders: Vec<String> = block.genders.iter().map(|g| format!("{:?}", g).to_lowercase()).collect();
        if genders.is_empty() {
            writeln!(out, "== {} ({}) ==", block.pos, block.categories.join(", "))?;
        } else {
            writeln!(
                out,
                "== {} ({}; {}) ==",
                block.pos,
                block.categories.join(", "),
                genders.join(", ")
            )?;
        }

        for def in &block.definitions {
            let labels = if def.labels.is_empty() {
                String::new()
            } else {
                format!("({}) ", def.labels.join(", "))
            };
            match def.kind {
                DefinitionKind::Gloss => writeln!(out, "  [{}] {}{}", def.number, labels, def.text)?,
                DefinitionKind::Reference => writeln!(out, "  [{}] {}→ {}", def.number, labels, def.text)?,
            }
        }

        for form_of in &block.form_of {
            writeln!(out, "  {} of {}", form_of.description, form_of.lemma)?;
        }

        if let Some(table) = &block.inflection {
            writeln!(out, "  Inflection ({}):", table.template)?;
            for (key, value) in &table.forms {
                let variants = table.variants_of(key);
                if variants.is_empty() {
                    writeln!(out, "    {}: {}", key, value)?;
                } else {
                    writeln!(out, "    {}: {} ({})", key, value, variants.join(", "))?;
                }
            }
            if !table.auxiliaries.is_empty() {
                writeln!(out, "    Hilfsverb: {}", table.auxiliaries.join(", "))?;
            }
        }

        if !block.translations.is_empty() {
            writeln!(out, "  Translations:")?;
            for t in &block.translations {
                writeln!(out, "    {} [{}] {}", t.language, t.senses.join(", "), t.term)?;
            }
        }
    }

    for diagnostic in &entry.diagnostics {
        writeln!(out, "! {}: {}", diagnostic.stage, diagnostic.reason)?;
    }
    Ok(())
}
