//! deckwise - deck list import, collection tracking and suggestion candidates.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use deckwise::config::{self, Config};
use deckwise::{
    CardDatabase, CardId, CardLookup, CardQuery, Collection, Deck, DeckId, DeckStats, Error,
    FileStore, Library, NeedSpecification, Result, ScoredCandidate, assemble_deck,
    compute_availability, parse_deck_list, score_and_filter, suggestion_pool,
};

const USAGE: &str = "\
Usage: deckwise [--cards PATH] [--data-dir DIR] <command>

Commands:
  import <file> [--name NAME]           Import a deck list
  decks                                 List saved decks
  delete-deck <id>                      Delete a saved deck
  stats <id> [--json]                   Show deck statistics
  collection add <file>                 Add a card list to the collection
  collection remove <card-id> [qty]     Remove copies from the collection
  available [<id>]                      Show free copies (for a deck: legal ones)
  suggest <id> --needs <file> [--json]  Rank collection cards against deck needs

Environment: DECKWISE_CARDS, DECKWISE_DATA_DIR, DECKWISE_LOG";

#[derive(Debug)]
enum Command {
    Import { file: PathBuf, name: Option<String> },
    Decks,
    DeleteDeck { id: String },
    Stats { id: String, json: bool },
    CollectionAdd { file: PathBuf },
    CollectionRemove { card_id: String, quantity: u32 },
    Available { id: Option<String> },
    Suggest { id: String, needs: PathBuf, json: bool },
}

#[derive(Debug)]
struct Args {
    config: Config,
    command: Command,
}

/// Parse command-line arguments.
fn parse_args() -> std::result::Result<Args, String> {
    let config = Config::from_env().map_err(|err| err.to_string())?;
    let (config, args) = config
        .with_args(env::args().skip(1).collect())
        .map_err(|err| err.to_string())?;

    let mut json = false;
    let mut name = None;
    let mut needs = None;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => {
                json = true;
                i += 1;
            }
            "--name" => {
                name = Some(args.get(i + 1).ok_or("--name requires a value")?.clone());
                i += 2;
            }
            "--needs" => {
                needs = Some(PathBuf::from(
                    args.get(i + 1).ok_or("--needs requires a file path")?,
                ));
                i += 2;
            }
            "-h" | "--help" => return Err(String::new()),
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}")),
            _ => {
                positional.push(args[i].clone());
                i += 1;
            }
        }
    }

    let words: Vec<&str> = positional.iter().map(String::as_str).collect();
    let command = match words.as_slice() {
        ["import", file] => Command::Import {
            file: PathBuf::from(file),
            name,
        },
        ["decks"] => Command::Decks,
        ["delete-deck", id] => Command::DeleteDeck { id: id.to_string() },
        ["stats", id] => Command::Stats {
            id: id.to_string(),
            json,
        },
        ["collection", "add", file] => Command::CollectionAdd {
            file: PathBuf::from(file),
        },
        ["collection", "remove", card_id] => Command::CollectionRemove {
            card_id: card_id.to_string(),
            quantity: 1,
        },
        ["collection", "remove", card_id, quantity] => Command::CollectionRemove {
            card_id: card_id.to_string(),
            quantity: quantity
                .parse()
                .map_err(|_| format!("invalid quantity '{quantity}'"))?,
        },
        ["available"] => Command::Available { id: None },
        ["available", id] => Command::Available {
            id: Some(id.to_string()),
        },
        ["suggest", id] => Command::Suggest {
            id: id.to_string(),
            needs: needs.ok_or("suggest requires --needs <file>")?,
            json,
        },
        [] => return Err(String::new()),
        other => return Err(format!("unrecognized command: {}", other.join(" "))),
    };

    Ok(Args { config, command })
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn open_library(config: &Config) -> Result<Library<FileStore>> {
    Ok(Library::new(FileStore::open(&config.data_dir)?))
}

fn find_deck(library: &Library<FileStore>, id: &str) -> Result<Deck> {
    library
        .deck(&DeckId(id.to_string()))?
        .ok_or_else(|| Error::DeckNotFound(id.to_string()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_import(config: &Config, file: &Path, name: Option<String>) -> Result<()> {
    let parsed = parse_deck_list(&read_text(file)?)?;
    let db = CardDatabase::load(&config.cards_path)?;
    let queries: Vec<CardQuery> = parsed.entries().map(CardQuery::for_entry).collect();
    let batch = db.lookup_batch(&queries);

    let name = name.unwrap_or_else(|| {
        file.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Imported deck".to_string())
    });
    let import = assemble_deck(&name, parsed, &batch);
    open_library(config)?.save_deck(&import.deck)?;

    let deck = &import.deck;
    println!("Imported '{}' as {}", deck.name, deck.id);
    let commanders: Vec<&str> = deck.commander.iter().map(|e| e.name.as_str()).collect();
    println!("  Commander: {}", commanders.join(" + "));
    println!(
        "  Cards: {} (color identity {})",
        deck.card_count(),
        deck.color_identity()
    );
    if !import.parse_errors.is_empty() {
        println!("  {} line(s) not understood:", import.parse_errors.len());
        for error in &import.parse_errors {
            println!("    {error}");
        }
    }
    if !import.not_found.is_empty() {
        println!("  Not found: {}", import.not_found.join(", "));
    }
    if !import.off_identity.is_empty() {
        println!("  Outside commander identity: {}", import.off_identity.join(", "));
    }
    Ok(())
}

fn run_decks(config: &Config) -> Result<()> {
    let decks = open_library(config)?.decks()?;
    if decks.is_empty() {
        println!("No saved decks.");
    }
    for deck in decks {
        println!(
            "{}  {:<32} {:>3} cards  {:<5} {}",
            deck.id,
            deck.name,
            deck.card_count(),
            deck.color_identity(),
            deck.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

fn run_stats(config: &Config, id: &str, json: bool) -> Result<()> {
    let deck = find_deck(&open_library(config)?, id)?;
    let stats = DeckStats::from_deck(&deck);
    if json {
        return print_json(&stats);
    }

    println!("{} ({})", deck.name, deck.color_identity());
    println!(
        "  {} cards, {} lands, {} creatures, {} unresolved",
        stats.total_cards, stats.lands, stats.creatures, stats.unresolved
    );
    println!("  Average mana value: {:.2}", stats.average_mana_value);
    let curve: Vec<String> = stats
        .curve
        .iter()
        .enumerate()
        .map(|(mv, count)| {
            let label = if mv + 1 == stats.curve.len() {
                format!("{mv}+")
            } else {
                mv.to_string()
            };
            format!("{label}:{count}")
        })
        .collect();
    println!("  Curve: {}", curve.join(" "));
    for (role, count) in &stats.roles {
        println!("  {role}: {count}");
    }
    Ok(())
}

fn run_collection_add(config: &Config, file: &Path) -> Result<()> {
    let parsed = parse_deck_list(&read_text(file)?)?;
    let db = CardDatabase::load(&config.cards_path)?;
    let queries: Vec<CardQuery> = parsed.entries().map(CardQuery::for_entry).collect();
    let batch = db.lookup_batch(&queries);

    let library = open_library(config)?;
    let mut collection = library.collection()?;
    let summary = collection.import(parsed, &batch);
    library.save_collection(&collection)?;

    println!(
        "Added {} card(s); collection now holds {} card(s) in {} entries",
        summary.added,
        collection.total_cards(),
        collection.len()
    );
    for error in &summary.parse_errors {
        println!("  {error}");
    }
    if !summary.not_found.is_empty() {
        println!("  Not found: {}", summary.not_found.join(", "));
    }
    Ok(())
}

fn run_collection_remove(config: &Config, card_id: &str, quantity: u32) -> Result<()> {
    let library = open_library(config)?;
    let mut collection: Collection = library.collection()?;
    if collection.remove(&CardId::new(card_id), quantity) {
        library.save_collection(&collection)?;
        println!("Removed up to {quantity} of {card_id}");
    } else {
        log::warn!("card {card_id} is not in the collection");
        println!("{card_id} is not in the collection");
    }
    Ok(())
}

fn run_available(config: &Config, id: Option<&str>) -> Result<()> {
    let library = open_library(config)?;
    let collection = library.collection()?;
    let decks = library.decks()?;
    let availability = compute_availability(collection.entries(), &decks);

    match id {
        Some(id) => {
            let deck = find_deck(&library, id)?;
            for card in suggestion_pool(&availability, deck.color_identity()) {
                if !deck.contains_name(&card.card.name) {
                    println!("{:>3}  {}", card.available, card.card.name);
                }
            }
        }
        None => {
            for item in &availability {
                println!(
                    "{:>3} of {:<3} {}  ({})",
                    item.available, item.owned, item.card.name, item.card.id
                );
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct SuggestionRequest<'a> {
    deck: &'a str,
    need: &'a NeedSpecification,
    candidates: &'a [ScoredCandidate],
}

fn run_suggest(config: &Config, id: &str, needs: &Path, json: bool) -> Result<()> {
    let mut need = NeedSpecification::from_model_output(&read_text(needs)?)?;
    let library = open_library(config)?;
    let deck = find_deck(&library, id)?;
    let decks = library.decks()?;
    let collection = library.collection()?;

    let availability = compute_availability(collection.entries(), &decks);
    let pool = suggestion_pool(&availability, deck.color_identity());
    let deck_cards: Vec<_> = deck.entries().cloned().collect();
    let candidates = score_and_filter(&pool, &need, &deck_cards);
    DeckStats::from_deck(&deck).fill_role_counts(&mut need);

    if json {
        return print_json(&SuggestionRequest {
            deck: &deck.name,
            need: &need,
            candidates: &candidates,
        });
    }

    if candidates.is_empty() {
        println!("No collection cards match this deck's needs.");
        return Ok(());
    }
    for (rank, candidate) in candidates.iter().enumerate() {
        let signals: Vec<String> = candidate.signals.iter().map(ToString::to_string).collect();
        println!(
            "{:>3}. {:>3}  {:<36} x{}  {}",
            rank + 1,
            candidate.relevance_score,
            candidate.card.name,
            candidate.available,
            signals.join(", ")
        );
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = &args.config;
    log::debug!("using {config:?}");
    match args.command {
        Command::Import { file, name } => run_import(config, &file, name),
        Command::Decks => run_decks(config),
        Command::DeleteDeck { id } => {
            if open_library(config)?.delete_deck(&DeckId(id.clone()))? {
                println!("Deleted {id}");
                Ok(())
            } else {
                Err(Error::DeckNotFound(id))
            }
        }
        Command::Stats { id, json } => run_stats(config, &id, json),
        Command::CollectionAdd { file } => run_collection_add(config, &file),
        Command::CollectionRemove { card_id, quantity } => {
            run_collection_remove(config, &card_id, quantity)
        }
        Command::Available { id } => run_available(config, id.as_deref()),
        Command::Suggest { id, needs, json } => run_suggest(config, &id, &needs, json),
    }
}

fn main() {
    env_logger::Builder::new()
        .parse_filters(&config::log_filter())
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("Error: {message}\n");
            }
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
